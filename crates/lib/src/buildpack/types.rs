//! Buildpack types.
//!
//! - [`Stage`] - One of the four named pipeline stages
//! - [`StageCommand`] - A raw command line for a stage
//! - [`PackFile`] - An entry listed from a buildpack directory
//! - [`Buildpack`] - A resolved, immutable buildpack

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named stage of a buildpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  Bootstrap,
  Build,
  Test,
  Run,
}

impl Stage {
  pub const ALL: [Stage; 4] = [Stage::Bootstrap, Stage::Build, Stage::Test, Stage::Run];

  pub fn as_str(self) -> &'static str {
    match self {
      Stage::Bootstrap => "bootstrap",
      Stage::Build => "build",
      Stage::Test => "test",
      Stage::Run => "run",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stage '{0}' (expected bootstrap, build, test, or run)")]
pub struct ParseStageError(pub String);

impl FromStr for Stage {
  type Err = ParseStageError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Stage::ALL
      .into_iter()
      .find(|stage| stage.as_str() == s)
      .ok_or_else(|| ParseStageError(s.to_string()))
  }
}

/// A stage's command line, exactly as written in the buildpack config.
///
/// Tokenized on whitespace only when it runs. An empty command is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StageCommand(String);

impl StageCommand {
  pub fn new(command: impl Into<String>) -> Self {
    Self(command.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Whether running this command would do nothing.
  pub fn is_empty(&self) -> bool {
    self.0.trim().is_empty()
  }
}

impl fmt::Display for StageCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Kind of a directory entry in a buildpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackFileKind {
  File,
  Dir,
  Symlink,
}

/// One entry of a buildpack directory, captured at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackFile {
  /// Entry name relative to the buildpack directory.
  pub name: PathBuf,
  pub kind: PackFileKind,
  pub len: u64,
  /// Permission bits, where the platform has them.
  pub mode: Option<u32>,
}

/// A resolved buildpack.
///
/// Read-only once resolved: installation and stage execution only read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Buildpack {
  pub name: String,
  pub dir: PathBuf,
  pub files: Vec<PackFile>,
  pub bootstrap: StageCommand,
  pub build: StageCommand,
  pub test: StageCommand,
  pub run: StageCommand,
}

impl Buildpack {
  /// The command configured for `stage`.
  pub fn command(&self, stage: Stage) -> &StageCommand {
    match stage {
      Stage::Bootstrap => &self.bootstrap,
      Stage::Build => &self.build,
      Stage::Test => &self.test,
      Stage::Run => &self.run,
    }
  }
}
