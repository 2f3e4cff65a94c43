//! Types for pipeline runs.
//!
//! This module defines the error type, the per-stage and per-run reports, and
//! the install kind accepted by [`Pipeline::install_pack`](super::Pipeline::install_pack).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::buildpack::{BuildpackError, Stage};
use crate::fetch::{FetchError, FetchedRepo};
use crate::runner::{CommandOutput, RunError};
use crate::workspace::WorkspaceError;

/// Errors that halt a pipeline run.
///
/// A stage command exiting unsuccessfully is not one of these; it is recorded
/// in the [`PipelineReport`] instead.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Workspace(#[from] WorkspaceError),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error(transparent)]
  Buildpack(#[from] BuildpackError),

  /// The stage's program could not be started.
  #[error("{stage} stage could not start: {source}")]
  Stage {
    stage: Stage,
    #[source]
    source: RunError,
  },

  /// No directory name can be derived from a repository URL.
  #[error("cannot derive a buildpack name from '{0}'")]
  NoPackName(String),
}

/// How [`Pipeline::install_pack`](super::Pipeline::install_pack) acquires a buildpack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallKind {
  /// Clone a version-controlled repository.
  #[default]
  Vcs,
  /// Copy a local directory.
  Local,
}

impl fmt::Display for InstallKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InstallKind::Vcs => f.write_str("vcs"),
      InstallKind::Local => f.write_str("local"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown install type '{0}' (expected vcs or local)")]
pub struct ParseInstallKindError(pub String);

impl FromStr for InstallKind {
  type Err = ParseInstallKindError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "vcs" => Ok(InstallKind::Vcs),
      "local" => Ok(InstallKind::Local),
      other => Err(ParseInstallKindError(other.to_string())),
    }
  }
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
  /// The command exited successfully.
  Succeeded,
  /// The command ran and failed.
  Failed {
    code: Option<i32>,
    signal: Option<i32>,
    message: String,
  },
  /// The buildpack configures no command for this stage.
  NoCommand,
  /// An earlier stage failed and the run was configured to halt.
  Skipped,
}

impl StageStatus {
  pub fn is_failure(&self) -> bool {
    matches!(self, StageStatus::Failed { .. })
  }
}

/// Result of running (or not running) one stage command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
  pub stage: Stage,
  pub command: String,
  #[serde(flatten)]
  pub status: StageStatus,
  #[serde(rename = "duration_ms", serialize_with = "as_millis")]
  pub duration: Duration,
  pub output: CommandOutput,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Result of a full Build or Test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
  /// The workspace the run used. Left on disk.
  pub workspace: PathBuf,
  pub buildpack: String,
  pub repo: FetchedRepo,
  /// Files linked into the workspace from the buildpack.
  pub installed: Vec<PathBuf>,
  pub stages: Vec<StageReport>,
}

impl PipelineReport {
  /// Whether no stage failed.
  pub fn succeeded(&self) -> bool {
    !self.stages.iter().any(|s| s.status.is_failure())
  }

  pub fn failed_stages(&self) -> impl Iterator<Item = &StageReport> {
    self.stages.iter().filter(|s| s.status.is_failure())
  }
}
