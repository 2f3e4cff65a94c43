//! Buildpack resolution and installation.
//!
//! A buildpack is a directory `<root>/<name>/` holding arbitrary files plus a
//! `cmds.yml` that maps stage names to command lines:
//!
//! ```yaml
//! bootstrap: ./setup.sh
//! test: make test
//! ```
//!
//! Missing stages resolve to an empty (no-op) command. Installing a buildpack
//! hard-links its files into a workspace, so the buildpack directory must be
//! treated as read-only by anything running there.

mod install;
mod resolve;
mod types;

use std::path::PathBuf;

use thiserror::Error;

pub use resolve::{list_buildpacks, resolve};
pub use types::{Buildpack, PackFile, PackFileKind, ParseStageError, Stage, StageCommand};

/// Errors that can occur while resolving or installing a buildpack.
#[derive(Debug, Error)]
pub enum BuildpackError {
  /// The name is not a single plain path component, so it would not stay
  /// under the buildpacks root.
  #[error("invalid buildpack name '{0}'")]
  InvalidName(String),

  #[error("failed to read buildpack directory '{}': {source}", path.display())]
  ReadDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read buildpack config '{}': {source}", path.display())]
  ReadConfig {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse buildpack config '{}': {source}", path.display())]
  ParseConfig {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("failed to link '{}' to '{}': {source}", src.display(), dest.display())]
  Link {
    src: PathBuf,
    dest: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
