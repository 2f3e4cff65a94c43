//! Repository acquisition.
//!
//! Populates a directory either from a version-controlled remote
//! ([`fetch_vcs`]) or by recursively copying a local tree ([`fetch_local`]).

mod local;
mod vcs;

use std::path::PathBuf;

use thiserror::Error;

use crate::runner::RunError;

pub use local::{copy_dir, copy_file, fetch_local};
pub use vcs::{FetchedRepo, VcsKind, fetch_vcs, repo_name_from_url};

/// Errors that can occur during fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
  /// Failed to create a destination directory.
  #[error("failed to create directory '{}': {source}", path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The VCS client failed (clone, fetch, checkout).
  #[error("{kind} operation on '{url}' failed: {source}")]
  Vcs {
    kind: VcsKind,
    url: String,
    #[source]
    source: RunError,
  },

  /// Failed to open the checked-out repository.
  #[error("failed to open repository at '{}': {source}", path.display())]
  Open {
    path: PathBuf,
    #[source]
    source: Box<gix::open::Error>,
  },

  /// The requested revision does not exist in the repository.
  #[error("revision '{rev}' not found in '{url}'")]
  RevisionNotFound { url: String, rev: String },

  /// The local source path could not be resolved.
  #[error("failed to resolve path '{}': {source}", path.display())]
  ResolvePath {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The local source path does not exist.
  #[error("path does not exist: {}", .0.display())]
  PathNotFound(PathBuf),

  /// The local source path has no final component to name the copy after.
  #[error("cannot derive a directory name from '{}'", .0.display())]
  NoBaseName(PathBuf),

  /// Walking the source tree failed.
  #[error("failed to walk '{}': {source}", path.display())]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  /// Copying a single file failed.
  #[error("failed to copy '{}' to '{}': {source}", from.display(), to.display())]
  CopyFile {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
