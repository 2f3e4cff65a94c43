//! Workspace allocation.
//!
//! Every pipeline run gets a fresh, uniquely named directory under the
//! workspaces root. Workspaces are never reused and never removed here; their
//! lifetime belongs to whoever cleans up the root.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Errors that can occur while creating a workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
  #[error("workspace root does not exist: {}", .0.display())]
  MissingRoot(PathBuf),

  #[error("failed to create workspace under {}: {source}", root.display())]
  Create {
    root: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to resolve workspace path {}: {source}", path.display())]
  Resolve {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Create a new workspace directory under `root` and return its absolute path.
///
/// `root` must already exist. Uniqueness comes from the temp-directory
/// primitive, so concurrent callers never receive the same path.
pub fn create_workspace(root: &Path) -> Result<PathBuf, WorkspaceError> {
  if !root.is_dir() {
    return Err(WorkspaceError::MissingRoot(root.to_path_buf()));
  }

  let dir = tempfile::Builder::new()
    .prefix("ws-")
    .tempdir_in(root)
    .map_err(|e| WorkspaceError::Create {
      root: root.to_path_buf(),
      source: e,
    })?
    .keep();

  let dir = dunce::canonicalize(&dir).map_err(|e| WorkspaceError::Resolve { path: dir, source: e })?;

  info!(path = %dir.display(), "created workspace");
  Ok(dir)
}
