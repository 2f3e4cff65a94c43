//! Local directory copy.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::FetchError;

/// Copy the local directory `source` into `dest_dir`.
///
/// The copy lands at `<dest_dir>/<basename(source)>`, which is returned. Both
/// paths are made absolute first. Any file that fails to copy aborts the whole
/// operation; whatever was already copied stays in place.
pub fn fetch_local(dest_dir: &Path, source: &Path) -> Result<PathBuf, FetchError> {
  let source = dunce::canonicalize(source).map_err(|e| {
    if e.kind() == io::ErrorKind::NotFound {
      FetchError::PathNotFound(source.to_path_buf())
    } else {
      FetchError::ResolvePath {
        path: source.to_path_buf(),
        source: e,
      }
    }
  })?;

  let name = source
    .file_name()
    .ok_or_else(|| FetchError::NoBaseName(source.clone()))?;

  let dest_dir = std::path::absolute(dest_dir).map_err(|e| FetchError::ResolvePath {
    path: dest_dir.to_path_buf(),
    source: e,
  })?;
  let target = dest_dir.join(name);

  info!(source = %source.display(), target = %target.display(), "copying local directory");
  copy_dir(&source, &target)?;

  Ok(target)
}

/// Recursively copy the tree at `source` to `dest`.
///
/// Walks depth-first in pre-order: each destination directory is created with
/// its source directory's mode before any of its children are copied.
/// Symlinks are followed and their targets' content is copied.
pub fn copy_dir(source: &Path, dest: &Path) -> Result<(), FetchError> {
  let walker = WalkDir::new(source).follow_links(true).sort_by_file_name();

  for entry in walker {
    let entry = entry.map_err(|e| FetchError::Walk {
      path: source.to_path_buf(),
      source: e,
    })?;

    let Ok(relative) = entry.path().strip_prefix(source) else {
      continue;
    };
    let target = dest.join(relative);

    if entry.file_type().is_dir() {
      let metadata = entry.metadata().map_err(|e| FetchError::Walk {
        path: entry.path().to_path_buf(),
        source: e,
      })?;
      create_dir(&target, &metadata.permissions())?;
    } else {
      copy_file(entry.path(), &target)?;
    }
  }

  Ok(())
}

#[cfg(unix)]
fn create_dir(path: &Path, permissions: &fs::Permissions) -> Result<(), FetchError> {
  use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

  fs::DirBuilder::new()
    .recursive(true)
    .mode(permissions.mode())
    .create(path)
    .map_err(|e| FetchError::CreateDir {
      path: path.to_path_buf(),
      source: e,
    })?;

  // The builder's mode is masked by the umask.
  if let Err(e) = fs::set_permissions(path, permissions.clone()) {
    warn!(path = %path.display(), error = %e, "failed to copy directory mode");
  }
  Ok(())
}

#[cfg(not(unix))]
fn create_dir(path: &Path, _permissions: &fs::Permissions) -> Result<(), FetchError> {
  fs::create_dir_all(path).map_err(|e| FetchError::CreateDir {
    path: path.to_path_buf(),
    source: e,
  })
}

/// Stream `source` into `dest`, then copy the source's permission bits.
///
/// Returns the number of bytes copied. Content errors are fatal; failing to
/// set the mode is logged and ignored.
pub fn copy_file(source: &Path, dest: &Path) -> Result<u64, FetchError> {
  copy_file_with(source, dest, |path, permissions| fs::set_permissions(path, permissions))
}

fn copy_file_with<F>(source: &Path, dest: &Path, set_permissions: F) -> Result<u64, FetchError>
where
  F: FnOnce(&Path, fs::Permissions) -> io::Result<()>,
{
  let copy_error = |e: io::Error| FetchError::CopyFile {
    from: source.to_path_buf(),
    to: dest.to_path_buf(),
    source: e,
  };

  let mut reader = File::open(source).map_err(copy_error)?;
  let mut writer = File::create(dest).map_err(copy_error)?;
  let bytes = io::copy(&mut reader, &mut writer).map_err(copy_error)?;
  writer.sync_all().map_err(copy_error)?;
  drop(writer);

  match fs::metadata(source) {
    Ok(metadata) => {
      if let Err(e) = set_permissions(dest, metadata.permissions()) {
        warn!(path = %dest.display(), error = %e, "failed to copy file mode");
      }
    }
    Err(e) => warn!(path = %source.display(), error = %e, "failed to read file mode"),
  }

  debug!(from = %source.display(), to = %dest.display(), bytes, "copied file");
  Ok(bytes)
}
