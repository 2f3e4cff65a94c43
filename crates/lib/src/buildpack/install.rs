//! Hard-linking buildpack files into a workspace.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::BuildpackError;
use super::types::{Buildpack, PackFileKind};

impl Buildpack {
  /// Hard-link every listed file of this buildpack into `workspace`.
  ///
  /// Each link lands at `<workspace>/<file name>` and shares storage with the
  /// buildpack's copy. Subdirectories cannot be hard-linked and are skipped
  /// with a warning. The first link failure aborts and is returned; links made
  /// before it are left in place.
  ///
  /// Returns the paths of the links created, in listing order.
  pub fn install(&self, workspace: &Path) -> Result<Vec<PathBuf>, BuildpackError> {
    let mut installed = Vec::with_capacity(self.files.len());

    for file in &self.files {
      let src = self.dir.join(&file.name);

      if file.kind == PackFileKind::Dir {
        warn!(buildpack = %self.name, path = %src.display(), "skipping directory, only files are installed");
        continue;
      }

      // Only the final component names the link.
      let Some(base) = file.name.file_name() else {
        warn!(buildpack = %self.name, path = %src.display(), "skipping entry without a file name");
        continue;
      };
      let dest = workspace.join(base);

      fs::hard_link(&src, &dest).map_err(|e| BuildpackError::Link {
        src: src.clone(),
        dest: dest.clone(),
        source: e,
      })?;

      info!(src = %src.display(), dest = %dest.display(), "installed buildpack file");
      installed.push(dest);
    }

    Ok(installed)
  }
}
