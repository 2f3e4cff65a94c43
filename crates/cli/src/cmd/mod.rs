mod install;
mod list;
mod run;
mod show;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use buildpack_lib::config::Config;

use crate::GlobalOpts;

pub use install::{InstallType, cmd_install};
pub use list::cmd_list;
pub use run::{Flow, cmd_run};
pub use show::cmd_show;

/// Load configuration and apply command-line overrides.
fn load_config(global: &GlobalOpts) -> Result<Config> {
  let mut config = Config::load(global.config.as_deref()).context("Failed to load configuration")?;

  if let Some(dir) = &global.pack_dir {
    config.pack_dir = dir.clone();
  }
  if let Some(dir) = &global.workspace_dir {
    config.workspace_dir = dir.clone();
  }

  debug!(
    pack_dir = %config.pack_dir.display(),
    workspace_dir = %config.workspace_dir.display(),
    stage_failure = ?config.stage_failure,
    "resolved configuration"
  );
  Ok(config)
}

fn ensure_dir(path: &Path) -> Result<()> {
  fs::create_dir_all(path).with_context(|| format!("Failed to create directory {}", path.display()))
}
