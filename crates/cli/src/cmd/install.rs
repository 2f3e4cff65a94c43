use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use buildpack_lib::pipeline::{InstallKind, Pipeline};

use crate::GlobalOpts;
use crate::output::{print_json, print_stat, print_success};

use super::{ensure_dir, load_config};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum InstallType {
  #[default]
  Vcs,
  Local,
}

impl From<InstallType> for InstallKind {
  fn from(t: InstallType) -> Self {
    match t {
      InstallType::Vcs => InstallKind::Vcs,
      InstallType::Local => InstallKind::Local,
    }
  }
}

#[derive(Serialize)]
struct InstallOutput<'a> {
  kind: InstallKind,
  target: &'a str,
  path: PathBuf,
}

pub fn cmd_install(target: &str, kind: InstallType, rev: Option<&str>, global: &GlobalOpts) -> Result<()> {
  let config = load_config(global)?;
  ensure_dir(&config.pack_dir)?;

  let kind = InstallKind::from(kind);
  let pipeline = Pipeline::from_config(&config);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let path = rt
    .block_on(pipeline.install_pack(kind, target, rev))
    .with_context(|| format!("Failed to install buildpack from '{}'", target))?;

  if global.output.is_json() {
    print_json(&InstallOutput { kind, target, path })?;
  } else {
    println!();
    print_success("Buildpack installed");
    print_stat("Source", target);
    print_stat("Path", &path.display().to_string());
  }

  Ok(())
}
