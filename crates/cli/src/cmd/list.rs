use anyhow::{Context, Result};

use buildpack_lib::buildpack::list_buildpacks;

use crate::GlobalOpts;
use crate::output::{print_info, print_json, symbols};

use super::load_config;

pub fn cmd_list(global: &GlobalOpts) -> Result<()> {
  let config = load_config(global)?;
  let names = list_buildpacks(&config.pack_dir).context("Failed to list buildpacks")?;

  if global.output.is_json() {
    return print_json(&names);
  }

  if names.is_empty() {
    print_info(&format!("No buildpacks installed in {}", config.pack_dir.display()));
    return Ok(());
  }

  for name in &names {
    println!("  {} {}", symbols::INFO, name);
  }
  Ok(())
}
