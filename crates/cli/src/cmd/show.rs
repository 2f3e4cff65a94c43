//! Implementation of the `bp show` command.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use buildpack_lib::buildpack::{PackFileKind, Stage, resolve};

use crate::GlobalOpts;
use crate::output::{format_bytes, print_json, print_stat};

use super::load_config;

/// Print a buildpack's stage commands and the files it installs.
pub fn cmd_show(pack: &str, global: &GlobalOpts) -> Result<()> {
  let config = load_config(global)?;
  let buildpack = resolve(&config.pack_dir, pack).with_context(|| format!("Failed to load buildpack '{}'", pack))?;

  if global.output.is_json() {
    return print_json(&buildpack);
  }

  println!("{}", buildpack.name.if_supports_color(Stream::Stdout, |s| s.bold()));
  print_stat("Directory", &buildpack.dir.display().to_string());

  println!();
  println!("Commands:");
  for stage in Stage::ALL {
    let command = buildpack.command(stage);
    if command.is_empty() {
      print_stat(stage.as_str(), &"(none)".if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string());
    } else {
      print_stat(stage.as_str(), command.as_str());
    }
  }

  println!();
  println!("Files:");
  for file in &buildpack.files {
    let detail = match file.kind {
      PackFileKind::File => format_bytes(file.len),
      PackFileKind::Dir => "directory, not installed".to_string(),
      PackFileKind::Symlink => "symlink".to_string(),
    };
    print_stat(&file.name.display().to_string(), &detail);
  }

  Ok(())
}
