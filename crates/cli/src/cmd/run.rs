//! Implementation of the `bp build` and `bp test` commands.
//!
//! Both prepare a fresh workspace (clone, resolve, link) and then run a fixed
//! list of buildpack stages in it.

use std::fmt;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use buildpack_lib::config::StageFailurePolicy;
use buildpack_lib::pipeline::{Pipeline, PipelineReport};

use crate::output::{format_duration, print_error, print_json, print_stage, print_stat, print_success, truncate_hash};
use crate::{GlobalOpts, RunArgs};

use super::{ensure_dir, load_config};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
  Build,
  Test,
}

impl fmt::Display for Flow {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Flow::Build => f.write_str("Build"),
      Flow::Test => f.write_str("Test"),
    }
  }
}

/// Execute a build or test run.
///
/// Fails when setup fails or when any stage failed; failed stages are printed
/// before the error is returned.
pub fn cmd_run(flow: Flow, args: &RunArgs, global: &GlobalOpts) -> Result<()> {
  let config = load_config(global)?;
  ensure_dir(&config.pack_dir)?;
  ensure_dir(&config.workspace_dir)?;

  let mut pipeline = Pipeline::from_config(&config);
  if args.halt_on_failure {
    pipeline = pipeline.with_stage_failure(StageFailurePolicy::Halt);
  }

  let start = Instant::now();
  let rev = args.rev.as_deref();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(async {
      match flow {
        Flow::Build => pipeline.build(&args.repo, &args.pack, rev).await,
        Flow::Test => pipeline.test(&args.repo, &args.pack, rev).await,
      }
    })
    .with_context(|| format!("{} of '{}' with buildpack '{}' failed", flow, args.repo, args.pack))?;

  if global.output.is_json() {
    print_json(&report)?;
  } else {
    print_report(flow, &report, start);
  }

  let failed = report.failed_stages().count();
  if failed > 0 {
    bail!("{} stage(s) failed", failed);
  }
  Ok(())
}

fn print_report(flow: Flow, report: &PipelineReport, start: Instant) {
  println!();
  for stage in &report.stages {
    print_stage(stage);
  }

  println!();
  if report.succeeded() {
    print_success(&format!("{} complete!", flow));
  } else {
    print_error(&format!("{} finished with failures", flow));
  }
  print_stat("Buildpack", &report.buildpack);
  print_stat(
    "Revision",
    &format!("{} ({})", report.repo.rev, truncate_hash(&report.repo.commit)),
  );
  print_stat("Workspace", &report.workspace.display().to_string());
  print_stat("Duration", &format_duration(start.elapsed()));
}
