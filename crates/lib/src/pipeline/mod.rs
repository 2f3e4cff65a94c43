//! Pipeline orchestration.
//!
//! Composes the workspace, fetch, buildpack, and runner modules into the two
//! supported flows:
//!
//! - **Build**: setup, then the `bootstrap` stage
//! - **Test**: setup, then `bootstrap` and `test`
//!
//! Setup creates a workspace, clones the repository into it, resolves the
//! buildpack, and links the buildpack's files beside the checkout. Any setup
//! failure halts the run and leaves the workspace on disk.
//!
//! Stage commands run one at a time in the workspace. A stage that exits
//! unsuccessfully is recorded in the report; whether later stages still run is
//! decided by [`StageFailurePolicy`]. A stage whose program cannot be started
//! halts the run regardless of policy.

mod types;

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::buildpack::{self, Buildpack, Stage};
use crate::config::{Config, StageFailurePolicy};
use crate::fetch::{self, FetchedRepo};
use crate::runner::{RunError, run_command};
use crate::workspace::create_workspace;

pub use types::{
  InstallKind, ParseInstallKindError, PipelineError, PipelineReport, StageReport, StageStatus,
};

/// Stages run by [`Pipeline::build`].
pub const BUILD_STAGES: &[Stage] = &[Stage::Bootstrap];

/// Stages run by [`Pipeline::test`].
pub const TEST_STAGES: &[Stage] = &[Stage::Bootstrap, Stage::Test];

/// A prepared workspace, ready for stage commands.
#[derive(Debug, Clone)]
pub struct Setup {
  pub workspace: PathBuf,
  pub repo: FetchedRepo,
  pub buildpack: Buildpack,
  pub installed: Vec<PathBuf>,
}

/// Runs buildpacks against repositories.
///
/// Holds only the two roots and the failure policy; every run allocates its
/// own workspace, so one `Pipeline` can serve any number of runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
  pack_dir: PathBuf,
  workspace_dir: PathBuf,
  stage_failure: StageFailurePolicy,
}

impl Pipeline {
  pub fn new(pack_dir: impl Into<PathBuf>, workspace_dir: impl Into<PathBuf>) -> Self {
    Self {
      pack_dir: pack_dir.into(),
      workspace_dir: workspace_dir.into(),
      stage_failure: StageFailurePolicy::default(),
    }
  }

  pub fn from_config(config: &Config) -> Self {
    Self::new(&config.pack_dir, &config.workspace_dir).with_stage_failure(config.stage_failure)
  }

  pub fn with_stage_failure(mut self, policy: StageFailurePolicy) -> Self {
    self.stage_failure = policy;
    self
  }

  pub fn pack_dir(&self) -> &Path {
    &self.pack_dir
  }

  pub fn workspace_dir(&self) -> &Path {
    &self.workspace_dir
  }

  pub fn stage_failure(&self) -> StageFailurePolicy {
    self.stage_failure
  }

  /// Prepare a fresh workspace holding `repo` at `rev` plus the files of
  /// buildpack `pack`.
  pub async fn setup(&self, repo: &str, pack: &str, rev: Option<&str>) -> Result<Setup, PipelineError> {
    let workspace = create_workspace(&self.workspace_dir)?;
    let fetched = fetch::fetch_vcs(&workspace, repo, rev).await?;
    let buildpack = buildpack::resolve(&self.pack_dir, pack)?;
    let installed = buildpack.install(&workspace)?;

    info!(
      workspace = %workspace.display(),
      buildpack = pack,
      commit = %fetched.commit,
      files = installed.len(),
      "workspace ready"
    );

    Ok(Setup {
      workspace,
      repo: fetched,
      buildpack,
      installed,
    })
  }

  /// Set up and run the bootstrap stage.
  pub async fn build(&self, repo: &str, pack: &str, rev: Option<&str>) -> Result<PipelineReport, PipelineError> {
    let setup = self.setup(repo, pack, rev).await?;
    self.run_stages(setup, BUILD_STAGES).await
  }

  /// Set up and run the bootstrap and test stages.
  pub async fn test(&self, repo: &str, pack: &str, rev: Option<&str>) -> Result<PipelineReport, PipelineError> {
    let setup = self.setup(repo, pack, rev).await?;
    self.run_stages(setup, TEST_STAGES).await
  }

  /// Run `stages` in order inside a prepared workspace.
  pub async fn run_stages(&self, setup: Setup, stages: &[Stage]) -> Result<PipelineReport, PipelineError> {
    let mut reports = Vec::with_capacity(stages.len());
    let mut halted = false;

    for &stage in stages {
      let command = setup.buildpack.command(stage).as_str().to_string();

      if halted {
        warn!(%stage, "skipping stage after earlier failure");
        reports.push(StageReport {
          stage,
          command,
          status: StageStatus::Skipped,
          duration: Default::default(),
          output: Default::default(),
        });
        continue;
      }

      let report = run_stage(stage, &setup, command).await?;
      if report.status.is_failure() && self.stage_failure == StageFailurePolicy::Halt {
        halted = true;
      }
      reports.push(report);
    }

    let report = PipelineReport {
      workspace: setup.workspace,
      buildpack: setup.buildpack.name,
      repo: setup.repo,
      installed: setup.installed,
      stages: reports,
    };

    info!(
      workspace = %report.workspace.display(),
      succeeded = report.succeeded(),
      stages = report.stages.len(),
      "pipeline complete"
    );
    Ok(report)
  }

  /// Install a buildpack into the pack directory without running anything.
  ///
  /// `Local` copies `target` to `<pack_dir>/<basename(target)>`; `Vcs` fetches
  /// the repository at `target` into `<pack_dir>/<name from URL>`. Returns the
  /// installed buildpack directory. The pack directory must already exist.
  pub async fn install_pack(&self, kind: InstallKind, target: &str, rev: Option<&str>) -> Result<PathBuf, PipelineError> {
    info!(%kind, target, pack_dir = %self.pack_dir.display(), "installing buildpack");

    let dir = match kind {
      InstallKind::Local => fetch::fetch_local(&self.pack_dir, Path::new(target))?,
      InstallKind::Vcs => {
        let name = fetch::repo_name_from_url(target).ok_or_else(|| PipelineError::NoPackName(target.to_string()))?;
        fetch::fetch_vcs(&self.pack_dir.join(name), target, rev).await?.path
      }
    };

    info!(path = %dir.display(), "buildpack installed");
    Ok(dir)
  }
}

async fn run_stage(stage: Stage, setup: &Setup, command: String) -> Result<StageReport, PipelineError> {
  let span = info_span!("stage", %stage, buildpack = %setup.buildpack.name);
  let started = Instant::now();

  if setup.buildpack.command(stage).is_empty() {
    debug!(%stage, "no command configured");
    return Ok(StageReport {
      stage,
      command,
      status: StageStatus::NoCommand,
      duration: started.elapsed(),
      output: Default::default(),
    });
  }

  let result = run_command(&command, &setup.workspace).instrument(span).await;
  let duration = started.elapsed();

  let (status, output) = match result {
    Ok(output) => {
      info!(%stage, elapsed = ?duration, "stage succeeded");
      (StageStatus::Succeeded, output)
    }
    Err(e) if e.is_spawn() => {
      error!(%stage, error = %e, "stage could not start");
      return Err(PipelineError::Stage { stage, source: e });
    }
    Err(e) => {
      error!(%stage, error = %e, "stage failed");
      let message = e.to_string();
      match e {
        RunError::Exited {
          code, signal, output, ..
        } => (StageStatus::Failed { code, signal, message }, output),
        _ => (
          StageStatus::Failed {
            code: None,
            signal: None,
            message,
          },
          Default::default(),
        ),
      }
    }
  };

  Ok(StageReport {
    stage,
    command,
    status,
    duration,
    output,
  })
}
