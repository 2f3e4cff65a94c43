//! Runtime configuration.
//!
//! Loaded from an optional YAML file, then overridden by environment
//! variables. Command-line flags are applied on top by the caller.
//!
//! ```yaml
//! pack_dir: /srv/buildpacks
//! workspace_dir: /var/tmp/workspaces
//! stage_failure: halt
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{CONFIG_FILE, PACK_DIR_ENV, WORKSPACE_DIR_ENV};
use crate::platform::paths::{config_dir, default_pack_dir, default_workspace_dir};

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file '{}': {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },
}

/// What a pipeline does after a stage command fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageFailurePolicy {
  /// Run the remaining stages anyway.
  #[default]
  Continue,
  /// Skip every stage after the failed one.
  Halt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Root holding one directory per installed buildpack.
  pub pack_dir: PathBuf,
  /// Root under which each run gets a fresh workspace.
  pub workspace_dir: PathBuf,
  pub stage_failure: StageFailurePolicy,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      pack_dir: default_pack_dir(),
      workspace_dir: default_workspace_dir(),
      stage_failure: StageFailurePolicy::default(),
    }
  }
}

/// Location of the config file when none is given.
pub fn default_config_path() -> PathBuf {
  config_dir().join(CONFIG_FILE)
}

impl Config {
  /// Load configuration from `path`, or from [`default_config_path`].
  ///
  /// A missing file at the default location yields the defaults. A file that
  /// was named explicitly must exist. Environment overrides are applied last.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let (path, explicit) = match path {
      Some(p) => (p.to_path_buf(), true),
      None => (default_config_path(), false),
    };

    let mut config = match fs::read_to_string(&path) {
      Ok(contents) => {
        debug!(path = %path.display(), "loading config file");
        Self::parse(&contents).map_err(|e| ConfigError::Parse { path, source: e })?
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => {
        debug!(path = %path.display(), "no config file, using defaults");
        Self::default()
      }
      Err(e) => return Err(ConfigError::Read { path, source: e }),
    };

    config.apply_env();
    Ok(config)
  }

  /// Parse YAML configuration. Unset keys keep their defaults.
  pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str::<Option<Self>>(contents).map(Option::unwrap_or_default)
  }

  fn apply_env(&mut self) {
    if let Some(dir) = env_path(PACK_DIR_ENV) {
      debug!(var = PACK_DIR_ENV, path = %dir.display(), "pack dir overridden from environment");
      self.pack_dir = dir;
    }
    if let Some(dir) = env_path(WORKSPACE_DIR_ENV) {
      debug!(var = WORKSPACE_DIR_ENV, path = %dir.display(), "workspace dir overridden from environment");
      self.workspace_dir = dir;
    }
  }
}

fn env_path(var: &str) -> Option<PathBuf> {
  std::env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}
