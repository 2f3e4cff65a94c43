use crate::consts::APP_NAME;
use std::path::PathBuf;
use tracing::warn;

#[cfg(windows)]
const HOME_VAR: &str = "USERPROFILE";
#[cfg(not(windows))]
const HOME_VAR: &str = "HOME";

/// Returns the user's home directory.
///
/// When the home variable is unset or empty this is the empty path, so the
/// default directories become relative to the current directory. A warning is
/// logged in that case.
pub fn home_dir() -> PathBuf {
  match std::env::var(HOME_VAR) {
    Ok(home) if !home.is_empty() => PathBuf::from(home),
    _ => {
      warn!(var = HOME_VAR, "home directory is not set, default paths are relative to the current directory");
      PathBuf::new()
    }
  }
}

/// Returns the directory for configuration files for the application
#[cfg(windows)]
pub fn config_dir() -> PathBuf {
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir())
    .join(APP_NAME)
}

/// Returns the directory for configuration files for the application
#[cfg(not(windows))]
pub fn config_dir() -> PathBuf {
  let config_home = std::env::var("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".config"));
  config_home.join(APP_NAME)
}

/// Returns the directory for data files (installed buildpacks, workspaces)
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  std::env::var("LOCALAPPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir())
    .join(APP_NAME)
}

/// Returns the directory for data files (installed buildpacks, workspaces)
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  let data_home = std::env::var("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

/// Default root under which buildpacks are installed and resolved.
pub fn default_pack_dir() -> PathBuf {
  data_dir().join("packs")
}

/// Default root under which fresh workspaces are created.
pub fn default_workspace_dir() -> PathBuf {
  data_dir().join("workspaces")
}
