/// Application name, used for XDG directory names.
pub const APP_NAME: &str = "buildpack";

/// Stage-command configuration file inside every buildpack directory.
pub const PACK_CONFIG_FILE: &str = "cmds.yml";

/// Configuration file name inside the config directory.
pub const CONFIG_FILE: &str = "config.yml";

/// Revision checked out when none is requested (Git).
pub const DEFAULT_GIT_REVISION: &str = "master";

/// Revision checked out when none is requested (Mercurial).
pub const DEFAULT_HG_REVISION: &str = "default";

/// Environment variable overriding the buildpacks root.
pub const PACK_DIR_ENV: &str = "BUILDPACK_PACK_DIR";

/// Environment variable overriding the workspaces root.
pub const WORKSPACE_DIR_ENV: &str = "BUILDPACK_WORKSPACE_DIR";
