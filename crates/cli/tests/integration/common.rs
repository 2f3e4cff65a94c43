//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub use buildpack_lib::util::testutil::{GitFixture, git_available};

/// Isolated test environment.
///
/// Each test gets its own temporary directory with isolated config, pack, and
/// workspace roots.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Buildpacks root. Not created; the CLI creates it on demand.
  pub fn pack_dir(&self) -> PathBuf {
    self.temp.path().join("packs")
  }

  /// Workspaces root. Not created; the CLI creates it on demand.
  pub fn workspace_dir(&self) -> PathBuf {
    self.temp.path().join("workspaces")
  }

  /// Write a buildpack with the given `cmds.yml` and extra files.
  pub fn write_pack(&self, name: &str, config: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = self.pack_dir().join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("cmds.yml"), config).unwrap();
    for (file, content) in files {
      std::fs::write(dir.join(file), content).unwrap();
    }
    dir
  }

  /// Create a Git repository with one commit on `master` holding `files`.
  pub fn git_repo(&self, files: &[(&str, &str)]) -> GitFixture {
    let repo = GitFixture::new();
    repo.commit_all(files);
    repo
  }

  /// Workspaces created so far.
  pub fn workspaces(&self) -> Vec<PathBuf> {
    match std::fs::read_dir(self.workspace_dir()) {
      Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
      Err(_) => Vec::new(),
    }
  }

  /// Get a pre-configured Command for the bp binary.
  ///
  /// Points config lookup at the temp directory and passes both roots as
  /// flags so the user's own buildpacks are never touched.
  pub fn bp_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("bp");
    cmd.env("XDG_CONFIG_HOME", self.temp.path().join("config"));
    cmd.env("XDG_DATA_HOME", self.temp.path().join("data"));
    cmd.env_remove("BUILDPACK_PACK_DIR");
    cmd.env_remove("BUILDPACK_WORKSPACE_DIR");
    cmd.env_remove("RUST_LOG");
    cmd.arg("--pack-dir").arg(self.pack_dir());
    cmd.arg("--workspace-dir").arg(self.workspace_dir());
    cmd
  }
}
