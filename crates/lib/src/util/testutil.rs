//! Test utilities for buildpack-lib.
//!
//! Helpers for tests that need a real Git repository on disk. Git-backed
//! tests call [`git_available`] first and return early when no client exists.
//! Other crates reach these through the `testutil` feature.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Whether a `git` binary is on `PATH`.
pub fn git_available() -> bool {
  Command::new("git")
    .arg("--version")
    .output()
    .map(|o| o.status.success())
    .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
  let output = Command::new("git")
    .args(["-c", "user.name=Test", "-c", "user.email=test@example.com", "-c", "commit.gpgsign=false"])
    .args(args)
    .current_dir(dir)
    .output()
    .unwrap_or_else(|e| panic!("failed to run git {:?}: {}", args, e));
  assert!(
    output.status.success(),
    "git {:?} failed: {}",
    args,
    String::from_utf8_lossy(&output.stderr)
  );
  String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A throwaway Git repository whose default branch is `master`.
pub struct GitFixture {
  pub temp: TempDir,
  url: String,
}

impl Default for GitFixture {
  fn default() -> Self {
    Self::new()
  }
}

impl GitFixture {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    git(temp.path(), &["init", "--quiet"]);
    git(temp.path(), &["symbolic-ref", "HEAD", "refs/heads/master"]);
    let url = temp.path().to_string_lossy().into_owned();
    Self { temp, url }
  }

  /// Commit `files` in a single commit. With no files the commit is empty.
  pub fn commit_all(&self, files: &[(&str, &str)]) -> String {
    for (file, content) in files {
      fs::write(self.temp.path().join(file), content).unwrap();
      git(self.temp.path(), &["add", file]);
    }
    git(self.temp.path(), &["commit", "--quiet", "--allow-empty", "-m", "initial"]);
    git(self.temp.path(), &["rev-parse", "HEAD"])
  }

  /// Directory name of the repository, which is also its cloned name.
  pub fn name(&self) -> String {
    self.temp.path().file_name().unwrap().to_string_lossy().into_owned()
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  /// Write `file` and commit it, returning the new commit hash.
  pub fn commit(&self, file: &str, content: &str) -> String {
    fs::write(self.temp.path().join(file), content).unwrap();
    git(self.temp.path(), &["add", file]);
    let message = format!("update {}", file);
    git(self.temp.path(), &["commit", "--quiet", "-m", message.as_str()]);
    git(self.temp.path(), &["rev-parse", "HEAD"])
  }

  pub fn tag(&self, name: &str) {
    git(self.temp.path(), &["tag", name]);
  }

  /// Create and switch to a new branch.
  pub fn branch(&self, name: &str) {
    git(self.temp.path(), &["checkout", "--quiet", "-b", name]);
  }

  pub fn switch(&self, name: &str) {
    git(self.temp.path(), &["checkout", "--quiet", name]);
  }
}
