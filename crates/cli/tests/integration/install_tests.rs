use predicates::prelude::*;

use super::common::{TestEnv, git_available};

#[test]
fn install_local_copies_pack() {
  let env = TestEnv::new();
  let source = env.temp.path().join("src").join("python");
  std::fs::create_dir_all(&source).unwrap();
  std::fs::write(source.join("cmds.yml"), "test: pytest\n").unwrap();
  std::fs::write(source.join("setup.sh"), "#!/bin/sh\n").unwrap();

  env
    .bp_cmd()
    .args(["install", "--type", "local"])
    .arg(&source)
    .assert()
    .success()
    .stdout(predicate::str::contains("Buildpack installed"));

  let installed = env.pack_dir().join("python");
  assert_eq!(std::fs::read_to_string(installed.join("cmds.yml")).unwrap(), "test: pytest\n");
  assert!(installed.join("setup.sh").is_file());

  env
    .bp_cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("python"));
}

#[test]
fn install_local_missing_source_fails() {
  let env = TestEnv::new();

  env
    .bp_cmd()
    .args(["install", "-t", "local"])
    .arg(env.temp.path().join("nowhere"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn install_vcs_clones_pack() {
  if !git_available() {
    return;
  }
  let env = TestEnv::new();
  let repo = env.git_repo(&[("cmds.yml", "bootstrap: echo from-git\n")]);

  let output = env
    .bp_cmd()
    .args(["-o", "json", "install"])
    .arg(repo.url())
    .output()
    .unwrap();

  assert!(output.status.success());
  let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(result["kind"], "vcs");

  env
    .bp_cmd()
    .args(["show", repo.name().as_str()])
    .assert()
    .success()
    .stdout(predicate::str::contains("echo from-git"));
}
