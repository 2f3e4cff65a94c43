use predicates::prelude::*;

use super::common::{TestEnv, git_available};

#[test]
fn build_runs_bootstrap_and_logs_output() {
  if !git_available() {
    return;
  }
  let env = TestEnv::new();
  env.write_pack("echo", "bootstrap: echo hello\n", &[]);
  let repo = env.git_repo(&[("README", "hi\n")]);

  env
    .bp_cmd()
    .arg("build")
    .arg(repo.url())
    .arg("echo")
    .assert()
    .success()
    .stdout(predicate::str::contains("Build complete"))
    .stderr(predicate::str::contains("hello"));

  let workspaces = env.workspaces();
  assert_eq!(workspaces.len(), 1);
  assert!(workspaces[0].join("README").is_file());
  assert!(workspaces[0].join("cmds.yml").is_file());
}

#[test]
fn test_reports_missing_test_command() {
  if !git_available() {
    return;
  }
  let env = TestEnv::new();
  env.write_pack("echo", "bootstrap: echo hello\n", &[]);
  let repo = env.git_repo(&[]);

  env
    .bp_cmd()
    .arg("test")
    .arg(repo.url())
    .arg("echo")
    .assert()
    .success()
    .stdout(predicate::str::contains("Test complete"))
    .stdout(predicate::str::contains("no command"));
}

#[test]
fn failing_stage_exits_nonzero_but_later_stages_run() {
  if !git_available() {
    return;
  }
  let env = TestEnv::new();
  env.write_pack("flaky", "bootstrap: false\ntest: echo still-tested\n", &[]);
  let repo = env.git_repo(&[]);

  env
    .bp_cmd()
    .arg("test")
    .arg(repo.url())
    .arg("flaky")
    .assert()
    .failure()
    .stderr(predicate::str::contains("still-tested"))
    .stderr(predicate::str::contains("1 stage(s) failed"));
}

#[test]
fn halt_on_failure_skips_later_stages() {
  if !git_available() {
    return;
  }
  let env = TestEnv::new();
  env.write_pack("flaky", "bootstrap: false\ntest: echo still-tested\n", &[]);
  let repo = env.git_repo(&[]);

  env
    .bp_cmd()
    .arg("test")
    .arg(repo.url())
    .arg("flaky")
    .arg("--halt-on-failure")
    .assert()
    .failure()
    .stderr(predicate::str::contains("skipped"))
    .stderr(predicate::str::contains("still-tested").not());
}

#[test]
fn json_report_is_valid() {
  if !git_available() {
    return;
  }
  let env = TestEnv::new();
  env.write_pack("echo", "bootstrap: echo hello\n", &[]);
  let repo = env.git_repo(&[]);

  let output = env
    .bp_cmd()
    .args(["-o", "json", "build"])
    .arg(repo.url())
    .arg("echo")
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["buildpack"], "echo");
  assert_eq!(report["repo"]["rev"], "master");
  assert_eq!(report["stages"][0]["stage"], "bootstrap");
  assert_eq!(report["stages"][0]["status"], "succeeded");
  assert_eq!(report["stages"][0]["output"]["stdout"][0], "hello");
}

#[test]
fn unknown_buildpack_fails_setup() {
  if !git_available() {
    return;
  }
  let env = TestEnv::new();
  let repo = env.git_repo(&[]);

  env
    .bp_cmd()
    .arg("build")
    .arg(repo.url())
    .arg("absent")
    .assert()
    .failure()
    .stderr(predicate::str::contains("absent"));
}

#[test]
fn unstartable_command_fails() {
  if !git_available() {
    return;
  }
  let env = TestEnv::new();
  env.write_pack("broken", "bootstrap: nonexistent-binary-xyz\n", &[]);
  let repo = env.git_repo(&[]);

  env
    .bp_cmd()
    .arg("build")
    .arg(repo.url())
    .arg("broken")
    .assert()
    .failure()
    .stderr(predicate::str::contains("could not start"));
}

#[test]
fn long_stage_output_is_capped_in_the_report() {
  if !git_available() {
    return;
  }
  let env = TestEnv::new();
  env.write_pack("noisy", "bootstrap: seq 1200\n", &[]);
  let repo = env.git_repo(&[]);

  env
    .bp_cmd()
    .arg("build")
    .arg(repo.url())
    .arg("noisy")
    .assert()
    .success()
    .stdout(predicate::str::contains("200 earlier line(s) not kept"));

  let output = env
    .bp_cmd()
    .args(["-o", "json", "build"])
    .arg(repo.url())
    .arg("noisy")
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let captured = &report["stages"][0]["output"];
  assert_eq!(captured["stdout"].as_array().unwrap().len(), 1000);
  assert_eq!(captured["stdout"][0], "201");
  assert_eq!(captured["stdout_dropped"], 200);
}
