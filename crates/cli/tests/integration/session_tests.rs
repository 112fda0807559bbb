use predicates::prelude::*;

use super::common::TestEnv;

fn saved_ids(env: &TestEnv) -> Vec<String> {
  env
    .pref_string("anchor_ids")
    .unwrap_or_default()
    .split(',')
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

fn device_anchor_count(env: &TestEnv) -> usize {
  let raw = std::fs::read_to_string(env.device_path()).unwrap();
  let device: serde_json::Value = serde_json::from_str(&raw).unwrap();
  device["anchors"].as_object().map(|a| a.len()).unwrap_or(0)
}

#[test]
fn saved_anchor_is_restored_in_next_session() {
  let env = TestEnv::empty();
  let first = env.write_file("first.txt", "place cube 0 1 -2 90\ntoggle @1\n");
  let second = env.write_file("second.txt", "restore\nlist\n");

  env
    .cmd()
    .arg("session")
    .arg(&first)
    .assert()
    .success()
    .stdout(predicate::str::contains("Saved"));

  let ids = saved_ids(&env);
  assert_eq!(ids.len(), 1);
  assert_eq!(env.pref_string(&format!("type_{}", ids[0])).as_deref(), Some("cube"));
  assert_eq!(device_anchor_count(&env), 1);

  env
    .cmd()
    .arg("session")
    .arg(&second)
    .assert()
    .success()
    .stdout(predicate::str::contains("Loaded from Device"))
    .stdout(predicate::str::contains("restored 1 of 1"))
    .stdout(predicate::str::contains("cube (saved)"));
}

#[test]
fn json_output_lists_events_and_saved_anchors() {
  let env = TestEnv::empty();
  let script = env.write_file("script.txt", "place table 1 0 0\nplace 0 0 2\ntoggle @2\n");

  let out = env
    .cmd()
    .args(["-o", "json", "session"])
    .arg(&script)
    .output()
    .unwrap();
  assert!(out.status.success());

  let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  let statuses: Vec<&str> = summary["events"]
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["status"].as_str().unwrap())
    .collect();
  assert_eq!(statuses, vec!["Not Saved", "Not Saved", "Saved"]);
  assert_eq!(summary["anchors"].as_array().unwrap().len(), 2);
  assert_eq!(summary["saved"].as_array().unwrap().len(), 1);
}

#[test]
fn platform_failure_is_reported_and_session_continues() {
  let env = TestEnv::empty();
  let script = env.write_file(
    "script.txt",
    "place wall 0 0 0\nfault save on\ntoggle @1\nfault save off\ntoggle @1\n",
  );

  env
    .cmd()
    .arg("session")
    .arg(&script)
    .assert()
    .success()
    .stdout(predicate::str::contains("Save Failed"))
    .stderr(predicate::str::contains("line 3"))
    .stderr(predicate::str::contains("simulated save failure"));

  assert_eq!(saved_ids(&env).len(), 1);
}

#[test]
fn failed_delete_keeps_anchor_saved() {
  let env = TestEnv::empty();
  let first = env.write_file("first.txt", "place wall 0 0 0\ntoggle @1\n");
  let second = env.write_file("second.txt", "restore\nfault erase on\ndelete @1\n");
  let third = env.write_file("third.txt", "restore\ndelete @1\n");

  env.cmd().arg("session").arg(&first).assert().success();

  env
    .cmd()
    .arg("session")
    .arg(&second)
    .assert()
    .success()
    .stdout(predicate::str::contains("Delete Failed"));
  assert_eq!(saved_ids(&env).len(), 1);
  assert_eq!(device_anchor_count(&env), 1);

  env
    .cmd()
    .arg("session")
    .arg(&third)
    .assert()
    .success()
    .stdout(predicate::str::contains("Deleted"));
  assert!(saved_ids(&env).is_empty());
  assert_eq!(device_anchor_count(&env), 0);
}

#[test]
fn load_failure_keeps_save_list() {
  let env = TestEnv::empty();
  let first = env.write_file("first.txt", "place wall 0 0 0\ntoggle @1\n");
  let second = env.write_file("second.txt", "fault load on\nrestore\nlist\n");

  env.cmd().arg("session").arg(&first).assert().success();

  env
    .cmd()
    .arg("session")
    .arg(&second)
    .assert()
    .success()
    .stdout(predicate::str::contains("Load Failed"))
    .stdout(predicate::str::contains("No anchors in this session"));
  assert_eq!(saved_ids(&env).len(), 1);
}

#[test]
fn unsave_all_clears_save_list_and_device() {
  let env = TestEnv::empty();
  let script = env.write_file(
    "script.txt",
    "place wall 0 0 0\nplace cube 1 0 0\ntoggle @1\ntoggle @2\nunsave-all\n",
  );

  env
    .cmd()
    .arg("session")
    .arg(&script)
    .assert()
    .success()
    .stdout(predicate::str::contains("unsaved 2, failed 0"));

  assert!(saved_ids(&env).is_empty());
  assert_eq!(device_anchor_count(&env), 0);
}

#[test]
fn default_kind_comes_from_config() {
  let env = TestEnv::empty();
  env.write_file("config.toml", "default_kind = \"chair\"\n");
  let script = env.write_file("script.txt", "place 0 0 0\n");

  env
    .cmd()
    .arg("session")
    .arg(&script)
    .assert()
    .success()
    .stdout(predicate::str::contains("@1 chair"));
}

#[test]
fn script_errors_abort_before_running() {
  let env = TestEnv::empty();
  let script = env.write_file("script.txt", "place wall 0 0 0\njump @1\n");

  env
    .cmd()
    .arg("session")
    .arg(&script)
    .assert()
    .failure()
    .stderr(predicate::str::contains("line 2"));

  assert!(!env.prefs_path().exists());
}

#[test]
fn unknown_reference_fails_the_session() {
  let env = TestEnv::empty();
  let script = env.write_file("script.txt", "place wall 0 0 0\ntoggle @3\n");

  env
    .cmd()
    .arg("session")
    .arg(&script)
    .assert()
    .failure()
    .stderr(predicate::str::contains("@3 does not name an anchor"));
}

#[test]
fn unsave_all_drops_anchors_that_did_not_restore() {
  let env = TestEnv::empty();
  let first = env.write_file("first.txt", "place wall 0 0 0\nplace cube 1 0 0\ntoggle @1\ntoggle @2\n");
  env.cmd().arg("session").arg(&first).assert().success();
  assert_eq!(saved_ids(&env).len(), 2);

  let second = env.write_file("second.txt", "fault load on\nrestore\nunsave-all\n");
  env
    .cmd()
    .arg("session")
    .arg(&second)
    .assert()
    .success()
    .stdout(predicate::str::contains("unsaved 0, failed 0, dropped 2"));

  assert!(saved_ids(&env).is_empty());
}

#[test]
fn verbose_session_logs_its_progress() {
  let env = TestEnv::empty();
  let script = env.write_file("script.txt", "place wall 0 0 0\n");

  env
    .cmd()
    .args(["--verbose", "session"])
    .arg(&script)
    .assert()
    .success()
    .stderr(predicate::str::contains("parsed session script"))
    .stderr(predicate::str::contains("holding preferences lock"))
    .stderr(predicate::str::contains("running session step"));
}
