use predicates::prelude::*;
use serde_json::json;

use super::common::{A, B, TestEnv};

fn two_saved() -> TestEnv {
  TestEnv::with_prefs(
    json!({
      "anchor_ids": format!("{A},{B}"),
      format!("anchor_{A}"): A,
      format!("anchor_{B}"): B,
      format!("type_{A}"): "cube",
    }),
    json!({}),
  )
}

#[test]
fn list_without_prefs_reports_nothing_saved() {
  let env = TestEnv::empty();

  env
    .cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("No saved anchors"));
}

#[test]
fn list_shows_kinds_with_wall_fallback() {
  let env = two_saved();

  env
    .cmd()
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains(format!("{A} cube")))
    .stdout(predicate::str::contains(format!("{B} wall")));
}

#[test]
fn list_json_output_is_valid() {
  let env = two_saved();

  let out = env.cmd().args(["list", "-o", "json"]).output().unwrap();
  assert!(out.status.success());

  let entries: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(entries.as_array().unwrap().len(), 2);
  assert_eq!(entries[0]["uuid"], A);
  assert_eq!(entries[0]["kind"], "cube");
  assert_eq!(entries[1]["marked"], true);
}

#[test]
fn check_flags_missing_marker_and_malformed_entry() {
  let env = TestEnv::with_prefs(
    json!({
      "anchor_ids": format!("{A},not-a-uuid,,{B}"),
      format!("anchor_{A}"): A,
    }),
    json!({}),
  );

  env
    .cmd()
    .arg("check")
    .assert()
    .success()
    .stderr(predicate::str::contains("Malformed save-list entry"))
    .stderr(predicate::str::contains(format!("Listed without saved marker: {B}")));
}

#[test]
fn check_consistent_prefs() {
  let env = two_saved();

  env
    .cmd()
    .args(["check", "-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("missing_marker"))
    .stdout(predicate::str::contains("orphan_markers"));

  env
    .cmd()
    .arg("check")
    .assert()
    .success()
    .stdout(predicate::str::contains("Preferences are consistent"));
}

#[test]
fn forget_removes_entry_marker_and_kind() {
  let env = two_saved();

  env
    .cmd()
    .args(["forget", A])
    .assert()
    .success()
    .stdout(predicate::str::contains(format!("Forgot {A}")));

  assert_eq!(env.pref_string("anchor_ids").as_deref(), Some(B));
  assert_eq!(env.pref_string(&format!("anchor_{A}")), None);
  assert_eq!(env.pref_string(&format!("type_{A}")), None);
}

#[test]
fn forget_rejects_invalid_uuid() {
  let env = TestEnv::empty();

  env.cmd().args(["forget", "nope"]).assert().failure();
}

#[test]
fn set_type_writes_lowercase_kind() {
  let env = two_saved();

  env
    .cmd()
    .args(["set-type", B, "Table"])
    .assert()
    .success()
    .stdout(predicate::str::contains("table"));

  assert_eq!(env.pref_string(&format!("type_{B}")).as_deref(), Some("table"));
}

#[test]
fn set_type_rejects_unknown_kind() {
  let env = two_saved();

  env
    .cmd()
    .args(["set-type", B, "sofa"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("sofa"));
}

#[test]
fn clear_requires_force_without_terminal() {
  let env = two_saved();

  env
    .cmd()
    .arg("clear")
    .assert()
    .failure()
    .stderr(predicate::str::contains("--force"));

  assert!(env.pref_string("anchor_ids").is_some());
}

#[test]
fn clear_with_force_removes_everything_saved() {
  let env = two_saved();

  env
    .cmd()
    .args(["clear", "--force"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed 2 saved anchor(s)"));

  assert_eq!(env.pref_string("anchor_ids"), None);
  assert_eq!(env.pref_string(&format!("anchor_{A}")), None);
  assert_eq!(env.pref_string(&format!("type_{A}")), None);
}

#[test]
fn migrate_moves_legacy_slots_into_save_list() {
  let env = TestEnv::with_prefs(json!({ "uuid0": A, "uuid1": B }), json!({ "numUuid": 2 }));

  env
    .cmd()
    .arg("migrate")
    .assert()
    .success()
    .stdout(predicate::str::contains("Migrated 2 anchor(s)"));

  let prefs = env.prefs();
  assert_eq!(prefs["strings"]["anchor_ids"], format!("{A},{B}"));
  assert!(prefs["strings"].get("uuid0").is_none());
  assert!(prefs["ints"].get("numUuid").is_none());
}

#[test]
fn migrate_without_legacy_is_a_no_op() {
  let env = TestEnv::empty();

  env
    .cmd()
    .arg("migrate")
    .assert()
    .success()
    .stdout(predicate::str::contains("No legacy anchors"));
}
