use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn plan_flags_new_objects_without_writing() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fabric-migrate"));
    cmd.arg("plan")
        .arg("--table")
        .arg(fixture("fixtures/rows.json"))
        .arg("--fabric")
        .arg(fixture("fixtures/fabric.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "- tenant=PROD (exists) vrf=RED (exists) bd=APPS_BD (new)",
        ))
        .stdout(predicate::str::contains(
            "- tenant=PROD app_profile=BLUE_ANP (new) epg=BACKUP_EPG (new)",
        ))
        .stdout(predicate::str::contains("plan new_objects=5"));
}

#[test]
fn plan_json_lists_both_sections() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fabric-migrate"));
    let output = cmd
        .arg("plan")
        .arg("--table")
        .arg(fixture("fixtures/rows.json"))
        .arg("--fabric")
        .arg(fixture("fixtures/fabric.json"))
        .arg("--format")
        .arg("json")
        .output()
        .expect("run");
    assert!(output.status.success());

    let plan: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(plan["network"].as_array().map(Vec::len), Some(2));
    assert_eq!(plan["application"][0]["app_profile"], "RED_ANP");
    assert_eq!(plan["application"][0]["app_profile_new"], false);
}

#[test]
fn plan_refuses_invalid_tables() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fabric-migrate"));
    cmd.arg("plan")
        .arg("--table")
        .arg(fixture("fixtures/rows_conflict.json"))
        .arg("--fabric")
        .arg(fixture("fixtures/fabric.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("plan refused: 2 validation errors"));
}
