use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

fn apply(table: &Path, fabric: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fabric-migrate"));
    cmd.arg("apply")
        .arg("--table")
        .arg(table)
        .arg("--fabric")
        .arg(fabric);
    cmd
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("json")
}

#[test]
fn apply_creates_missing_objects_then_converges() {
    let dir = tempdir().expect("tempdir");
    let journal = dir.path().join("journal.json");
    let after = dir.path().join("fabric-after.json");

    apply(&fixture("fixtures/rows.json"), &fixture("fixtures/fabric.json"))
        .arg("--configs")
        .arg(fixture("fixtures/nexus-core1.txt"))
        .arg("--journal")
        .arg(&journal)
        .arg("--write-fabric")
        .arg(&after)
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATED row=2 kind=bridge_domain name=APPS_BD"))
        .stdout(predicate::str::contains("EXISTS  row=2 kind=app_profile name=RED_ANP"))
        .stdout(predicate::str::contains(
            "CREATED row=3 kind=static_path name=101-102 vPC_DB",
        ))
        .stdout(predicate::str::contains("outcomes created=10 exists=5 failed=0"));

    let creates = read_json(&journal);
    let creates = creates.as_array().expect("journal entries");
    assert_eq!(creates.len(), 10);
    assert_eq!(creates[0]["kind"], "bridge_domain");
    assert_eq!(creates[0]["attributes"]["dn"], "uni/tn-PROD/BD-APPS_BD");

    let rerun_journal = dir.path().join("rerun.json");
    apply(&fixture("fixtures/rows.json"), &after)
        .arg("--journal")
        .arg(&rerun_journal)
        .assert()
        .success()
        .stdout(predicate::str::contains("outcomes created=0 exists=15 failed=0"));
    assert_eq!(read_json(&rerun_journal).as_array().map(Vec::len), Some(0));
}

#[test]
fn validation_errors_stop_before_any_create() {
    let dir = tempdir().expect("tempdir");
    let journal = dir.path().join("journal.json");
    let after = dir.path().join("fabric-after.json");

    apply(
        &fixture("fixtures/rows_conflict.json"),
        &fixture("fixtures/fabric.json"),
    )
    .arg("--journal")
    .arg(&journal)
    .arg("--write-fabric")
    .arg(&after)
    .assert()
    .failure()
    .stderr(predicate::str::contains(
        "apply refused: 2 validation errors, nothing was created",
    ))
    .stdout(predicate::str::contains("CREATED").not());

    assert!(!journal.exists());
    assert!(!after.exists());
}

#[test]
fn apply_refuses_to_overwrite_its_fabric_input() {
    let dir = tempdir().expect("tempdir");
    let fabric = dir.path().join("fabric.json");
    fs::copy(fixture("fixtures/fabric.json"), &fabric).expect("copy");
    let before = fs::read_to_string(&fabric).expect("read");

    apply(&fixture("fixtures/rows.json"), &fabric)
        .arg("--write-fabric")
        .arg(&fabric)
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite input file"));

    assert_eq!(fs::read_to_string(&fabric).expect("read"), before);
}

#[test]
fn json_output_carries_validation_and_outcomes() {
    let mut cmd = apply(&fixture("fixtures/rows.json"), &fixture("fixtures/fabric.json"));
    let output = cmd.arg("--format").arg("json").output().expect("run");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["validation"]["errors"].as_array().map(Vec::len), Some(0));
    let outcomes = report["reconcile"]["outcomes"].as_array().expect("outcomes");
    assert_eq!(outcomes.len(), 15);
    assert_eq!(outcomes[0]["kind"], "tenant");
    assert_eq!(outcomes[0]["status"]["status"], "already_exists");
}
