use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn profiles_are_created_for_leaves_and_pairs() {
    let dir = tempdir().expect("tempdir");
    let after = dir.path().join("fabric-after.json");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fabric-migrate"));
    cmd.arg("profiles")
        .arg("--fabric")
        .arg(fixture("fixtures/fabric.json"))
        .arg("--write-fabric")
        .arg(&after)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "EXISTS  row=- kind=switch_profile name=Leaf-101_LeafProf",
        ))
        .stdout(predicate::str::contains(
            "CREATED row=- kind=interface_profile name=Leaf-101-102_IntProf",
        ))
        .stdout(predicate::str::contains("outcomes created=9 exists=3 failed=0"));

    let mut rerun = Command::new(assert_cmd::cargo::cargo_bin!("fabric-migrate"));
    rerun
        .arg("profiles")
        .arg("--fabric")
        .arg(&after)
        .assert()
        .success()
        .stdout(predicate::str::contains("outcomes created=0 exists=12 failed=0"));
}

#[test]
fn missing_fabric_file_is_reported() {
    let dir = tempdir().expect("tempdir");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fabric-migrate"));
    cmd.arg("profiles")
        .arg("--fabric")
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.json"));
}
