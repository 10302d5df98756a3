//! Exit codes and outputs of the `froc` binary.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn froc() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_froc"));
    cmd.env_remove("RUST_LOG").env_remove("FROC_CONFIG");
    cmd
}

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// One CT series with two lesions and one rater who finds one of them.
fn study(root: &Path) {
    let case = "P1/20240101_CT/SE2";
    write(
        &root.join("reference").join(case).join("lesions.json"),
        r#"[{"x": 0, "y": 0, "z": 0, "r": 5, "name": "a"},
            {"x": 40, "y": 0, "z": 0, "r": 5, "name": "b"}]"#,
    );
    write(
        &root.join("raters/rater01").join(case).join("responses.json"),
        r#"[{"x": 1, "y": 1, "z": 0, "r": 1, "name": "3"},
            {"x": 90, "y": 0, "z": 0, "r": 1, "name": "1"}]"#,
    );
}

#[test]
fn version_prints_package_version() {
    froc()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    froc().assert().code(2);
}

#[test]
fn prepare_creates_rater_directories() {
    let dir = tempdir().unwrap();
    let keys = dir.path().join("keys.txt");
    fs::write(&keys, "P1/20240101_CT/SE2\nP2/20240105_MR/SE10\n").unwrap();
    let target = dir.path().join("study");

    froc()
        .args(["prepare", "--num-of-raters", "2", "--keys"])
        .arg(&keys)
        .arg("--target-dir")
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 series for 2 raters"));

    assert!(target.join("reference/P2/20240105_MR/SE10").is_dir());
    assert!(target.join("raters/rater02/P1/20240101_CT/SE2").is_dir());
    assert!(!target.join("raters/rater03").exists());
}

#[test]
fn prepare_rejects_malformed_keys() {
    let dir = tempdir().unwrap();
    let keys = dir.path().join("keys.txt");
    fs::write(&keys, "P1/20240101_CT/SE2\nP2/2024_MR/SE1\n").unwrap();

    froc()
        .args(["prepare", "--keys"])
        .arg(&keys)
        .arg("--target-dir")
        .arg(dir.path().join("study"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("keys.txt:2"));
}

#[test]
fn prepare_requires_at_least_one_rater() {
    let dir = tempdir().unwrap();
    let keys = dir.path().join("keys.txt");
    fs::write(&keys, "P1/20240101_CT/SE2\n").unwrap();

    froc()
        .args(["prepare", "--num-of-raters", "0", "--keys"])
        .arg(&keys)
        .arg("--target-dir")
        .arg(dir.path().join("study"))
        .assert()
        .code(2);
}

#[test]
fn evaluate_writes_report_and_summary() {
    let dir = tempdir().unwrap();
    study(dir.path());
    let out = dir.path().join("out/report.json");

    froc()
        .args(["evaluate", "--eval-dir"])
        .arg(dir.path())
        .arg("--out-path")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("rater01: 1 cases, 1 TP, 1 FP"));

    let v: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(v["schema_version"], 1);
    assert_eq!(v["truth"].as_array().unwrap().len(), 2);
    assert_eq!(v["truth"][0]["paradigm"], "FROC");
    assert_eq!(v["truth"][1]["paradigm"], "FCTRL");
    assert_eq!(v["tp"][0]["lesion_id"], 1);
    assert_eq!(v["tp"][0]["rating"], 3.0);
    assert_eq!(v["fp"][0]["rating"], 1.0);
    assert_eq!(v["raters"][0]["rater"], "rater01");
}

#[test]
fn evaluate_parallel_matches_sequential() {
    let dir = tempdir().unwrap();
    study(dir.path());
    let seq = dir.path().join("seq.json");
    let par = dir.path().join("par.json");

    froc()
        .args(["evaluate", "--no-cache", "--eval-dir"])
        .arg(dir.path())
        .arg("--out-path")
        .arg(&seq)
        .assert()
        .success();
    froc()
        .args(["evaluate", "--parallel", "--eval-dir"])
        .arg(dir.path())
        .arg("--out-path")
        .arg(&par)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(seq).unwrap(), fs::read_to_string(par).unwrap());
}

#[test]
fn evaluate_reads_layout_from_config_in_eval_dir() {
    let dir = tempdir().unwrap();
    let case = "P1/20240101_CT/SE2";
    write(
        &dir.path().join("truth").join(case).join("l.json"),
        r#"[{"x": 0, "y": 0, "z": 0, "r": 5, "name": "a"}]"#,
    );
    write(
        &dir.path().join("readers/amy").join(case).join("r.json"),
        r#"[{"x": 0, "y": 0, "z": 0, "r": 1, "name": "r", "confidence": 0.5}]"#,
    );
    write(
        &dir.path().join("froc.yaml"),
        "version: 1\n\
         layout:\n  reference_dir: truth\n  raters_dir: readers\n\
         output:\n  path: unused.json\n",
    );
    let out = dir.path().join("report.json");

    froc()
        .args(["evaluate", "--eval-dir"])
        .arg(dir.path())
        .arg("--out-path")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("amy: 1 cases, 1 TP, 0 FP"));
    assert!(out.is_file());
}

#[test]
fn unsupported_config_version_is_a_config_error() {
    let dir = tempdir().unwrap();
    study(dir.path());
    let cfg = dir.path().join("custom.yaml");
    fs::write(&cfg, "version: 9\n").unwrap();

    froc()
        .args(["evaluate", "--eval-dir"])
        .arg(dir.path())
        .arg("--config")
        .arg(&cfg)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unsupported config version 9"));
}

#[test]
fn responses_without_reference_case_are_a_data_error() {
    let dir = tempdir().unwrap();
    study(dir.path());
    fs::create_dir_all(dir.path().join("raters/rater01/P9/20240101_CT/SE1")).unwrap();

    froc()
        .args(["evaluate", "--eval-dir"])
        .arg(dir.path())
        .arg("--out-path")
        .arg(dir.path().join("r.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("P9/20240101_CT/SE1"));
}

#[test]
fn match_prints_partition() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("case.json");
    fs::write(
        &input,
        r#"{
            "lesions": [{"x": 0, "y": 0, "z": 0, "r": 10, "name": "L"}],
            "responses": [
                {"x": 6, "y": 0, "z": 0, "r": 1, "name": "R1", "confidence": 1},
                {"x": 5, "y": 0, "z": 0, "r": 1, "name": "R2", "confidence": 2}
            ]
        }"#,
    )
    .unwrap();

    let output = froc().args(["match", "--input"]).arg(&input).output().unwrap();
    assert!(output.status.success());
    let v: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["true_positives"][0]["response"]["name"], "R2");
    assert_eq!(v["false_positives"][0]["name"], "R1");
}

#[test]
fn match_rejects_invalid_radius() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("case.json");
    fs::write(
        &input,
        r#"{"lesions": [{"x": 0, "y": 0, "z": 0, "r": 0, "name": "L"}], "responses": []}"#,
    )
    .unwrap();

    froc()
        .args(["match", "--input"])
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("lesion #0"));
}
