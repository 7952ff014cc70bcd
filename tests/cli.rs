//! Binary-level tests for the `proposal-advisor` command line.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn advisor(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("proposal-advisor").unwrap();
    cmd.env_remove("OPENAI_API_KEY")
        .env_remove("ADVISOR_FETCH_POLICY")
        .env_remove("RUST_LOG")
        .env("ADVISOR_DB_PATH", dir.path().join("proposals.db"));
    cmd
}

fn seeded() -> TempDir {
    let dir = TempDir::new().unwrap();
    advisor(&dir)
        .args(["init", "--sample"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Seeded sample proposal (3 rows)"));
    dir
}

#[test]
fn test_details_sample_json() {
    let dir = seeded();
    let output = advisor(&dir)
        .args(["--format", "json", "details", "557"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let orders = json["enriched_proposals_orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["transaction_type"], "BUY");
    assert_eq!(orders[0]["quantity"], 50);
    assert_eq!(orders[1]["target_quantity"], 650.0);
    assert!(json.get("fetch_errors").is_none());
}

#[test]
fn test_details_reads_id_from_stdin() {
    let dir = seeded();
    advisor(&dir)
        .arg("details")
        .write_stdin("557\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("32% < Equity < 50%"));
}

#[test]
fn test_details_rejects_bad_stdin() {
    let dir = seeded();
    advisor(&dir)
        .arg("details")
        .write_stdin("five hundred\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("integer enriched_proposal_id"));
}

#[test]
fn test_export_all() {
    let dir = seeded();
    let out = dir.path().join("export.json");
    advisor(&dir)
        .args(["--format", "ndjson", "export", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"count\":1"));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written[0]["enriched_proposal_id"], 557);
}

#[test]
fn test_stdout_clean_in_json_mode() {
    let dir = seeded();
    let output = advisor(&dir)
        .args(["--verbose", "--format", "json", "details", "557"])
        .output()
        .unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&output.stdout).is_ok());
}

#[test]
fn test_classify_without_key_fails() {
    let dir = TempDir::new().unwrap();
    advisor(&dir)
        .args(["classify", "Why was selling AAPL proposed?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn test_details_before_init_fails() {
    let dir = TempDir::new().unwrap();
    advisor(&dir)
        .args(["details", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("init"));
}
