//! Binary-level tests for the commands that need no network.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("arena-supervisor").unwrap_or_else(|_| unreachable!());
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("ARENA_ROSTER_PATH")
        .env_remove("ARENA_API_TOKEN")
        .env_remove("ARENA_ALLOWED_ORIGINS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_route_text() {
    let home = TempDir::new().unwrap_or_else(|_| unreachable!());
    cmd(&home)
        .args(["route", "Which XML schema does PUF use?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Strategy:   single"))
        .stdout(predicate::str::contains("Agents:     puf"));
}

#[test]
fn test_route_json() {
    let home = TempDir::new().unwrap_or_else(|_| unreachable!());
    cmd(&home)
        .args(["--format", "json", "route", "complete guide for Germany"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mode\": \"parallel\""))
        .stdout(predicate::str::contains("\"complexity\": \"complex\""));
}

#[test]
fn test_ask_without_token_fails() {
    let home = TempDir::new().unwrap_or_else(|_| unreachable!());
    cmd(&home)
        .args(["ask", "What is SDI?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API token is required"));
}

#[test]
fn test_demo_report_from_stdin() {
    let home = TempDir::new().unwrap_or_else(|_| unreachable!());
    cmd(&home)
        .args(["report", "--form", "-", "--demo"])
        .write_stdin(r#"{"partnerCompanyName":"Acme","country1":"Germany"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: READY"))
        .stdout(predicate::str::contains("[ok] Germany - Country Compliance Requirements"));
}

#[test]
fn test_demo_report_json_output_file() {
    let home = TempDir::new().unwrap_or_else(|_| unreachable!());
    let form = home.path().join("form.json");
    let out = home.path().join("report.json");
    std::fs::write(&form, r#"{"country1":"France","additionalCountries":"Belgium, france"}"#)
        .unwrap_or_else(|_| unreachable!());

    cmd(&home)
        .args(["--format", "json", "report", "--demo", "--form"])
        .arg(&form)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"demoMode\": true"));

    let saved = std::fs::read_to_string(&out).unwrap_or_default();
    let value: serde_json::Value = serde_json::from_str(&saved).unwrap_or_default();
    assert_eq!(value["countries"], serde_json::json!(["France", "Belgium"]));
}

#[test]
fn test_init_config_then_route_with_roster() {
    let home = TempDir::new().unwrap_or_else(|_| unreachable!());
    let path = home.path().join("roster.json");

    cmd(&home)
        .args(["init-config", "--path"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default roster"));

    cmd(&home)
        .args(["init-config", "--path"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    cmd(&home)
        .arg("--roster")
        .arg(&path)
        .args(["route", "How do I authenticate with the OAuth endpoint?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Agents:     api"));
}
