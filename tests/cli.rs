// ABOUTME: Integration tests for the cutover CLI commands.
// ABOUTME: Validates --help output, init, plan, and a fast deploy rehearsal.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cutover_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("cutover"))
}

#[test]
fn help_shows_commands() {
    cutover_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("cutover.yml");

    cutover_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success();

    assert!(config_path.exists(), "cutover.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("image:"), "Config should have image field");
    assert!(content.contains("mode: canary"));
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("cutover.yml");

    fs::write(&config_path, "existing: config").unwrap();

    cutover_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let content = fs::read_to_string(&config_path).unwrap();
    assert_eq!(content, "existing: config", "file must be untouched");
}

#[test]
fn init_force_overwrites() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("cutover.yml"), "existing: config").unwrap();

    cutover_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--force", "--service", "web"])
        .assert()
        .success();

    let content = fs::read_to_string(temp_dir.path().join("cutover.yml")).unwrap();
    assert!(content.contains("service: web"));
}

#[test]
fn plan_prints_the_schedule() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("cutover.yml"),
        "service: web\nimage: nginx:v2\nrollout:\n  mode: linear\n  percentage: 25\n  interval: 1m\n",
    )
    .unwrap();

    cutover_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("25%"))
        .stdout(predicate::str::contains("50%"))
        .stdout(predicate::str::contains("75%"))
        .stdout(predicate::str::contains("100%"));
}

#[test]
fn plan_without_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    cutover_cmd()
        .current_dir(temp_dir.path())
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn status_shows_the_rollout_policy() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("cutover.yml"),
        "service: web\nimage: nginx:v2\n",
    )
    .unwrap();

    cutover_cmd()
        .current_dir(temp_dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("web"))
        .stdout(predicate::str::contains("nginx:v2"));
}

/// A rehearsal against the simulated control plane; all_at_once with a zero
/// termination wait finishes in real time.
#[test]
fn deploy_rehearsal_completes_and_records_history() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("cutover.yml"),
        "service: web\nimage: nginx:v2\n\
         rollout:\n  mode: all_at_once\n  termination_wait: 0s\n\
         history: history.jsonl\n",
    )
    .unwrap();

    cutover_cmd()
        .current_dir(temp_dir.path())
        .args(["deploy", "--approve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deployment finished"));

    let history = fs::read_to_string(temp_dir.path().join("history.jsonl")).unwrap();
    assert!(history.contains("\"COMPLETED\""));
    assert!(history.contains("\"service\":\"web\""));
}

#[test]
fn deploy_json_emits_the_record() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("cutover.yml"),
        "service: web\nimage: nginx:v2\nrollout:\n  mode: all_at_once\n  termination_wait: 0s\n",
    )
    .unwrap();

    cutover_cmd()
        .current_dir(temp_dir.path())
        .args(["--json", "deploy", "--approve"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"COMPLETED\""));
}

#[test]
fn history_with_no_file_configured_succeeds() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("cutover.yml"),
        "service: web\nimage: nginx:v2\n",
    )
    .unwrap();

    cutover_cmd()
        .current_dir(temp_dir.path())
        .arg("history")
        .assert()
        .success();
}
