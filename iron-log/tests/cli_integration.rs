//! Integration tests for iron-log

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to escape path for TOML on Windows
fn escape_path_for_toml(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Temp directory holding a config that points at a fresh database
fn setup_test_env() -> (TempDir, String) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    let db_path = temp_dir.path().join("data").join("workouts.db");

    let config_content = format!(
        r#"
[database]
path = "{}"

[training]
unit = "kg"
"#,
        escape_path_for_toml(&db_path.to_string_lossy())
    );
    fs::write(&config_path, config_content).unwrap();

    (temp_dir, config_path.to_string_lossy().to_string())
}

fn iron_log(config_path: &str) -> Command {
    let mut cmd = Command::cargo_bin("iron-log").unwrap();
    cmd.env("IRONNOTES_CONFIG", config_path)
        .env_remove("IRONNOTES_DB_PATH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_parse_text_output() {
    let (_temp_dir, config_path) = setup_test_env();

    iron_log(&config_path)
        .args(["parse", "100kg", "x", "10", "x", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("weight: 100kg"))
        .stdout(predicate::str::contains("reps: 10"))
        .stdout(predicate::str::contains("sets: 3"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let (_temp_dir, config_path) = setup_test_env();

    iron_log(&config_path)
        .env_remove("IRONNOTES_LOG_FORMAT")
        .env_remove("IRONNOTES_LOG_LEVEL")
        .args(["-v", "parse", "100x5"])
        .assert()
        .success()
        .stderr(predicate::str::contains("iron-log started with args"));

    iron_log(&config_path)
        .env_remove("IRONNOTES_LOG_LEVEL")
        .args(["parse", "100x5"])
        .assert()
        .success()
        .stderr(predicate::str::contains("iron-log started").not());
}

#[test]
fn test_parse_json_output() {
    let (_temp_dir, config_path) = setup_test_env();

    let output = iron_log(&config_path)
        .args(["parse", "SA 20x12", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["weight"], 20.0);
    assert_eq!(parsed["reps"], 12);
    assert_eq!(parsed["is_single_arm"], true);
}

#[test]
fn test_parse_failure_exits_with_invalid_input() {
    let (_temp_dir, config_path) = setup_test_env();

    iron_log(&config_path)
        .args(["parse", "heavy"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Could not parse set"));
}

#[test]
fn test_set_without_active_session_is_not_found() {
    let (_temp_dir, config_path) = setup_test_env();

    iron_log(&config_path)
        .args(["set", "100x5"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("no active session"));
}

#[test]
fn test_set_without_exercise_is_not_found() {
    let (_temp_dir, config_path) = setup_test_env();

    iron_log(&config_path).arg("start").assert().success();
    iron_log(&config_path)
        .args(["set", "100x5"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("no exercise"));
}

#[test]
fn test_full_session_flow() {
    let (_temp_dir, config_path) = setup_test_env();

    iron_log(&config_path)
        .args(["start", "--notes", "push day"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started session"));

    iron_log(&config_path)
        .args(["exercise", "Bench Press", "--group", "chest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added Bench Press (Chest)"));

    iron_log(&config_path)
        .args(["set", "100kg", "x", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bench Press set 1: 100kg x 5"))
        .stdout(predicate::str::contains("PR"));

    iron_log(&config_path)
        .args(["set", "90", "5", "--exercise", "bench press"])
        .assert()
        .success()
        .stdout(predicate::str::contains("set 2: 90kg x 5"))
        .stdout(predicate::str::contains("PR").not());

    let output = iron_log(&config_path)
        .args(["show", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let detail: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(detail["session"]["notes"], "push day");
    let sets = detail["exercises"][0]["sets"].as_array().unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0]["is_pr"], true);
    assert_eq!(sets[1]["is_pr"], false);

    iron_log(&config_path)
        .arg("finish")
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished session"));

    // Nothing left to finish
    iron_log(&config_path).arg("finish").assert().code(4);
}

#[test]
fn test_clone_last_copies_exercises() {
    let (_temp_dir, config_path) = setup_test_env();

    iron_log(&config_path).arg("start").assert().success();
    iron_log(&config_path)
        .args(["exercise", "Squat", "--group", "legs"])
        .assert()
        .success();
    iron_log(&config_path).arg("finish").assert().success();

    let output = iron_log(&config_path)
        .args(["start", "--clone-last", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let started: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(started["exercises"][0]["name"], "Squat");
    assert_eq!(started["exercises"][0]["muscle_group"], "Legs");
}

#[test]
fn test_exercise_rejects_unknown_group() {
    let (_temp_dir, config_path) = setup_test_env();

    iron_log(&config_path).arg("start").assert().success();
    iron_log(&config_path)
        .args(["exercise", "Bench", "--group", "neck"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid muscle group"));

    iron_log(&config_path)
        .args(["exercise", "Burpees", "--group", "full-body"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Chest, Back, Legs, Shoulders, Arms, Core"));

    // Omitting the group files the exercise under Full Body
    iron_log(&config_path)
        .args(["exercise", "Burpees"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(Full Body)"));
}

#[test]
fn test_delete_session() {
    let (_temp_dir, config_path) = setup_test_env();

    let output = iron_log(&config_path)
        .args(["start", "--format", "json"])
        .output()
        .unwrap();
    let started: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let session_id = started["session"]["id"].as_str().unwrap().to_string();

    // Declined confirmation leaves the session alone
    iron_log(&config_path)
        .args(["delete", &session_id])
        .write_stdin("n\n")
        .assert()
        .code(3);

    iron_log(&config_path)
        .args(["delete", &session_id, "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted session"));

    iron_log(&config_path)
        .args(["delete", &session_id, "--force"])
        .assert()
        .code(4);
}
