use assert_cmd::Command;
use libironnotes::service::IronNotesService;
use libironnotes::{Config, MuscleGroup};
use predicates::prelude::*;
use tempfile::TempDir;

struct TestEnv {
    _temp_dir: TempDir,
    config_path: String,
    first_session: String,
}

/// Helper to create a database with two sessions and a config pointing at it
async fn create_test_env() -> TestEnv {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("workouts.db");
    let config_path = temp_dir.path().join("config.toml");

    std::fs::write(
        &config_path,
        format!(
            "[database]\npath = \"{}\"\n",
            db_path.to_string_lossy().replace('\\', "\\\\")
        ),
    )
    .unwrap();

    let mut config = Config::default_config();
    config.database.path = db_path.to_string_lossy().to_string();
    let service = IronNotesService::from_config(config).await.unwrap();
    let workouts = service.workouts();

    let first = workouts.start_session(false, "heavy day".to_string()).await.unwrap();
    let squat = workouts
        .add_exercise(&first.session.id, "Squat", MuscleGroup::Legs)
        .await
        .unwrap();
    workouts.log_set(&squat.id, "100 x 5").await.unwrap();
    workouts.log_set(&squat.id, "110 x 5").await.unwrap();
    let bench = workouts
        .add_exercise(&first.session.id, "Bench Press", MuscleGroup::Chest)
        .await
        .unwrap();
    workouts.log_set(&bench.id, "80 x 8").await.unwrap();
    workouts.finish_session(&first.session.id).await.unwrap();

    let second = workouts.start_session(true, String::new()).await.unwrap();
    let squat_again = &second.exercises[0];
    workouts.log_set(&squat_again.id, "120 x 5").await.unwrap();

    TestEnv {
        _temp_dir: temp_dir,
        config_path: config_path.to_string_lossy().to_string(),
        first_session: first.session.id,
    }
}

fn iron_history(env: &TestEnv) -> Command {
    let mut cmd = Command::cargo_bin("iron-history").unwrap();
    cmd.env("IRONNOTES_CONFIG", &env.config_path)
        .env_remove("IRONNOTES_DB_PATH");
    cmd
}

#[tokio::test]
async fn test_sessions_text() {
    let env = create_test_env().await;

    iron_history(&env)
        .arg("sessions")
        .assert()
        .success()
        .stdout(predicate::str::contains(env.first_session.as_str()))
        .stdout(predicate::str::contains("heavy day"))
        .stdout(predicate::str::contains("in progress"));
}

#[tokio::test]
async fn test_sessions_completed_json() {
    let env = create_test_env().await;

    let output = iron_history(&env)
        .args(["sessions", "--completed", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let sessions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let sessions = sessions.as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["id"], env.first_session.as_str());
    assert_eq!(sessions[0]["is_completed"], true);
}

#[tokio::test]
async fn test_sessions_jsonl_one_object_per_line() {
    let env = create_test_env().await;

    let output = iron_history(&env)
        .args(["sessions", "--format", "jsonl"])
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let _: serde_json::Value = serde_json::from_str(line).unwrap();
    }
}

#[tokio::test]
async fn test_summary() {
    let env = create_test_env().await;

    let output = iron_history(&env)
        .args(["summary", &env.first_session, "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total_sets"], 3);
    assert_eq!(summary["total_volume"], 500.0 + 550.0 + 640.0);
    assert_eq!(summary["pr_count"], 2);
    assert_eq!(summary["muscle_groups"][0], "Legs");
    assert_eq!(summary["muscle_groups"][1], "Chest");
}

#[tokio::test]
async fn test_summary_unknown_session() {
    let env = create_test_env().await;

    iron_history(&env)
        .args(["summary", "no-such-session"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Not found"));
}

#[tokio::test]
async fn test_stats_text() {
    let env = create_test_env().await;

    iron_history(&env)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workouts completed: 1"))
        .stdout(predicate::str::contains("Personal records: 3"))
        .stdout(predicate::str::contains("Bench Press"))
        .stdout(predicate::str::contains("Best estimated 1RM"))
        .stdout(predicate::str::contains("135.0"));
}

#[tokio::test]
async fn test_progress_csv() {
    let env = create_test_env().await;

    let output = iron_history(&env)
        .args(["progress", "Squat", "--format", "csv"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("timestamp,session_id,weight,reps,estimated_1rm,is_pr")
    );
    // 100x5 lost its flag to 110x5 in the same session but is still plotted
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[0].contains(",100,5,112.50,false"));
    assert!(rows[1].contains(",110,5,123.75,true"));
    assert!(rows[2].contains(",120,5,135.00,true"));
}

#[tokio::test]
async fn test_previous_skips_active_session() {
    let env = create_test_env().await;

    iron_history(&env)
        .args(["previous", "Squat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. 100 x 5"))
        .stdout(predicate::str::contains("2. 110 x 5  PR"))
        .stdout(predicate::str::contains("120").not());
}

#[tokio::test]
async fn test_invalid_date_is_invalid_input() {
    let env = create_test_env().await;

    iron_history(&env)
        .args(["sessions", "--since", "last tuesday"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid date format"));
}

#[test]
fn test_missing_database() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "[database]\npath = \"{}\"\n",
            temp_dir.path().join("absent.db").to_string_lossy().replace('\\', "\\\\")
        ),
    )
    .unwrap();

    Command::cargo_bin("iron-history")
        .unwrap()
        .env("IRONNOTES_CONFIG", &config_path)
        .env_remove("IRONNOTES_DB_PATH")
        .arg("stats")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Database not found"));
}
