//! CLI integration tests

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../data")
        .join(name)
}

/// Command for the built binary, isolated from the user's config and working directory
fn esrb(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_esrb"));
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("ESRB_API_URL")
        .env_remove("ESRB_MODEL_PATH")
        .env_remove("RUST_LOG");
    cmd
}

fn run_with_stdin(mut cmd: Command, input: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute command");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = esrb(&home).arg("--help").output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("ESRB rating predictor"), "Should show about text");
    assert!(stdout.contains("menu"), "Should show menu command");
    assert!(stdout.contains("train"), "Should show train command");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("remote"), "Should show remote command");
    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("ESRB_API_URL"), "Should show env var");
}

#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let output = esrb(&home).arg("--version").output().unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("esrb"));
}

#[test]
fn test_train_help() {
    let home = TempDir::new().unwrap();
    let output = esrb(&home).args(["train", "--help"]).output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("--seconds"));
    assert!(stdout.contains("--output"));
    assert!(stdout.contains("--metric"), "Global options should be listed");
}

#[test]
fn test_invalid_command() {
    let home = TempDir::new().unwrap();
    let output = esrb(&home).arg("invalid-command").output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_invalid_metric() {
    let home = TempDir::new().unwrap();
    let output = esrb(&home)
        .args(["train", "--metric", "f1"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_menu_predict_without_model() {
    let home = TempDir::new().unwrap();
    let output = run_with_stdin(esrb(&home), "P\nQ\n");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Welcome to the ESRB Predictor"));
    assert!(stdout.contains("You must train or load a model before classifying games"));
    assert!(stdout.contains("Thanks for using the classifier!"));
}

#[test]
fn test_menu_load_missing_model() {
    let home = TempDir::new().unwrap();
    let mut cmd = esrb(&home);
    cmd.arg("menu");
    let output = run_with_stdin(cmd, "L\nQ\n");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Could not load the model from Model.json"));
}

#[test]
fn test_predict_without_model_fails() {
    let home = TempDir::new().unwrap();
    let output = esrb(&home).arg("predict").output().unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Could not load the model"));
}

#[test]
fn test_train_zero_seconds_fails() {
    let home = TempDir::new().unwrap();
    let output = esrb(&home)
        .args(["train", "--seconds", "0"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("at least one second"));
}

#[test]
fn test_train_then_predict() {
    let home = TempDir::new().unwrap();
    let model = home.path().join("models").join("Model.json");
    std::fs::create_dir_all(model.parent().unwrap()).unwrap();

    let output = esrb(&home)
        .args(["train", "--seconds", "1", "--training-data"])
        .arg(data_file("ESRB.csv"))
        .arg("--validation-data")
        .arg(data_file("ESRBTest.csv"))
        .arg("--model")
        .arg(&model)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "train failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("ran in"));
    assert!(stdout.contains("saved to"));
    assert!(model.exists());

    let output = esrb(&home)
        .args(["predict", "--format", "json", "--model"])
        .arg(&model)
        .output()
        .unwrap();
    assert!(output.status.success());

    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 6);
    assert_eq!(results[1]["title"], "Kinda Sus");
}

#[test]
fn test_train_split_json_summary() {
    let home = TempDir::new().unwrap();

    let output = esrb(&home)
        .args(["train", "--seconds", "1", "--split", "0.25", "--format", "json", "--training-data"])
        .arg(data_file("ESRB.csv"))
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "train failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["trainingRows"], 300);
    assert_eq!(summary["validationRows"], 100);
    assert!(!summary["runs"].as_array().unwrap().is_empty());
    assert!(home.path().join("Model.json").exists());
}

#[test]
fn test_train_split_without_value_uses_default_fraction() {
    let home = TempDir::new().unwrap();

    let output = esrb(&home)
        .args(["train", "--seconds", "1", "--format", "json", "--split", "--training-data"])
        .arg(data_file("ESRB.csv"))
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "train failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["validationRows"], 80);
}

#[test]
fn test_train_rejects_bad_split() {
    let home = TempDir::new().unwrap();
    let output = esrb(&home)
        .args(["train", "--split", "1.5"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("between 0 and 1"));
}
