//! Integration tests for log level and log file settings

use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn devcfg(temp_dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo::cargo_bin_cmd!("devcfg");
    cmd.current_dir(temp_dir.path())
        .env_remove("DEVCFG_LOG")
        .env_remove("OMPI_COMM_WORLD_RANK")
        .env_remove("OMPI_COMM_WORLD_SIZE")
        .env_remove("PMI_RANK")
        .env_remove("PMI_SIZE");
    cmd
}

#[test]
fn test_default_level_logs_config() {
    let temp_dir = TempDir::new().unwrap();
    devcfg(&temp_dir)
        .arg("train")
        .assert()
        .success()
        .stderr(predicate::str::contains("[config] cpu-threads: 0"));
}

#[test]
fn test_error_level_suppresses_config_lines() {
    let temp_dir = TempDir::new().unwrap();
    devcfg(&temp_dir)
        .args(["train", "--log-level", "error"])
        .assert()
        .success()
        .stdout("GPU[0]\n")
        .stderr(predicate::str::contains("[config]").not());
}

#[test]
fn test_log_level_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("quiet.yml");
    fs::write(&config_path, "log-level: warn\n").unwrap();

    devcfg(&temp_dir)
        .args(["train", "-c", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("[config]").not());
}

#[test]
fn test_log_file_receives_config_lines() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("run.log");

    devcfg(&temp_dir)
        .args(["train", "--log", log_path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("[config]"));

    let logged = fs::read_to_string(&log_path).unwrap();
    assert!(logged.contains("[config] log-level: info"));
    assert!(logged.contains("Model is being created with version"));
}

#[test]
fn test_unknown_log_level_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    devcfg(&temp_dir)
        .args(["train", "--log-level", "loud"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid log level 'loud'"));
}

#[test]
fn test_unwritable_log_file_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("no-such-dir").join("run.log");

    devcfg(&temp_dir)
        .args(["train", "--log", log_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("I/O error"));
}
