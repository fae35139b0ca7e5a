//! Integration tests for embedding and reloading model configuration

use assert_cmd::cargo;
use devcfg_core::model::{ArtifactItem, ArtifactWriter, ItemType};
use devcfg_core::version::BUILD_VERSION;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn devcfg(temp_dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo::cargo_bin_cmd!("devcfg");
    cmd.current_dir(temp_dir.path())
        .env("DEVCFG_LOG", "info")
        .env_remove("OMPI_COMM_WORLD_RANK")
        .env_remove("OMPI_COMM_WORLD_SIZE")
        .env_remove("PMI_RANK")
        .env_remove("PMI_SIZE");
    cmd
}

/// Helper to write a parameters-only artifact
fn write_plain_model(temp_dir: &TempDir) -> PathBuf {
    let path = temp_dir.path().join("model.bin");
    let mut writer = ArtifactWriter::new();
    writer.add_item(ArtifactItem {
        name: "decoder_W".to_string(),
        item_type: ItemType::Float32,
        shape: vec![1],
        bytes: 1.0f32.to_le_bytes().to_vec(),
    });
    writer.write(&path).unwrap();
    path
}

/// Helper to embed `yaml` into the artifact at `model`
fn embed(temp_dir: &TempDir, model: &Path, yaml: &str, extra: &[&str]) {
    let config_path = temp_dir.path().join("embed.yml");
    fs::write(&config_path, yaml).unwrap();
    devcfg(temp_dir)
        .arg("embed")
        .arg(&config_path)
        .arg(model)
        .args(extra)
        .assert()
        .success();
}

#[test]
fn test_inspect_plain_model() {
    let temp_dir = TempDir::new().unwrap();
    let model = write_plain_model(&temp_dir);

    devcfg(&temp_dir)
        .arg("inspect")
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("No model configuration found"));
}

#[test]
fn test_embed_then_inspect_keeps_parameters() {
    let temp_dir = TempDir::new().unwrap();
    let model = write_plain_model(&temp_dir);
    embed(&temp_dir, &model, "cpu-threads: 2\n", &[]);

    devcfg(&temp_dir)
        .arg("inspect")
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("cpu-threads: 2"))
        .stdout(predicate::str::contains(BUILD_VERSION));

    let items = devcfg_core::model::read_items(&fs::read(&model).unwrap(), "test").unwrap();
    assert!(items.iter().any(|item| item.name == "decoder_W"));
}

#[test]
fn test_translation_picks_up_embedded_devices() {
    let temp_dir = TempDir::new().unwrap();
    let model = write_plain_model(&temp_dir);
    embed(&temp_dir, &model, "devices: ['3']\n", &[]);

    devcfg(&temp_dir)
        .arg("translate")
        .arg("--models")
        .arg(&model)
        .assert()
        .success()
        .stdout("GPU[3]\n")
        .stderr(predicate::str::contains("[config] devices:"));
}

#[test]
fn test_training_reports_upgrade_of_old_model() {
    let temp_dir = TempDir::new().unwrap();
    let model = write_plain_model(&temp_dir);
    embed(&temp_dir, &model, "version: v0.0.1\n", &["--no-stamp"]);

    devcfg(&temp_dir)
        .arg("train")
        .arg("--model")
        .arg(&model)
        .assert()
        .success()
        .stderr(predicate::str::contains("will be overwritten with current version"));
}

#[test]
fn test_new_training_model_reports_creation() {
    let temp_dir = TempDir::new().unwrap();

    devcfg(&temp_dir)
        .args(["train", "--model", "fresh.bin"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Model is being created with version"));
}

#[test]
fn test_inspect_corrupt_artifact_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.bin");
    fs::write(&path, b"junk").unwrap();

    devcfg(&temp_dir)
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Corrupt model artifact"));
}
