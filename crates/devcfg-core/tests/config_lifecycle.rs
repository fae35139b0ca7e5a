//! Integration tests for run configuration start-up: parsing, model overrides,
//! device resolution and saving

use devcfg_core::config::{Config, ConfigError, ConfigParser, RunMode, Settings};
use devcfg_core::device::{DeviceId, ProcessTopology};
use devcfg_core::model::{ArtifactItem, ArtifactWriter, ItemType, ModelError, ModelSource};
use devcfg_core::serde_yaml::{self, Mapping};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to write a model artifact, optionally embedding `config_yaml`
fn write_model(dir: &Path, name: &str, config_yaml: Option<&str>) -> PathBuf {
    let mut writer = ArtifactWriter::new();
    writer.add_item(ArtifactItem {
        name: "encoder_Wemb".to_string(),
        item_type: ItemType::Float32,
        shape: vec![1, 2],
        bytes: [0.25f32, -0.5].iter().flat_map(|v| v.to_le_bytes()).collect(),
    });
    if let Some(yaml) = config_yaml {
        let mapping: Mapping = serde_yaml::from_str(yaml).unwrap();
        writer.add_config(&mapping).unwrap();
    }
    let path = dir.join(name);
    writer.write(&path).unwrap();
    path
}

/// Helper to parse settings for `mode` from command-line style arguments
fn parse(mode: RunMode, args: &[&str]) -> Settings {
    let argv = std::iter::once("devcfg").chain(args.iter().copied());
    ConfigParser::default().parse_args(mode, argv).unwrap()
}

#[test]
fn test_training_reloads_model_config() {
    let temp_dir = TempDir::new().unwrap();
    let model = write_model(
        temp_dir.path(),
        "model.bin",
        Some("cpu-threads: 2\nversion: v0.1.0\nmini-batch: 8\n"),
    );
    let settings = parse(RunMode::Training, &["--model", model.to_str().unwrap()]);

    let config = Config::initialize(settings, RunMode::Training).unwrap();
    assert_eq!(config.settings().get_u64("mini-batch").unwrap(), 8);
    assert_eq!(config.settings().get_str("version").unwrap(), "v0.1.0");

    let devices = config.devices(ProcessTopology::single()).unwrap();
    assert_eq!(devices, vec![DeviceId::cpu(0), DeviceId::cpu(1)]);
}

#[test]
fn test_model_config_overrides_command_line() {
    let temp_dir = TempDir::new().unwrap();
    let model = write_model(temp_dir.path(), "model.bin", Some("mini-batch: 8\n"));
    let settings = parse(
        RunMode::Training,
        &["--model", model.to_str().unwrap(), "--mini-batch", "128"],
    );

    let config = Config::initialize(settings, RunMode::Training).unwrap();
    assert_eq!(config.settings().get_u64("mini-batch").unwrap(), 8);
}

#[test]
fn test_no_reload_skips_model_config() {
    let temp_dir = TempDir::new().unwrap();
    let model = write_model(temp_dir.path(), "model.bin", Some("mini-batch: 8\n"));
    let settings = parse(
        RunMode::Training,
        &["--model", model.to_str().unwrap(), "--no-reload"],
    );

    let config = Config::initialize(settings, RunMode::Training).unwrap();
    assert_eq!(config.settings().get_u64("mini-batch").unwrap(), 64);
}

#[test]
fn test_ignore_model_config() {
    let temp_dir = TempDir::new().unwrap();
    let model = write_model(temp_dir.path(), "model.bin", Some("beam-size: 4\n"));
    let settings = parse(
        RunMode::Translation,
        &["--models", model.to_str().unwrap(), "--ignore-model-config"],
    );

    let config = Config::initialize(settings, RunMode::Translation).unwrap();
    assert_eq!(config.settings().get_u64("beam-size").unwrap(), 12);
}

#[test]
fn test_missing_training_model_starts_fresh() {
    let temp_dir = TempDir::new().unwrap();
    let model = temp_dir.path().join("not-yet-trained.bin");
    let settings = parse(RunMode::Training, &["--model", model.to_str().unwrap()]);

    let config = Config::initialize(settings, RunMode::Training).unwrap();
    assert!(!config.settings().has("version"));
    assert_eq!(
        config.devices(ProcessTopology::single()).unwrap(),
        vec![DeviceId::gpu(0)]
    );
}

#[test]
fn test_translation_uses_first_model() {
    let temp_dir = TempDir::new().unwrap();
    let first = write_model(temp_dir.path(), "first.bin", Some("beam-size: 4\n"));
    let second = write_model(temp_dir.path(), "second.bin", Some("beam-size: 9\n"));
    let settings = parse(
        RunMode::Translation,
        &[
            "--models",
            first.to_str().unwrap(),
            second.to_str().unwrap(),
        ],
    );

    let config = Config::initialize(settings, RunMode::Translation).unwrap();
    assert_eq!(config.settings().get_u64("beam-size").unwrap(), 4);
}

#[test]
fn test_model_without_config_is_not_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let model = write_model(temp_dir.path(), "plain.bin", None);
    let settings = parse(RunMode::Translation, &["--models", model.to_str().unwrap()]);
    let before = settings.clone();

    let mut config = Config::initialize(settings, RunMode::Translation).unwrap();
    assert_eq!(config.settings(), &before);
    assert!(!config
        .load_model_parameters(ModelSource::Path(&model))
        .unwrap());
}

#[test]
fn test_translation_with_missing_model_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let model = temp_dir.path().join("missing.bin");
    let settings = parse(RunMode::Translation, &["--models", model.to_str().unwrap()]);

    let err = Config::initialize(settings, RunMode::Translation).unwrap_err();
    assert!(matches!(err, ConfigError::Model(ModelError::Io { .. })));
}

#[test]
fn test_load_model_parameters_from_buffer() {
    let mut writer = ArtifactWriter::new();
    let mapping: Mapping = serde_yaml::from_str("num-devices: 2\ndevices: ['0', '1', '2', '3']\n").unwrap();
    writer.add_config(&mapping).unwrap();
    let bytes = writer.to_bytes();

    let settings = parse(RunMode::Training, &["--no-reload"]);
    let mut config = Config::initialize(settings, RunMode::Training).unwrap();
    assert!(config.load_model_parameters(ModelSource::Bytes(&bytes)).unwrap());

    let rank1 = config.devices(ProcessTopology::new(1, 2).unwrap()).unwrap();
    assert_eq!(rank1, vec![DeviceId::gpu(2), DeviceId::gpu(3)]);
}

#[test]
fn test_seed_resolution() {
    let settings = parse(RunMode::Training, &["--seed", "42", "--no-reload"]);
    let config = Config::initialize(settings, RunMode::Training).unwrap();
    assert_eq!(config.seed(), 42);

    let settings = parse(RunMode::Training, &["--no-reload"]);
    let config = Config::initialize(settings, RunMode::Training).unwrap();
    assert!(config.seed() > 0);
    assert_eq!(config.settings().get_u64("seed").unwrap(), 0);
}

#[test]
fn test_save_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let settings = parse(
        RunMode::Server,
        &["--models", "a.bin", "--devices", "1", "3", "--ignore-model-config"],
    );
    let config = Config::initialize(settings, RunMode::Server).unwrap();

    let path = temp_dir.path().join("saved.yml");
    config.save(&path).unwrap();
    let reloaded = Settings::load(&path).unwrap();
    assert_eq!(&reloaded, config.settings());
}

#[test]
fn test_cloned_config_is_independent() {
    let settings = parse(RunMode::Training, &["--no-reload"]);
    let original = Config::initialize(settings, RunMode::Training).unwrap();
    let mut copy = original.clone();
    copy.settings_mut().set("cpu-threads", 4u64);

    assert_eq!(original.settings().get_u64("cpu-threads").unwrap(), 0);
    assert_eq!(copy.settings().get_u64("cpu-threads").unwrap(), 4);
    assert_eq!(copy.mode(), RunMode::Training);
}

#[cfg(feature = "mpi")]
mod mpi_diagnostics {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Log sink shared between the subscriber and the test
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_rank_assignment_is_logged_without_changing_devices() {
        let settings = parse(
            RunMode::Training,
            &["--no-reload", "--num-devices", "1", "--devices", "4", "5"],
        );
        let config = Config::initialize(settings, RunMode::Training).unwrap();
        let topology = ProcessTopology::new(1, 2).unwrap();

        let log = CapturedLog::default();
        let sink = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_target(false)
            .with_writer(move || sink.clone())
            .finish();
        let devices =
            tracing::subscriber::with_default(subscriber, || config.devices(topology)).unwrap();

        assert_eq!(devices, vec![DeviceId::gpu(5)]);
        assert_eq!(
            devices,
            devcfg_core::device::resolve_devices(config.settings(), topology).unwrap()
        );
        assert!(log.contents().contains("[MPI rank 1 out of 2]: GPU[5]"));
    }

    #[test]
    fn test_every_cpu_thread_is_logged() {
        let settings = parse(RunMode::Training, &["--no-reload", "--cpu-threads", "2"]);
        let config = Config::initialize(settings, RunMode::Training).unwrap();

        let log = CapturedLog::default();
        let sink = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        let devices = tracing::subscriber::with_default(subscriber, || {
            config.devices(ProcessTopology::single())
        })
        .unwrap();

        assert_eq!(devices, vec![DeviceId::cpu(0), DeviceId::cpu(1)]);
        let contents = log.contents();
        assert!(contents.contains("[MPI rank 0 out of 1]: CPU[0]"));
        assert!(contents.contains("[MPI rank 0 out of 1]: CPU[1]"));
    }
}
