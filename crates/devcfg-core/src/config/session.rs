//! Run configuration: parsed settings plus model overrides and seed

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use super::error::ConfigError;
use super::parser::{ConfigParser, ModeOptions};
use super::store::Settings;
use super::types::RunMode;
use crate::device::{self, DeviceConfigError, DeviceId, ProcessTopology};
use crate::logging;
use crate::model::{ModelSource, load_fragment};
use crate::version;

/// Settings of one run together with its mode and resolved random seed
#[derive(Debug, Clone)]
pub struct Config {
    settings: Settings,
    mode: RunMode,
    seed: u64,
}

impl Config {
    /// Parse `options`, set up logging from them and initialize the run
    pub fn from_options(options: &ModeOptions) -> Result<Self, ConfigError> {
        let settings = ConfigParser::default().parse(options)?;
        logging::init(&settings)?;
        Self::initialize(settings, options.mode())
    }

    /// Finish start-up from parsed settings
    ///
    /// Resolves the seed, applies the configuration embedded in the model
    /// unless disabled, then logs the merged settings and the model version.
    pub fn initialize(settings: Settings, mode: RunMode) -> Result<Self, ConfigError> {
        let mut config = Self {
            seed: 0,
            settings,
            mode,
        };
        config.seed = resolve_seed(config.settings.get_u64("seed")?);

        let ignore_model_config = config.settings.get_bool("ignore-model-config")?;
        if mode.uses_model_list() {
            let models = config.settings.get_strings("models")?;
            if let Some(model) = models.first().filter(|_| !ignore_model_config) {
                config.load_model_parameters(ModelSource::Path(Path::new(model)))?;
            }
        } else {
            let model = config.settings.get_str("model")?;
            let no_reload = config.settings.get_bool("no-reload")?;
            if Path::new(&model).exists() && !no_reload && !ignore_model_config {
                config.load_model_parameters(ModelSource::Path(Path::new(&model)))?;
            }
        }

        config.settings.log();
        version::log_model_version(&config.settings, mode);
        Ok(config)
    }

    /// Override settings with the configuration embedded in a model artifact
    ///
    /// Returns `false` when the artifact carries no configuration, which
    /// leaves the settings untouched.
    pub fn load_model_parameters(&mut self, source: ModelSource<'_>) -> Result<bool, ConfigError> {
        match load_fragment(source)? {
            Some(fragment) => {
                self.settings.override_with(&fragment);
                Ok(true)
            }
            None => {
                info!("[config] No model configuration found in model file");
                Ok(false)
            }
        }
    }

    /// Devices assigned to the process at `topology`
    ///
    /// Logs the assignment in MPI builds.
    pub fn devices(&self, topology: ProcessTopology) -> Result<Vec<DeviceId>, DeviceConfigError> {
        let devices = device::resolve_devices(&self.settings, topology)?;
        device::log_device_assignment(&devices, topology);
        Ok(devices)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Random seed of the run; never 0
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Write the merged settings as YAML to `path`
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.settings.save(path)
    }
}

/// A configured seed of 0 means "pick one from the clock"
fn resolve_seed(configured: u64) -> u64 {
    if configured != 0 {
        return configured;
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(1)
        .max(1)
}
