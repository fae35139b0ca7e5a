//! Command-line and config-file parsing into a settings document

use clap::{Args, Command, FromArgMatches};
use serde_yaml::Value;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use super::error::ConfigError;
use super::overrides::override_settings;
use super::store::{Settings, parse_mapping};
use super::types::RunMode;

/// Options shared by every run mode
#[derive(Args, Debug, Clone, Default)]
pub struct CommonOptions {
    /// YAML configuration files, applied in order before command-line options
    #[arg(short = 'c', long = "config", num_args = 1..)]
    pub config: Vec<PathBuf>,

    /// Preallocated workspace memory per device in MB
    #[arg(short = 'w', long)]
    pub workspace: Option<u64>,

    /// Log file path
    #[arg(long)]
    pub log: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Random seed; 0 picks a time-based seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of CPU threads; a non-zero value selects CPU execution
    #[arg(long)]
    pub cpu_threads: Option<u64>,

    /// Number of GPUs used by each process
    #[arg(long)]
    pub num_devices: Option<u64>,

    /// GPU ids, either shared by all processes or one block per process
    #[arg(short = 'd', long, num_args = 1..)]
    pub devices: Vec<String>,

    /// Ignore the configuration embedded in the model
    #[arg(long)]
    pub ignore_model_config: bool,
}

/// Options for `training` mode
#[derive(Args, Debug, Clone, Default)]
pub struct TrainingOptions {
    #[command(flatten)]
    pub common: CommonOptions,

    /// Path prefix of the model to train
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Paths to the training corpora
    #[arg(short = 't', long, num_args = 1..)]
    pub train_sets: Vec<String>,

    /// Do not load an existing model from the model path
    #[arg(long)]
    pub no_reload: bool,

    /// Sentences per mini-batch
    #[arg(long)]
    pub mini_batch: Option<u64>,

    /// Learning rate
    #[arg(short = 'l', long)]
    pub learn_rate: Option<f64>,

    /// Stop after this many epochs; 0 means no limit
    #[arg(short = 'e', long)]
    pub after_epochs: Option<u64>,

    /// Display progress every this many updates
    #[arg(long)]
    pub disp_freq: Option<u64>,
}

/// Options for `translation` mode
#[derive(Args, Debug, Clone, Default)]
pub struct TranslationOptions {
    #[command(flatten)]
    pub common: CommonOptions,

    /// Paths to the models used for decoding
    #[arg(short = 'm', long, num_args = 1..)]
    pub models: Vec<String>,

    /// Input files
    #[arg(short = 'i', long, num_args = 1..)]
    pub input: Vec<String>,

    /// Beam size
    #[arg(short = 'b', long)]
    pub beam_size: Option<u64>,

    /// Length normalization exponent
    #[arg(short = 'n', long)]
    pub normalize: Option<f64>,

    /// Emit n-best lists
    #[arg(long)]
    pub n_best: bool,
}

/// Options for `server` mode
#[derive(Args, Debug, Clone, Default)]
pub struct ServerOptions {
    #[command(flatten)]
    pub translation: TranslationOptions,

    /// Port to listen on
    #[arg(short = 'p', long)]
    pub port: Option<u16>,
}

/// Options for `scoring` mode
#[derive(Args, Debug, Clone, Default)]
pub struct ScoringOptions {
    #[command(flatten)]
    pub common: CommonOptions,

    /// Path to the model used for scoring
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Paths to the corpora to score
    #[arg(short = 't', long, num_args = 1..)]
    pub train_sets: Vec<String>,

    /// Do not load an existing model from the model path
    #[arg(long)]
    pub no_reload: bool,

    /// Score n-best lists
    #[arg(long)]
    pub n_best: bool,
}

/// Parsed options of one run mode
#[derive(Debug, Clone)]
pub enum ModeOptions {
    Training(TrainingOptions),
    Translation(TranslationOptions),
    Server(ServerOptions),
    Scoring(ScoringOptions),
}

impl ModeOptions {
    pub fn mode(&self) -> RunMode {
        match self {
            ModeOptions::Training(_) => RunMode::Training,
            ModeOptions::Translation(_) => RunMode::Translation,
            ModeOptions::Server(_) => RunMode::Server,
            ModeOptions::Scoring(_) => RunMode::Scoring,
        }
    }

    pub fn common(&self) -> &CommonOptions {
        match self {
            ModeOptions::Training(o) => &o.common,
            ModeOptions::Translation(o) => &o.common,
            ModeOptions::Server(o) => &o.translation.common,
            ModeOptions::Scoring(o) => &o.common,
        }
    }
}

/// Builds the settings document of a run
#[derive(Debug, Clone, Copy)]
pub struct ConfigParser {
    validate: bool,
}

impl Default for ConfigParser {
    fn default() -> Self {
        Self { validate: true }
    }
}

impl ConfigParser {
    pub fn new(validate: bool) -> Self {
        Self { validate }
    }

    /// Parse raw `argv` (including the program name) for `mode`
    pub fn parse_args<I, T>(&self, mode: RunMode, argv: I) -> Result<Settings, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let options = match mode {
            RunMode::Training => ModeOptions::Training(parse_options(mode, argv)?),
            RunMode::Translation => ModeOptions::Translation(parse_options(mode, argv)?),
            RunMode::Server => ModeOptions::Server(parse_options(mode, argv)?),
            RunMode::Scoring => ModeOptions::Scoring(parse_options(mode, argv)?),
        };
        self.parse(&options)
    }

    /// Build settings from parsed options
    ///
    /// Defaults for the mode come first, then each `--config` file in order,
    /// then every option given on the command line.
    pub fn parse(&self, options: &ModeOptions) -> Result<Settings, ConfigError> {
        let mode = options.mode();
        let mut settings = Self::defaults(mode);

        for path in &options.common().config {
            let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let mapping = parse_mapping(&contents, &path.display().to_string())?;
            debug!(path = %path.display(), keys = mapping.len(), "Applying config file");
            override_settings(&mut settings, &mapping);
        }

        apply_cli_options(&mut settings, options);

        if self.validate {
            validate(&settings, mode)?;
        }
        Ok(settings)
    }

    /// Built-in defaults for `mode`
    ///
    /// `num-devices` has no default so that its presence records whether it
    /// was given.
    pub fn defaults(mode: RunMode) -> Settings {
        let mut settings = Settings::new();
        let workspace: u64 = if mode == RunMode::Training { 2048 } else { 512 };
        settings.set("workspace", workspace);
        settings.set("log", "");
        settings.set("log-level", "info");
        settings.set("seed", 0u64);
        settings.set("cpu-threads", 0u64);
        settings.set("devices", Vec::<String>::new());
        settings.set("ignore-model-config", false);

        match mode {
            RunMode::Training => {
                settings.set("model", "model.bin");
                settings.set("train-sets", Vec::<String>::new());
                settings.set("no-reload", false);
                settings.set("mini-batch", 64u64);
                settings.set("learn-rate", 0.0001f64);
                settings.set("after-epochs", 0u64);
                settings.set("disp-freq", 1000u64);
            }
            RunMode::Translation | RunMode::Server => {
                settings.set("models", Vec::<String>::new());
                settings.set("input", vec!["stdin".to_string()]);
                settings.set("beam-size", 12u64);
                settings.set("normalize", 0.0f64);
                settings.set("n-best", false);
                if mode == RunMode::Server {
                    settings.set("port", 8080u64);
                }
            }
            RunMode::Scoring => {
                settings.set("train-sets", Vec::<String>::new());
                settings.set("no-reload", false);
                settings.set("n-best", false);
            }
        }
        settings
    }
}

fn parse_options<A, I, T>(mode: RunMode, argv: I) -> Result<A, clap::Error>
where
    A: Args,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let command = A::augment_args(Command::new(mode.as_str()));
    let matches = command.try_get_matches_from(argv)?;
    A::from_arg_matches(&matches)
}

fn set_opt(settings: &mut Settings, key: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        settings.set(key, value);
    }
}

fn set_list(settings: &mut Settings, key: &str, values: &[String]) {
    if !values.is_empty() {
        settings.set(key, values.to_vec());
    }
}

fn set_flag(settings: &mut Settings, key: &str, flag: bool) {
    if flag {
        settings.set(key, true);
    }
}

fn apply_common(settings: &mut Settings, common: &CommonOptions) {
    set_opt(settings, "workspace", common.workspace);
    set_opt(settings, "log", common.log.clone());
    set_opt(settings, "log-level", common.log_level.clone());
    set_opt(settings, "seed", common.seed);
    set_opt(settings, "cpu-threads", common.cpu_threads);
    set_opt(settings, "num-devices", common.num_devices);
    set_list(settings, "devices", &common.devices);
    set_flag(settings, "ignore-model-config", common.ignore_model_config);
}

fn apply_translation(settings: &mut Settings, options: &TranslationOptions) {
    apply_common(settings, &options.common);
    set_list(settings, "models", &options.models);
    set_list(settings, "input", &options.input);
    set_opt(settings, "beam-size", options.beam_size);
    set_opt(settings, "normalize", options.normalize);
    set_flag(settings, "n-best", options.n_best);
}

fn apply_cli_options(settings: &mut Settings, options: &ModeOptions) {
    match options {
        ModeOptions::Training(o) => {
            apply_common(settings, &o.common);
            set_opt(settings, "model", o.model.clone());
            set_list(settings, "train-sets", &o.train_sets);
            set_flag(settings, "no-reload", o.no_reload);
            set_opt(settings, "mini-batch", o.mini_batch);
            set_opt(settings, "learn-rate", o.learn_rate);
            set_opt(settings, "after-epochs", o.after_epochs);
            set_opt(settings, "disp-freq", o.disp_freq);
        }
        ModeOptions::Translation(o) => apply_translation(settings, o),
        ModeOptions::Server(o) => {
            apply_translation(settings, &o.translation);
            set_opt(settings, "port", o.port);
        }
        ModeOptions::Scoring(o) => {
            apply_common(settings, &o.common);
            set_opt(settings, "model", o.model.clone());
            set_list(settings, "train-sets", &o.train_sets);
            set_flag(settings, "no-reload", o.no_reload);
            set_flag(settings, "n-best", o.n_best);
        }
    }
}

fn validate(settings: &Settings, mode: RunMode) -> Result<(), ConfigError> {
    // Typed reads surface config-file values of the wrong type early.
    settings.get_u64("cpu-threads")?;
    settings.get_u64("seed")?;
    if settings.has("num-devices") {
        settings.get_u64("num-devices")?;
    }

    let required = if mode.uses_model_list() {
        !settings.get_strings("models")?.is_empty()
    } else {
        settings.has("model") && !settings.get_str("model")?.is_empty()
    };
    if !required {
        let key = if mode.uses_model_list() { "models" } else { "model" };
        return Err(ConfigError::MissingRequired {
            key: key.to_string(),
            mode: mode.to_string(),
        });
    }
    Ok(())
}
