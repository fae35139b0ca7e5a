//! Run-mode commands: resolve the configuration and this process's devices

use anyhow::Result;
use clap::Args;
use devcfg_core::config::{
    Config, ModeOptions, ScoringOptions, ServerOptions, TrainingOptions, TranslationOptions,
};
use std::path::PathBuf;

use crate::util::topology::TopologyArgs;

/// Output and topology options shared by every run mode
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Save the merged configuration as YAML to this path
    #[arg(long, value_name = "PATH")]
    dump_config: Option<PathBuf>,

    /// Print the merged configuration as YAML before the devices
    #[arg(long)]
    print_config: bool,

    #[command(flatten)]
    topology: TopologyArgs,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub options: TrainingOptions,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug)]
pub struct TranslateArgs {
    #[command(flatten)]
    pub options: TranslationOptions,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub options: ServerOptions,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub options: ScoringOptions,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Execute a run-mode command
pub fn execute(options: ModeOptions, args: RunArgs) -> Result<()> {
    let config = Config::from_options(&options)?;

    if let Some(path) = &args.dump_config {
        config.save(path)?;
        tracing::info!(path = %path.display(), "Saved configuration");
    }
    if args.print_config {
        print!("{}", config.settings().to_yaml_string()?);
    }

    let topology = args.topology.resolve()?;
    let devices = config.devices(topology)?;
    for device in devices {
        println!("{device}");
    }

    Ok(())
}
