//! CLI command dispatch and execution

use anyhow::Result;
use clap::{Parser, Subcommand};
use devcfg_core::config::ModeOptions;

mod embed;
mod inspect;
mod run;

/// devcfg - resolve run settings and compute devices
#[derive(Parser, Debug)]
#[command(
    name = "devcfg",
    version,
    about = "Resolve run settings and per-process compute devices",
    long_about = "Merges defaults, config files, command-line options and model-embedded \
                  configuration, then prints the devices assigned to this process"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve settings and devices for a training run
    Train(run::TrainArgs),

    /// Resolve settings and devices for batch translation
    Translate(run::TranslateArgs),

    /// Resolve settings and devices for a translation server
    Serve(run::ServeArgs),

    /// Resolve settings and devices for scoring
    Score(run::ScoreArgs),

    /// Print the configuration embedded in a model artifact
    Inspect(inspect::InspectArgs),

    /// Embed a YAML configuration into a model artifact
    Embed(embed::EmbedArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run::execute(ModeOptions::Training(args.options), args.run),
            Commands::Translate(args) => {
                run::execute(ModeOptions::Translation(args.options), args.run)
            }
            Commands::Serve(args) => run::execute(ModeOptions::Server(args.options), args.run),
            Commands::Score(args) => run::execute(ModeOptions::Scoring(args.options), args.run),
            Commands::Inspect(args) => inspect::execute(args),
            Commands::Embed(args) => embed::execute(args),
        }
    }
}
