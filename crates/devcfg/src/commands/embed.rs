//! Embed command implementation

use anyhow::{Context, Result};
use clap::Args;
use devcfg_core::config::Settings;
use devcfg_core::model::{ArtifactWriter, read_items};
use devcfg_core::version::stamp_version;
use std::fs;
use std::path::PathBuf;

/// Embed a YAML configuration into a model artifact
#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// YAML configuration to embed
    config: PathBuf,

    /// Model artifact to update; created if it does not exist
    model: PathBuf,

    /// Keep the configuration's own `version` instead of recording this build
    #[arg(long)]
    no_stamp: bool,
}

/// Execute the embed command
pub fn execute(args: EmbedArgs) -> Result<()> {
    devcfg_core::logging::init_from_env();
    let settings = Settings::load(&args.config)?;
    let mut fragment = settings.document().clone();
    if !args.no_stamp {
        stamp_version(&mut fragment);
    }

    let mut writer = ArtifactWriter::new();
    if args.model.exists() {
        let bytes = fs::read(&args.model)
            .with_context(|| format!("Failed to read {}", args.model.display()))?;
        for item in read_items(&bytes, &args.model.display().to_string())? {
            writer.add_item(item);
        }
    }
    writer.add_config(&fragment)?;
    writer.write(&args.model)?;

    let model = args.model.display();
    let count = fragment.len();
    println!("Embedded {count} configuration keys into {model}");
    Ok(())
}
