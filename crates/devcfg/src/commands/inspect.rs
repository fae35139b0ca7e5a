//! Inspect command implementation

use anyhow::Result;
use clap::Args;
use devcfg_core::model::{ModelSource, load_fragment};
use std::path::PathBuf;

/// Print the configuration embedded in a model artifact
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Model artifact to read
    model: PathBuf,
}

/// Execute the inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    devcfg_core::logging::init_from_env();
    match load_fragment(ModelSource::Path(&args.model))? {
        Some(fragment) => print!("{}", serde_yaml::to_string(&fragment)?),
        None => {
            let model = args.model.display();
            println!("No model configuration found in {model}");
        }
    }
    Ok(())
}
