//! devcfg - resolve run settings and compute devices
//!
//! Merges defaults, YAML config files, command-line options and the
//! configuration embedded in a model, then prints the devices assigned to
//! this process of a (possibly multi-process) job.

use clap::Parser;

mod commands;
mod util;

use commands::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.execute() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
