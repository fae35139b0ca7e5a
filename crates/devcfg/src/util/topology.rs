//! Process topology detection for MPI launches

use anyhow::{Context, Result};
use clap::Args;
use devcfg_core::device::ProcessTopology;

const RANK_VARS: [&str; 2] = ["OMPI_COMM_WORLD_RANK", "PMI_RANK"];
const SIZE_VARS: [&str; 2] = ["OMPI_COMM_WORLD_SIZE", "PMI_SIZE"];

/// Position of this process in a multi-process job
#[derive(Args, Debug)]
pub struct TopologyArgs {
    /// Rank of this process (default: from the MPI launcher, else 0)
    #[arg(long)]
    mpi_rank: Option<usize>,

    /// Number of processes in the job (default: from the MPI launcher, else 1)
    #[arg(long)]
    mpi_size: Option<usize>,
}

impl TopologyArgs {
    /// Resolve the topology from flags, then launcher environment, then defaults
    pub fn resolve(&self) -> Result<ProcessTopology> {
        let rank = match self.mpi_rank {
            Some(rank) => rank,
            None => env_usize(&RANK_VARS)?.unwrap_or(0),
        };
        let size = match self.mpi_size {
            Some(size) => size,
            None => env_usize(&SIZE_VARS)?.unwrap_or(1),
        };
        Ok(ProcessTopology::new(rank, size)?)
    }
}

/// First of `vars` that is set, parsed as an unsigned integer
fn env_usize(vars: &[&str]) -> Result<Option<usize>> {
    for var in vars {
        if let Ok(value) = std::env::var(var) {
            let parsed = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid value '{value}' for {var}"))?;
            return Ok(Some(parsed));
        }
    }
    Ok(None)
}
