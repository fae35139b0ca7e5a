//! Compute device assignment for one process of a (possibly multi-process) run
//!
//! Device settings are read from three keys:
//!
//! - `cpu-threads`: a non-zero value selects CPU execution with that many
//!   threads; `devices` is then ignored since it names GPUs
//! - `num-devices`: GPUs used by each process
//! - `devices`: GPU ids, either one set shared by every process or one block
//!   of `num-devices` ids per process, concatenated in rank order
//!
//! Examples for GPU runs:
//!
//! ```text
//! (nothing)                                  device 0
//! --num-devices 4                            devices 0 1 2 3
//! --devices 4 5 6 7                          devices 4 5 6 7, in every process
//! --num-devices 1 --devices 0 1 2 3          4 processes; rank r uses device r
//! --num-devices 2 --devices 0 1 2 3          2 processes; rank 0 uses 0 1, rank 1 uses 2 3
//! ```

use serde_yaml::Value;
use std::fmt;
use thiserror::Error;

use crate::config::{ConfigError, Settings};

/// Kind of compute device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Cpu,
    Gpu,
}

impl DeviceKind {
    pub fn name(self) -> &'static str {
        match self {
            DeviceKind::Cpu => "CPU",
            DeviceKind::Gpu => "GPU",
        }
    }
}

/// A CPU thread slot or GPU index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    pub no: usize,
    pub kind: DeviceKind,
}

impl DeviceId {
    pub fn cpu(no: usize) -> Self {
        Self {
            no,
            kind: DeviceKind::Cpu,
        }
    }

    pub fn gpu(no: usize) -> Self {
        Self {
            no,
            kind: DeviceKind::Gpu,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind.name(), self.no)
    }
}

/// Position of this process within a multi-process job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessTopology {
    rank: usize,
    size: usize,
}

impl Default for ProcessTopology {
    fn default() -> Self {
        Self::single()
    }
}

impl ProcessTopology {
    /// Topology of `size` processes, this one being `rank`
    pub fn new(rank: usize, size: usize) -> Result<Self, DeviceConfigError> {
        if rank >= size {
            return Err(DeviceConfigError::InvalidTopology { rank, size });
        }
        Ok(Self { rank, size })
    }

    /// A single-process run
    pub fn single() -> Self {
        Self { rank: 0, size: 1 }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Device settings that cannot be mapped onto this process
#[derive(Debug, Error)]
pub enum DeviceConfigError {
    #[error("devices[] size must be equal to numDevices (devices[] lists {listed}, numDevices is {num_devices})")]
    CountMismatch { listed: usize, num_devices: usize },

    #[error(
        "devices[] size must be equal to or a multiple of numDevices (devices[] lists {listed}, numDevices is {num_devices})"
    )]
    NotAMultiple { listed: usize, num_devices: usize },

    #[error(
        "devices[] must either list a shared set of devices, or one set per MPI process ({sets} sets listed for {processes} processes)"
    )]
    ProcessCountMismatch { sets: usize, processes: usize },

    #[error("Invalid device id '{value}' in devices[]")]
    InvalidDeviceId { value: String },

    #[error("MPI rank {rank} is out of range for {size} processes")]
    InvalidTopology { rank: usize, size: usize },

    #[error(transparent)]
    Settings(#[from] ConfigError),
}

/// Resolve the ordered devices of the process at `topology`
///
/// CPU runs yield thread slots `0..cpu-threads`. GPU runs yield the ids of
/// `devices` (or `0..num-devices` when it is empty), sliced down to this
/// process's block when one block per process is listed. Order is kept and
/// duplicates are not removed.
pub fn resolve_devices(
    settings: &Settings,
    topology: ProcessTopology,
) -> Result<Vec<DeviceId>, DeviceConfigError> {
    let cpu_threads: usize = settings.get_as("cpu-threads")?;
    if cpu_threads > 0 {
        return Ok((0..cpu_threads).map(DeviceId::cpu).collect());
    }

    let num_devices: usize = if settings.has("num-devices") {
        settings.get_as("num-devices")?
    } else {
        0
    };
    let device_nos = listed_devices(settings.get("devices")?)?;
    let assigned = assign_gpus(num_devices, device_nos, topology)?;
    Ok(assigned.into_iter().map(DeviceId::gpu).collect())
}

/// GPU ids of this process given `num_devices` (0 when unset) and the listed ids
fn assign_gpus(
    mut num_devices: usize,
    mut device_nos: Vec<usize>,
    topology: ProcessTopology,
) -> Result<Vec<usize>, DeviceConfigError> {
    if device_nos.is_empty() {
        if num_devices == 0 {
            num_devices = 1;
        }
        device_nos = (0..num_devices).collect();
    } else if num_devices == 0 {
        num_devices = device_nos.len();
    }

    let listed = device_nos.len();
    // Also caught by the checks below, but with a message that only makes
    // sense for multi-process runs.
    if topology.size() == 1 && num_devices != listed {
        return Err(DeviceConfigError::CountMismatch {
            listed,
            num_devices,
        });
    }

    let sets = listed / num_devices;
    if num_devices * sets != listed {
        return Err(DeviceConfigError::NotAMultiple {
            listed,
            num_devices,
        });
    }

    if sets != 1 {
        if sets != topology.size() {
            return Err(DeviceConfigError::ProcessCountMismatch {
                sets,
                processes: topology.size(),
            });
        }
        let start = topology.rank() * num_devices;
        device_nos = device_nos[start..start + num_devices].to_vec();
    }
    Ok(device_nos)
}

/// Parse the `devices` value: a list of decimal ids given as strings or numbers
fn listed_devices(value: &Value) -> Result<Vec<usize>, DeviceConfigError> {
    let entries: &[Value] = match value {
        Value::Sequence(seq) => seq.as_slice(),
        Value::Null => &[],
        other => std::slice::from_ref(other),
    };
    entries.iter().map(parse_device_no).collect()
}

fn parse_device_no(value: &Value) -> Result<usize, DeviceConfigError> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<usize>().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        _ => None,
    };
    parsed.ok_or_else(|| DeviceConfigError::InvalidDeviceId {
        value: match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => format!("{other:?}"),
        },
    })
}

/// Log the devices assigned to this rank
///
/// Only MPI builds (the `mpi` feature) emit anything; resolution itself is
/// unaffected.
#[cfg(feature = "mpi")]
pub fn log_device_assignment(devices: &[DeviceId], topology: ProcessTopology) {
    for device in devices {
        tracing::info!(
            "[MPI rank {} out of {}]: {}",
            topology.rank(),
            topology.size(),
            device
        );
    }
}

#[cfg(not(feature = "mpi"))]
pub fn log_device_assignment(_devices: &[DeviceId], _topology: ProcessTopology) {}
