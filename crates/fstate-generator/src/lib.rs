//! Forwarding State Generator
//!
//! Drives the ISL-only forwarding state computation over a prepared
//! scenario: a static ISL list plus, per epoch, the ISL lengths and the
//! satellites each ground station has in range. Each epoch's table is
//! threaded into the next so only changes are written.
//!
//! # Output layout
//!
//! ```text
//! <output_dir>/gsl_if_bandwidth_<t>.txt   interface capacities (t = 0 only)
//! <output_dir>/fstate_<t>.txt             changed forwarding entries
//! <output_dir>/run_summary.json           per-epoch counts
//! ```

use isl_fstate::FstateError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod driver;
pub mod scenario;

pub use config::GeneratorConfig;
pub use scenario::{EpochSnapshot, Scenario};

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "dynamic_state";

/// GSL bandwidth assumed for nodes a scenario leaves unspecified
pub const DEFAULT_GSL_BANDWIDTH: f64 = 1.0;

/// File name of the run summary inside the output directory
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
    #[error("Forwarding state error at t={time_since_epoch_ns}ns: {source}")]
    Epoch {
        time_since_epoch_ns: u64,
        source: FstateError,
    },
    #[error(transparent)]
    Fstate(#[from] FstateError),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Per-epoch counts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpochSummary {
    pub time_since_epoch_ns: u64,
    pub entries: usize,
    pub changed_entries: usize,
    pub dropped_entries: usize,
}

/// Result of a full run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub num_satellites: usize,
    pub num_ground_stations: usize,
    pub epochs: Vec<EpochSummary>,
    pub generated_at: String,
}

impl RunSummary {
    pub fn total_changes(&self) -> usize {
        self.epochs.iter().map(|e| e.changed_entries).sum()
    }
}
