//! Generator configuration
//!
//! Loaded from an optional JSON file; any field left out keeps its default.
//! CLI flags override what the file sets.

use crate::{Result, DEFAULT_GSL_BANDWIDTH, DEFAULT_OUTPUT_DIR};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory receiving the per-epoch records
    pub output_dir: PathBuf,
    /// Bandwidth for nodes without `gsl_interfaces` in the scenario
    pub default_gsl_bandwidth: f64,
    /// Write `gsl_if_bandwidth_<t>.txt` next to each forwarding-state record
    pub write_gsl_if_bandwidth: bool,
    /// Write `run_summary.json` after the last epoch
    pub write_summary: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            default_gsl_bandwidth: DEFAULT_GSL_BANDWIDTH,
            write_gsl_if_bandwidth: true,
            write_summary: true,
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading generator config from {:?}", path);

        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }
}
