//! Scenario loading from JSON files
//!
//! A scenario carries everything the forwarding computation consumes but
//! does not produce itself: the static ISL list, GSL capacities and, per
//! epoch, ISL lengths plus the ground stations' visibility lists.

use crate::{GeneratorError, Result};
use isl_fstate::{BackboneGraph, GslInterfaceInfo, NodeId, VisibleSatellite};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// One epoch's time-varying state
#[derive(Debug, Clone, Deserialize)]
pub struct EpochSnapshot {
    pub time_since_epoch_ns: u64,
    /// Parallel to [`Scenario::isls`]
    pub isl_lengths_m: Vec<f64>,
    /// Per ground station: `[distance_m, satellite_id]` pairs
    pub ground_station_satellites_in_range: Vec<Vec<(f64, NodeId)>>,
}

impl EpochSnapshot {
    pub fn visibility(&self) -> Vec<Vec<VisibleSatellite>> {
        self.ground_station_satellites_in_range
            .iter()
            .map(|in_range| in_range.iter().copied().map(VisibleSatellite::from).collect())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub num_satellites: usize,
    pub num_ground_stations: usize,
    /// Static ISL list; its order fixes interface numbering
    pub isls: Vec<(NodeId, NodeId)>,
    /// One per node, satellites first. Missing means configured default.
    #[serde(default)]
    pub gsl_interfaces: Option<Vec<GslInterfaceInfo>>,
    pub epochs: Vec<EpochSnapshot>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.check()?;
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading scenario from {:?}", path);

        let file = File::open(path)?;
        let scenario: Scenario = serde_json::from_reader(BufReader::new(file))?;
        scenario.check()?;

        info!(
            "Loaded {} satellites, {} ground stations, {} ISLs, {} epochs",
            scenario.num_satellites,
            scenario.num_ground_stations,
            scenario.isls.len(),
            scenario.epochs.len()
        );

        Ok(scenario)
    }

    /// Shape checks only; topology rules are enforced per epoch by the engine
    fn check(&self) -> Result<()> {
        if let Some(gsl) = &self.gsl_interfaces {
            let expected = self.num_satellites + self.num_ground_stations;
            if gsl.len() != expected {
                return Err(GeneratorError::InvalidScenario(format!(
                    "{} GSL interfaces for {} nodes",
                    gsl.len(),
                    expected
                )));
            }
        }

        let mut last_t: Option<u64> = None;
        for epoch in &self.epochs {
            let t = epoch.time_since_epoch_ns;
            if last_t.is_some_and(|prev| t <= prev) {
                return Err(GeneratorError::InvalidScenario(format!(
                    "epoch timestamps must increase, got {} after {:?}",
                    t, last_t
                )));
            }
            last_t = Some(t);

            if epoch.isl_lengths_m.len() != self.isls.len() {
                return Err(GeneratorError::InvalidScenario(format!(
                    "epoch t={} has {} ISL lengths for {} ISLs",
                    t,
                    epoch.isl_lengths_m.len(),
                    self.isls.len()
                )));
            }
        }

        Ok(())
    }

    /// GSL capacities, falling back to `default_bandwidth` for every node
    pub fn gsl_interfaces_or(&self, default_bandwidth: f64) -> Vec<GslInterfaceInfo> {
        self.gsl_interfaces.clone().unwrap_or_else(|| {
            vec![
                GslInterfaceInfo::new(default_bandwidth);
                self.num_satellites + self.num_ground_stations
            ]
        })
    }

    /// The epoch's backbone: every satellite, every ISL at its current length
    pub fn backbone(&self, epoch: &EpochSnapshot) -> BackboneGraph {
        let mut graph = BackboneGraph::with_satellites(self.num_satellites);
        for (&(a, b), &length_m) in self.isls.iter().zip(epoch.isl_lengths_m.iter()) {
            graph.add_isl(a, b, length_m);
        }
        graph
    }
}
