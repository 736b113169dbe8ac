//! Per-epoch forwarding state computation
//!
//! Ties the stages together in their required order. The previous epoch's
//! table is an explicit argument and the new one is returned, so epochs can
//! be computed by independent callers without shared process state.

use crate::emit::{write_epoch_records, EpochRecordPaths};
use crate::forwarding::DecisionContext;
use crate::shortest_path::floyd_warshall;
use crate::table::StateDiffer;
use crate::topology::{validate_backbone, validate_interfaces, validate_visibility};
use crate::{
    BackboneGraph, EpochState, ForwardingTable, FstateError, InterfaceMap, NodeId, NodeSpace,
    Result, VisibleSatellite,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// Capacity of a node's single GSL interface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GslInterfaceInfo {
    pub aggregate_max_bandwidth: f64,
}

impl GslInterfaceInfo {
    pub fn new(aggregate_max_bandwidth: f64) -> Self {
        Self {
            aggregate_max_bandwidth,
        }
    }
}

/// Static description of the constellation, shared by all epochs
#[derive(Debug, Clone)]
pub struct Constellation {
    space: NodeSpace,
    interfaces: InterfaceMap,
    gsl_interfaces: Vec<GslInterfaceInfo>,
}

impl Constellation {
    /// `gsl_interfaces` holds one entry per node, satellites first.
    pub fn new(
        space: NodeSpace,
        interfaces: InterfaceMap,
        gsl_interfaces: Vec<GslInterfaceInfo>,
    ) -> Result<Self> {
        if gsl_interfaces.len() != space.total_nodes() {
            return Err(FstateError::GslInterfaceCount {
                expected: space.total_nodes(),
                actual: gsl_interfaces.len(),
            });
        }
        Ok(Self {
            space,
            interfaces,
            gsl_interfaces,
        })
    }

    pub fn space(&self) -> &NodeSpace {
        &self.space
    }

    pub fn interfaces(&self) -> &InterfaceMap {
        &self.interfaces
    }

    pub fn gsl_interface(&self, node_id: NodeId) -> &GslInterfaceInfo {
        &self.gsl_interfaces[node_id]
    }
}

/// Time-varying inputs of one epoch
#[derive(Debug, Clone, Copy)]
pub struct EpochInput<'a> {
    pub time_since_epoch_ns: u64,
    /// ISL graph with this epoch's link lengths
    pub graph: &'a BackboneGraph,
    /// Satellites in GSL range of each ground station
    pub visibility: &'a [Vec<VisibleSatellite>],
}

/// Free-one, ISL-only forwarding: every node has exactly one GSL
/// interface and paths never relay through ground stations.
#[derive(Debug, Clone)]
pub struct ForwardingStateEngine {
    constellation: Constellation,
}

impl ForwardingStateEngine {
    pub fn new(constellation: Constellation) -> Self {
        Self { constellation }
    }

    pub fn constellation(&self) -> &Constellation {
        &self.constellation
    }

    /// Compute the epoch's forwarding state against `previous` (`None` at
    /// the first epoch). Fails before any decision if the topology is invalid.
    pub fn compute_epoch(
        &self,
        input: &EpochInput<'_>,
        previous: Option<&ForwardingTable>,
    ) -> Result<EpochState> {
        let space = &self.constellation.space;
        let interfaces = &self.constellation.interfaces;

        validate_backbone(input.graph, space)?;
        validate_interfaces(input.graph, interfaces, space)?;
        validate_visibility(input.visibility, space)?;

        for (gid, in_range) in input.visibility.iter().enumerate() {
            if in_range.is_empty() {
                warn!(
                    "Ground station {} has no satellite in range at t={}ns",
                    space.ground_station_node(gid),
                    input.time_since_epoch_ns
                );
            }
        }

        debug!("Calculating Floyd-Warshall for graph without ground-station relays");
        let distances = floyd_warshall(input.graph, space.num_satellites);

        let ctx = DecisionContext {
            space,
            graph: input.graph,
            distances: &distances,
            interfaces,
            visibility: input.visibility,
        };

        let mut differ = StateDiffer::new(previous);
        let reach = ctx.route_satellites_to_ground_stations(|src, dst, entry| {
            differ.record(src, dst, entry)
        })?;
        ctx.route_ground_stations(&reach, |src, dst, entry| differ.record(src, dst, entry));

        let state = differ.finish(input.time_since_epoch_ns);

        info!(
            "Epoch t={}ns: {} entries, {} changed, {} dropped",
            state.time_since_epoch_ns,
            state.table.len(),
            state.change_count(),
            state.table.drop_count()
        );

        Ok(state)
    }

    /// Write the epoch's forwarding-state record, and the interface-capacity
    /// record too when `with_gsl_if_bandwidth` is set.
    pub fn write_epoch(
        &self,
        dir: &Path,
        state: &EpochState,
        with_gsl_if_bandwidth: bool,
    ) -> Result<EpochRecordPaths> {
        write_epoch_records(dir, &self.constellation, state, with_gsl_if_bandwidth)
    }
}
