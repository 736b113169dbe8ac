//! ISL Forwarding State
//!
//! Computes the per-epoch forwarding state of a constellation in which
//! ground stations attach to satellites over GSLs and traffic is carried
//! exclusively over the inter-satellite backbone:
//!
//! ```text
//! (src gs) - (sat) - (sat) - ... - (sat) - (dst gs)
//! ```
//!
//! Pipeline per epoch:
//!
//! - Topology validation (satellite-only backbone, one GSL interface per node)
//! - Floyd-Warshall over the backbone into a dense distance matrix
//! - Access-link ranking of each ground station's visible satellites
//! - Next-hop decisions (satellite -> GS, then GS -> GS)
//! - Diff against the previous epoch's table, emitting only changes
//!
//! Node ids follow a fixed layout: `0..S` are satellites and `S..S+G` are
//! ground stations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod emit;
pub mod engine;
pub mod forwarding;
pub mod ranking;
pub mod shortest_path;
pub mod table;
pub mod topology;

pub use engine::{Constellation, EpochInput, ForwardingStateEngine, GslInterfaceInfo};
pub use forwarding::{ForwardingEntry, GroundReachability};
pub use ranking::{AccessCandidate, VisibleSatellite};
pub use shortest_path::DistanceMatrix;
pub use table::{EpochState, ForwardingTable, FstateChange};
pub use topology::{BackboneGraph, InterfaceMap, TopologyError};

/// Node identifier (satellites first, then ground stations)
pub type NodeId = usize;

/// Interface index local to a node
pub type InterfaceId = u32;

/// The only interface a ground station has
pub const GROUND_STATION_INTERFACE: InterfaceId = 0;

/// Forwarding state errors
#[derive(Error, Debug)]
pub enum FstateError {
    #[error("Invalid topology: {0}")]
    Topology(#[from] TopologyError),
    #[error("GSL interface info count mismatch: expected {expected}, got {actual}")]
    GslInterfaceCount { expected: usize, actual: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FstateError>;

/// Layout of the node id space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpace {
    pub num_satellites: usize,
    pub num_ground_stations: usize,
}

impl NodeSpace {
    pub fn new(num_satellites: usize, num_ground_stations: usize) -> Self {
        Self {
            num_satellites,
            num_ground_stations,
        }
    }

    #[inline]
    pub fn is_satellite(&self, id: NodeId) -> bool {
        id < self.num_satellites
    }

    #[inline]
    pub fn is_ground_station(&self, id: NodeId) -> bool {
        id >= self.num_satellites && id < self.total_nodes()
    }

    /// Node id of the ground station with index `gid`
    #[inline]
    pub fn ground_station_node(&self, gid: usize) -> NodeId {
        self.num_satellites + gid
    }

    pub fn total_nodes(&self) -> usize {
        self.num_satellites + self.num_ground_stations
    }

    pub fn satellites(&self) -> std::ops::Range<NodeId> {
        0..self.num_satellites
    }

    pub fn ground_stations(&self) -> std::ops::Range<NodeId> {
        self.num_satellites..self.total_nodes()
    }

    /// Number of entries in a complete forwarding table: S·G + G·(G−1)
    pub fn forwarding_table_size(&self) -> usize {
        let g = self.num_ground_stations;
        self.num_satellites * g + g * g.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_space_ranges() {
        let space = NodeSpace::new(4, 2);

        assert!(space.is_satellite(0));
        assert!(space.is_satellite(3));
        assert!(!space.is_satellite(4));
        assert!(space.is_ground_station(4));
        assert!(space.is_ground_station(5));
        assert!(!space.is_ground_station(6));
        assert_eq!(space.ground_station_node(1), 5);
        assert_eq!(space.total_nodes(), 6);
    }

    #[test]
    fn test_forwarding_table_size() {
        assert_eq!(NodeSpace::new(3, 2).forwarding_table_size(), 3 * 2 + 2);
        assert_eq!(NodeSpace::new(5, 0).forwarding_table_size(), 0);
        assert_eq!(NodeSpace::new(0, 1).forwarding_table_size(), 0);
    }
}
