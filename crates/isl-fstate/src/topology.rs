//! Satellite backbone topology and its invariants
//!
//! The backbone is the ISL graph without any ground station. It is
//! validated once per epoch before any shortest-path work, since the
//! forwarding computation assumes:
//! - the graph holds exactly the satellites `0..S`
//! - no link touches a ground station (no GS relaying)
//! - every ISL has a local interface on both ends

use crate::{InterfaceId, NodeId, NodeSpace, VisibleSatellite};
use petgraph::graphmap::UnGraphMap;
use std::collections::HashMap;
use thiserror::Error;

/// Violations of the backbone/visibility contract. Always fatal for the epoch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("Number of nodes in the graph ({actual}) does not match the number of satellites ({expected})")]
    NodeCountMismatch { expected: usize, actual: usize },
    #[error("Graph cannot contain satellite-to-ground-station links: {0} - {1}")]
    GroundStationLink(NodeId, NodeId),
    #[error("Graph node {0} is not a satellite")]
    NonSatelliteNode(NodeId),
    #[error("Self-loop on satellite {0}")]
    SelfLoop(NodeId),
    #[error("ISL {0} - {1} listed more than once")]
    DuplicateIsl(NodeId, NodeId),
    #[error("Invalid ISL length between {0} and {1}: {2}")]
    InvalidLinkWeight(NodeId, NodeId, f64),
    #[error("No interface from {0} towards {1}")]
    MissingInterface(NodeId, NodeId),
    #[error("Interface map covers {actual} satellites, expected {expected}")]
    InterfaceMapSize { expected: usize, actual: usize },
    #[error("Visibility lists for {actual} ground stations, expected {expected}")]
    VisibilityCountMismatch { expected: usize, actual: usize },
    #[error("Ground station {ground_station} sees unknown satellite {satellite}")]
    UnknownVisibleSatellite { ground_station: usize, satellite: NodeId },
    #[error("Ground station {ground_station} has invalid access distance {distance_m} to satellite {satellite}")]
    InvalidAccessDistance {
        ground_station: usize,
        satellite: NodeId,
        distance_m: f64,
    },
}

/// Undirected ISL graph weighted by link length (metres)
#[derive(Debug, Clone)]
pub struct BackboneGraph {
    graph: UnGraphMap<NodeId, f64>,
}

impl BackboneGraph {
    pub fn new() -> Self {
        Self {
            graph: UnGraphMap::new(),
        }
    }

    /// Graph with satellites `0..num_satellites` and no links yet
    pub fn with_satellites(num_satellites: usize) -> Self {
        let mut backbone = Self::new();
        for sid in 0..num_satellites {
            backbone.add_node(sid);
        }
        backbone
    }

    pub fn add_node(&mut self, id: NodeId) {
        self.graph.add_node(id);
    }

    /// Add an ISL. Re-adding an existing pair keeps the shorter length.
    pub fn add_isl(&mut self, a: NodeId, b: NodeId, length_m: f64) {
        let length_m = match self.graph.edge_weight(a, b) {
            Some(&existing) if existing <= length_m => existing,
            _ => length_m,
        };
        self.graph.add_edge(a, b, length_m);
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn isl_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.nodes()
    }

    /// Direct backbone neighbours (empty for unknown nodes)
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.neighbors(id)
    }

    pub fn isls(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        self.graph.all_edges().map(|(a, b, w)| (a, b, *w))
    }
}

impl Default for BackboneGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Local interface indices of every ISL endpoint
///
/// A satellite numbers its ISL interfaces `0..isl_count`; its single GSL
/// interface comes right after, at index `isl_count`.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceMap {
    by_pair: HashMap<(NodeId, NodeId), InterfaceId>,
    isl_counts: Vec<InterfaceId>,
}

impl InterfaceMap {
    pub fn new(num_satellites: usize) -> Self {
        Self {
            by_pair: HashMap::new(),
            isl_counts: vec![0; num_satellites],
        }
    }

    /// Assign interfaces in ISL list order: for `(a, b)`, `a` gets its next
    /// free index towards `b` and `b` its next free index towards `a`.
    ///
    /// A pair may appear once in either orientation; the backbone holds a
    /// single link per pair, so a repeat would inflate the ISL count.
    pub fn from_isls(
        space: &NodeSpace,
        isls: &[(NodeId, NodeId)],
    ) -> std::result::Result<Self, TopologyError> {
        let mut map = Self::new(space.num_satellites);
        for &(a, b) in isls {
            check_isl_endpoints(space, a, b)?;
            if map.by_pair.contains_key(&(a, b)) {
                return Err(TopologyError::DuplicateIsl(a, b));
            }
            map.assign_next(a, b);
            map.assign_next(b, a);
        }
        Ok(map)
    }

    fn assign_next(&mut self, from: NodeId, to: NodeId) {
        let next = self.isl_counts[from];
        self.by_pair.insert((from, to), next);
        self.isl_counts[from] += 1;
    }

    /// Interface `from` uses to reach its backbone neighbour `to`
    pub fn interface(&self, from: NodeId, to: NodeId) -> Option<InterfaceId> {
        self.by_pair.get(&(from, to)).copied()
    }

    pub fn num_satellites(&self) -> usize {
        self.isl_counts.len()
    }

    /// Number of ISL interfaces of a satellite
    pub fn isl_count(&self, sat: NodeId) -> InterfaceId {
        self.isl_counts.get(sat).copied().unwrap_or(0)
    }

    /// The satellite's GSL interface index
    pub fn gsl_interface(&self, sat: NodeId) -> InterfaceId {
        self.isl_count(sat)
    }
}

/// Both ends must be distinct satellites.
fn check_isl_endpoints(
    space: &NodeSpace,
    a: NodeId,
    b: NodeId,
) -> std::result::Result<(), TopologyError> {
    if let Some(unknown) = [a, b]
        .into_iter()
        .find(|id| !space.is_satellite(*id) && !space.is_ground_station(*id))
    {
        return Err(TopologyError::NonSatelliteNode(unknown));
    }
    if !space.is_satellite(a) || !space.is_satellite(b) {
        return Err(TopologyError::GroundStationLink(a, b));
    }
    if a == b {
        return Err(TopologyError::SelfLoop(a));
    }
    Ok(())
}

/// Check the backbone contains exactly the satellites and nothing else.
pub fn validate_backbone(
    graph: &BackboneGraph,
    space: &NodeSpace,
) -> std::result::Result<(), TopologyError> {
    if graph.node_count() != space.num_satellites {
        return Err(TopologyError::NodeCountMismatch {
            expected: space.num_satellites,
            actual: graph.node_count(),
        });
    }

    for (a, b, length_m) in graph.isls() {
        check_isl_endpoints(space, a, b)?;
        if length_m.is_nan() || length_m < 0.0 {
            return Err(TopologyError::InvalidLinkWeight(a, b, length_m));
        }
    }

    // Isolated ids past S would otherwise slip through the count check
    if let Some(id) = graph.nodes().find(|id| !space.is_satellite(*id)) {
        return Err(TopologyError::NonSatelliteNode(id));
    }

    Ok(())
}

/// Every ISL needs an interface on both of its ends.
pub fn validate_interfaces(
    graph: &BackboneGraph,
    interfaces: &InterfaceMap,
    space: &NodeSpace,
) -> std::result::Result<(), TopologyError> {
    if interfaces.num_satellites() != space.num_satellites {
        return Err(TopologyError::InterfaceMapSize {
            expected: space.num_satellites,
            actual: interfaces.num_satellites(),
        });
    }

    for (a, b, _) in graph.isls() {
        if interfaces.interface(a, b).is_none() {
            return Err(TopologyError::MissingInterface(a, b));
        }
        if interfaces.interface(b, a).is_none() {
            return Err(TopologyError::MissingInterface(b, a));
        }
    }

    Ok(())
}

/// One list per ground station, each naming satellites only.
pub fn validate_visibility(
    visibility: &[Vec<VisibleSatellite>],
    space: &NodeSpace,
) -> std::result::Result<(), TopologyError> {
    if visibility.len() != space.num_ground_stations {
        return Err(TopologyError::VisibilityCountMismatch {
            expected: space.num_ground_stations,
            actual: visibility.len(),
        });
    }

    for (gid, in_range) in visibility.iter().enumerate() {
        for visible in in_range {
            if !space.is_satellite(visible.satellite_id) {
                return Err(TopologyError::UnknownVisibleSatellite {
                    ground_station: gid,
                    satellite: visible.satellite_id,
                });
            }
            if visible.distance_m.is_nan() || visible.distance_m < 0.0 {
                return Err(TopologyError::InvalidAccessDistance {
                    ground_station: gid,
                    satellite: visible.satellite_id,
                    distance_m: visible.distance_m,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize) -> BackboneGraph {
        let mut graph = BackboneGraph::with_satellites(n);
        for i in 0..n {
            graph.add_isl(i, (i + 1) % n, 1000.0);
        }
        graph
    }

    #[test]
    fn test_valid_ring() {
        let space = NodeSpace::new(4, 2);
        assert_eq!(validate_backbone(&ring(4), &space), Ok(()));
    }

    #[test]
    fn test_node_count_mismatch() {
        let space = NodeSpace::new(5, 1);
        let err = validate_backbone(&ring(4), &space).unwrap_err();
        assert_eq!(
            err,
            TopologyError::NodeCountMismatch {
                expected: 5,
                actual: 4
            }
        );
    }

    #[test]
    fn test_ground_station_link_rejected() {
        // Node count still matches S: satellite 2 replaced by ground station 3
        let space = NodeSpace::new(3, 1);
        let mut graph = BackboneGraph::new();
        graph.add_node(0);
        graph.add_node(1);
        graph.add_isl(0, 1, 10.0);
        graph.add_isl(1, 3, 10.0);

        let err = validate_backbone(&graph, &space).unwrap_err();
        assert_eq!(err, TopologyError::GroundStationLink(1, 3));
    }

    #[test]
    fn test_isolated_non_satellite_node_rejected() {
        let space = NodeSpace::new(2, 1);
        let mut graph = BackboneGraph::new();
        graph.add_node(0);
        graph.add_node(7);

        let err = validate_backbone(&graph, &space).unwrap_err();
        assert_eq!(err, TopologyError::NonSatelliteNode(7));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let space = NodeSpace::new(2, 0);
        let mut graph = BackboneGraph::with_satellites(2);
        graph.add_isl(0, 1, -1.0);

        assert!(matches!(
            validate_backbone(&graph, &space),
            Err(TopologyError::InvalidLinkWeight(0, 1, _))
        ));
    }

    #[test]
    fn test_add_isl_keeps_shorter_length() {
        let mut graph = BackboneGraph::with_satellites(2);
        let length = |g: &BackboneGraph| g.isls().next().map(|(_, _, w)| w);

        graph.add_isl(0, 1, 50.0);
        graph.add_isl(1, 0, 80.0);
        assert_eq!(length(&graph), Some(50.0));
        graph.add_isl(0, 1, 20.0);
        assert_eq!(length(&graph), Some(20.0));
        assert_eq!(graph.isl_count(), 1);
    }

    #[test]
    fn test_interfaces_assigned_in_isl_order() {
        let map = InterfaceMap::from_isls(&NodeSpace::new(3, 0), &[(0, 1), (1, 2), (2, 0)]).unwrap();

        assert_eq!(map.interface(0, 1), Some(0));
        assert_eq!(map.interface(1, 0), Some(0));
        assert_eq!(map.interface(1, 2), Some(1));
        assert_eq!(map.interface(2, 1), Some(0));
        assert_eq!(map.interface(2, 0), Some(1));
        assert_eq!(map.interface(0, 2), Some(1));
        assert_eq!(map.interface(0, 0), None);

        assert_eq!(map.isl_count(0), 2);
        assert_eq!(map.gsl_interface(1), 2);
    }

    #[test]
    fn test_interface_map_rejects_ground_station() {
        assert_eq!(
            InterfaceMap::from_isls(&NodeSpace::new(2, 1), &[(0, 2)]),
            Err(TopologyError::GroundStationLink(0, 2))
        );
    }

    #[test]
    fn test_interface_map_rejects_unknown_node() {
        // Node 3 is past the last ground station (2)
        assert_eq!(
            InterfaceMap::from_isls(&NodeSpace::new(2, 1), &[(0, 1), (3, 1)]),
            Err(TopologyError::NonSatelliteNode(3))
        );
    }

    #[test]
    fn test_repeated_isl_rejected() {
        let space = NodeSpace::new(2, 0);
        assert_eq!(
            InterfaceMap::from_isls(&space, &[(0, 1), (1, 0)]),
            Err(TopologyError::DuplicateIsl(1, 0))
        );
        assert_eq!(
            InterfaceMap::from_isls(&space, &[(0, 1), (0, 1)]),
            Err(TopologyError::DuplicateIsl(0, 1))
        );

        // A single listing keeps the GSL interface right after the one ISL
        let map = InterfaceMap::from_isls(&space, &[(0, 1)]).unwrap();
        assert_eq!(map.isl_count(0), 1);
        assert_eq!(map.gsl_interface(0), 1);
    }

    #[test]
    fn test_link_to_unknown_node_named() {
        let space = NodeSpace::new(2, 1);
        let mut graph = BackboneGraph::new();
        graph.add_node(0);
        graph.add_isl(0, 9, 1.0);

        assert_eq!(
            validate_backbone(&graph, &space),
            Err(TopologyError::NonSatelliteNode(9))
        );
    }

    #[test]
    fn test_missing_interface_detected() {
        let space = NodeSpace::new(3, 0);
        let mut graph = BackboneGraph::with_satellites(3);
        graph.add_isl(0, 1, 1.0);
        graph.add_isl(1, 2, 1.0);
        let map = InterfaceMap::from_isls(&space, &[(0, 1)]).unwrap();

        assert_eq!(
            validate_interfaces(&graph, &map, &space),
            Err(TopologyError::MissingInterface(1, 2))
        );
    }

    #[test]
    fn test_visibility_validation() {
        let space = NodeSpace::new(2, 2);
        let ok = vec![vec![VisibleSatellite::new(100.0, 1)], vec![]];
        assert_eq!(validate_visibility(&ok, &space), Ok(()));

        let short = vec![vec![]];
        assert!(matches!(
            validate_visibility(&short, &space),
            Err(TopologyError::VisibilityCountMismatch { .. })
        ));

        let unknown = vec![vec![], vec![VisibleSatellite::new(100.0, 2)]];
        assert_eq!(
            validate_visibility(&unknown, &space),
            Err(TopologyError::UnknownVisibleSatellite {
                ground_station: 1,
                satellite: 2
            })
        );
    }
}
