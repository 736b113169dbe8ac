//! Next-hop decisions
//!
//! Two stages, strictly ordered:
//!
//! 1. Satellite -> ground station: pick the destination satellite offering
//!    the lowest (ISL distance + GSL length), then the neighbour that lies on
//!    a shortest path to it. The chosen cost is cached per (satellite, GS)
//!    in [`GroundReachability`].
//! 2. Ground station -> ground station: pick the source satellite offering
//!    the lowest (GSL length + cached stage 1 cost).
//!
//! Anything unreachable resolves to [`ForwardingEntry::Drop`].

use crate::ranking::best_access_candidate;
use crate::{
    BackboneGraph, DistanceMatrix, InterfaceId, InterfaceMap, NodeId, NodeSpace, TopologyError,
    VisibleSatellite, GROUND_STATION_INTERFACE,
};
use std::fmt;

/// Decision for one (source, destination) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardingEntry {
    /// Undeliverable, rendered as `-1,-1,-1`
    Drop,
    Forward {
        next_hop: NodeId,
        /// Interface on the source
        egress_if: InterfaceId,
        /// Interface on the next hop
        ingress_if: InterfaceId,
    },
}

impl ForwardingEntry {
    pub fn forward(next_hop: NodeId, egress_if: InterfaceId, ingress_if: InterfaceId) -> Self {
        Self::Forward {
            next_hop,
            egress_if,
            ingress_if,
        }
    }

    pub fn is_drop(&self) -> bool {
        matches!(self, Self::Drop)
    }

    pub fn next_hop(&self) -> Option<NodeId> {
        match self {
            Self::Drop => None,
            Self::Forward { next_hop, .. } => Some(*next_hop),
        }
    }
}

impl fmt::Display for ForwardingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drop => write!(f, "-1,-1,-1"),
            Self::Forward {
                next_hop,
                egress_if,
                ingress_if,
            } => write!(f, "{},{},{}", next_hop, egress_if, ingress_if),
        }
    }
}

/// Stage 1 result carried into stage 2: best cost from each satellite to
/// each ground station, `+∞` when it cannot deliver there.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundReachability {
    num_ground_stations: usize,
    distance_m: Vec<f64>,
}

impl GroundReachability {
    pub fn new(space: &NodeSpace) -> Self {
        Self {
            num_ground_stations: space.num_ground_stations,
            distance_m: vec![f64::INFINITY; space.num_satellites * space.num_ground_stations],
        }
    }

    /// Cost from satellite `sat` to ground station index `gid`
    #[inline]
    pub fn distance(&self, sat: NodeId, gid: usize) -> f64 {
        self.distance_m[sat * self.num_ground_stations + gid]
    }

    fn set(&mut self, sat: NodeId, gid: usize, distance_m: f64) {
        self.distance_m[sat * self.num_ground_stations + gid] = distance_m;
    }
}

/// Read-only inputs shared by every decision of one epoch
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub space: &'a NodeSpace,
    pub graph: &'a BackboneGraph,
    pub distances: &'a DistanceMatrix,
    pub interfaces: &'a InterfaceMap,
    pub visibility: &'a [Vec<VisibleSatellite>],
}

impl<'a> DecisionContext<'a> {
    fn interface(&self, from: NodeId, to: NodeId) -> Result<InterfaceId, TopologyError> {
        self.interfaces
            .interface(from, to)
            .ok_or(TopologyError::MissingInterface(from, to))
    }

    /// Next hop from satellite `curr` towards ground station index `dst_gid`,
    /// together with the cost promised by the selected destination satellite.
    pub fn satellite_to_ground_station(
        &self,
        curr: NodeId,
        dst_gid: usize,
    ) -> Result<(ForwardingEntry, f64), TopologyError> {
        let dst_gs_node_id = self.space.ground_station_node(dst_gid);

        let best = best_access_candidate(&self.visibility[dst_gid], |sat| {
            self.distances.get(curr, sat)
        });
        let Some(best) = best else {
            return Ok((ForwardingEntry::Drop, f64::INFINITY));
        };
        let dst_sat = best.satellite_id;

        if curr == dst_sat {
            let entry = ForwardingEntry::forward(
                dst_gs_node_id,
                self.interfaces.gsl_interface(dst_sat),
                GROUND_STATION_INTERFACE,
            );
            return Ok((entry, best.total_cost_m));
        }

        // Any neighbour achieving the matrix-optimal sum lies on a shortest path
        let mut best_hop: Option<(f64, NodeId)> = None;
        for n in self.graph.neighbors(curr) {
            if !self.distances.is_reachable(curr, n) || !self.distances.is_reachable(n, dst_sat) {
                continue;
            }
            let via = self.distances.get(curr, n) + self.distances.get(n, dst_sat);
            let better = match best_hop {
                None => true,
                Some((best_via, best_n)) => via < best_via || (via == best_via && n < best_n),
            };
            if better {
                best_hop = Some((via, n));
            }
        }

        let entry = match best_hop {
            Some((_, n)) => {
                ForwardingEntry::forward(n, self.interface(curr, n)?, self.interface(n, curr)?)
            }
            None => ForwardingEntry::Drop,
        };

        Ok((entry, best.total_cost_m))
    }

    /// Next hop from ground station `src_gid` towards ground station `dst_gid`
    pub fn ground_station_to_ground_station(
        &self,
        reach: &GroundReachability,
        src_gid: usize,
        dst_gid: usize,
    ) -> ForwardingEntry {
        best_access_candidate(&self.visibility[src_gid], |sat| reach.distance(sat, dst_gid))
            .map(|best| {
                ForwardingEntry::forward(
                    best.satellite_id,
                    GROUND_STATION_INTERFACE,
                    self.interfaces.gsl_interface(best.satellite_id),
                )
            })
            .unwrap_or(ForwardingEntry::Drop)
    }

    /// Stage 1 over every (satellite, ground station) pair, ascending.
    ///
    /// Calls `record` with `(src, dst, entry)` per pair.
    pub fn route_satellites_to_ground_stations<F>(
        &self,
        mut record: F,
    ) -> Result<GroundReachability, TopologyError>
    where
        F: FnMut(NodeId, NodeId, ForwardingEntry),
    {
        let mut reach = GroundReachability::new(self.space);
        for curr in self.space.satellites() {
            for dst_gid in 0..self.space.num_ground_stations {
                let (entry, distance_m) = self.satellite_to_ground_station(curr, dst_gid)?;
                reach.set(curr, dst_gid, distance_m);
                record(curr, self.space.ground_station_node(dst_gid), entry);
            }
        }
        Ok(reach)
    }

    /// Stage 2 over every ordered pair of distinct ground stations.
    pub fn route_ground_stations<F>(&self, reach: &GroundReachability, mut record: F)
    where
        F: FnMut(NodeId, NodeId, ForwardingEntry),
    {
        let g = self.space.num_ground_stations;
        for src_gid in 0..g {
            for dst_gid in (0..g).filter(|d| *d != src_gid) {
                let entry = self.ground_station_to_ground_station(reach, src_gid, dst_gid);
                record(
                    self.space.ground_station_node(src_gid),
                    self.space.ground_station_node(dst_gid),
                    entry,
                );
            }
        }
    }
}
