//! Access-link ranking
//!
//! Orders the satellites a ground station can see by total cost:
//! GSL length plus the satellite's cost to some reference (another
//! satellite, or a destination ground station). Ties go to the lowest
//! satellite id so the selection never depends on list order.

use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A satellite currently in GSL range of a ground station
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleSatellite {
    /// GSL length in metres
    pub distance_m: f64,
    pub satellite_id: NodeId,
}

impl VisibleSatellite {
    pub fn new(distance_m: f64, satellite_id: NodeId) -> Self {
        Self {
            distance_m,
            satellite_id,
        }
    }
}

impl From<(f64, NodeId)> for VisibleSatellite {
    fn from((distance_m, satellite_id): (f64, NodeId)) -> Self {
        Self::new(distance_m, satellite_id)
    }
}

/// A reachable access satellite with its total cost
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessCandidate {
    pub satellite_id: NodeId,
    pub total_cost_m: f64,
}

impl AccessCandidate {
    /// Ascending by (cost, satellite id)
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.total_cost_m
            .total_cmp(&other.total_cost_m)
            .then(self.satellite_id.cmp(&other.satellite_id))
    }
}

fn candidate<F>(visible: &VisibleSatellite, reference_cost: &F) -> Option<AccessCandidate>
where
    F: Fn(NodeId) -> f64,
{
    let cost = reference_cost(visible.satellite_id);
    cost.is_finite().then(|| AccessCandidate {
        satellite_id: visible.satellite_id,
        total_cost_m: cost + visible.distance_m,
    })
}

/// Lowest-ranked candidate among those with a finite reference cost.
///
/// `None` when nothing in range can reach the reference.
pub fn best_access_candidate<F>(visible: &[VisibleSatellite], reference_cost: F) -> Option<AccessCandidate>
where
    F: Fn(NodeId) -> f64,
{
    visible
        .iter()
        .filter_map(|v| candidate(v, &reference_cost))
        .min_by(AccessCandidate::rank_cmp)
}
