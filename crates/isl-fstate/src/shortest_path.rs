//! Dense all-pairs shortest paths over the satellite backbone
//!
//! Floyd-Warshall on an owned row-major S×S matrix. The decision stage
//! needs random access to any satellite pair's distance, never the paths
//! themselves, so O(S³) time and O(S²) memory per epoch is the trade-off.

use crate::{BackboneGraph, NodeId};
use tracing::debug;

/// Pairwise minimum ISL distance between satellites (metres)
///
/// `+∞` marks unreachable pairs; the diagonal is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Matrix with no links: zero diagonal, infinite elsewhere
    pub fn unconnected(size: usize) -> Self {
        let mut data = vec![f64::INFINITY; size * size];
        for i in 0..size {
            data[i * size + i] = 0.0;
        }
        Self { size, data }
    }

    #[inline]
    pub fn get(&self, from: NodeId, to: NodeId) -> f64 {
        self.data[from * self.size + to]
    }

    #[inline]
    pub fn is_reachable(&self, from: NodeId, to: NodeId) -> bool {
        self.get(from, to).is_finite()
    }

    pub fn row(&self, from: NodeId) -> &[f64] {
        &self.data[from * self.size..(from + 1) * self.size]
    }

    fn relax(&mut self, from: NodeId, to: NodeId, distance: f64) {
        let idx = from * self.size + to;
        if distance < self.data[idx] {
            self.data[idx] = distance;
        }
    }
}

/// Compute all-pairs shortest distances among satellites `0..num_satellites`.
///
/// The graph must already be validated: every ISL endpoint is a satellite.
pub fn floyd_warshall(graph: &BackboneGraph, num_satellites: usize) -> DistanceMatrix {
    let n = num_satellites;
    let mut dist = DistanceMatrix::unconnected(n);

    for (a, b, length_m) in graph.isls() {
        dist.relax(a, b, length_m);
        dist.relax(b, a, length_m);
    }

    let mut via_row = vec![0.0; n];
    for k in 0..n {
        via_row.copy_from_slice(dist.row(k));
        for i in 0..n {
            let d_ik = dist.data[i * n + k];
            if i == k || d_ik.is_infinite() {
                continue;
            }
            let row_i = &mut dist.data[i * n..(i + 1) * n];
            for (d_ij, d_kj) in row_i.iter_mut().zip(via_row.iter()) {
                let through_k = d_ik + d_kj;
                if through_k < *d_ij {
                    *d_ij = through_k;
                }
            }
        }
    }

    debug!(
        "Floyd-Warshall over {} satellites and {} ISLs complete",
        n,
        graph.isl_count()
    );

    dist
}
