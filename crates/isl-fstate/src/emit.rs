//! Record writers
//!
//! Two line-oriented streams per epoch, named by the epoch timestamp:
//! - `gsl_if_bandwidth_<t>.txt`: `node_id,isl_count,aggregate_max_bandwidth`,
//!   only populated at `t == 0`
//! - `fstate_<t>.txt`: `src,dst,next_hop,egress_if,ingress_if` per changed pair

use crate::{Constellation, EpochState, FstateChange, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn fstate_file_name(time_since_epoch_ns: u64) -> String {
    format!("fstate_{}.txt", time_since_epoch_ns)
}

pub fn gsl_if_bandwidth_file_name(time_since_epoch_ns: u64) -> String {
    format!("gsl_if_bandwidth_{}.txt", time_since_epoch_ns)
}

/// Interface capacities, satellites then ground stations.
///
/// Ground stations report an ISL count of 0. Nothing is written after the
/// first epoch since one GSL interface per node never changes capacity.
pub fn write_gsl_if_bandwidth<W: Write>(
    mut out: W,
    time_since_epoch_ns: u64,
    constellation: &Constellation,
) -> std::io::Result<()> {
    if time_since_epoch_ns != 0 {
        return Ok(());
    }

    let space = constellation.space();
    for node_id in 0..space.total_nodes() {
        let isl_count = if space.is_satellite(node_id) {
            constellation.interfaces().isl_count(node_id)
        } else {
            0
        };
        writeln!(
            out,
            "{},{},{:.6}",
            node_id,
            isl_count,
            constellation.gsl_interface(node_id).aggregate_max_bandwidth
        )?;
    }

    out.flush()
}

pub fn write_fstate<W: Write>(mut out: W, changes: &[FstateChange]) -> std::io::Result<()> {
    for change in changes {
        writeln!(out, "{}", change)?;
    }
    out.flush()
}

/// Paths written for one epoch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochRecordPaths {
    /// `None` when the interface-capacity record was skipped
    pub gsl_if_bandwidth: Option<PathBuf>,
    pub fstate: PathBuf,
}

/// Write a computed epoch's records into `dir`. The interface-capacity
/// record is only written when `with_gsl_if_bandwidth` is set.
pub fn write_epoch_records(
    dir: &Path,
    constellation: &Constellation,
    state: &EpochState,
    with_gsl_if_bandwidth: bool,
) -> Result<EpochRecordPaths> {
    let t = state.time_since_epoch_ns;

    let gsl_if_bandwidth = if with_gsl_if_bandwidth {
        let path = dir.join(gsl_if_bandwidth_file_name(t));
        debug!("Writing interface bandwidth state to {:?}", path);
        write_gsl_if_bandwidth(BufWriter::new(File::create(&path)?), t, constellation)?;
        Some(path)
    } else {
        None
    };

    let fstate = dir.join(fstate_file_name(t));
    debug!("Writing forwarding state to {:?}", fstate);
    write_fstate(BufWriter::new(File::create(&fstate)?), &state.changes)?;

    Ok(EpochRecordPaths {
        gsl_if_bandwidth,
        fstate,
    })
}
