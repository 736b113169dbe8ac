//! Forwarding table and epoch-to-epoch diffing
//!
//! The full table is always retained as the next epoch's "previous" state;
//! only entries that are new or changed are emitted.

use crate::{ForwardingEntry, NodeId};
use std::collections::BTreeMap;
use std::fmt;

/// Complete forwarding state of one epoch, keyed by (source, destination)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardingTable {
    entries: BTreeMap<(NodeId, NodeId), ForwardingEntry>,
}

impl ForwardingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: NodeId, destination: NodeId) -> Option<ForwardingEntry> {
        self.entries.get(&(source, destination)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending (source, destination) order
    pub fn iter(&self) -> impl Iterator<Item = ((NodeId, NodeId), ForwardingEntry)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    pub fn drop_count(&self) -> usize {
        self.iter().filter(|(_, entry)| entry.is_drop()).count()
    }

    fn insert(&mut self, source: NodeId, destination: NodeId, entry: ForwardingEntry) {
        self.entries.insert((source, destination), entry);
    }
}

/// One line of the forwarding-state record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FstateChange {
    pub source: NodeId,
    pub destination: NodeId,
    pub entry: ForwardingEntry,
}

impl fmt::Display for FstateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.source, self.destination, self.entry)
    }
}

/// Result of one epoch: the full table plus what changed against the previous one
#[derive(Debug, Clone, PartialEq)]
pub struct EpochState {
    pub time_since_epoch_ns: u64,
    pub table: ForwardingTable,
    /// In computation order: satellite -> GS pairs, then GS -> GS pairs
    pub changes: Vec<FstateChange>,
}

impl EpochState {
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }
}

/// Accumulates an epoch's entries against the previous table
#[derive(Debug)]
pub struct StateDiffer<'a> {
    previous: Option<&'a ForwardingTable>,
    table: ForwardingTable,
    changes: Vec<FstateChange>,
}

impl<'a> StateDiffer<'a> {
    /// `previous` is `None` at the first epoch, in which case everything is emitted
    pub fn new(previous: Option<&'a ForwardingTable>) -> Self {
        Self {
            previous,
            table: ForwardingTable::new(),
            changes: Vec::new(),
        }
    }

    pub fn record(&mut self, source: NodeId, destination: NodeId, entry: ForwardingEntry) {
        let unchanged = self
            .previous
            .and_then(|prev| prev.get(source, destination))
            .is_some_and(|prev_entry| prev_entry == entry);
        if !unchanged {
            self.changes.push(FstateChange {
                source,
                destination,
                entry,
            });
        }
        self.table.insert(source, destination, entry);
    }

    pub fn finish(self, time_since_epoch_ns: u64) -> EpochState {
        EpochState {
            time_since_epoch_ns,
            table: self.table,
            changes: self.changes,
        }
    }
}
