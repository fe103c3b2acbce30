//! Encounter ledger: the ordered list of peers a node has met.
//!
//! Compasses keep the flags they reached, flags keep the compasses that
//! visited them. Records are only ever appended, never reordered or removed,
//! and the ledger lives for as long as the node is powered.

use tracing::{debug, warn};

use crate::protocol::{Course, NodeId};

/// Maximum number of encounters a node can hold.
pub const LEDGER_CAPACITY: usize = 64;

/// One encounter: a peer met on a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterRecord {
    pub course: Course,
    pub peer: NodeId,
}

/// Append-only, insertion-ordered, deduplicating encounter store.
#[derive(Debug, Clone, Default)]
pub struct EncounterLedger {
    records: heapless::Vec<EncounterRecord, LEDGER_CAPACITY>,
}

impl EncounterLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `(course, peer)` unless an equal record already exists.
    ///
    /// Returns `true` only when a record was added; callers use this to decide
    /// whether to acknowledge. A full ledger refuses the record and returns
    /// `false`.
    pub fn record_if_new(&mut self, course: Course, peer: NodeId) -> bool {
        if self.contains(course, &peer) {
            return false;
        }

        match self.records.push(EncounterRecord { course, peer }) {
            Ok(()) => {
                debug!(%course, count = self.records.len(), "encounter recorded");
                true
            }
            Err(rejected) => {
                warn!(
                    course = %rejected.course,
                    peer = %rejected.peer,
                    capacity = self.capacity(),
                    "ledger full, encounter dropped"
                );
                false
            }
        }
    }

    pub fn contains(&self, course: Course, peer: &NodeId) -> bool {
        self.records
            .iter()
            .any(|record| record.course == course && record.peer == *peer)
    }

    /// All records in the order they were first seen.
    ///
    /// Call again to restart from the beginning.
    pub fn iter_in_order(&self) -> core::slice::Iter<'_, EncounterRecord> {
        self.records.iter()
    }

    /// Records for one course, in ledger order.
    pub fn iter_course(
        &self,
        course: Course,
    ) -> impl Iterator<Item = &EncounterRecord> + Clone + '_ {
        self.iter_in_order().filter(move |record| record.course == course)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        LEDGER_CAPACITY
    }
}
