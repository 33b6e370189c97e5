//! In-memory snapshot of all tracked persons

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::{PersonId, PersonRecord, PresenceStatus};

/// Mapping from person id to record
///
/// Ordered so that the serialized form is deterministic: two snapshots with
/// the same content always produce the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: BTreeMap<PersonId, PersonRecord>,
}

/// Per-status tallies over a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub present: usize,
    pub absent: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.present + self.absent + self.unknown
    }

    /// Share of records with unknown status, in whole percent
    pub fn unknown_percent(&self) -> u32 {
        match self.total() {
            0 => 0,
            total => ((self.unknown as f64 / total as f64) * 100.0).round() as u32,
        }
    }
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: PersonId) -> Option<&PersonRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: PersonId) -> Option<&mut PersonRecord> {
        self.records.get_mut(&id)
    }

    pub fn contains(&self, id: PersonId) -> bool {
        self.records.contains_key(&id)
    }

    /// Insert or replace a record, keyed by its own id
    pub fn insert(&mut self, record: PersonRecord) -> Option<PersonRecord> {
        self.records.insert(record.id, record)
    }

    pub fn remove(&mut self, id: PersonId) -> Option<PersonRecord> {
        self.records.remove(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.records.keys().copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &PersonRecord> {
        self.records.values()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut PersonRecord> {
        self.records.values_mut()
    }

    /// Records whose group matches exactly, ordered by location then id
    pub fn records_in_group(&self, group_label: &str) -> Vec<PersonRecord> {
        let mut selected: Vec<PersonRecord> = self
            .records
            .values()
            .filter(|record| record.group_label == group_label)
            .cloned()
            .collect();
        selected.sort_by(|a, b| {
            a.location_label
                .cmp(&b.location_label)
                .then_with(|| a.id.cmp(&b.id))
        });
        selected
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.records
            .values()
            .fold(StatusCounts::default(), |mut counts, record| {
                match record.current_status {
                    PresenceStatus::Present => counts.present += 1,
                    PresenceStatus::Absent => counts.absent += 1,
                    PresenceStatus::Unknown => counts.unknown += 1,
                }
                counts
            })
    }
}

impl FromIterator<PersonRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = PersonRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().map(|record| (record.id, record)).collect(),
        }
    }
}
