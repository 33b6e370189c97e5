//! Floor/room partitioning for presentation
//!
//! Records are grouped by the first character of their location (the floor)
//! and then by the full location (the room). Records without a location are
//! left out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::PersonRecord;

/// Records partitioned by floor, then room
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FloorPlan {
    floors: BTreeMap<String, BTreeMap<String, Vec<PersonRecord>>>,
}

impl FloorPlan {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = PersonRecord>,
    {
        let mut floors: BTreeMap<String, BTreeMap<String, Vec<PersonRecord>>> = BTreeMap::new();

        for record in records {
            let Some(floor) = record.partition_key() else {
                continue;
            };
            floors
                .entry(floor.to_string())
                .or_default()
                .entry(record.location_label.clone())
                .or_default()
                .push(record);
        }

        Self { floors }
    }

    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }

    pub fn floors(&self) -> impl Iterator<Item = &str> {
        self.floors.keys().map(String::as_str)
    }

    pub fn rooms(&self, floor: &str) -> Option<&BTreeMap<String, Vec<PersonRecord>>> {
        self.floors.get(floor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, Vec<PersonRecord>>)> {
        self.floors.iter()
    }

    /// Total number of records placed on the plan
    pub fn record_count(&self) -> usize {
        self.floors
            .values()
            .flat_map(|rooms| rooms.values())
            .map(Vec::len)
            .sum()
    }
}
