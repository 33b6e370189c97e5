//! Person records

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a tracked person, as issued by the access backend
pub type PersonId = i64;

/// Presence state derived from the most recent access event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// Last seen entering a monitored area
    Present,
    /// Last seen leaving into unmonitored territory
    Absent,
    /// No qualifying event, or the destination zone is not classified
    #[default]
    Unknown,
}

impl PresenceStatus {
    /// Name used in logs and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Present => "present",
            PresenceStatus::Absent => "absent",
            PresenceStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The most recent access event recorded for a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastEvent {
    /// Event time as reported by the backend (backend local time)
    pub time: NaiveDateTime,
    /// Zone the person passed out of
    pub from_zone: Option<String>,
    /// Zone the person passed into; the only zone used for classification
    pub to_zone: Option<String>,
}

/// One tracked individual
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Unique key, stable across refreshes
    pub id: PersonId,
    /// Display name
    pub name: String,
    /// Subgroup used for read filtering (e.g. a building)
    pub group_label: String,
    /// Sub-unit within the group (e.g. a room code); first character is the
    /// coarse partition key
    pub location_label: String,
    /// Latest event inside the lookback window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_event: Option<LastEvent>,
    /// Derived from `last_event`, never set from anywhere else
    #[serde(default)]
    pub current_status: PresenceStatus,
}

impl PersonRecord {
    /// Create a record with no event history
    pub fn new(
        id: PersonId,
        name: impl Into<String>,
        group_label: impl Into<String>,
        location_label: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            group_label: group_label.into(),
            location_label: location_label.into(),
            last_event: None,
            current_status: PresenceStatus::Unknown,
        }
    }

    /// Coarse partition key: the first character of the location
    pub fn partition_key(&self) -> Option<char> {
        self.location_label.chars().next()
    }

    /// Drop event-derived state
    pub fn clear_event(&mut self) {
        self.last_event = None;
        self.current_status = PresenceStatus::Unknown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&PresenceStatus::Present).unwrap();
        assert_eq!(json, "\"present\"");

        let status: PresenceStatus = serde_json::from_str("\"absent\"").unwrap();
        assert_eq!(status, PresenceStatus::Absent);
        assert_eq!(PresenceStatus::default(), PresenceStatus::Unknown);
    }

    #[test]
    fn test_partition_key() {
        let record = PersonRecord::new(1, "Ivanov Ivan", "Hall 1", "305a");
        assert_eq!(record.partition_key(), Some('3'));

        let empty = PersonRecord::new(2, "Petrov Petr", "Hall 1", "");
        assert_eq!(empty.partition_key(), None);
    }

    #[test]
    fn test_record_without_event_omits_field() {
        let record = PersonRecord::new(7, "Sidorova Anna", "Hall 2", "101");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("last_event").is_none());
        assert_eq!(json["current_status"], "unknown");
    }
}
