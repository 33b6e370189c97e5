//! Access events

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::record::{LastEvent, PersonId};

/// A single pass through a controlled zone boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    /// Person who passed
    pub person_id: PersonId,
    /// Event time (backend local time)
    pub time: NaiveDateTime,
    /// Zone left
    pub from_zone: Option<String>,
    /// Zone entered
    pub to_zone: Option<String>,
}

impl AccessEvent {
    /// The stored form of this event on a person record
    pub fn to_last_event(&self) -> LastEvent {
        LastEvent {
            time: self.time,
            from_zone: self.from_zone.clone(),
            to_zone: self.to_zone.clone(),
        }
    }
}
