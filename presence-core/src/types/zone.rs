//! Zone classification and status derivation

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::record::{LastEvent, PresenceStatus};

/// Static classification of zone names
///
/// Entry zones are monitored areas a person arrives into; exit zones are
/// unmonitored territory. The sets may overlap, in which case entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneClassification {
    /// Zones that mean "present"
    pub entry: BTreeSet<String>,
    /// Zones that mean "absent"
    pub exit: BTreeSet<String>,
}

impl ZoneClassification {
    /// Build a classification from any string iterables
    pub fn new<E, X>(entry: E, exit: X) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        X: IntoIterator,
        X::Item: Into<String>,
    {
        Self {
            entry: entry.into_iter().map(Into::into).collect(),
            exit: exit.into_iter().map(Into::into).collect(),
        }
    }

    /// Classify a destination zone
    pub fn classify_zone(&self, zone: &str) -> PresenceStatus {
        if self.entry.contains(zone) {
            return PresenceStatus::Present;
        }
        if self.exit.contains(zone) {
            return PresenceStatus::Absent;
        }
        PresenceStatus::Unknown
    }

    /// Derive a status from a person's last event
    ///
    /// Only the destination zone is consulted.
    pub fn derive_status(&self, last_event: Option<&LastEvent>) -> PresenceStatus {
        last_event
            .and_then(|event| event.to_zone.as_deref())
            .map(|zone| self.classify_zone(zone))
            .unwrap_or(PresenceStatus::Unknown)
    }
}
