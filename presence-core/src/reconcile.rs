//! Roster merge and status application
//!
//! A refresh cycle rebuilds the snapshot from the authoritative roster:
//! ids missing from the roster are removed, new ids are inserted, and
//! existing ids get their identity and placement overwritten. Event-derived
//! fields are then recomputed from the folded last events.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::{AccessEvent, PersonId, PersonRecord, Snapshot, ZoneClassification};

/// A roster member that resolved to a group and location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedPerson {
    pub id: PersonId,
    pub name: String,
    pub group_label: String,
    pub location_label: String,
}

/// What happens to event-derived fields of persons without a new event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Clear every record's event and status before applying new events,
    /// so a person with no event in the window is always `unknown`
    #[default]
    ResetEachCycle,
    /// Keep whatever event and status survived from the previous cycle
    RetainPrevious,
}

impl FromStr for StatusPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reset" | "reset_each_cycle" => Ok(StatusPolicy::ResetEachCycle),
            "retain" | "retain_previous" => Ok(StatusPolicy::RetainPrevious),
            other => Err(CoreError::InvalidPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for StatusPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusPolicy::ResetEachCycle => write!(f, "reset"),
            StatusPolicy::RetainPrevious => write!(f, "retain"),
        }
    }
}

/// Counters from a roster merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Reconcile the snapshot against the roster of this cycle
pub fn merge_roster(snapshot: &mut Snapshot, roster: &[PlacedPerson]) -> MergeStats {
    let mut stats = MergeStats::default();
    let mut stale: HashSet<PersonId> = snapshot.ids().collect();

    for person in roster {
        stale.remove(&person.id);

        match snapshot.get_mut(person.id) {
            Some(record) => {
                record.name = person.name.clone();
                record.group_label = person.group_label.clone();
                record.location_label = person.location_label.clone();
                stats.updated += 1;
            }
            None => {
                snapshot.insert(PersonRecord::new(
                    person.id,
                    person.name.clone(),
                    person.group_label.clone(),
                    person.location_label.clone(),
                ));
                stats.inserted += 1;
            }
        }
    }

    for id in stale {
        snapshot.remove(id);
        stats.removed += 1;
    }

    stats
}

/// Set last events and recompute statuses
///
/// Events for ids that are not in the snapshot are ignored. Returns the
/// number of records that received an event.
pub fn apply_last_events(
    snapshot: &mut Snapshot,
    last_events: &HashMap<PersonId, AccessEvent>,
    zones: &ZoneClassification,
    policy: StatusPolicy,
) -> usize {
    if policy == StatusPolicy::ResetEachCycle {
        snapshot.records_mut().for_each(PersonRecord::clear_event);
    }

    let mut applied = 0;
    for (id, event) in last_events {
        if let Some(record) = snapshot.get_mut(*id) {
            let last_event = event.to_last_event();
            record.current_status = zones.derive_status(Some(&last_event));
            record.last_event = Some(last_event);
            applied += 1;
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PresenceStatus;
    use chrono::NaiveDate;

    fn placed(id: PersonId, location: &str) -> PlacedPerson {
        PlacedPerson {
            id,
            name: format!("Person {}", id),
            group_label: "Hall 1".to_string(),
            location_label: location.to_string(),
        }
    }

    fn entered(id: PersonId, zone: &str) -> AccessEvent {
        AccessEvent {
            person_id: id,
            time: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            from_zone: None,
            to_zone: Some(zone.to_string()),
        }
    }

    fn zones() -> ZoneClassification {
        ZoneClassification::new(["Hall 1"], ["Outside"])
    }

    #[test]
    fn test_merge_inserts_updates_and_removes() {
        let mut snapshot: Snapshot = [
            PersonRecord::new(1, "Old name", "Hall 2", "999"),
            PersonRecord::new(2, "Gone", "Hall 1", "101"),
        ]
        .into_iter()
        .collect();

        let stats = merge_roster(&mut snapshot, &[placed(1, "101"), placed(3, "205")]);

        assert_eq!(
            stats,
            MergeStats {
                inserted: 1,
                updated: 1,
                removed: 1
            }
        );
        assert_eq!(snapshot.ids().collect::<Vec<_>>(), vec![1, 3]);
        let record = snapshot.get(1).unwrap();
        assert_eq!(record.name, "Person 1");
        assert_eq!(record.group_label, "Hall 1");
        assert_eq!(record.location_label, "101");
    }

    #[test]
    fn test_merge_keeps_event_fields_of_existing_records() {
        let mut snapshot = Snapshot::new();
        merge_roster(&mut snapshot, &[placed(1, "101")]);
        apply_last_events(
            &mut snapshot,
            &HashMap::from([(1, entered(1, "Hall 1"))]),
            &zones(),
            StatusPolicy::ResetEachCycle,
        );

        merge_roster(&mut snapshot, &[placed(1, "102")]);
        let record = snapshot.get(1).unwrap();
        assert_eq!(record.current_status, PresenceStatus::Present);
        assert!(record.last_event.is_some());
    }

    #[test]
    fn test_apply_ignores_unknown_ids() {
        let mut snapshot = Snapshot::new();
        merge_roster(&mut snapshot, &[placed(1, "101")]);

        let applied = apply_last_events(
            &mut snapshot,
            &HashMap::from([(1, entered(1, "Outside")), (42, entered(42, "Hall 1"))]),
            &zones(),
            StatusPolicy::ResetEachCycle,
        );

        assert_eq!(applied, 1);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(1).unwrap().current_status, PresenceStatus::Absent);
    }

    #[test]
    fn test_reset_policy_clears_stale_status() {
        let mut snapshot = Snapshot::new();
        merge_roster(&mut snapshot, &[placed(1, "101")]);
        let events = HashMap::from([(1, entered(1, "Hall 1"))]);
        apply_last_events(&mut snapshot, &events, &zones(), StatusPolicy::ResetEachCycle);

        apply_last_events(&mut snapshot, &HashMap::new(), &zones(), StatusPolicy::ResetEachCycle);

        let record = snapshot.get(1).unwrap();
        assert_eq!(record.current_status, PresenceStatus::Unknown);
        assert!(record.last_event.is_none());
    }

    #[test]
    fn test_retain_policy_keeps_previous_status() {
        let mut snapshot = Snapshot::new();
        merge_roster(&mut snapshot, &[placed(1, "101")]);
        let events = HashMap::from([(1, entered(1, "Hall 1"))]);
        apply_last_events(&mut snapshot, &events, &zones(), StatusPolicy::RetainPrevious);

        apply_last_events(&mut snapshot, &HashMap::new(), &zones(), StatusPolicy::RetainPrevious);

        assert_eq!(snapshot.get(1).unwrap().current_status, PresenceStatus::Present);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("reset".parse::<StatusPolicy>().unwrap(), StatusPolicy::ResetEachCycle);
        assert_eq!(" Retain ".parse::<StatusPolicy>().unwrap(), StatusPolicy::RetainPrevious);
        assert!("sometimes".parse::<StatusPolicy>().is_err());
        assert_eq!(StatusPolicy::default().to_string(), "reset");
    }
}
