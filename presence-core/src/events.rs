//! Access event processing
//!
//! The backend returns events newest-first. They are re-sorted oldest-first
//! (stable) and folded into a map, so each later insert overwrites an earlier
//! one and every person ends up with their chronologically last event.
//! Events sharing a timestamp keep their relative response order.

use chrono::{DateTime, NaiveDateTime};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::types::{AccessEvent, PersonId};

const TIME_LABEL_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse an event `time_label` as reported by the access backend
pub fn parse_time_label(label: &str) -> CoreResult<NaiveDateTime> {
    let label = label.trim();

    for format in TIME_LABEL_FORMATS {
        if let Ok(time) = NaiveDateTime::parse_from_str(label, format) {
            return Ok(time);
        }
    }

    DateTime::parse_from_rfc3339(label)
        .map(|time| time.naive_local())
        .map_err(|_| CoreError::InvalidTimestamp(label.to_string()))
}

/// Reduce events to the latest one per person
pub fn fold_last_events<I>(events: I) -> HashMap<PersonId, AccessEvent>
where
    I: IntoIterator<Item = AccessEvent>,
{
    let mut ordered: Vec<AccessEvent> = events.into_iter().collect();
    ordered.sort_by_key(|event| event.time);

    let mut last_events = HashMap::new();
    for event in ordered {
        last_events.insert(event.person_id, event);
    }
    last_events
}
