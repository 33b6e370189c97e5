//! Access backend wire types

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use presence_core::{parse_time_label, AccessEvent, AttributeField, CoreResult, PersonId};

/// Roster row as returned by the staff list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterRow {
    pub id: PersonId,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub division_id: Option<i64>,
    #[serde(default)]
    pub division_name: Option<String>,
}

/// A roster member, before placement is resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PersonId,
    pub name: String,
    pub division_id: Option<i64>,
    pub division_name: Option<String>,
}

impl RosterEntry {
    pub fn new(id: PersonId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            division_id: None,
            division_name: None,
        }
    }
}

impl From<RosterRow> for RosterEntry {
    fn from(row: RosterRow) -> Self {
        let name = [&row.last_name, &row.first_name, &row.middle_name]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            id: row.id,
            name,
            division_id: row.division_id,
            division_name: row.division_name,
        }
    }
}

/// Extended attributes of one person
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonDetail {
    #[serde(default)]
    pub id: Option<PersonId>,
    #[serde(default)]
    pub additional_fields: AdditionalFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdditionalFields {
    #[serde(default)]
    pub text: Option<Vec<AttributeField>>,
}

impl PersonDetail {
    pub fn with_fields(id: PersonId, fields: Vec<AttributeField>) -> Self {
        Self {
            id: Some(id),
            additional_fields: AdditionalFields { text: Some(fields) },
        }
    }

    pub fn attributes(&self) -> &[AttributeField] {
        self.additional_fields.text.as_deref().unwrap_or_default()
    }
}

/// Access event row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    /// Missing for passes by unidentified cards
    #[serde(default)]
    pub user_id: Option<PersonId>,
    pub time_label: String,
    #[serde(default)]
    pub zone_exit: Option<String>,
    #[serde(default)]
    pub zone_enter: Option<String>,
}

impl EventRow {
    pub fn new(user_id: PersonId, time_label: &str, zone_exit: &str, zone_enter: &str) -> Self {
        Self {
            user_id: Some(user_id),
            time_label: time_label.to_string(),
            zone_exit: Some(zone_exit.to_string()),
            zone_enter: Some(zone_enter.to_string()),
        }
    }

    /// Convert to a domain event; `None` when the row names no person
    pub fn to_access_event(&self) -> Option<CoreResult<AccessEvent>> {
        let person_id = self.user_id?;
        Some(parse_time_label(&self.time_label).map(|time| AccessEvent {
            person_id,
            time,
            from_zone: self.zone_exit.clone(),
            to_zone: self.zone_enter.clone(),
        }))
    }
}

/// Events endpoint response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub rows: Option<Vec<EventRow>>,
}

/// Parameters of one events request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub date_begin: NaiveDate,
    pub date_end: NaiveDate,
    pub division_id: i64,
    /// Zone ids, formatted for the backend (e.g. `1, 2`)
    pub zone_ids: String,
    pub row_cap: u32,
}

impl EventQuery {
    /// Window of `days` days ending on `today`; clamps at the earliest
    /// representable date
    pub fn trailing(
        today: NaiveDate,
        days: u32,
        division_id: i64,
        zone_ids: impl Into<String>,
        row_cap: u32,
    ) -> Self {
        Self {
            date_begin: today
                .checked_sub_signed(Duration::days(i64::from(days)))
                .unwrap_or(NaiveDate::MIN),
            date_end: today,
            division_id,
            zone_ids: zone_ids.into(),
            row_cap,
        }
    }

    /// Query string pairs; results are requested newest first
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("dateBegin", self.date_begin.format("%Y-%m-%d").to_string()),
            ("dateEnd", self.date_end.format("%Y-%m-%d").to_string()),
            ("sidx", "time_label".to_string()),
            ("sord", "desc".to_string()),
            ("division", self.division_id.to_string()),
            ("rooms", self.zone_ids.clone()),
            ("rows", self.row_cap.to_string()),
        ]
    }
}
