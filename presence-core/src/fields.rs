//! Attribute field extraction
//!
//! Person details carry a free-form list of labelled attributes. Group and
//! location are picked out of that list by configured field names.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One labelled attribute of a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeField {
    pub name: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl AttributeField {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
        }
    }
}

/// Result of looking a field up by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLookup<'a> {
    /// Field present with a non-empty value
    Found(&'a str),
    /// Field missing, or present with an empty value
    Absent,
}

impl<'a> FieldLookup<'a> {
    pub fn value(self) -> Option<&'a str> {
        match self {
            FieldLookup::Found(value) => Some(value),
            FieldLookup::Absent => None,
        }
    }
}

/// Name-indexed view over an attribute list
///
/// When a name repeats, the last occurrence wins, even if it is empty.
#[derive(Debug, Default)]
pub struct AttributeLookup<'a> {
    values: HashMap<&'a str, Option<&'a str>>,
}

impl<'a> AttributeLookup<'a> {
    pub fn new(fields: &'a [AttributeField]) -> Self {
        let values = fields
            .iter()
            .map(|field| {
                let text = field.text.as_deref().filter(|text| !text.is_empty());
                (field.name.as_str(), text)
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> FieldLookup<'a> {
        match self.values.get(name) {
            Some(Some(value)) => FieldLookup::Found(value),
            _ => FieldLookup::Absent,
        }
    }
}

/// Field names that carry a person's group and location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub group_field: String,
    pub location_field: String,
}

impl FieldMapping {
    pub fn new(group_field: impl Into<String>, location_field: impl Into<String>) -> Self {
        Self {
            group_field: group_field.into(),
            location_field: location_field.into(),
        }
    }

    /// Resolve a person's placement from their attribute list
    pub fn place(&self, fields: &[AttributeField]) -> Placement {
        let lookup = AttributeLookup::new(fields);

        match (lookup.get(&self.group_field), lookup.get(&self.location_field)) {
            (FieldLookup::Found(group), FieldLookup::Found(location)) => Placement::Placed {
                group_label: group.to_string(),
                location_label: location.to_string(),
            },
            (group, location) => {
                let mut missing = Vec::new();
                if group == FieldLookup::Absent {
                    missing.push(self.group_field.clone());
                }
                if location == FieldLookup::Absent {
                    missing.push(self.location_field.clone());
                }
                Placement::Unplaced { missing }
            }
        }
    }
}

/// Where a person lives, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Placed {
        group_label: String,
        location_label: String,
    },
    /// At least one required field is absent; the person is not tracked
    Unplaced { missing: Vec<String> },
}
