//! Presence Core - zone presence domain model
//!
//! This crate holds the pure part of the presence tracker:
//! - Person records and the in-memory snapshot keyed by person id
//! - Zone classification and presence status derivation
//! - The last-write-wins fold over access events
//! - Typed extraction of group/location attributes
//! - Roster merge and status application steps of a refresh cycle
//! - Floor/room partitioning used by presentation layers
//!
//! Nothing in here performs I/O; the `presence-sync` crate drives these
//! functions from the refresh cycle.

pub mod error;
pub mod events;
pub mod fields;
pub mod layout;
pub mod reconcile;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use events::{fold_last_events, parse_time_label};
pub use fields::{AttributeField, AttributeLookup, FieldLookup, FieldMapping, Placement};
pub use layout::FloorPlan;
pub use reconcile::{apply_last_events, merge_roster, MergeStats, PlacedPerson, StatusPolicy};
pub use types::*;
