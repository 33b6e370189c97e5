//! Core type definitions
//!
//! All types follow these naming conventions:
//! - snake_case for serialized field names
//! - `*_label` suffix for free-form strings coming from the access backend
//! - `*_zone` suffix for zone names as reported by access events

mod event;
mod record;
mod snapshot;
mod zone;

pub use event::*;
pub use record::*;
pub use snapshot::*;
pub use zone::*;
