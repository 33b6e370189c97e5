//! Access backend integration
//!
//! The engine talks to the backend only through the [`AccessApi`] trait.
//! [`HttpAccessApi`] is the production implementation; [`MockAccessApi`]
//! serves scripted data for tests and dry runs.

mod client;
mod mock;
mod traits;
mod types;

pub use client::{paths, HttpAccessApi};
pub use mock::MockAccessApi;
pub use traits::AccessApi;
pub use types::{EventQuery, EventRow, PersonDetail, RosterEntry, RosterRow};
