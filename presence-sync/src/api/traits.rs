//! Access backend trait

use async_trait::async_trait;

use presence_core::PersonId;

use super::types::{EventQuery, EventRow, PersonDetail, RosterEntry};
use crate::error::ApiResult;

/// Access backend operations used by a refresh cycle
///
/// Implementations own authentication: an expired token is repaired as a
/// side effect of the call that detected it, and that call still fails.
#[async_trait]
pub trait AccessApi: Send + Sync {
    /// Check the backend and repair the token if it expired
    ///
    /// Never fails; returns whether the backend answered successfully.
    async fn check_server_health(&self) -> bool;

    /// All active members of a division
    async fn fetch_roster(&self, division_id: i64) -> ApiResult<Vec<RosterEntry>>;

    /// Extended attributes of one person
    async fn fetch_person_detail(&self, id: PersonId) -> ApiResult<PersonDetail>;

    /// Event rows for a window, newest first
    async fn fetch_events(&self, query: &EventQuery) -> ApiResult<Vec<EventRow>>;
}
