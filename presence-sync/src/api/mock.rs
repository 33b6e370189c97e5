//! Scripted access backend

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use presence_core::{AttributeField, PersonId};

use super::traits::AccessApi;
use super::types::{EventQuery, EventRow, PersonDetail, RosterEntry};
use crate::error::{ApiError, ApiResult};

/// In-memory access backend with call counters
pub struct MockAccessApi {
    roster: RwLock<Vec<RosterEntry>>,
    details: RwLock<HashMap<PersonId, PersonDetail>>,
    failing_details: RwLock<HashSet<PersonId>>,
    events: RwLock<Vec<EventRow>>,
    roster_error: RwLock<Option<ApiError>>,
    events_error: RwLock<Option<ApiError>>,
    roster_gate: RwLock<Option<Arc<Notify>>>,
    healthy: RwLock<bool>,
    event_queries: RwLock<Vec<EventQuery>>,
    health_calls: AtomicUsize,
    roster_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    event_calls: AtomicUsize,
}

impl MockAccessApi {
    pub fn new() -> Self {
        Self {
            roster: RwLock::new(Vec::new()),
            details: RwLock::new(HashMap::new()),
            failing_details: RwLock::new(HashSet::new()),
            events: RwLock::new(Vec::new()),
            roster_error: RwLock::new(None),
            events_error: RwLock::new(None),
            roster_gate: RwLock::new(None),
            healthy: RwLock::new(true),
            event_queries: RwLock::new(Vec::new()),
            health_calls: AtomicUsize::new(0),
            roster_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            event_calls: AtomicUsize::new(0),
        }
    }

    /// Add a roster member with the given attributes
    pub async fn add_person(&self, id: PersonId, name: &str, fields: Vec<AttributeField>) {
        self.roster.write().await.push(RosterEntry::new(id, name));
        self.details
            .write()
            .await
            .insert(id, PersonDetail::with_fields(id, fields));
    }

    /// Remove a member from the roster
    pub async fn remove_person(&self, id: PersonId) {
        self.roster.write().await.retain(|entry| entry.id != id);
        self.details.write().await.remove(&id);
    }

    /// Make detail requests for `id` fail with a 500
    pub async fn fail_detail(&self, id: PersonId) {
        self.failing_details.write().await.insert(id);
    }

    pub async fn add_event(&self, row: EventRow) {
        self.events.write().await.push(row);
    }

    pub async fn set_events(&self, rows: Vec<EventRow>) {
        *self.events.write().await = rows;
    }

    pub async fn fail_roster(&self, error: Option<ApiError>) {
        *self.roster_error.write().await = error;
    }

    pub async fn fail_events(&self, error: Option<ApiError>) {
        *self.events_error.write().await = error;
    }

    pub async fn set_healthy(&self, healthy: bool) {
        *self.healthy.write().await = healthy;
    }

    /// Hold roster requests until the returned handle is notified
    pub async fn pause_roster(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.roster_gate.write().await = Some(gate.clone());
        gate
    }

    pub async fn event_queries(&self) -> Vec<EventQuery> {
        self.event_queries.read().await.clone()
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn roster_calls(&self) -> usize {
        self.roster_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn event_calls(&self) -> usize {
        self.event_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockAccessApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccessApi for MockAccessApi {
    async fn check_server_health(&self) -> bool {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        *self.healthy.read().await
    }

    async fn fetch_roster(&self, _division_id: i64) -> ApiResult<Vec<RosterEntry>> {
        self.roster_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.roster_gate.write().await.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = self.roster_error.read().await.clone() {
            return Err(error);
        }
        Ok(self.roster.read().await.clone())
    }

    async fn fetch_person_detail(&self, id: PersonId) -> ApiResult<PersonDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_details.read().await.contains(&id) {
            return Err(ApiError::request_failed(
                format!("/api/users/staff/{}", id),
                500,
                serde_json::json!({ "raw": "internal error" }),
            ));
        }

        self.details.read().await.get(&id).cloned().ok_or_else(|| {
            ApiError::request_failed(
                format!("/api/users/staff/{}", id),
                404,
                serde_json::json!({ "raw": "not found" }),
            )
        })
    }

    async fn fetch_events(&self, query: &EventQuery) -> ApiResult<Vec<EventRow>> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        self.event_queries.write().await.push(query.clone());

        if let Some(error) = self.events_error.read().await.clone() {
            return Err(error);
        }
        Ok(self.events.read().await.clone())
    }
}
