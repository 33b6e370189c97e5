//! Presence Service
//!
//! Owns the in-memory snapshot and runs the refresh cycle:
//! health check, roster, batched person details, events, merge, persist.
//! At most one cycle runs at a time; a trigger that finds a cycle in
//! flight is dropped, not queued.

use chrono::{DateTime, Local, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use presence_core::{
    apply_last_events, fold_last_events, merge_roster, AccessEvent, MergeStats, PlacedPerson,
    Placement, Snapshot, StatusCounts,
};

use crate::api::{AccessApi, EventQuery, EventRow, RosterEntry};
use crate::config::{SiteConfig, SyncConfig};
use crate::error::SyncResult;
use crate::store::SnapshotStore;

/// Summary of one completed refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    /// Persons returned by the roster call
    pub roster_size: usize,
    /// Persons that resolved to a group and location
    pub placed: usize,
    /// Persons missing the group or location attribute
    pub unplaced: usize,
    /// Persons whose detail request failed
    pub failed: usize,
    /// Event rows returned by the backend
    pub event_rows: usize,
    /// Rows dropped for a missing person id or unreadable timestamp
    pub dropped_events: usize,
    /// Snapshot records that received a last event
    pub persons_with_events: usize,
    pub merge: MergeStats,
    pub counts: StatusCounts,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl CycleReport {
    fn log(&self) {
        info!(
            roster = self.roster_size,
            placed = self.placed,
            unplaced = self.unplaced,
            failed = self.failed,
            event_rows = self.event_rows,
            dropped_events = self.dropped_events,
            persons_with_events = self.persons_with_events,
            inserted = self.merge.inserted,
            updated = self.merge.updated,
            removed = self.merge.removed,
            present = self.counts.present,
            absent = self.counts.absent,
            unknown = self.counts.unknown,
            unknown_percent = self.counts.unknown_percent(),
            duration_ms = self.duration_ms,
            "Refresh cycle completed"
        );
    }
}

/// Result of a refresh request
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Another cycle was already running
    Skipped,
    Completed(CycleReport),
    /// The cycle stopped early; the message is the cause
    Failed(String),
}

impl RefreshOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, RefreshOutcome::Skipped)
    }

    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            RefreshOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Clears the updating flag when the cycle ends, however it ends
struct UpdateGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> UpdateGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

enum DetailOutcome {
    Placed(PlacedPerson),
    Unplaced,
    Failed,
}

#[derive(Default)]
struct Placements {
    placed: Vec<PlacedPerson>,
    unplaced: usize,
    failed: usize,
}

/// Presence tracking service
pub struct PresenceService {
    pub(crate) api: Arc<dyn AccessApi>,
    pub(crate) store: Arc<dyn SnapshotStore>,
    pub(crate) site: SiteConfig,
    pub(crate) sync: SyncConfig,
    pub(crate) snapshot: RwLock<Snapshot>,
    updating: AtomicBool,
    last_successful_update: RwLock<Option<DateTime<Utc>>>,
}

impl PresenceService {
    pub fn new(
        api: Arc<dyn AccessApi>,
        store: Arc<dyn SnapshotStore>,
        site: SiteConfig,
        sync: SyncConfig,
    ) -> Self {
        Self {
            api,
            store,
            site,
            sync,
            snapshot: RwLock::new(Snapshot::new()),
            updating: AtomicBool::new(false),
            last_successful_update: RwLock::new(None),
        }
    }

    /// Load the durable snapshot into memory
    ///
    /// The store's modification time becomes the last update time.
    /// Returns the number of records loaded.
    pub async fn load(&self) -> SyncResult<usize> {
        let snapshot = self.store.read().await?;
        let modified = self.store.last_modified().await?;
        let count = snapshot.len();

        *self.snapshot.write().await = snapshot;
        *self.last_successful_update.write().await = modified;

        info!(records = count, last_update = ?modified, "Snapshot loaded from store");
        Ok(count)
    }

    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    /// Time of the last successful persist, if any
    pub async fn last_update_time(&self) -> Option<DateTime<Utc>> {
        *self.last_successful_update.read().await
    }

    /// Copy of the in-memory snapshot
    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Start a refresh in the background and return immediately
    pub fn trigger_refresh(self: &Arc<Self>) -> JoinHandle<RefreshOutcome> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.refresh().await })
    }

    /// Run one refresh cycle unless one is already running
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = UpdateGuard::try_acquire(&self.updating) else {
            warn!("Update already in progress, skipping");
            return RefreshOutcome::Skipped;
        };

        match self.run_cycle().await {
            Ok(report) => {
                report.log();
                RefreshOutcome::Completed(report)
            }
            Err(e) => {
                error!(error = %e, "Refresh cycle failed");
                RefreshOutcome::Failed(e.to_string())
            }
        }
    }

    async fn run_cycle(&self) -> SyncResult<CycleReport> {
        let started = Instant::now();
        info!("Starting refresh cycle");

        if !self.api.check_server_health().await {
            warn!("Access API health check failed, continuing with data calls");
        }

        let roster = self.api.fetch_roster(self.site.division_id).await?;
        info!(count = roster.len(), "Roster fetched");

        let placements = self.resolve_placements(&roster).await;

        let query = EventQuery::trailing(
            Local::now().date_naive(),
            self.sync.lookback_days,
            self.site.division_id,
            self.site.zone_ids_param(),
            self.sync.event_row_cap,
        );
        let rows = self.api.fetch_events(&query).await?;
        let (events, dropped_events) = collect_events(&rows);
        let last_events = fold_last_events(events);
        info!(
            rows = rows.len(),
            persons = last_events.len(),
            "Events folded to last event per person"
        );

        let mut working = self.snapshot.read().await.clone();
        let merge = merge_roster(&mut working, &placements.placed);
        let persons_with_events = apply_last_events(
            &mut working,
            &last_events,
            &self.site.zones,
            self.sync.status_policy,
        );
        let counts = working.status_counts();

        *self.snapshot.write().await = working;

        {
            let current = self.snapshot.read().await;
            self.store.write(&current).await?;
        }

        let completed_at = Utc::now();
        *self.last_successful_update.write().await = Some(completed_at);

        Ok(CycleReport {
            roster_size: roster.len(),
            placed: placements.placed.len(),
            unplaced: placements.unplaced,
            failed: placements.failed,
            event_rows: rows.len(),
            dropped_events,
            persons_with_events,
            merge,
            counts,
            duration_ms: started.elapsed().as_millis() as u64,
            completed_at,
        })
    }

    /// Fetch details batch by batch; members of a batch run concurrently
    async fn resolve_placements(&self, roster: &[RosterEntry]) -> Placements {
        let mut placements = Placements::default();
        let batch_size = self.sync.batch_size.max(1);

        for (index, batch) in roster.chunks(batch_size).enumerate() {
            debug!(batch = index, size = batch.len(), "Fetching person details");

            let outcomes = join_all(batch.iter().map(|entry| self.resolve_person(entry))).await;
            for outcome in outcomes {
                match outcome {
                    DetailOutcome::Placed(person) => placements.placed.push(person),
                    DetailOutcome::Unplaced => placements.unplaced += 1,
                    DetailOutcome::Failed => placements.failed += 1,
                }
            }
        }

        info!(
            placed = placements.placed.len(),
            unplaced = placements.unplaced,
            failed = placements.failed,
            "Person details resolved"
        );
        placements
    }

    async fn resolve_person(&self, entry: &RosterEntry) -> DetailOutcome {
        let detail = match self.api.fetch_person_detail(entry.id).await {
            Ok(detail) => detail,
            Err(e) => {
                error!(id = entry.id, error = %e, "Failed to fetch person detail");
                return DetailOutcome::Failed;
            }
        };

        match self.site.fields.place(detail.attributes()) {
            Placement::Placed {
                group_label,
                location_label,
            } => DetailOutcome::Placed(PlacedPerson {
                id: entry.id,
                name: entry.name.clone(),
                group_label,
                location_label,
            }),
            Placement::Unplaced { missing } => {
                debug!(id = entry.id, ?missing, "Person has no placement, skipped");
                DetailOutcome::Unplaced
            }
        }
    }
}

/// Convert rows to events, counting the rows that cannot be used
fn collect_events(rows: &[EventRow]) -> (Vec<AccessEvent>, usize) {
    let mut dropped = 0;
    let events = rows
        .iter()
        .filter_map(|row| match row.to_access_event() {
            Some(Ok(event)) => Some(event),
            Some(Err(e)) => {
                warn!(user_id = ?row.user_id, error = %e, "Dropping event row");
                dropped += 1;
                None
            }
            None => {
                dropped += 1;
                None
            }
        })
        .collect();
    (events, dropped)
}
