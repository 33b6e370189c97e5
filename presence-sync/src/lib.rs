//! # Presence Sync
//!
//! Keeps a local snapshot of who is inside the monitored zones, rebuilt
//! periodically from an external access-control backend.
//!
//! A refresh cycle pulls the roster of one division, resolves each person's
//! group and location from their attribute list, folds the access events of
//! a trailing window to the last event per person, and derives a presence
//! status from the destination zone of that event. The result replaces the
//! in-memory snapshot and is written to a durable file.
//!
//! ## Components
//!
//! - [`api`]: access backend client (HTTP, with token refresh) and a mock
//! - [`store`]: snapshot file and credential file
//! - [`engine`]: the service and its refresh cycle
//! - [`read`]: group reads that stay consistent during a refresh
//! - [`runner`]: the periodic scheduler

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod read;
pub mod runner;
pub mod store;

pub use api::{AccessApi, EventQuery, EventRow, HttpAccessApi, MockAccessApi, PersonDetail, RosterEntry};
pub use config::{AccessApiConfig, PresenceConfig, SiteConfig, SyncConfig, TOKEN_ENV_KEY};
pub use engine::{CycleReport, PresenceService, RefreshOutcome};
pub use error::{
    ApiError, ApiResult, ConfigError, ConfigResult, ErrorPayload, PersistenceError,
    PersistenceResult, SyncError, SyncResult,
};
pub use read::{GroupMeta, GroupPayload, GroupView};
pub use runner::{RefreshScheduler, SchedulerHandle};
pub use store::{
    CredentialStore, EnvFileCredentialStore, FileSnapshotStore, InMemoryCredentialStore,
    InMemorySnapshotStore, SnapshotStore,
};
