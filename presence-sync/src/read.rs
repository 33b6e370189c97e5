//! Group reads
//!
//! While a refresh is running the in-memory snapshot may be replaced at any
//! moment, so reads prefer the durable copy. Memory is used when the durable
//! copy is empty but memory is not, or when the durable read fails.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use presence_core::{FloorPlan, PersonRecord, Snapshot};

use crate::engine::PresenceService;
use crate::error::{SyncError, SyncResult};

/// Records of one group, ordered by location then id
#[derive(Debug, Clone, PartialEq)]
pub struct GroupView {
    pub group_key: String,
    pub group_label: String,
    pub last_update: Option<DateTime<Utc>>,
    pub records: Vec<PersonRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMeta {
    pub last_update: Option<DateTime<Utc>>,
    pub group: String,
}

/// Shape handed to presentation: metadata plus the floor plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPayload {
    pub meta: GroupMeta,
    pub data: FloorPlan,
}

impl GroupView {
    pub fn floor_plan(&self) -> FloorPlan {
        FloorPlan::from_records(self.records.iter().cloned())
    }

    pub fn to_payload(&self) -> GroupPayload {
        GroupPayload {
            meta: GroupMeta {
                last_update: self.last_update,
                group: self.group_label.clone(),
            },
            data: self.floor_plan(),
        }
    }
}

impl PresenceService {
    /// Records of the group configured under `group_key`
    pub async fn get_records(&self, group_key: &str) -> SyncResult<GroupView> {
        let group_label = self
            .site
            .group_label(group_key)
            .ok_or_else(|| SyncError::UnknownGroup(group_key.to_string()))?
            .to_string();

        let records = if self.is_updating() {
            self.read_during_refresh(&group_label).await
        } else {
            self.snapshot.read().await.records_in_group(&group_label)
        };

        debug!(group = %group_label, count = records.len(), "Group records read");

        Ok(GroupView {
            group_key: group_key.to_string(),
            group_label,
            last_update: self.last_update_time().await,
            records,
        })
    }

    async fn read_during_refresh(&self, group_label: &str) -> Vec<PersonRecord> {
        let durable: Snapshot = match self.store.read().await {
            Ok(durable) => durable,
            Err(e) => {
                warn!(error = %e, "Durable snapshot unreadable during refresh, serving memory");
                return self.snapshot.read().await.records_in_group(group_label);
            }
        };

        if durable.is_empty() {
            let memory = self.snapshot.read().await;
            if !memory.is_empty() {
                debug!(records = memory.len(), "Durable snapshot empty, serving memory");
                return memory.records_in_group(group_label);
            }
        }

        debug!("Update in progress, serving durable snapshot");
        durable.records_in_group(group_label)
    }
}
