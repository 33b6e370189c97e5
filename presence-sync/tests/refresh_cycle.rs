//! End-to-end refresh cycles against the fake backend

mod common;

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use common::*;
use presence_core::PresenceStatus;
use presence_sync::{
    EnvFileCredentialStore, FileSnapshotStore, HttpAccessApi, PresenceService, RefreshOutcome,
    SiteConfig, SyncConfig,
};

struct Deployment {
    backend: Arc<FakeBackend>,
    service: Arc<PresenceService>,
    temp_dir: TempDir,
    base_url: String,
}

impl Deployment {
    fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            snapshot_path: self.temp_dir.path().join("students.db.json"),
            env_file: self.temp_dir.path().join(".env"),
            ..SyncConfig::default()
        }
    }

    /// A second service over the same files, as after a restart
    fn restart(&self) -> PresenceService {
        let sync = self.sync_config();
        let api = HttpAccessApi::new(
            &api_config(&self.base_url, &self.backend.valid_token()),
            Arc::new(EnvFileCredentialStore::new(&sync.env_file)),
        )
        .unwrap();
        PresenceService::new(
            Arc::new(api),
            Arc::new(FileSnapshotStore::new(&sync.snapshot_path)),
            SiteConfig::default(),
            sync,
        )
    }
}

async fn deploy(token: &str) -> Deployment {
    let temp_dir = TempDir::new().unwrap();
    let backend = FakeBackend::new(token);
    let base_url = spawn_backend(backend.clone()).await;

    let sync = SyncConfig {
        snapshot_path: temp_dir.path().join("students.db.json"),
        env_file: temp_dir.path().join(".env"),
        ..SyncConfig::default()
    };
    let api = HttpAccessApi::new(
        &api_config(&base_url, token),
        Arc::new(EnvFileCredentialStore::new(&sync.env_file)),
    )
    .unwrap();
    let service = Arc::new(PresenceService::new(
        Arc::new(api),
        Arc::new(FileSnapshotStore::new(&sync.snapshot_path)),
        SiteConfig::default(),
        sync,
    ));

    Deployment {
        backend,
        service,
        temp_dir,
        base_url,
    }
}

#[tokio::test]
async fn test_two_room_scenario() {
    let deployment = deploy("initial").await;
    deployment.backend.add_person(1, "Ivanov", "Ivan", HALL_ONE, "101");
    deployment.backend.add_person(2, "Petrova", "Olga", HALL_ONE, "205");
    deployment
        .backend
        .set_events(json!([event(1, "2024-03-01 08:00:00", OUTSIDE, HALL_ONE)]));

    let outcome = deployment.service.refresh().await;
    assert!(matches!(outcome, RefreshOutcome::Completed(_)));

    let view = deployment.service.get_records("obch1").await.unwrap();
    let statuses: Vec<_> = view.records.iter().map(|r| (r.id, r.current_status)).collect();
    assert_eq!(
        statuses,
        vec![(1, PresenceStatus::Present), (2, PresenceStatus::Unknown)]
    );

    let plan = view.floor_plan();
    assert_eq!(plan.floors().collect::<Vec<_>>(), vec!["1", "2"]);
    assert_eq!(plan.rooms("1").unwrap()["101"][0].name, "Ivanov Ivan");
    assert_eq!(plan.rooms("2").unwrap()["205"][0].id, 2);
}

#[tokio::test]
async fn test_failed_detail_excluded() {
    let deployment = deploy("initial").await;
    deployment.backend.add_person(1, "Ivanov", "Ivan", HALL_ONE, "101");
    deployment.backend.add_person(7, "Sidorov", "Petr", HALL_ONE, "310");
    deployment
        .backend
        .fail_detail(7, axum::http::StatusCode::BAD_GATEWAY, "upstream timeout");

    let outcome = deployment.service.refresh().await;
    let report = outcome.report().unwrap();
    assert_eq!(report.failed, 1);

    let snapshot = deployment.service.snapshot().await;
    assert!(snapshot.contains(1));
    assert!(!snapshot.contains(7));
}

#[tokio::test]
async fn test_expired_token_repaired_before_data_calls() {
    let deployment = deploy("initial").await;
    std::fs::write(
        deployment.temp_dir.path().join(".env"),
        "ACCESS_API_LOGIN=operator\nACCESS_API_TOKEN=initial\n",
    )
    .unwrap();
    deployment.backend.add_person(1, "Ivanov", "Ivan", HALL_ONE, "101");
    deployment.backend.expire_token();

    let outcome = deployment.service.refresh().await;

    assert_eq!(outcome.report().unwrap().placed, 1);
    assert_eq!(deployment.backend.auth_calls(), 1);
    let env = std::fs::read_to_string(deployment.temp_dir.path().join(".env")).unwrap();
    assert_eq!(env, "ACCESS_API_LOGIN=operator\nACCESS_API_TOKEN=issued-1\n");
}

#[tokio::test]
async fn test_departed_person_removed_from_file() {
    let deployment = deploy("initial").await;
    deployment.backend.add_person(1, "Ivanov", "Ivan", HALL_ONE, "101");
    deployment.backend.add_person(2, "Petrova", "Olga", HALL_TWO, "205");
    deployment.service.refresh().await;

    deployment.backend.set_roster(json!([
        { "id": 1, "last_name": "Ivanov", "first_name": "Ivan" }
    ]));
    deployment.service.refresh().await;

    let restarted = deployment.restart();
    restarted.load().await.unwrap();
    let snapshot = restarted.snapshot().await;
    assert_eq!(snapshot.ids().collect::<Vec<_>>(), vec![1]);
}

#[tokio::test]
async fn test_restart_serves_stored_snapshot() {
    let deployment = deploy("initial").await;
    deployment.backend.add_person(3, "Smirnov", "Oleg", HALL_TWO, "110");
    deployment
        .backend
        .set_events(json!([event(3, "2024-03-01 23:10:00", HALL_TWO, OUTSIDE)]));
    deployment.service.refresh().await;

    let restarted = deployment.restart();
    assert_eq!(restarted.load().await.unwrap(), 1);
    assert!(restarted.last_update_time().await.is_some());

    let view = restarted.get_records("obch2").await.unwrap();
    assert_eq!(view.records.len(), 1);
    assert_eq!(view.records[0].current_status, PresenceStatus::Absent);

    let payload = serde_json::to_value(view.to_payload()).unwrap();
    assert_eq!(payload["meta"]["group"], HALL_TWO);
    assert_eq!(payload["data"]["1"]["110"][0]["current_status"], "absent");
}

#[tokio::test]
async fn test_repeat_cycle_is_idempotent() {
    let deployment = deploy("initial").await;
    deployment.backend.add_person(1, "Ivanov", "Ivan", HALL_ONE, "101");
    deployment.backend.add_person(2, "Petrova", "Olga", HALL_ONE, "205");
    deployment.backend.set_events(json!([
        event(2, "2024-03-01 21:00:00", HALL_ONE, OUTSIDE),
        event(2, "2024-03-01 07:00:00", OUTSIDE, HALL_ONE)
    ]));
    let path = deployment.temp_dir.path().join("students.db.json");

    deployment.service.refresh().await;
    let first = std::fs::read(&path).unwrap();
    deployment.service.refresh().await;
    let second = std::fs::read(&path).unwrap();

    assert_eq!(first, second);
    let snapshot = deployment.service.snapshot().await;
    assert_eq!(snapshot.get(2).unwrap().current_status, PresenceStatus::Absent);
}
