//! Fake access backend served over real HTTP

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use presence_sync::AccessApiConfig;

pub const LOGIN: &str = "operator";
pub const PASSWORD: &str = "secret";
pub const HALL_ONE: &str = "Общежитие №1";
pub const HALL_TWO: &str = "Общежитие №2";
pub const OUTSIDE: &str = "Неконтролируемая территория";

/// Scriptable backend state
pub struct FakeBackend {
    valid_token: Mutex<String>,
    issued: AtomicUsize,
    auth_calls: AtomicUsize,
    roster: Mutex<Value>,
    details: Mutex<HashMap<i64, Value>>,
    failures: Mutex<HashMap<i64, (StatusCode, String)>>,
    events: Mutex<Value>,
    event_queries: Mutex<Vec<HashMap<String, String>>>,
    data_authorizations: Mutex<Vec<Option<String>>>,
    auth_authorizations: Mutex<Vec<Option<String>>>,
}

impl FakeBackend {
    pub fn new(valid_token: &str) -> Arc<Self> {
        Arc::new(Self {
            valid_token: Mutex::new(valid_token.to_string()),
            issued: AtomicUsize::new(0),
            auth_calls: AtomicUsize::new(0),
            roster: Mutex::new(json!([])),
            details: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            events: Mutex::new(json!({ "rows": [] })),
            event_queries: Mutex::new(Vec::new()),
            data_authorizations: Mutex::new(Vec::new()),
            auth_authorizations: Mutex::new(Vec::new()),
        })
    }

    /// Invalidate whatever token clients currently hold
    pub fn expire_token(&self) {
        *self.valid_token.lock().unwrap() = "revoked-by-server".to_string();
    }

    pub fn valid_token(&self) -> String {
        self.valid_token.lock().unwrap().clone()
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }

    pub fn add_person(&self, id: i64, last_name: &str, first_name: &str, group: &str, room: &str) {
        let mut roster = self.roster.lock().unwrap();
        if let Value::Array(rows) = &mut *roster {
            rows.push(json!({
                "id": id,
                "last_name": last_name,
                "first_name": first_name,
                "middle_name": null,
                "division_id": 5,
                "division_name": "Students"
            }));
        }
        self.details.lock().unwrap().insert(
            id,
            json!({
                "id": id,
                "additional_fields": {
                    "text": [
                        { "name": "Общежитие", "text": group },
                        { "name": "№ комнаты", "text": room }
                    ]
                }
            }),
        );
    }

    pub fn set_roster(&self, roster: Value) {
        *self.roster.lock().unwrap() = roster;
    }

    pub fn fail_detail(&self, id: i64, status: StatusCode, body: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(id, (status, body.to_string()));
    }

    pub fn set_events(&self, rows: Value) {
        *self.events.lock().unwrap() = json!({ "rows": rows });
    }

    pub fn event_queries(&self) -> Vec<HashMap<String, String>> {
        self.event_queries.lock().unwrap().clone()
    }

    pub fn data_authorizations(&self) -> Vec<Option<String>> {
        self.data_authorizations.lock().unwrap().clone()
    }

    pub fn auth_authorizations(&self) -> Vec<Option<String>> {
        self.auth_authorizations.lock().unwrap().clone()
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let header = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.data_authorizations.lock().unwrap().push(header.clone());

        let expected = format!("Bearer {}", self.valid_token());
        if header.as_deref() == Some(expected.as_str()) {
            Ok(())
        } else {
            Err((StatusCode::UNAUTHORIZED, Json(json!({ "error": "token expired" }))).into_response())
        }
    }
}

type Shared = Arc<FakeBackend>;

async fn server_state(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(rejection) = backend.authorize(&headers) {
        return rejection;
    }
    Json(json!({ "state": "running" })).into_response()
}

async fn auth(State(backend): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    backend.auth_calls.fetch_add(1, Ordering::SeqCst);
    backend.auth_authorizations.lock().unwrap().push(
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    );

    if body["login"] != LOGIN || body["password"] != PASSWORD {
        return (StatusCode::FORBIDDEN, Json(json!({ "error": "bad credentials" }))).into_response();
    }

    let n = backend.issued.fetch_add(1, Ordering::SeqCst) + 1;
    let token = format!("issued-{}", n);
    *backend.valid_token.lock().unwrap() = token.clone();
    Json(json!({ "token": token })).into_response()
}

async fn staff_list(State(backend): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(rejection) = backend.authorize(&headers) {
        return rejection;
    }
    Json(backend.roster.lock().unwrap().clone()).into_response()
}

async fn staff(State(backend): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(rejection) = backend.authorize(&headers) {
        return rejection;
    }
    if let Some((status, body)) = backend.failures.lock().unwrap().get(&id).cloned() {
        return (status, body).into_response();
    }
    match backend.details.lock().unwrap().get(&id).cloned() {
        Some(detail) => Json(detail).into_response(),
        None => (StatusCode::NOT_FOUND, "no such user").into_response(),
    }
}

async fn events(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(rejection) = backend.authorize(&headers) {
        return rejection;
    }
    backend.event_queries.lock().unwrap().push(params);
    Json(backend.events.lock().unwrap().clone()).into_response()
}

/// Serve the backend on an ephemeral port and return its base URL
pub async fn spawn_backend(backend: Shared) -> String {
    let app = Router::new()
        .route("/api/sysserver/getServerState", get(server_state))
        .route("/api/system/auth", post(auth))
        .route("/api/users/staff/fullList", get(staff_list))
        .route("/api/users/staff/:id", get(staff))
        .route("/api/accessReports/events", get(events))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

pub fn api_config(base_url: &str, token: &str) -> AccessApiConfig {
    AccessApiConfig::new(base_url, LOGIN, PASSWORD).with_token(token)
}

pub fn event(user_id: i64, time: &str, from: &str, to: &str) -> Value {
    json!({
        "user_id": user_id,
        "time_label": time,
        "zone_exit": from,
        "zone_enter": to
    })
}
