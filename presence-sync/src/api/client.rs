//! HTTP Access Client
//!
//! Authenticated HTTP client for the access backend. Every request carries
//! the current bearer token and a JSON content type. A 401 response triggers
//! one credential exchange per expired token; the request that saw the 401
//! still fails with `AuthExpired`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use presence_core::PersonId;

use super::traits::AccessApi;
use super::types::{EventQuery, EventRow, EventsResponse, PersonDetail, RosterEntry, RosterRow};
use crate::config::AccessApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::store::CredentialStore;

/// Backend endpoint paths
pub mod paths {
    /// Server state endpoint
    pub const SERVER_STATE: &str = "/api/sysserver/getServerState";
    /// Credential exchange (login + password -> token)
    pub const AUTH: &str = "/api/system/auth";
    /// Roster by division and status
    pub const STAFF_LIST: &str = "/api/users/staff/fullList";
    /// Person detail prefix; the id is appended
    pub const STAFF: &str = "/api/users/staff";
    /// Access event report
    pub const EVENTS: &str = "/api/accessReports/events";
}

/// Access backend client over HTTP
pub struct HttpAccessApi {
    /// HTTP client
    client: Client,
    /// Base URL without trailing slash
    base_url: String,
    login: String,
    password: String,
    /// Current bearer token
    token: RwLock<String>,
    /// Serializes credential exchanges; holds the stale token whose
    /// exchange was already attempted, successful or not
    reauth_lock: Mutex<Option<String>>,
    /// Durable home of the token
    credentials: Arc<dyn CredentialStore>,
    /// Successful credential exchanges
    reauth_count: AtomicU64,
}

impl HttpAccessApi {
    /// Create a new client
    pub fn new(config: &AccessApiConfig, credentials: Arc<dyn CredentialStore>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::transport(config.base_url.as_str(), e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            login: config.login.clone(),
            password: config.password.clone(),
            token: RwLock::new(config.token.clone()),
            reauth_lock: Mutex::new(None),
            credentials,
            reauth_count: AtomicU64::new(0),
        })
    }

    /// Current bearer token
    pub async fn token(&self) -> String {
        self.token.read().await.clone()
    }

    /// Number of successful credential exchanges since construction
    pub fn reauthentication_count(&self) -> u64 {
        self.reauth_count.load(Ordering::SeqCst)
    }

    /// Authenticated request returning the JSON body
    ///
    /// `headers` are applied last and override the defaults. A body is only
    /// attached for methods other than GET and HEAD.
    pub async fn fetch(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let token = self.token().await;
        let result = self
            .send(method, path, query, headers, body, Some(&token))
            .await;

        if let Err(ApiError::AuthExpired { .. }) = &result {
            self.handle_expired_token(&token).await;
        }

        result
    }

    /// Exchange login and password for a new token and persist it
    ///
    /// A persistence failure is logged; the new token is still used.
    pub async fn reauthenticate(&self) -> ApiResult<()> {
        let _guard = self.reauth_lock.lock().await;
        self.exchange_credentials().await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let value = self
            .fetch(Method::GET, path, query, HeaderMap::new(), None)
            .await?;
        serde_json::from_value(value).map_err(|e| ApiError::decode(path, e.to_string()))
    }

    async fn handle_expired_token(&self, stale_token: &str) {
        let mut attempted = self.reauth_lock.lock().await;

        if *self.token.read().await != stale_token {
            debug!("Token already rotated by a concurrent request");
            return;
        }
        if attempted.as_deref() == Some(stale_token) {
            debug!("Exchange for this token already attempted, waiting for the next health check");
            return;
        }
        *attempted = Some(stale_token.to_string());

        warn!("Access API token expired. Requesting a new token...");
        if let Err(e) = self.exchange_credentials().await {
            error!(error = %e, "Re-authentication failed");
        }
    }

    /// Caller must hold `reauth_lock`
    async fn exchange_credentials(&self) -> ApiResult<()> {
        let body = json!({ "login": self.login, "password": self.password });
        let response = self
            .send(Method::POST, paths::AUTH, &[], HeaderMap::new(), Some(&body), None)
            .await?;

        let token = response
            .get("token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::decode(paths::AUTH, "response carries no token"))?
            .to_string();

        *self.token.write().await = token.clone();
        self.reauth_count.fetch_add(1, Ordering::SeqCst);
        warn!("New access API token issued");

        match self.credentials.persist_token(&token).await {
            Ok(()) => info!("Access API token persisted"),
            Err(e) => error!(error = %e, "Failed to persist access API token, keeping it in memory"),
        }

        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        headers: HeaderMap,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let carries_body = method != Method::GET && method != Method::HEAD;

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        request = request.headers(headers);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let (true, Some(body)) = (carries_body, body) {
            request = request.json(body);
        }

        debug!(method = %method, path, "Access API request");

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(path, e.to_string()))?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!(path, "Access API auth error");
            return Err(ApiError::AuthExpired {
                path: path.to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::transport(path, e.to_string()))?;

        if !status.is_success() {
            let body = match serde_json::from_str::<Value>(&text) {
                Ok(parsed) => parsed,
                Err(_) => json!({ "raw": text }),
            };
            return Err(ApiError::request_failed(path, status.as_u16(), body));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::decode(path, e.to_string()))
    }
}

#[async_trait]
impl AccessApi for HttpAccessApi {
    async fn check_server_health(&self) -> bool {
        // A new cycle may retry an exchange that failed in the previous one
        *self.reauth_lock.lock().await = None;

        match self
            .fetch(Method::GET, paths::SERVER_STATE, &[], HeaderMap::new(), None)
            .await
        {
            Ok(state) => {
                debug!(state = %state, "Access API server state OK");
                true
            }
            Err(e) => {
                if e.is_auth_expired() {
                    warn!("Access API token had expired; a new one was requested");
                }
                error!(error = %e, "Access API server state check failed");
                false
            }
        }
    }

    async fn fetch_roster(&self, division_id: i64) -> ApiResult<Vec<RosterEntry>> {
        let rows: Vec<RosterRow> = self
            .get_json(
                paths::STAFF_LIST,
                &[
                    ("division", division_id.to_string()),
                    ("status", "active".to_string()),
                ],
            )
            .await?;

        Ok(rows.into_iter().map(RosterEntry::from).collect())
    }

    async fn fetch_person_detail(&self, id: PersonId) -> ApiResult<PersonDetail> {
        self.get_json(&format!("{}/{}", paths::STAFF, id), &[]).await
    }

    async fn fetch_events(&self, query: &EventQuery) -> ApiResult<Vec<EventRow>> {
        let response: EventsResponse = self.get_json(paths::EVENTS, &query.to_query()).await?;
        Ok(response.rows.unwrap_or_default())
    }
}
