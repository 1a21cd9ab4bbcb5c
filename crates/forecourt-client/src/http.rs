//! # API Client
//!
//! Thin reqwest wrapper over the dashboard backend.
//!
//! ## Endpoints
//! ```text
//! ┌────────┬───────────────────────────────┬──────────────────────────────┐
//! │ Method │ Path                          │ Used by                      │
//! ├────────┼───────────────────────────────┼──────────────────────────────┤
//! │ GET    │ /active                       │ reference loader (employees) │
//! │ GET    │ /products                     │ reference loader (products)  │
//! │ GET    │ /inventory/latest             │ row enrichment (tank state)  │
//! │ GET    │ /sales/last?productName=&gun= │ row enrichment (opening)     │
//! │ POST   │ /entryData                    │ combined submission          │
//! │ POST   │ /sales /collections /inventory│ split submission             │
//! │ POST   │ /login                        │ session                      │
//! │ GET    │ /recent-entries               │ history                      │
//! │ DELETE │ /entry/{id}                   │ history                      │
//! └────────┴───────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! Non-success responses become [`ClientError::Rejected`] carrying the
//! backend's `message` field, or the raw body when there is none.

use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use forecourt_core::history::{EntryId, EntryRecord};
use forecourt_core::submission::{CollectionRecord, SalesRecord};
use forecourt_core::{
    Employee, EntryPayload, InventoryRecord, InventorySnapshot, LastClosing, LoginRequest,
    LoginResponse, Product, Session,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Header carrying the per-attempt deduplication key.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// HTTP client for the backend. Cheap to clone; clones share the session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<RwLock<Option<Session>>>,
}

impl ApiClient {
    /// Creates a client from configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(ApiClient {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Signs in and keeps the session for later requests.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<Session> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .send_json(Method::POST, "login", Some(&request), None)
            .await
            .and_then(|body| parse_body(&body))?;

        let session = Session::from_login(response, Utc::now());
        info!(username = %session.user.username, "Signed in");
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(session)
    }

    /// Forgets the session. Later requests go out without a token.
    pub fn logout(&self) {
        if let Some(session) = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            info!(username = %session.user.username, "Signed out");
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn auth_header(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|s| s.bearer_token().map(|t| format!("Bearer {}", t)))
    }

    // =========================================================================
    // Reference data
    // =========================================================================

    pub async fn active_employees(&self) -> ClientResult<Vec<Employee>> {
        self.get("active").await
    }

    /// Every product, active or not.
    pub async fn products(&self) -> ClientResult<Vec<Product>> {
        self.get("products").await
    }

    pub async fn latest_inventory(&self) -> ClientResult<Vec<InventorySnapshot>> {
        self.get("inventory/latest").await
    }

    pub async fn last_closing(&self, product_name: &str, gun: &str) -> ClientResult<LastClosing> {
        let request = self
            .request(Method::GET, "sales/last")
            .query(&[("productName", product_name), ("gun", gun)]);
        let body = Self::execute(request).await?;
        parse_body(&body)
    }

    // =========================================================================
    // Submission
    // =========================================================================

    pub async fn post_entry(&self, payload: &EntryPayload, idempotency_key: &str) -> ClientResult<()> {
        self.send_json(Method::POST, "entryData", Some(payload), Some(idempotency_key))
            .await
            .map(drop)
    }

    pub async fn post_sales(&self, record: &SalesRecord, idempotency_key: &str) -> ClientResult<()> {
        self.send_json(Method::POST, "sales", Some(record), Some(idempotency_key))
            .await
            .map(drop)
    }

    pub async fn post_collections(
        &self,
        record: &CollectionRecord,
        idempotency_key: &str,
    ) -> ClientResult<()> {
        self.send_json(Method::POST, "collections", Some(record), Some(idempotency_key))
            .await
            .map(drop)
    }

    pub async fn post_inventory(
        &self,
        record: &InventoryRecord,
        idempotency_key: &str,
    ) -> ClientResult<()> {
        self.send_json(Method::POST, "inventory", Some(record), Some(idempotency_key))
            .await
            .map(drop)
    }

    // =========================================================================
    // History
    // =========================================================================

    pub async fn recent_entries(&self) -> ClientResult<Vec<EntryRecord>> {
        self.get("recent-entries").await
    }

    pub async fn delete_entry(&self, entry_id: &EntryId) -> ClientResult<()> {
        let path = format!("entry/{}", entry_id);
        Self::execute(self.request(Method::DELETE, &path)).await.map(drop)
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "Backend request");
        let mut request = self.client.request(method, self.url(path));
        if let Some(auth) = self.auth_header() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        request
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let body = Self::execute(self.request(Method::GET, path)).await?;
        parse_body(&body)
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        idempotency_key: Option<&str>,
    ) -> ClientResult<String> {
        let mut request = self.request(method, path);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_HEADER, key);
        }
        Self::execute(request).await
    }

    /// Sends the request and returns the body text of a success response.
    async fn execute(request: RequestBuilder) -> ClientResult<String> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        debug!(status = status.as_u16(), body = %text, "Backend rejected request");
        match status {
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            _ => Err(ClientError::Rejected {
                status: status.as_u16(),
                message: error_message(&text),
            }),
        }
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> ClientResult<T> {
    serde_json::from_str(body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// `message` of a JSON error body, else the trimmed body text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
