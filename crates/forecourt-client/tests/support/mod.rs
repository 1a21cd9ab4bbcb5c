//! In-process stub of the dashboard backend.
//!
//! Every request is recorded. Responses are canned per method and path;
//! anything not configured answers 404.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use forecourt_client::{ClientConfig, EntryApp, SubmitStrategy};

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub idempotency_key: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
struct Canned {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct StubBackend {
    routes: Arc<Mutex<HashMap<(Method, String), Canned>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubBackend {
    /// Binds to an ephemeral port and returns the stub with its base URL.
    pub async fn start() -> (StubBackend, String) {
        let stub = StubBackend::default();
        let app = Router::new().fallback(handle).with_state(stub.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve stub") });

        (stub, format!("http://{}", addr))
    }

    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        self.install(method, path, status, body.to_string(), None);
    }

    pub fn respond_text(&self, method: Method, path: &str, status: u16, body: &str) {
        self.install(method, path, status, body.to_string(), None);
    }

    pub fn respond_slow(&self, method: Method, path: &str, status: u16, body: Value, delay: Duration) {
        self.install(method, path, status, body.to_string(), Some(delay));
    }

    fn install(&self, method: Method, path: &str, status: u16, body: String, delay: Option<Duration>) {
        let canned = Canned {
            status: StatusCode::from_u16(status).expect("status code"),
            body,
            delay,
        };
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), canned);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests other than GETs.
    pub fn writes(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != Method::GET)
            .collect()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Reference lists and tank state used by most flows.
    pub fn with_reference_data(&self) {
        self.respond(
            Method::GET,
            "/active",
            200,
            json!([{"employeeId": 7, "employeeFirstName": "Asha", "employeeLastName": "Rao", "employeeRole": "Attendant"}]),
        );
        self.respond(
            Method::GET,
            "/products",
            200,
            json!([
                {"productId": 1, "productName": "Petrol", "price": 10.0, "status": "ACTIVE"},
                {"productId": 2, "productName": "Diesel", "price": 9.0, "status": "active"},
                {"productId": 3, "productName": "Kerosene", "price": 5.0, "status": "INACTIVE"}
            ]),
        );
        self.respond(
            Method::GET,
            "/inventory/latest",
            200,
            json!([
                {"productId": 1, "productName": "Petrol", "currentLevel": 1000.0, "tankCapacity": 5000.0},
                {"productId": 2, "productName": "Diesel", "currentLevel": 800.0, "tankCapacity": 4000.0, "metric": "Liters (Sale)"}
            ]),
        );
        self.respond(Method::GET, "/sales/last", 200, json!({"lastClosing": 100.0}));
    }
}

async fn handle(
    State(stub): State<StubBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    stub.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        idempotency_key: header("idempotency-key"),
        authorization: header("authorization"),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let canned = stub
        .routes
        .lock()
        .unwrap()
        .get(&(method, uri.path().to_string()))
        .cloned();

    match canned {
        Some(canned) => {
            if let Some(delay) = canned.delay {
                tokio::time::sleep(delay).await;
            }
            (canned.status, canned.body).into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}

pub fn config(base_url: &str, strategy: SubmitStrategy) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.backend.base_url = base_url.to_string();
    config.backend.strategy = strategy;
    config
}

pub fn shift_end() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 14)
        .unwrap()
        .and_hms_opt(18, 30, 0)
        .unwrap()
}

pub fn app(base_url: &str, strategy: SubmitStrategy) -> EntryApp {
    EntryApp::new(&config(base_url, strategy), shift_end()).expect("app")
}
