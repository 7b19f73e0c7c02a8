#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use kehilla_api::database::models::Organization;
use kehilla_api::database::{MemoryStore, Store};
use kehilla_api::router::{self, AppState};

pub const ORG_HEADER: &str = "x-organization-id";

/// Router over an in-memory store with one organization already created
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub org: Uuid,
    app: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    /// `data` of the success envelope
    pub fn data(&self) -> Value {
        self.json().get("data").cloned().unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let org = Organization::new("Beth Shalom");
        store.insert_organization(&org).await?;
        let app = router::app(AppState::new(store.clone()));
        Ok(Self { store, org: org.id, app })
    }

    pub async fn add_organization(&self, name: &str) -> Result<Uuid> {
        let org = Organization::new(name);
        self.store.insert_organization(&org).await?;
        Ok(org.id)
    }

    pub async fn send(&self, method: Method, uri: &str, org: Option<&str>, body: Option<Value>) -> Result<TestResponse> {
        let (content_type, bytes) = match body {
            Some(v) => (Some("application/json"), serde_json::to_vec(&v)?),
            None => (None, Vec::new()),
        };
        self.send_raw(method, uri, org, content_type, bytes).await
    }

    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        org: Option<&str>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(org) = org {
            builder = builder.header(ORG_HEADER, org);
        }
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        let response = self.app.clone().oneshot(builder.body(Body::from(bytes))?).await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await?.to_vec();
        Ok(TestResponse { status, content_type, bytes })
    }

    /// Request scoped to the default organization
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> Result<TestResponse> {
        let org = self.org.to_string();
        self.send(method, uri, Some(&org), body).await
    }

    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        self.call(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<TestResponse> {
        self.call(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> Result<TestResponse> {
        self.call(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> Result<TestResponse> {
        self.call(Method::DELETE, uri, None).await
    }

    /// Creates a donor through the API and returns its id
    pub async fn donor(&self, first: &str, last: &str, phone: &str) -> Result<Uuid> {
        let res = self
            .post("/api/donors", serde_json::json!({ "first_name": first, "last_name": last, "phone": phone }))
            .await?;
        assert_eq!(res.status, StatusCode::CREATED, "create donor failed: {}", res.text());
        id_of(&res.data())
    }
}

pub fn id_of(value: &Value) -> Result<Uuid> {
    let raw = value.get("id").and_then(Value::as_str).ok_or_else(|| anyhow::anyhow!("no id in {}", value))?;
    Ok(Uuid::parse_str(raw)?)
}

/// Decimals are serialized as strings
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().unwrap_or_default(),
        Value::Number(n) => n.to_string().parse().unwrap_or_default(),
        _ => rust_decimal::Decimal::ZERO,
    }
}
