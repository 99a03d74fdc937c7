#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use rekord_cms::auth::{generate_jwt, Claims};
use rekord_cms::config::config;
use rekord_cms::editor::UploadPolicy;
use rekord_cms::settings::SettingsStore;
use rekord_cms::testing::MemoryStore;
use rekord_cms::types::Role;
use rekord_cms::{app, AppState};

/// The router wired to an in-memory backend
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub settings: Arc<SettingsStore>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_upload_policy(UploadPolicy::default())
    }

    pub fn with_upload_policy(policy: UploadPolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let settings = Arc::new(SettingsStore::new(store.clone()));
        let state = AppState::new(store.clone(), store.clone(), settings.clone(), policy);
        Self { store, settings, router: app(state) }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    pub async fn send_bytes(&self, uri: &str, token: &str, bytes: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(Body::from(bytes))
            .unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}

/// A signed token for a fresh user with the given role claim
pub fn token(role: Option<Role>) -> String {
    token_for(&Uuid::new_v4().to_string(), role)
}

pub fn token_for(user_id: &str, role: Option<Role>) -> String {
    let claims = Claims::new(user_id, "ola@rekordit.pl", role, Duration::hours(1));
    generate_jwt(&claims, &config().security.jwt_secret).unwrap()
}
