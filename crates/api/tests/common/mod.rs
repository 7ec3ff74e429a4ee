#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use hsseq_core::backend::memory::MemoryBackend;
use hsseq_core::save_guard::SaveGuard;
use hsseq_core::types::{new_id, Id, Identity};
use hsseq_events::EventBus;
use tower::ServiceExt;

use hsseq_api::auth::jwt::JwtConfig;
use hsseq_api::config::ServerConfig;
use hsseq_api::router::build_router;
use hsseq_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Everything a test needs to drive the app and inspect its effects.
pub struct TestApp {
    pub router: Router,
    pub backend: Arc<MemoryBackend>,
    pub event_bus: Arc<EventBus>,
    pub save_guard: SaveGuard,
}

/// Build the application over an in-memory backend, with the same router
/// and middleware as the binary.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let backend = Arc::new(MemoryBackend::recording());
    let event_bus = Arc::new(EventBus::default());
    let save_guard = SaveGuard::new();

    let state = AppState {
        backend: backend.clone(),
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        save_guard: save_guard.clone(),
    };

    TestApp {
        router: build_router(state, &config),
        backend,
        event_bus,
        save_guard,
    }
}

/// A signed-in user of some company.
#[derive(Debug, Clone, Copy)]
pub struct TestUser {
    pub user_id: Id,
    pub company_id: Id,
}

impl TestUser {
    pub fn new() -> Self {
        Self {
            user_id: new_id(),
            company_id: new_id(),
        }
    }

    /// Another user of the same company.
    pub fn colleague(&self) -> Self {
        Self {
            user_id: new_id(),
            company_id: self.company_id,
        }
    }

    pub fn token(&self) -> String {
        self.token_with_role("inspector")
    }

    pub fn token_with_role(&self, role: &str) -> String {
        let identity = Identity {
            user_id: self.user_id,
            company_id: self.company_id,
        };
        test_config().jwt.issue(identity, role).unwrap()
    }
}

/// Send a request with an optional bearer token and JSON body.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&TestUser>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", user.token()));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
