#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use gaugewatch_api::config::ServerConfig;
use gaugewatch_api::router::build_app_router;
use gaugewatch_api::state::AppState;
use gaugewatch_core::definition::DefinitionRegistry;
use gaugewatch_core::derivation::DerivationStore;
use gaugewatch_core::jitter::FixedJitter;
use gaugewatch_core::settings::SettingsStore;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        record_retention: None,
        jitter_seed: None,
    }
}

/// Fresh state whose derivation jitter is always zero, so `current` is exactly
/// the midpoint of its band.
pub fn test_state() -> AppState {
    AppState {
        config: Arc::new(test_config()),
        store: Arc::new(DerivationStore::new(Box::new(FixedJitter(0.0)))),
        registry: Arc::new(DefinitionRegistry::default()),
        settings: Arc::new(SettingsStore::default()),
    }
}

/// Build the full application router over `state`, with the production
/// middleware stack.
pub fn build_app(state: AppState) -> Router {
    build_app_router(state, &test_config())
}

pub fn build_test_app() -> Router {
    build_app(test_state())
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body.to_string())).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body.to_string())).await
}

/// Send a request with a raw (possibly malformed) JSON body.
pub async fn send_raw(app: Router, method: Method, uri: &str, body: &str) -> Response<Body> {
    send(app, method, uri, Some(body.to_string())).await
}

async fn send(app: Router, method: Method, uri: &str, body: Option<String>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
