//! Builds the axum `Router`: contract lookup, payload parsing, controller
//! dispatch, and response normalization (§4.5), with auth/rate-limit/
//! security-header middleware layered around it (§4.2-§4.4).
//!
//! Two routes bypass the generic envelope pipeline: `/openapi.json` serves
//! its document unauthenticated, and `get_prometheus_metrics` renders
//! Prometheus exposition text straight from the shared `MetricsRegistry`
//! rather than going through the controller and `normalize` (§4.9-§4.10).

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use scenectl_auth::{AuthConfig, AuthLayer, RateLimitConfig, RateLimitLayer, RateLimiter};
use scenectl_contracts::ContractRegistry;
use scenectl_core::{Envelope, HttpMethod, normalize};
use scenectl_metrics::MetricsRegistry;
use scenectl_security::{SecurityHeadersConfig, SecurityHeadersLayer};
use scenectl_tracker::RequestTracker;
use serde_json::Value;
use tower::ServiceBuilder;

use crate::controller::Controller;

pub struct AppState {
    pub service_name: String,
    pub contracts: Arc<ContractRegistry>,
    pub controller: Arc<dyn Controller>,
    pub tracker: Arc<RequestTracker>,
    pub metrics: Arc<MetricsRegistry>,
    pub openapi: Value,
}

pub struct RouterConfig {
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub security_headers: SecurityHeadersConfig,
}

pub fn build_router(state: Arc<AppState>, config: RouterConfig) -> axum::Router {
    let mut auth_config = config.auth;
    if !auth_config.exempt_paths.iter().any(|p| p == "/openapi.json") {
        auth_config.exempt_paths.push("/openapi.json".to_string());
    }

    let limiter = Arc::new(RateLimiter::new(config.rate_limit, state.metrics.clone()));

    axum::Router::new()
        .fallback(axum::routing::any(dispatch_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SecurityHeadersLayer::new(config.security_headers))
                .layer(AuthLayer::new(auth_config, state.metrics.clone()))
                .layer(RateLimitLayer::new(limiter)),
        )
        .with_state(state)
}

async fn dispatch_handler(State(state): State<Arc<AppState>>, req: Request) -> Response {
    state.metrics.increment_requests();

    if req.uri().path() == "/openapi.json" {
        return json_response(200, &state.openapi);
    }

    let method = match *req.method() {
        axum::http::Method::GET => HttpMethod::Get,
        axum::http::Method::POST => HttpMethod::Post,
        _ => return envelope_response(Envelope::error("NO_ROUTE", "method not supported", None)),
    };

    let path = req.uri().path().trim_start_matches('/').to_string();
    let query = req.uri().query().map(str::to_string);

    let Some(contract) = state.contracts.by_route(&path, method) else {
        state.metrics.increment_errors();
        return envelope_response(Envelope::error(
            "NO_ROUTE",
            format!("no route for {method} /{path}"),
            None,
        ));
    };
    let operation = contract.operation.clone();
    state.metrics.increment_endpoint(operation.as_str());

    if operation.as_str() == "get_prometheus_metrics" {
        return text_response(200, &state.metrics.get_prometheus_metrics());
    }

    let payload = match method {
        HttpMethod::Get => query_to_json(query.as_deref()),
        HttpMethod::Post => match body_to_json(req).await {
            Ok(v) => v,
            Err(response) => return response,
        },
    };

    let raw = state.controller.dispatch(operation.as_str(), payload).await;
    let default_error_code = format!("{}_FAILED", operation.shout());
    let envelope = normalize(raw, &default_error_code);
    if matches!(envelope, Envelope::Error(_)) {
        state.metrics.increment_errors();
    }
    envelope_response(envelope)
}

fn query_to_json(query: Option<&str>) -> Value {
    let mut map = serde_json::Map::new();
    if let Some(query) = query {
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default();
            let decoded_key = percent_decode(key);
            let decoded_value = percent_decode(value);
            map.insert(decoded_key, Value::String(decoded_value));
        }
    }
    Value::Object(map)
}

fn percent_decode(s: &str) -> String {
    percent_encoding::percent_decode_str(s).decode_utf8_lossy().replace('+', " ")
}

async fn body_to_json(req: Request) -> Result<Value, Response> {
    let bytes = match axum::body::to_bytes(req.into_body(), 10 * 1024 * 1024).await {
        Ok(b) => b,
        Err(_) => return Err(envelope_response(Envelope::error("INVALID_PARAMETER", "could not read request body", None))),
    };
    if bytes.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| envelope_response(Envelope::error("VALIDATION_ERROR", format!("invalid JSON body: {e}"), None)))
}

fn envelope_response(envelope: Envelope) -> Response {
    let status = envelope.http_status();
    let body = serde_json::to_vec(&envelope).unwrap_or_default();
    Response::builder()
        .status(status)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("status/header/body are all well-formed")
}

fn json_response(status: u16, value: &Value) -> Response {
    let body = serde_json::to_vec(value).unwrap_or_default();
    Response::builder()
        .status(status)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("status/header/body are all well-formed")
}

/// The `get_prometheus_metrics` operation renders exposition text, not an
/// envelope; every other operation's result is still normalized JSON (§4.9).
fn text_response(status: u16, body: &str) -> Response {
    Response::builder()
        .status(status)
        .header(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body.to_string()))
        .expect("status/header/body are all well-formed")
}
