//! `AuthGuard`: a `tower` `Layer`/`Service` pair enforcing §4.2's dual HMAC
//! + bearer scheme in front of every protected route.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use scenectl_core::Envelope;
use scenectl_metrics::MetricsRegistry;
use tower::{Layer, Service};

use crate::signing;

/// Inbound authentication configuration (§3 `AuthConfig (inbound)`).
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub enabled: bool,
    pub hmac_secret: Option<Vec<u8>>,
    pub bearer_token: Option<String>,
    pub realm: String,
    /// Routes that bypass the guard regardless of `enabled` (e.g. `/openapi.json`).
    pub exempt_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { enabled: true, hmac_secret: None, bearer_token: None, realm: "isaac-sim".to_string(), exempt_paths: Vec::new() }
    }
}

impl AuthConfig {
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }
}

/// A `tower::Layer` that wraps a service with [`AuthService`].
#[derive(Clone)]
pub struct AuthLayer {
    config: Arc<AuthConfig>,
    metrics: Arc<MetricsRegistry>,
}

impl AuthLayer {
    pub fn new(config: AuthConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self { config: Arc::new(config), metrics }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService { inner, config: self.config.clone(), metrics: self.metrics.clone() }
    }
}

#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    config: Arc<AuthConfig>,
    metrics: Arc<MetricsRegistry>,
}

impl<S> Service<Request> for AuthService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let config = self.config.clone();
        let metrics = self.metrics.clone();
        let mut inner = self.inner.clone();

        match check(&config, &req) {
            Ok(()) => Box::pin(async move { inner.call(req).await }),
            Err(reason) => {
                metrics.increment_auth_failures();
                tracing::warn!(reason = %reason, path = %req.uri().path(), "rejected unauthenticated request");
                let response = unauthorized_response(&config.realm);
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

fn check(config: &AuthConfig, req: &Request) -> Result<(), &'static str> {
    if !config.enabled || config.exempt_paths.iter().any(|p| p == req.uri().path()) {
        return Ok(());
    }

    if let Some(expected_token) = &config.bearer_token {
        if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            if let Some(token) = auth_header.strip_prefix("Bearer ") {
                if token == expected_token {
                    return Ok(());
                }
            }
        }
    }

    if let Some(secret) = &config.hmac_secret {
        let timestamp = req.headers().get("x-timestamp").and_then(|v| v.to_str().ok());
        let signature = req.headers().get("x-signature").and_then(|v| v.to_str().ok());
        if let (Some(timestamp), Some(signature)) = (timestamp, signature) {
            let now = SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock is after epoch").as_secs_f64();
            if signing::timestamp_in_window(timestamp, now) {
                let path_with_query = path_with_query(req);
                if signing::verify(secret, req.method().as_str(), &path_with_query, timestamp, signature) {
                    return Ok(());
                }
                return Err("signature mismatch");
            }
            return Err("timestamp outside window");
        }
    }

    Err("no valid credentials presented")
}

fn path_with_query(req: &Request) -> String {
    match req.uri().query() {
        Some(q) => format!("{}?{}", req.uri().path(), q),
        None => req.uri().path().to_string(),
    }
}

fn unauthorized_response(realm: &str) -> Response {
    let envelope = Envelope::error("UNAUTHORIZED", "authentication required", None);
    let body = serde_json::to_vec(&envelope).unwrap_or_default();
    Response::builder()
        .status(401)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(http::header::WWW_AUTHENTICATE, format!(r#"HMAC-SHA256 realm="{realm}""#))
        .body(Body::from(body))
        .expect("status/header/body are all well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn req(method: Method, uri: &str, headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().method(method).uri(uri);
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn disabled_config_passes_through() {
        let config = AuthConfig::disabled();
        assert!(check(&config, &req(Method::GET, "/health", &[])).is_ok());
    }

    #[test]
    fn bearer_alone_suffices() {
        let config = AuthConfig { bearer_token: Some("s3cr3t".into()), ..AuthConfig::default() };
        let request = req(Method::GET, "/health", &[("authorization", "Bearer s3cr3t")]);
        assert!(check(&config, &request).is_ok());
    }

    #[test]
    fn hmac_alone_suffices_with_fresh_timestamp() {
        let secret = b"hmac-secret".to_vec();
        let config = AuthConfig { hmac_secret: Some(secret.clone()), ..AuthConfig::default() };
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs_f64();
        let ts = format!("{now}");
        let sig = signing::sign(&secret, "GET", "/health", &ts);
        let request = req(Method::GET, "/health", &[("x-timestamp", &ts), ("x-signature", &sig)]);
        assert!(check(&config, &request).is_ok());
    }

    #[test]
    fn exempt_path_bypasses_credential_check() {
        let config = AuthConfig { bearer_token: Some("s3cr3t".into()), exempt_paths: vec!["/openapi.json".into()], ..AuthConfig::default() };
        assert!(check(&config, &req(Method::GET, "/openapi.json", &[])).is_ok());
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let config = AuthConfig { bearer_token: Some("s3cr3t".into()), ..AuthConfig::default() };
        assert!(check(&config, &req(Method::GET, "/health", &[])).is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let secret = b"hmac-secret".to_vec();
        let config = AuthConfig { hmac_secret: Some(secret.clone()), ..AuthConfig::default() };
        let ts = "1000000000";
        let sig = signing::sign(&secret, "GET", "/health", ts);
        let request = req(Method::GET, "/health", &[("x-timestamp", ts), ("x-signature", &sig)]);
        assert!(check(&config, &request).is_err());
    }
}
