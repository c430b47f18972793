//! `SecurityHeaders`: attaches the fixed CSP/XFO/XCTO/etc. header set to
//! every response, including CORS preflight (§4.4).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::Response;
use tower::{Layer, Service};

/// Optional HSTS configuration; omitted unless explicitly enabled.
#[derive(Debug, Clone, Default)]
pub struct SecurityHeadersConfig {
    pub hsts_max_age_secs: Option<u64>,
}

#[derive(Clone)]
pub struct SecurityHeadersLayer {
    config: SecurityHeadersConfig,
}

impl SecurityHeadersLayer {
    pub fn new(config: SecurityHeadersConfig) -> Self {
        Self { config }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersService { inner, config: self.config.clone() }
    }
}

#[derive(Clone)]
pub struct SecurityHeadersService<S> {
    inner: S,
    config: SecurityHeadersConfig,
}

impl<S> Service<Request> for SecurityHeadersService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let config = self.config.clone();

        if req.method() == Method::OPTIONS {
            let mut response = Response::builder().status(StatusCode::OK).body(Body::empty()).expect("static response");
            apply_security_headers(response.headers_mut(), &config);
            apply_cors_preflight_headers(response.headers_mut());
            return Box::pin(async move { Ok(response) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let mut response = inner.call(req).await?;
            apply_security_headers(response.headers_mut(), &config);
            Ok(response)
        })
    }
}

fn apply_security_headers(headers: &mut axum::http::HeaderMap, config: &SecurityHeadersConfig) {
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static(
            "default-src 'self'; script-src 'none'; object-src 'none'; frame-src 'none'; style-src 'self' 'unsafe-inline'; img-src 'self' data:",
        ),
    );
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));
    headers.insert("referrer-policy", HeaderValue::from_static("strict-origin-when-cross-origin"));
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("geolocation=(), microphone=(), camera=(), payment=()"),
    );
    if let Some(max_age) = config.hsts_max_age_secs {
        if let Ok(value) = HeaderValue::from_str(&format!("max-age={max_age}")) {
            headers.insert("strict-transport-security", value);
        }
    }
}

fn apply_cors_preflight_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert("access-control-allow-methods", HeaderValue::from_static("GET, POST, OPTIONS"));
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("Authorization, X-Timestamp, X-Signature, Content-Type"),
    );
}
