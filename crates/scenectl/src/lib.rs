//! The render-host control plane, assembled from its component crates.
//!
//! Each module below is a thin re-export of a standalone `scenectl-*` crate;
//! a service binary depends on `scenectl` and reaches every component
//! through one namespace instead of pinning each crate individually.

pub use scenectl_core as core;
pub use scenectl_validate as validate;
pub use scenectl_auth as auth;
pub use scenectl_security as security;
pub use scenectl_metrics as metrics;
pub use scenectl_tracker as tracker;
pub use scenectl_queue as queue;
pub use scenectl_contracts as contracts;
pub use scenectl_waypoints as waypoints;
pub use scenectl_streaming as streaming;
pub use scenectl_server as server;
pub use scenectl_proxy as proxy;

/// The types a service binary's `main.rs` reaches for most often.
pub mod prelude {
    pub use scenectl_auth::{AuthConfig, RateLimitConfig};
    pub use scenectl_contracts::ContractRegistry;
    pub use scenectl_core::{normalize, CoreError, Envelope, HttpMethod, ServiceConfig};
    pub use scenectl_metrics::MetricsRegistry;
    pub use scenectl_queue::{Channel, RequestQueue, TickExecutor};
    pub use scenectl_security::SecurityHeadersConfig;
    pub use scenectl_server::{build_router, AppState, Controller, RouterConfig};
    pub use scenectl_tracker::RequestTracker;
}
