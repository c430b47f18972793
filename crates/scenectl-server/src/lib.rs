//! The generic HTTP surface shared by every render-host control-plane
//! service (C6): contract-driven dispatch, auth/rate-limit/security-header
//! middleware, and response normalization, parameterized over one
//! [`Controller`] per service binary.

pub mod controller;
pub mod router;

pub use controller::Controller;
pub use router::{build_router, AppState, RouterConfig};
