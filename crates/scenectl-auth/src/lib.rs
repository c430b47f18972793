//! `AuthGuard` (HMAC-SHA256 + bearer verification) and `RateLimiter`
//! (per-client-IP token bucket) as `tower` middleware.

pub mod guard;
pub mod rate_limit;
pub mod rate_limit_layer;
pub mod signing;

pub use guard::{AuthConfig, AuthLayer, AuthService};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use rate_limit_layer::{RateLimitLayer, RateLimitService};
