//! The `Controller` seam: one async function per service dispatching a
//! validated operation to either an inline query or the render-host queue
//! (§4.5).

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

/// Implemented once per service binary. `dispatch` receives the raw JSON
/// payload (query string turned into an object for `GET`, body for `POST`)
/// and returns a raw controller result, pre-normalization.
pub trait Controller: Send + Sync {
    fn dispatch(&self, operation: &str, payload: Value) -> Pin<Box<dyn Future<Output = Value> + Send>>;
}

impl<F, Fut> Controller for F
where
    F: Fn(&str, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Value> + Send + 'static,
{
    fn dispatch(&self, operation: &str, payload: Value) -> Pin<Box<dyn Future<Output = Value> + Send>> {
        Box::pin(self(operation, payload))
    }
}
