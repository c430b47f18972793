//! `RequestQueue` (C7) and `TickExecutor` (C8): the bridge between
//! HTTP-accepting worker threads and the single-threaded rendering host.

pub mod queue;
pub mod tick;

pub use queue::{Channel, QueueEntry, RequestQueue};
pub use tick::{OperationHandler, TickExecutor};
