//! `TickExecutor`: drains [`RequestQueue`] on the rendering-host main thread
//! once per tick and completes each entry (§4.7).

use std::time::Instant;

use scenectl_core::Envelope;
use scenectl_metrics::MetricsRegistry;
use scenectl_tracker::RequestTracker;

use crate::queue::{Channel, QueueEntry, RequestQueue};

/// Invoked once per drained entry; must never block on I/O or sockets.
/// Long-running work (e.g. launching an encoder) should spawn a child
/// process and return immediately with a correlation payload.
pub trait OperationHandler {
    fn invoke(&self, channel: Channel, operation: &str, payload: &serde_json::Value) -> Result<serde_json::Value, String>;
}

impl<F> OperationHandler for F
where
    F: Fn(Channel, &str, &serde_json::Value) -> Result<serde_json::Value, String>,
{
    fn invoke(&self, channel: Channel, operation: &str, payload: &serde_json::Value) -> Result<serde_json::Value, String> {
        self(channel, operation, payload)
    }
}

pub struct TickExecutor {
    max_operations_per_cycle: usize,
}

impl TickExecutor {
    pub fn new(max_operations_per_cycle: usize) -> Self {
        Self { max_operations_per_cycle }
    }

    /// Runs a single tick: drains up to the configured budget, invokes
    /// `handler` for each, updates `tracker` and `metrics`, and completes
    /// each entry's one-shot channel. Returns the number of entries drained.
    pub fn run_tick(
        &self,
        queue: &RequestQueue,
        tracker: &RequestTracker,
        metrics: &MetricsRegistry,
        handler: &dyn OperationHandler,
    ) -> usize {
        let drained = queue.drain(self.max_operations_per_cycle);
        let count = drained.len();

        for (channel, entry) in drained {
            let QueueEntry { id, operation, payload, result_tx } = entry;
            let started = Instant::now();
            let outcome = handler.invoke(channel, &operation, &payload);
            let duration_ms = started.elapsed().as_millis() as u64;
            metrics.record_request_duration_ms(duration_ms);

            let envelope = match outcome {
                Ok(result) => {
                    tracker.mark_completed(&id, Some(result.clone()), None);
                    let mut fields = serde_json::Map::new();
                    if let serde_json::Value::Object(map) = result {
                        fields = map;
                    }
                    Envelope::success(fields)
                }
                Err(reason) => {
                    metrics.increment_errors();
                    let error_code = format!("{}_FAILED", operation.to_uppercase());
                    let envelope = Envelope::error(error_code, reason, None);
                    if let Envelope::Error(ref err) = envelope {
                        tracker.mark_completed(&id, None, Some(Envelope::Error(err.clone())));
                    }
                    envelope
                }
            };

            let _ = result_tx.send(envelope);
        }

        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn new_harness() -> (RequestQueue, RequestTracker, MetricsRegistry, TickExecutor) {
        (
            RequestQueue::new(10),
            RequestTracker::new(100, Duration::from_secs(60)),
            MetricsRegistry::new("test"),
            TickExecutor::new(2),
        )
    }

    #[tokio::test]
    async fn successful_operation_completes_tracker_and_channel() {
        let (queue, tracker, metrics, executor) = new_harness();
        tracker.add("r1", serde_json::json!({}));
        let (_, rx) = queue.enqueue(Channel::Elements, "r1", "add_element", serde_json::json!({"name": "cube"})).unwrap();

        let handler = |_: Channel, _: &str, payload: &serde_json::Value| Ok(payload.clone());
        let drained = executor.run_tick(&queue, &tracker, &metrics, &handler);

        assert_eq!(drained, 1);
        let envelope = rx.await.unwrap();
        assert!(envelope.is_success());
        let snapshot = tracker.get("r1", true).unwrap();
        assert!(snapshot.completed);
    }

    #[tokio::test]
    async fn failed_operation_produces_operation_failed_code() {
        let (queue, tracker, metrics, executor) = new_harness();
        tracker.add("r1", serde_json::json!({}));
        let (_, rx) = queue.enqueue(Channel::Elements, "r1", "add_element", serde_json::json!({})).unwrap();

        let handler = |_: Channel, _: &str, _: &serde_json::Value| Err::<serde_json::Value, String>("scene busy".to_string());
        executor.run_tick(&queue, &tracker, &metrics, &handler);

        let envelope = rx.await.unwrap();
        match envelope {
            Envelope::Error(e) => assert_eq!(e.error_code, "ADD_ELEMENT_FAILED"),
            _ => panic!("expected error envelope"),
        }
    }

    #[tokio::test]
    async fn tick_respects_budget_leaving_remainder_queued() {
        let (queue, tracker, metrics, executor) = new_harness();
        for i in 0..3 {
            queue.enqueue(Channel::Elements, format!("r{i}"), "add_element", serde_json::json!({})).unwrap();
        }
        let handler = |_: Channel, _: &str, payload: &serde_json::Value| Ok(payload.clone());
        let drained = executor.run_tick(&queue, &tracker, &metrics, &handler);
        assert_eq!(drained, 2);
        assert_eq!(queue.total_len(), 1);
    }
}
