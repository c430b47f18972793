//! Counters, gauges, and timing aggregates registered at startup and
//! rendered as either a JSON envelope or Prometheus exposition text.
//!
//! All mutable state lives behind one [`parking_lot::Mutex`]; every public
//! method holds it only for the duration of the call, matching §5's
//! "short critical sections, gauge callbacks invoked under the lock but must
//! be pure and non-blocking" resource policy.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde_json::{json, Value};

/// A gauge's value-producing callback. Returns `Err` to signal the value is
/// momentarily unavailable; this is distinct from the gauge simply being
/// zero.
pub type GaugeFn = dyn Fn() -> Result<f64, String> + Send + Sync;

enum RegisteredMetric {
    Counter { help: String, value: u64 },
    Gauge { help: String, callback: Arc<GaugeFn> },
}

struct Inner {
    start_time: Instant,
    server_running: bool,
    requests_received: u64,
    errors: u64,
    auth_failures: u64,
    rate_limited: u64,
    request_duration_ms_sum: u64,
    request_duration_ms_count: u64,
    endpoint_counters: BTreeMap<String, u64>,
    custom: BTreeMap<String, RegisteredMetric>,
}

/// The per-service metrics registry. One instance per process, constructed
/// at startup and shared (via `Arc`) with every other component.
pub struct MetricsRegistry {
    service_name: String,
    inner: Mutex<Inner>,
}

impl MetricsRegistry {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            inner: Mutex::new(Inner {
                start_time: Instant::now(),
                server_running: false,
                requests_received: 0,
                errors: 0,
                auth_failures: 0,
                rate_limited: 0,
                request_duration_ms_sum: 0,
                request_duration_ms_count: 0,
                endpoint_counters: BTreeMap::new(),
                custom: BTreeMap::new(),
            }),
        }
    }

    pub fn start_server(&self) {
        self.inner.lock().server_running = true;
    }

    pub fn stop_server(&self) {
        self.inner.lock().server_running = false;
    }

    pub fn increment_requests(&self) {
        self.inner.lock().requests_received += 1;
    }

    pub fn increment_errors(&self) {
        self.inner.lock().errors += 1;
    }

    pub fn increment_auth_failures(&self) {
        self.inner.lock().auth_failures += 1;
    }

    pub fn increment_rate_limited(&self) {
        self.inner.lock().rate_limited += 1;
    }

    pub fn record_request_duration_ms(&self, duration_ms: u64) {
        let mut inner = self.inner.lock();
        inner.request_duration_ms_sum += duration_ms;
        inner.request_duration_ms_count += 1;
    }

    pub fn increment_endpoint(&self, route: &str) {
        *self.inner.lock().endpoint_counters.entry(route.to_string()).or_insert(0) += 1;
    }

    /// Registers a service-specific monotonic counter. Idempotent: a second
    /// registration under the same name is ignored.
    pub fn register_counter(&self, name: &str, help: &str) {
        self.inner
            .lock()
            .custom
            .entry(name.to_string())
            .or_insert_with(|| RegisteredMetric::Counter { help: help.to_string(), value: 0 });
    }

    /// Registers a service-specific gauge backed by a zero-argument
    /// callback, invoked fresh on every read.
    pub fn register_gauge(&self, name: &str, help: &str, callback: impl Fn() -> Result<f64, String> + Send + Sync + 'static) {
        self.inner
            .lock()
            .custom
            .insert(name.to_string(), RegisteredMetric::Gauge { help: help.to_string(), callback: Arc::new(callback) });
    }

    /// Increments a previously-registered counter by `n`. No-op (logged) if
    /// the name was never registered.
    pub fn increment_counter(&self, name: &str, n: u64) {
        let mut inner = self.inner.lock();
        match inner.custom.get_mut(name) {
            Some(RegisteredMetric::Counter { value, .. }) => *value += n,
            Some(RegisteredMetric::Gauge { .. }) => {
                tracing::warn!(metric = name, "increment_counter called on a registered gauge");
            }
            None => tracing::warn!(metric = name, "increment_counter called on an unregistered metric"),
        }
    }

    pub fn get_uptime_seconds(&self) -> f64 {
        self.inner.lock().start_time.elapsed().as_secs_f64()
    }

    /// JSON rendering: `{success: true, metrics: {...}}`. A failing gauge
    /// callback yields value `0` plus a logged warning.
    pub fn get_json_metrics(&self) -> Value {
        let inner = self.inner.lock();
        let mut metrics = serde_json::Map::new();
        metrics.insert("requests_received".into(), json!(inner.requests_received));
        metrics.insert("errors".into(), json!(inner.errors));
        metrics.insert("auth_failures".into(), json!(inner.auth_failures));
        metrics.insert("rate_limited".into(), json!(inner.rate_limited));
        metrics.insert("request_duration_ms_sum".into(), json!(inner.request_duration_ms_sum));
        metrics.insert("request_duration_ms_count".into(), json!(inner.request_duration_ms_count));
        metrics.insert("uptime_seconds".into(), json!(inner.start_time.elapsed().as_secs_f64()));
        metrics.insert("server_running".into(), json!(inner.server_running));
        for (route, count) in &inner.endpoint_counters {
            metrics.insert(format!("endpoint_{route}"), json!(count));
        }
        for (name, metric) in &inner.custom {
            let value = match metric {
                RegisteredMetric::Counter { value, .. } => *value as f64,
                RegisteredMetric::Gauge { callback, .. } => callback().unwrap_or_else(|err| {
                    tracing::warn!(metric = name, error = %err, "gauge callback failed, reporting 0");
                    0.0
                }),
            };
            metrics.insert(name.clone(), json!(value));
        }
        json!({ "success": true, "metrics": Value::Object(metrics) })
    }

    /// Prometheus text rendering. Each metric is preceded by `# HELP`/`# TYPE`
    /// lines; counters are suffixed `_total`. Unlike the JSON rendering, a
    /// failing gauge callback omits the metric entirely rather than
    /// emitting a corrupt `NaN`/zero line.
    pub fn get_prometheus_metrics(&self) -> String {
        let inner = self.inner.lock();
        let prefix = &self.service_name;
        let mut out = String::new();

        let mut counter = |out: &mut String, name: &str, help: &str, value: u64| {
            out.push_str(&format!("# HELP {prefix}_{name}_total {help}\n"));
            out.push_str(&format!("# TYPE {prefix}_{name}_total counter\n"));
            out.push_str(&format!("{prefix}_{name}_total {value}\n"));
        };
        counter(&mut out, "requests_received", "Total requests received", inner.requests_received);
        counter(&mut out, "errors", "Total errors", inner.errors);
        counter(&mut out, "auth_failures", "Total authentication failures", inner.auth_failures);
        counter(&mut out, "rate_limited", "Total requests rejected by the rate limiter", inner.rate_limited);
        counter(&mut out, "request_duration_ms_sum", "Sum of request durations in milliseconds", inner.request_duration_ms_sum);
        counter(&mut out, "request_duration_ms_count", "Count of timed requests", inner.request_duration_ms_count);

        out.push_str(&format!("# HELP {prefix}_uptime_seconds Process uptime in seconds\n"));
        out.push_str(&format!("# TYPE {prefix}_uptime_seconds gauge\n"));
        out.push_str(&format!("{prefix}_uptime_seconds {}\n", inner.start_time.elapsed().as_secs_f64()));

        out.push_str(&format!("# HELP {prefix}_server_running Whether the server is currently running\n"));
        out.push_str(&format!("# TYPE {prefix}_server_running gauge\n"));
        out.push_str(&format!("{prefix}_server_running {}\n", if inner.server_running { 1 } else { 0 }));

        if !inner.endpoint_counters.is_empty() {
            out.push_str(&format!("# HELP {prefix}_endpoint_requests_total Requests per endpoint\n"));
            out.push_str(&format!("# TYPE {prefix}_endpoint_requests_total counter\n"));
            for (route, count) in &inner.endpoint_counters {
                out.push_str(&format!("{prefix}_endpoint_requests_total{{route=\"{route}\"}} {count}\n"));
            }
        }

        for (name, metric) in &inner.custom {
            match metric {
                RegisteredMetric::Counter { help, value } => {
                    out.push_str(&format!("# HELP {prefix}_{name}_total {help}\n"));
                    out.push_str(&format!("# TYPE {prefix}_{name}_total counter\n"));
                    out.push_str(&format!("{prefix}_{name}_total {value}\n"));
                }
                RegisteredMetric::Gauge { help, callback } => match callback() {
                    Ok(value) => {
                        out.push_str(&format!("# HELP {prefix}_{name} {help}\n"));
                        out.push_str(&format!("# TYPE {prefix}_{name} gauge\n"));
                        out.push_str(&format!("{prefix}_{name} {value}\n"));
                    }
                    Err(err) => {
                        tracing::warn!(metric = name, error = %err, "gauge callback failed, omitting from Prometheus output");
                    }
                },
            }
        }

        out
    }
}


#[cfg(test)]
mod snapshot_tests {
    use super::*;

    #[test]
    fn prometheus_rendering_matches_snapshot() {
        let registry = MetricsRegistry::new("worldbuilder");
        registry.increment_requests();
        registry.increment_requests();
        registry.increment_errors();
        registry.increment_endpoint("add_element");

        let mut settings = insta::Settings::clone_current();
        settings.add_filter(r"_uptime_seconds [0-9.]+", "_uptime_seconds [ELAPSED]");
        settings.bind(|| {
            insta::assert_snapshot!(registry.get_prometheus_metrics());
        });
    }
}
