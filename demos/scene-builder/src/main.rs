//! Example render-host control-plane service binary: an in-memory scene
//! graph fronted by the `worldbuilder` contract table, wired through the
//! shared `scenectl` component stack end to end.

mod openapi;
mod scene;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use scenectl_auth::{AuthConfig, RateLimitConfig};
use scenectl_contracts::{tables, ContractRegistry};
use scenectl_core::{CoreError, Envelope, ServiceConfig};
use scenectl_metrics::MetricsRegistry;
use scenectl_queue::{Channel, RequestQueue, TickExecutor};
use scenectl_security::SecurityHeadersConfig;
use scenectl_server::{build_router, AppState, RouterConfig};
use scenectl_tracker::RequestTracker;
use serde_json::Value;

use scene::{SceneOperationHandler, SceneStore};

const SERVICE_NAME: &str = "worldbuilder";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).with_thread_ids(false).with_thread_names(false).init();

    let cfg = ServiceConfig::load(SERVICE_NAME)?;

    let metrics = Arc::new(MetricsRegistry::new(SERVICE_NAME));
    let tracker = Arc::new(RequestTracker::new(cfg.max_tracker_entries, cfg.tracker_ttl()));
    let queue = Arc::new(RequestQueue::new(cfg.queue_capacity_per_channel));
    let scene = Arc::new(SceneStore::new());
    let contracts = ContractRegistry::load(tables::worldbuilder());

    let implemented: Vec<&str> = contracts.contracts().iter().map(|c| c.operation.as_str()).collect();
    if let Err(missing) = contracts.self_check(&implemented) {
        anyhow::bail!("contract table names operations with no handler: {missing:?}");
    }

    metrics.register_counter("elements_created", "Elements created via add_element or create_batch");
    metrics.register_counter("batches_processed", "Batches processed via create_batch");
    metrics.register_counter("assets_placed", "Assets placed via place_asset");
    metrics.register_gauge("elements_live", "Elements currently present in the scene", {
        let scene = scene.clone();
        move || Ok(scene.get_scene()["element_count"].as_f64().unwrap_or(0.0))
    });

    let openapi_doc = openapi::build(SERVICE_NAME, &contracts);

    let controller = {
        let scene = scene.clone();
        let queue = queue.clone();
        let tracker = tracker.clone();
        let metrics = metrics.clone();
        move |operation: &str, payload: Value| {
            let scene = scene.clone();
            let queue = queue.clone();
            let tracker = tracker.clone();
            let metrics = metrics.clone();
            let operation = operation.to_string();
            async move { dispatch(&scene, &queue, &tracker, &metrics, &operation, payload).await }
        }
    };

    let state = Arc::new(AppState {
        service_name: SERVICE_NAME.to_string(),
        contracts: Arc::new(contracts),
        controller: Arc::new(controller),
        tracker: tracker.clone(),
        metrics: metrics.clone(),
        openapi: openapi_doc,
    });

    let router_config = RouterConfig {
        auth: AuthConfig {
            enabled: cfg.auth.enabled,
            hmac_secret: cfg.auth.hmac_secret.clone().map(String::into_bytes),
            bearer_token: cfg.auth.bearer_token.clone(),
            realm: SERVICE_NAME.to_string(),
            exempt_paths: Vec::new(),
        },
        rate_limit: RateLimitConfig { burst: cfg.auth.burst, rate_per_minute: cfg.auth.rate_limit_per_minute },
        security_headers: SecurityHeadersConfig::default(),
    };
    let app = build_router(state, router_config);

    spawn_tick_loop(queue, tracker, metrics.clone(), scene, cfg.max_operations_per_cycle);

    metrics.start_server();
    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    tracing::info!(addr = %cfg.listen_addr, service = SERVICE_NAME, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    metrics.stop_server();

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

/// Drains the queue on a fixed cadence, standing in for the rendering
/// engine's tick callback.
fn spawn_tick_loop(
    queue: Arc<RequestQueue>,
    tracker: Arc<RequestTracker>,
    metrics: Arc<MetricsRegistry>,
    scene: Arc<SceneStore>,
    max_operations_per_cycle: usize,
) {
    tokio::spawn(async move {
        let executor = TickExecutor::new(max_operations_per_cycle);
        let mut interval = tokio::time::interval(Duration::from_millis(16));
        loop {
            interval.tick().await;
            let handler = SceneOperationHandler(&scene);
            executor.run_tick(&queue, &tracker, &metrics, &handler);
        }
    });
}

/// The `Controller` body: inline for read-only queries, queued through the
/// tick thread for anything that mutates the scene (§2's request pipeline).
async fn dispatch(
    scene: &SceneStore,
    queue: &RequestQueue,
    tracker: &RequestTracker,
    metrics: &MetricsRegistry,
    operation: &str,
    payload: Value,
) -> Value {
    match operation {
        "get_health" => serde_json::json!({ "status": "ok", "uptime_seconds": metrics.get_uptime_seconds() }),
        "get_metrics" => metrics.get_json_metrics(),
        "get_scene" => scene.get_scene(),
        "scene_status" => scene.scene_status(),
        "list_elements" => result_to_value(scene.list_elements(&payload)),
        "batch_info" => result_to_value(scene.batch_info(&payload)),
        "query_objects_by_type" => result_to_value(scene.query_objects_by_type(&payload)),
        "query_objects_in_bounds" => result_to_value(scene.query_objects_in_bounds(&payload)),
        "query_objects_near_point" => result_to_value(scene.query_objects_near_point(&payload)),
        "calculate_bounds" => result_to_value(scene.calculate_bounds(&payload)),
        "find_ground_level" => result_to_value(scene.find_ground_level(&payload)),
        "request_status" => request_status(tracker, &payload),
        "add_element" => {
            metrics.increment_counter("elements_created", 1);
            enqueue_and_await(queue, tracker, Channel::Elements, operation, payload).await
        }
        "create_batch" => {
            metrics.increment_counter("batches_processed", 1);
            enqueue_and_await(queue, tracker, Channel::Batches, operation, payload).await
        }
        "place_asset" => {
            metrics.increment_counter("assets_placed", 1);
            enqueue_and_await(queue, tracker, Channel::Assets, operation, payload).await
        }
        "transform_asset" | "remove_element" | "clear_path" | "align_objects" => {
            enqueue_and_await(queue, tracker, Channel::Elements, operation, payload).await
        }
        other => error_value(CoreError::domain_failed(other, "no handler registered for this operation")),
    }
}

fn result_to_value(result: Result<Value, CoreError>) -> Value {
    match result {
        Ok(value) => value,
        Err(err) => error_value(err),
    }
}

fn error_value(err: CoreError) -> Value {
    serde_json::to_value(Envelope::from(err)).expect("Envelope always serializes")
}

fn request_status(tracker: &RequestTracker, payload: &Value) -> Value {
    let Some(id) = payload.get("request_id").and_then(Value::as_str) else {
        return error_value(CoreError::missing_parameter("request_id"));
    };
    match tracker.get(id, true) {
        Some(snapshot) => serde_json::to_value(snapshot).expect("RequestSnapshot always serializes"),
        None => error_value(CoreError::NotFound { what: format!("request `{id}`") }),
    }
}

async fn enqueue_and_await(
    queue: &RequestQueue,
    tracker: &RequestTracker,
    channel: Channel,
    operation: &str,
    payload: Value,
) -> Value {
    let id = uuid::Uuid::new_v4().to_string();
    tracker.add(&id, payload.clone());
    match queue.enqueue(channel, id, operation, payload) {
        Ok((_, rx)) => match rx.await {
            Ok(envelope) => serde_json::to_value(envelope).expect("Envelope always serializes"),
            Err(_) => error_value(CoreError::ServiceUnavailable { reason: "tick executor dropped the request".to_string() }),
        },
        Err(err) => error_value(err),
    }
}
