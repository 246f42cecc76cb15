use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use lms_core::RoleType;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// `OBSERVABILITY_ENABLED=false` (or `0`) turns every metric off.
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep task.
/// Returns None if observability is disabled or the recorder cannot be installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5,
                10.0,
            ],
        )
        .and_then(|builder| builder.install_recorder())
        .inspect_err(|e| tracing::warn!(error = %e, "Prometheus recorder not installed"))
        .ok()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let uri_path = req.uri().path().to_owned();

    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or(uri_path);

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Serves `GET /metrics` from the installed recorder.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn track_user_created(role_type: RoleType) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_created_total", "role_type" => role_type.as_str()).increment(1);
}

pub fn track_sign_in_success(role_type: RoleType) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_sign_ins_total", "role_type" => role_type.as_str(), "status" => "success")
        .increment(1);
}

pub fn track_sign_in_failure(reason: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_sign_ins_total", "role_type" => "unknown", "status" => "failure", "reason" => reason)
        .increment(1);
}

pub fn track_tokens_issued() {
    if !is_observability_enabled() {
        return;
    }
    counter!("jwt_tokens_issued_total").increment(1);
}

pub fn track_access_denied(role_type: RoleType) {
    if !is_observability_enabled() {
        return;
    }
    counter!("access_denials_total", "role_type" => role_type.as_str()).increment(1);
}

pub fn track_test_created(items: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("tests_created_total").increment(1);
    histogram!("test_items_per_test").record(items as f64);
}

pub fn track_file_stored(field: &'static str, bytes: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("files_stored_total", "field" => field).increment(1);
    counter!("files_stored_bytes_total", "field" => field).increment(bytes as u64);
}
