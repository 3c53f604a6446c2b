//! Health endpoint handlers.
//!
//! Every request runs its own read-only evaluation; nothing here touches
//! the failure counter or the containers.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::debug;

use dnsha_health::{HealthReport, RunState, VerdictReason};

use crate::ApiState;

#[derive(Serialize)]
struct HealthSummary<'a> {
    node: &'a str,
    status: &'static str,
    reason: VerdictReason,
    timestamp: u64,
}

#[derive(Serialize)]
struct DetailedHealth<'a> {
    node: &'a str,
    status: &'static str,
    timestamp: u64,
    #[serde(flatten)]
    report: HealthReport,
}

#[derive(Serialize)]
struct Readiness {
    ready: bool,
    timestamp: u64,
}

#[derive(Serialize)]
struct Liveness {
    alive: bool,
    timestamp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn status_code(ok: bool) -> StatusCode {
    if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

fn status_label(healthy: bool) -> &'static str {
    if healthy { "healthy" } else { "unhealthy" }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, [(header::CACHE_CONTROL, "no-cache")], Json(body)).into_response()
}

/// GET /health
pub async fn health(State(state): State<ApiState>) -> Response {
    let report = state.evaluator.evaluate().await;
    let healthy = report.verdict.healthy;
    debug!(healthy, "GET /health");

    json_response(
        status_code(healthy),
        HealthSummary {
            node: &state.node,
            status: status_label(healthy),
            reason: report.verdict.reason,
            timestamp: now_secs(),
        },
    )
}

/// GET /health/detailed
pub async fn health_detailed(State(state): State<ApiState>) -> Response {
    let report = state.evaluator.evaluate().await;
    let healthy = report.verdict.healthy;
    debug!(healthy, "GET /health/detailed");

    json_response(
        status_code(healthy),
        DetailedHealth {
            node: &state.node,
            status: status_label(healthy),
            timestamp: now_secs(),
            report,
        },
    )
}

/// GET /ready: the primary dependency is running. No probe.
pub async fn ready(State(state): State<ApiState>) -> Response {
    let ready = state.evaluator.primary_state().await == RunState::Running;
    debug!(ready, "GET /ready");

    json_response(
        status_code(ready),
        Readiness {
            ready,
            timestamp: now_secs(),
        },
    )
}

/// GET /live
pub async fn live() -> Response {
    json_response(
        StatusCode::OK,
        Liveness {
            alive: true,
            timestamp: now_secs(),
        },
    )
}
