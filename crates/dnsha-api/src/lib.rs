//! dnsha-api: HTTP health service for a DNS node.
//!
//! Exposes the same evaluation the priority hook uses, for load balancers
//! and monitoring.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/health` | Overall status; 200 healthy, 503 otherwise |
//! | GET | `/health/detailed` | Full health report; 200 healthy, 503 otherwise |
//! | GET | `/ready` | Primary dependency running; 200 / 503 |
//! | GET | `/live` | Always 200 |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use dnsha_health::HealthEvaluator;

/// Shared state for the handlers.
#[derive(Clone)]
pub struct ApiState {
    pub evaluator: Arc<HealthEvaluator>,
    /// Node name echoed in responses.
    pub node: String,
}

/// Build the health service router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/health/detailed", get(handlers::health_detailed))
        .route("/ready", get(handlers::ready))
        .route("/live", get(handlers::live))
        .with_state(state)
}
