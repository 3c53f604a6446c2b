//! `dnshad serve`: long-running HTTP health service.

use std::path::Path;

use anyhow::Context;
use tracing::{error, info};

use dnsha_api::{ApiState, build_router};

use crate::node;

pub async fn run_serve(config_path: &Path, listen: Option<String>) -> anyhow::Result<()> {
    let config = node::load_config(config_path)?;
    let listen = listen.unwrap_or_else(|| config.api.listen.clone());

    let runtime = node::container_runtime(&config);
    let evaluator = node::evaluator(&config, runtime)?;
    let router = build_router(ApiState {
        evaluator,
        node: config.node_name(),
    });

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    info!(addr = %listen, node = %config.node_name(), "health service listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("health service stopped");
    Ok(())
}
