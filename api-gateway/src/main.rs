//! CloudBill API Gateway
//!
//! Serves `GET /billing`: cloud cost-and-usage for every configured account,
//! consolidated by account or by a billing dimension.

mod config;
mod error;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use cloudbill_core::{AccountRegistry, CostAggregator};
use tracing::{error, info};

use crate::config::GatewayConfig;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_gateway=info".parse()?)
                .add_directive("cloudbill_core=info".parse()?),
        )
        .json()
        .init();

    info!("Starting CloudBill API Gateway v{}", cloudbill_common::VERSION);

    let config = GatewayConfig::load();
    info!(?config, "Loaded configuration");

    // Accounts are fixed for the life of the process
    let registry = AccountRegistry::from_credentials_file(
        &config.credentials_file,
        config.region.as_deref(),
    )
    .await
    .context("failed to initialize account clients")?;
    info!(accounts = ?registry.account_ids(), "Accounts configured");

    let state = AppState::new(CostAggregator::new(Arc::new(registry)));
    let app = routes::router(state, config.request_timeout());

    let addr = config.addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("CloudBill API Gateway listening on {}", addr);
    info!("Endpoints: /billing, /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Terminated CloudBill API Gateway");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
