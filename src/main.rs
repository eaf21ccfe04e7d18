//! Billing service entry point.
//!
//! Usage: `retail-billing [config.toml]`. `BILLING_*` environment variables
//! override the file; see [`retail_billing::config`].

use retail_billing::api::{self, AppState};
use retail_billing::config::Config;
use retail_billing::fulfillment::PdfInvoiceRenderer;
use retail_billing::lifecycle::{setup_tracing, BillingSystem, SystemError};
use retail_billing::messaging::OutboxTransport;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), SystemError> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    setup_tracing(&config.logging);
    info!(config = ?config_path, "Starting retail billing service");

    let transport = Arc::new(OutboxTransport::new(
        config.messaging.outbox_dir.clone(),
        config.messaging.auto_pair,
        config.messaging.pairing_delay,
    ));
    let renderer = Arc::new(PdfInvoiceRenderer::default());
    let system = BillingSystem::new(&config, transport, renderer);

    let listener = TcpListener::bind(config.server.bind_address).await?;
    info!(addr = %config.server.bind_address, "Listening");

    let app = api::router(AppState::from_system(&system));
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = &served {
        error!(error = %e, "HTTP server failed");
    }

    // The router (and its state clones) is gone once serve returns.
    system.shutdown().await?;
    served?;

    info!("Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
