use crate::billing::InvoiceEngine;
use crate::clients::{InvoiceClient, LedgerClient};
use crate::config::Config;
use crate::fulfillment::{DocumentRenderer, FulfillmentWorker, JobBoard};
use crate::messaging::{DialingPlan, SessionManager, Transport};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

/// Runtime orchestrator: spawns the store actors, the session manager and
/// the fulfillment worker, and wires them together.
///
/// # Example
///
/// ```ignore
/// let system = BillingSystem::new(&config, transport, renderer);
/// let invoice = system.engine.create_invoice(&tenant, cart).await?;
/// system.shutdown().await?;
/// ```
pub struct BillingSystem {
    pub engine: InvoiceEngine,
    pub ledger: LedgerClient,
    pub invoices: InvoiceClient,
    pub sessions: SessionManager,
    pub board: JobBoard,

    session_grace: Duration,
    worker: JoinHandle<()>,
    /// Store actor tasks (ledger, invoices).
    handles: Vec<JoinHandle<()>>,
}

impl BillingSystem {
    /// Creates and starts every component. Must be called inside a Tokio runtime.
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        // 1. Store actors (no dependencies, Context = ())
        let (ledger_actor, ledger) = crate::ledger_actor::new(config.store.actor_buffer);
        let (invoice_actor, invoices) = crate::invoice_actor::new(config.store.actor_buffer);
        let ledger_handle = tokio::spawn(ledger_actor.run(()));
        let invoice_handle = tokio::spawn(invoice_actor.run(()));

        // 2. Sessions and the worker that delivers through them
        let dialing = DialingPlan {
            country_code: config.messaging.country_code.clone(),
            local_number_len: config.messaging.local_number_len,
        };
        let sessions = SessionManager::new(transport, dialing, config.messaging.send_timeout);
        let (worker, queue) = FulfillmentWorker::new(&config.fulfillment, sessions.clone(), renderer);
        let board = worker.board().clone();
        let worker = tokio::spawn(worker.run());

        // 3. The engine holds the only long-lived queue handle
        let engine = InvoiceEngine::new(ledger.clone(), invoices.clone(), queue);

        info!(bind = %config.server.bind_address, "Billing system started");
        Self {
            engine,
            ledger,
            invoices,
            sessions,
            board,
            session_grace: config.server.shutdown_grace,
            worker,
            handles: vec![ledger_handle, invoice_handle],
        }
    }

    /// Gracefully shuts everything down.
    ///
    /// Every clone of the engine and clients handed out (e.g. to the HTTP
    /// router) must be dropped first, or the actors keep running.
    ///
    /// 1. Dropping the engine closes the job queue; the worker drains it.
    /// 2. Sessions are closed.
    /// 3. Dropping the clients stops the store actors.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down billing system...");
        let Self {
            engine,
            ledger,
            invoices,
            sessions,
            board,
            session_grace,
            worker,
            handles,
        } = self;

        drop(engine);
        if let Err(e) = worker.await {
            error!("Fulfillment worker failed: {:?}", e);
            return Err(SystemError::TaskFailed(format!("fulfillment worker: {e}")));
        }
        let stats = board.stats();
        info!(delivered = stats.delivered, failed = stats.failed, "Fulfillment drained");

        sessions.shutdown(session_grace).await;

        drop(ledger);
        drop(invoices);
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(SystemError::TaskFailed(format!("actor: {e}")));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
