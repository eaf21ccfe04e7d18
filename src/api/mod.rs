//! # HTTP Surface
//!
//! axum routes over the engine, the ledger and the session manager. The
//! caller's tenant comes from the `x-tenant-id` header; errors are
//! `{ "msg": ... }` bodies.

pub mod error;
pub mod inventory;
pub mod messaging;
pub mod sales;
pub mod tenant;

pub use error::ApiError;
pub use tenant::{Tenant, TENANT_HEADER};

use crate::billing::InvoiceEngine;
use crate::clients::LedgerClient;
use crate::lifecycle::BillingSystem;
use crate::messaging::SessionManager;
use axum::routing::{get, post};
use axum::Router;

#[derive(Clone)]
pub struct AppState {
    pub engine: InvoiceEngine,
    pub ledger: LedgerClient,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn from_system(system: &BillingSystem) -> Self {
        Self {
            engine: system.engine.clone(),
            ledger: system.ledger.clone(),
            sessions: system.sessions.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sales", post(sales::create_sale).get(sales::list_sales))
        .route("/api/sales/:id", get(sales::get_sale))
        .route("/api/messaging/status", get(messaging::status))
        .route("/api/inventory", post(inventory::stock_item))
        .route("/api/inventory/:id", get(inventory::get_item))
        .with_state(state)
}
