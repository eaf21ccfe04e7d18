//! # Retail Billing
//!
//! Point-of-sale billing for many tenants: a shared stock ledger, an
//! invoice store, and receipt delivery over per-tenant messaging sessions.
//!
//! ## Design
//!
//! State lives in actors built on one generic [`ResourceActor`](framework::ResourceActor).
//! Each actor owns its records and processes requests one at a time, so a
//! stock decrement is check-and-update with no locks and no lost updates.
//!
//! A sale is answered as soon as stock is taken and the invoice stored.
//! Receipt delivery is queued and runs in the background; its failures never
//! touch the invoice or the stock.
//!
//! ## Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: Message loop, request/response plumbing and the [`MockClient`](framework::mock::MockClient) for tests.
//! - **Key items**: [`ActorEntity`](framework::ActorEntity), [`ResourceActor`](framework::ResourceActor).
//!
//! ### 2. The Stores ([`ledger_actor`], [`invoice_actor`]) and their [`clients`]
//! - **Role**: Stock records with atomic reserve/release; immutable invoices.
//! - **Key items**: [`LedgerClient`](clients::LedgerClient), [`InvoiceClient`](clients::InvoiceClient).
//!
//! ### 3. The Business Logic ([`billing`])
//! - **Role**: Validate, price, reserve, persist, then hand the receipt to fulfillment.
//! - **Key items**: [`InvoiceEngine`](billing::InvoiceEngine).
//!
//! ### 4. Delivery ([`messaging`], [`fulfillment`])
//! - **Role**: One session per tenant with a pairing state machine; a worker
//!   that renders receipts and delivers them with retries.
//! - **Key items**: [`SessionManager`](messaging::SessionManager), [`FulfillmentWorker`](fulfillment::FulfillmentWorker).
//!
//! ### 5. The Outside ([`api`], [`config`], [`lifecycle`])
//! - **Role**: HTTP routes, layered configuration, startup and ordered shutdown.
//! - **Key items**: [`BillingSystem`](lifecycle::BillingSystem), [`router`](api::router).
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=info cargo run -- billing.toml
//! ```

pub mod api;
pub mod billing;
pub mod clients;
pub mod config;
pub mod framework;
pub mod fulfillment;
pub mod invoice_actor;
pub mod ledger_actor;
pub mod lifecycle;
pub mod messaging;
pub mod model;
