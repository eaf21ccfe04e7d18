//! # Invoice Transaction Engine
//!
//! Turns a cart into a persisted, immutable [`Invoice`](crate::model::Invoice)
//! and hands delivery off to the fulfillment worker.

pub mod engine;
pub mod error;

pub use engine::InvoiceEngine;
pub use error::BillingError;
