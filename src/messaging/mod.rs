//! # Messaging Session Manager
//!
//! Keeps one stateful session per tenant with an external messaging network
//! and delivers rendered documents through it.
//!
//! ## Structure
//!
//! - [`state`] - [`SessionState`] machine and the published [`SessionStatus`]
//! - [`transport`] - [`Transport`] seam plus the outbox and manual transports
//! - [`address`] - recipient normalization ([`DialingPlan`])
//! - [`SessionManager`] - registry, per-tenant session actors, delivery
//!
//! Sessions start lazily (`ensure_session`) and never block the caller; the
//! fulfillment worker waits for readiness with [`SessionManager::wait_until_ready`].

pub mod address;
mod manager;
mod registry;
mod session;
pub mod state;
pub mod transport;

pub use address::*;
pub use manager::SessionManager;
pub use state::*;
pub use transport::{
    EventSink, ManualTransport, OutboxTransport, SendError, Transport, TransportError, TransportEvent,
    TransportLink,
};

use serde::Serialize;

/// Why a delivery did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    SessionNotReady,
    Transport(String),
    InvalidRecipient(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeliveryResult {
    Delivered,
    Rejected(RejectReason),
}
