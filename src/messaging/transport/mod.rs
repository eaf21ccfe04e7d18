//! The seam between the session manager and a concrete messaging network.
//!
//! A [`Transport`] starts one connection per tenant and reports lifecycle
//! changes by pushing [`TransportEvent`]s into the [`EventSink`] it was given.
//! The returned [`TransportLink`] is used for sending once the session is
//! connected.

pub mod manual;
pub mod outbox;

pub use manual::{ManualTransport, SentDocument};
pub use outbox::OutboxTransport;

use super::Address;
use crate::model::{Document, TenantId};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Lifecycle notifications raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A pairing payload the user has to scan or accept.
    PairingChallenge(String),
    Authenticated,
    /// Handshake complete, sends will be accepted.
    Ready,
    AuthFailure(String),
    Disconnected(String),
}

/// Failure to bring a session up at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport refused to start: {0}")]
    Refused(String),
}

/// Failure to send one document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// This message failed; the session is still usable.
    #[error("send failed: {0}")]
    Transient(String),
    /// The transport lost the session while sending.
    #[error("session lost: {0}")]
    SessionLost(String),
}

/// Non-blocking handle a transport uses to report events for one tenant.
///
/// Safe to call from callbacks and from other threads.
#[derive(Debug, Clone)]
pub struct EventSink {
    tenant: TenantId,
    sender: mpsc::UnboundedSender<TransportEvent>,
}

impl EventSink {
    pub(crate) fn new(tenant: TenantId, sender: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self { tenant, sender }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    /// Returns `false` once the session this sink belongs to is gone.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Whether both sinks feed the same session.
    pub fn same_session(&self, other: &EventSink) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Begins the handshake for `tenant`. Events flow through `events`
    /// from now on, possibly before this call returns.
    async fn start(
        &self,
        tenant: &TenantId,
        events: EventSink,
    ) -> Result<Box<dyn TransportLink>, TransportError>;
}

#[async_trait]
pub trait TransportLink: Send + Sync {
    async fn send_document(
        &self,
        to: &Address,
        document: &Document,
        caption: &str,
    ) -> Result<(), SendError>;

    /// Releases the connection. Called exactly once, at teardown.
    async fn close(&self);
}
