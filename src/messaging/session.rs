//! One task per tenant owning that tenant's session.
//!
//! Transport events and commands arrive over channels and are handled one at
//! a time, so transitions for a tenant are totally ordered. Status changes are
//! published on a `watch` channel; readers never queue behind a delivery.

use super::state::{SessionState, SessionStatus, Transition};
use super::transport::{EventSink, SendError, Transport, TransportEvent, TransportLink};
use super::{Address, DeliveryResult, RejectReason};
use crate::model::{Document, TenantId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

pub(crate) enum SessionCommand {
    Deliver {
        to: Address,
        document: Arc<Document>,
        caption: String,
        respond_to: oneshot::Sender<DeliveryResult>,
    },
    Close,
}

/// Registry-side handle to a running (or finished) session.
#[derive(Clone)]
pub(crate) struct SessionHandle {
    pub(crate) commands: mpsc::Sender<SessionCommand>,
    pub(crate) status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    pub(crate) fn current(&self) -> SessionStatus {
        self.status.borrow().clone()
    }
}

pub(crate) struct SessionActor {
    tenant: TenantId,
    transport: Arc<dyn Transport>,
    send_timeout: Duration,
    status: SessionStatus,
    status_tx: watch::Sender<SessionStatus>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    commands: mpsc::Receiver<SessionCommand>,
    link: Option<Box<dyn TransportLink>>,
}

impl SessionActor {
    /// Creates the actor in `INITIALIZING` together with its handle.
    pub(crate) fn new(
        tenant: TenantId,
        transport: Arc<dyn Transport>,
        send_timeout: Duration,
        command_buffer: usize,
    ) -> (Self, SessionHandle) {
        let status = SessionStatus::initializing();
        let (status_tx, status_rx) = watch::channel(status.clone());
        let (events_tx, events) = mpsc::unbounded_channel();
        let (commands_tx, commands) = mpsc::channel(command_buffer);

        let actor = Self {
            tenant,
            transport,
            send_timeout,
            status,
            status_tx,
            events_tx,
            events,
            commands,
            link: None,
        };
        let handle = SessionHandle {
            commands: commands_tx,
            status: status_rx,
        };
        (actor, handle)
    }

    pub(crate) async fn run(mut self) {
        let tenant = self.tenant.clone();
        info!(%tenant, state = %self.status.state, "Session starting");

        let sink = EventSink::new(tenant.clone(), self.events_tx.clone());
        match self.transport.start(&tenant, sink).await {
            Ok(link) => self.link = Some(link),
            Err(e) => {
                warn!(%tenant, error = %e, "Transport failed to start");
                self.teardown().await;
                return;
            }
        }

        loop {
            tokio::select! {
                // Lifecycle events win over queued deliveries.
                biased;

                Some(event) = self.events.recv() => {
                    if self.on_event(event).await {
                        break;
                    }
                }
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Deliver { to, document, caption, respond_to }) => {
                        let (result, lost) = self.deliver(&to, &document, &caption).await;
                        let _ = respond_to.send(result);
                        if lost {
                            self.teardown().await;
                            break;
                        }
                    }
                    Some(SessionCommand::Close) | None => {
                        info!(%tenant, "Session closing");
                        self.teardown().await;
                        break;
                    }
                },
            }
        }

        info!(%tenant, "Session ended");
    }

    /// Returns `true` when the session is finished.
    async fn on_event(&mut self, event: TransportEvent) -> bool {
        let tenant = &self.tenant;
        debug!(%tenant, ?event, "Transport event");
        match self.status.apply(&event) {
            Transition::Moved {
                to: SessionState::Disconnected,
                from,
            } => {
                warn!(%tenant, %from, ?event, "Session disconnected");
                self.teardown().await;
                true
            }
            Transition::Moved { from, to } => {
                info!(%tenant, %from, %to, "Session transition");
                self.publish();
                false
            }
            Transition::ChallengeRefreshed => {
                info!(%tenant, "Pairing challenge refreshed");
                self.publish();
                false
            }
            Transition::Ignored => {
                warn!(%tenant, state = %self.status.state, ?event, "Ignoring out-of-order event");
                false
            }
        }
    }

    /// Sends one document. The flag is `true` when the transport lost the session.
    async fn deliver(&self, to: &Address, document: &Document, caption: &str) -> (DeliveryResult, bool) {
        let tenant = &self.tenant;
        let link = match (&self.link, self.status.state) {
            (Some(link), SessionState::Connected) => link,
            _ => return (DeliveryResult::Rejected(RejectReason::SessionNotReady), false),
        };

        match tokio::time::timeout(self.send_timeout, link.send_document(to, document, caption)).await {
            Ok(Ok(())) => {
                info!(%tenant, to = %to, file = %document.file_name, "Document delivered");
                (DeliveryResult::Delivered, false)
            }
            Ok(Err(SendError::Transient(reason))) => {
                warn!(%tenant, to = %to, %reason, "Delivery failed");
                (DeliveryResult::Rejected(RejectReason::Transport(reason)), false)
            }
            Ok(Err(SendError::SessionLost(reason))) => {
                warn!(%tenant, to = %to, %reason, "Session lost during delivery");
                (DeliveryResult::Rejected(RejectReason::Transport(reason)), true)
            }
            Err(_) => {
                let reason = format!("send timed out after {:?}", self.send_timeout);
                warn!(%tenant, to = %to, %reason, "Delivery failed");
                (DeliveryResult::Rejected(RejectReason::Transport(reason)), false)
            }
        }
    }

    /// Drops the link and any challenge, then publishes `DISCONNECTED`.
    async fn teardown(&mut self) {
        if let Some(link) = self.link.take() {
            link.close().await;
        }
        self.status.disconnect();
        self.publish();
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status.clone());
    }
}
