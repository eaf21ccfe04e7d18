use super::registry::{Ensured, SessionRegistry};
use super::session::{SessionActor, SessionCommand};
use super::state::{SessionState, SessionStatus};
use super::transport::Transport;
use super::{DeliveryResult, DialingPlan, RejectReason};
use crate::model::{Document, TenantId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{info, instrument, warn};

const COMMAND_BUFFER: usize = 32;

/// Multiplexes one messaging session per tenant.
///
/// Cheap to clone; every clone talks to the same registry.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    dialing: DialingPlan,
    send_timeout: Duration,
    registry: SessionRegistry,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, dialing: DialingPlan, send_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                dialing,
                send_timeout,
                registry: SessionRegistry::default(),
            }),
        }
    }

    pub fn dialing_plan(&self) -> &DialingPlan {
        &self.inner.dialing
    }

    /// Makes sure `tenant` has a live session, starting the handshake in the
    /// background if needed. Never waits for the handshake.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub fn ensure_session(&self, tenant: &TenantId) -> SessionStatus {
        let inner = &self.inner;
        let ensured = inner.registry.get_or_start(tenant, || {
            SessionActor::new(
                tenant.clone(),
                inner.transport.clone(),
                inner.send_timeout,
                COMMAND_BUFFER,
            )
        });
        match ensured {
            Ensured::Existing(handle) => handle.current(),
            Ensured::Started(handle) => {
                info!("Session initializing");
                handle.current()
            }
            Ensured::Closed => {
                warn!("Session manager is shut down");
                self.status(tenant)
            }
        }
    }

    /// Current status; `UNINITIALIZED` if the tenant never had a session.
    pub fn status(&self, tenant: &TenantId) -> SessionStatus {
        self.inner
            .registry
            .get(tenant)
            .map(|handle| handle.current())
            .unwrap_or_else(SessionStatus::uninitialized)
    }

    /// Subscribes to status changes of the tenant's current session.
    pub fn watch(&self, tenant: &TenantId) -> Option<watch::Receiver<SessionStatus>> {
        self.inner.registry.get(tenant).map(|handle| handle.status)
    }

    /// Waits for `CONNECTED`. Gives up early if the session disconnects.
    pub async fn wait_until_ready(&self, tenant: &TenantId, timeout: Duration) -> bool {
        let Some(mut status) = self.watch(tenant) else {
            return false;
        };
        let settled = status.wait_for(|s| matches!(s.state, SessionState::Connected | SessionState::Disconnected));
        let ready = match tokio::time::timeout(timeout, settled).await {
            Ok(Ok(s)) => s.is_ready(),
            _ => false,
        };
        ready
    }

    /// Delivers `document` to `contact` through the tenant's session.
    ///
    /// Never touches the transport unless the session is `CONNECTED`.
    #[instrument(skip(self, document, caption), fields(tenant = %tenant, file = %document.file_name))]
    pub async fn deliver(
        &self,
        tenant: &TenantId,
        contact: &str,
        document: Arc<Document>,
        caption: &str,
    ) -> DeliveryResult {
        let Some(handle) = self.inner.registry.get(tenant) else {
            return DeliveryResult::Rejected(RejectReason::SessionNotReady);
        };
        if !handle.current().is_ready() {
            return DeliveryResult::Rejected(RejectReason::SessionNotReady);
        }
        let to = match self.inner.dialing.normalize(contact) {
            Ok(to) => to,
            Err(e) => return DeliveryResult::Rejected(RejectReason::InvalidRecipient(e.to_string())),
        };

        let (respond_to, response) = oneshot::channel();
        let command = SessionCommand::Deliver {
            to,
            document,
            caption: caption.to_string(),
            respond_to,
        };
        if handle.commands.send(command).await.is_err() {
            return DeliveryResult::Rejected(RejectReason::SessionNotReady);
        }
        response
            .await
            .unwrap_or(DeliveryResult::Rejected(RejectReason::SessionNotReady))
    }

    /// Closes the tenant's session. A later `ensure_session` starts over.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn teardown(&self, tenant: &TenantId) -> bool {
        let Some(handle) = self.inner.registry.get(tenant) else {
            return false;
        };
        if handle.commands.send(SessionCommand::Close).await.is_err() {
            return false;
        }
        let mut status = handle.status;
        // Err means the task already ended, which is what we want.
        let _ = status.wait_for(|s| s.state == SessionState::Disconnected).await;
        info!("Session torn down");
        true
    }

    /// Closes every session and waits up to `grace` for their tasks.
    pub async fn shutdown(&self, grace: Duration) {
        let (handles, mut tasks) = self.inner.registry.close();
        for handle in &handles {
            let _ = handle.commands.send(SessionCommand::Close).await;
        }
        let drained = tokio::time::timeout(grace, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(remaining = tasks.len(), "Sessions did not close in time, aborting");
            tasks.abort_all();
        }
        info!(sessions = handles.len(), "Session manager stopped");
    }
}
