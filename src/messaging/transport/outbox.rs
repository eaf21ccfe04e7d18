//! Development transport that "delivers" into a directory per tenant.
//!
//! Pairing is simulated: a random challenge is issued on start and, with
//! `auto_pair`, accepted after `pairing_delay`.

use super::{EventSink, SendError, Transport, TransportError, TransportEvent, TransportLink};
use crate::messaging::Address;
use crate::model::{Document, TenantId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

pub struct OutboxTransport {
    root: PathBuf,
    auto_pair: bool,
    pairing_delay: Duration,
}

impl OutboxTransport {
    pub fn new(root: impl Into<PathBuf>, auto_pair: bool, pairing_delay: Duration) -> Self {
        Self {
            root: root.into(),
            auto_pair,
            pairing_delay,
        }
    }

    /// Directory documents for `tenant` are written to.
    pub fn tenant_dir(&self, tenant: &TenantId) -> PathBuf {
        let safe: String = tenant
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(safe)
    }
}

#[async_trait]
impl Transport for OutboxTransport {
    async fn start(
        &self,
        tenant: &TenantId,
        events: EventSink,
    ) -> Result<Box<dyn TransportLink>, TransportError> {
        let dir = self.tenant_dir(tenant);
        tokio::fs::create_dir_all(&dir).await?;

        let challenge = Uuid::new_v4().simple().to_string();
        info!(%tenant, dir = %dir.display(), "Outbox session started");
        events.emit(TransportEvent::PairingChallenge(challenge));

        let pairing = self.auto_pair.then(|| {
            let delay = self.pairing_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if events.emit(TransportEvent::Authenticated) {
                    events.emit(TransportEvent::Ready);
                }
            })
        });

        Ok(Box::new(OutboxLink { dir, pairing }))
    }
}

struct OutboxLink {
    dir: PathBuf,
    pairing: Option<JoinHandle<()>>,
}

impl OutboxLink {
    fn target(&self, to: &Address, document: &Document) -> PathBuf {
        let name = Path::new(&document.file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.dir.join(format!("{}_{}", to.digits(), name))
    }
}

#[async_trait]
impl TransportLink for OutboxLink {
    async fn send_document(
        &self,
        to: &Address,
        document: &Document,
        caption: &str,
    ) -> Result<(), SendError> {
        let path = self.target(to, document);
        tokio::fs::write(&path, &document.bytes)
            .await
            .map_err(|e| SendError::Transient(format!("{}: {e}", path.display())))?;
        debug!(to = %to.chat_id(), path = %path.display(), caption, "Document dropped in outbox");
        Ok(())
    }

    async fn close(&self) {
        if let Some(pairing) = &self.pairing {
            pairing.abort();
        }
    }
}
