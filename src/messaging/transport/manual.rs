//! Event-scripted transport for embedding and tests.
//!
//! The caller drives the handshake with [`ManualTransport::emit`] and can
//! inspect starts, closes and sends, or queue failures for the next sends.

use super::{EventSink, SendError, Transport, TransportError, TransportEvent, TransportLink};
use crate::messaging::Address;
use crate::model::{Document, TenantId};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// A document accepted by a [`ManualTransport`] link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDocument {
    pub tenant: TenantId,
    pub to: Address,
    pub file_name: String,
    pub caption: String,
}

#[derive(Default)]
struct ManualState {
    sinks: HashMap<TenantId, EventSink>,
    starts: HashMap<TenantId, usize>,
    closes: HashMap<TenantId, usize>,
    refuse_starts: bool,
    send_failures: VecDeque<SendError>,
    send_delay: Option<Duration>,
    send_attempts: usize,
    sent: Vec<SentDocument>,
}

#[derive(Clone)]
pub struct ManualTransport {
    state: Arc<Mutex<ManualState>>,
    // Bumped after every start so waiters can re-check.
    started: Arc<watch::Sender<u64>>,
}

impl Default for ManualTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualTransport {
    pub fn new() -> Self {
        let (started, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(ManualState::default())),
            started: Arc::new(started),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pushes an event into the tenant's current session.
    /// Returns `false` if the tenant has no live session.
    pub fn emit(&self, tenant: &TenantId, event: TransportEvent) -> bool {
        let sink = self.lock().sinks.get(tenant).cloned();
        sink.is_some_and(|sink| sink.emit(event))
    }

    /// Runs the whole handshake: challenge, authenticated, ready.
    pub fn connect(&self, tenant: &TenantId) -> bool {
        self.emit(tenant, TransportEvent::PairingChallenge(format!("pair-{tenant}")))
            && self.emit(tenant, TransportEvent::Authenticated)
            && self.emit(tenant, TransportEvent::Ready)
    }

    /// Waits until `tenant` has been started at least `count` times.
    pub async fn wait_started(&self, tenant: &TenantId, count: usize, timeout: Duration) -> bool {
        let mut rx = self.started.subscribe();
        let waited = tokio::time::timeout(timeout, rx.wait_for(|_| self.start_count(tenant) >= count)).await;
        matches!(waited, Ok(Ok(_)))
    }

    pub fn start_count(&self, tenant: &TenantId) -> usize {
        self.lock().starts.get(tenant).copied().unwrap_or(0)
    }

    pub fn close_count(&self, tenant: &TenantId) -> usize {
        self.lock().closes.get(tenant).copied().unwrap_or(0)
    }

    /// Makes every following `start` fail.
    pub fn refuse_starts(&self, refuse: bool) {
        self.lock().refuse_starts = refuse;
    }

    /// Queues a failure for the next send on any tenant.
    pub fn fail_next_send(&self, error: SendError) {
        self.lock().send_failures.push_back(error);
    }

    /// Makes every send take `delay` before completing.
    pub fn delay_sends(&self, delay: Duration) {
        self.lock().send_delay = Some(delay);
    }

    /// Number of times any link tried to send, failed or not.
    pub fn send_attempts(&self) -> usize {
        self.lock().send_attempts
    }

    pub fn sent(&self) -> Vec<SentDocument> {
        self.lock().sent.clone()
    }
}

#[async_trait]
impl Transport for ManualTransport {
    async fn start(
        &self,
        tenant: &TenantId,
        events: EventSink,
    ) -> Result<Box<dyn TransportLink>, TransportError> {
        {
            let mut state = self.lock();
            *state.starts.entry(tenant.clone()).or_default() += 1;
            if state.refuse_starts {
                drop(state);
                self.started.send_modify(|n| *n += 1);
                return Err(TransportError::Refused(format!("start refused for {tenant}")));
            }
            state.sinks.insert(tenant.clone(), events.clone());
        }
        // The state lock must be released before notifying waiters.
        self.started.send_modify(|n| *n += 1);
        Ok(Box::new(ManualLink {
            tenant: tenant.clone(),
            sink: events,
            transport: self.clone(),
        }))
    }
}

struct ManualLink {
    tenant: TenantId,
    sink: EventSink,
    transport: ManualTransport,
}

#[async_trait]
impl TransportLink for ManualLink {
    async fn send_document(
        &self,
        to: &Address,
        document: &Document,
        caption: &str,
    ) -> Result<(), SendError> {
        let (failure, delay) = {
            let mut state = self.transport.lock();
            state.send_attempts += 1;
            (state.send_failures.pop_front(), state.send_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(failure) = failure {
            return Err(failure);
        }
        self.transport.lock().sent.push(SentDocument {
            tenant: self.tenant.clone(),
            to: to.clone(),
            file_name: document.file_name.clone(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn close(&self) {
        let mut state = self.transport.lock();
        // A newer session may already have registered its own sink.
        if state.sinks.get(&self.tenant).is_some_and(|s| s.same_session(&self.sink)) {
            state.sinks.remove(&self.tenant);
        }
        *state.closes.entry(self.tenant.clone()).or_default() += 1;
    }
}
