//! Tenant → session map with atomic get-or-start.

use super::session::{SessionActor, SessionHandle};
use crate::model::TenantId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinSet;

pub(crate) enum Ensured {
    Existing(SessionHandle),
    Started(SessionHandle),
    /// The manager has shut down.
    Closed,
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<TenantId, SessionHandle>,
    tasks: JoinSet<()>,
    closed: bool,
}

/// The mutex is never held across an await, only around map updates and
/// task spawns.
#[derive(Default)]
pub(crate) struct SessionRegistry {
    inner: Mutex<Registry>,
}

impl SessionRegistry {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn get(&self, tenant: &TenantId) -> Option<SessionHandle> {
        self.lock().sessions.get(tenant).cloned()
    }

    /// Returns the tenant's live session, or starts one with `start`.
    ///
    /// Disconnected entries stay in the map (so their status stays readable)
    /// until this call replaces them.
    pub(crate) fn get_or_start(
        &self,
        tenant: &TenantId,
        start: impl FnOnce() -> (SessionActor, SessionHandle),
    ) -> Ensured {
        let mut registry = self.lock();
        if registry.closed {
            return Ensured::Closed;
        }
        // Reap finished sessions.
        while registry.tasks.try_join_next().is_some() {}

        if let Some(handle) = registry.sessions.get(tenant) {
            if handle.current().state.is_live() && !handle.commands.is_closed() {
                return Ensured::Existing(handle.clone());
            }
        }

        let (actor, handle) = start();
        registry.tasks.spawn(actor.run());
        registry.sessions.insert(tenant.clone(), handle.clone());
        Ensured::Started(handle)
    }

    /// Stops accepting sessions and hands back everything that is running.
    pub(crate) fn close(&self) -> (Vec<SessionHandle>, JoinSet<()>) {
        let mut registry = self.lock();
        registry.closed = true;
        let handles = registry.sessions.values().cloned().collect();
        (handles, std::mem::take(&mut registry.tasks))
    }
}
