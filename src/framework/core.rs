//! # Core Actor Framework
//!
//! This module defines the generic building blocks every stateful store in the
//! billing system is built from.
//!
//! ## Key Types
//!
//! - [`ActorEntity`]: The trait that all resource types must implement.
//! - [`ResourceActor`]: The generic actor that owns a collection of entities.
//! - [`ResourceClient`]: The generic client for communicating with actors.
//! - [`FrameworkError`]: Plumbing errors (ActorClosed, NotFound) plus the entity's own error.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any resource entity must implement to be managed by [`ResourceActor`].
///
/// # Architecture Note
/// The inventory ledger and the invoice store are both "a map of entities owned
/// by one task". Writing the message loop once and plugging entities into it
/// keeps the per-entity code down to validation and state transitions.
///
/// Associated types keep every operation typed: an `InventoryItem` actor only
/// accepts `ItemCreate` payloads and `LedgerAction`s.
///
/// # Async & Context
/// Hooks are `#[async_trait]` so they may call other actors. `Context` is
/// injected into every hook when the loop starts ("late binding").
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug + 'static;

    /// The data required to update an existing instance.
    /// Use [`std::convert::Infallible`] for entities that never change.
    type Update: Send + Sync + Debug + 'static;

    /// Enum of resource-specific operations (e.g. `Reserve`).
    type Action: Send + Sync + Debug + 'static;

    /// The result type returned by custom actions.
    type ActionResult: Send + Sync + Debug + 'static;

    /// The runtime context (dependencies) injected into the actor.
    /// Use `()` if no dependencies are needed.
    type Context: Send + Sync + 'static;

    /// One error enum per actor. Clients recover it with
    /// [`FrameworkError::entity_error`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct the full entity from the generated ID and the payload.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Called when an update request is received.
    async fn on_update(
        &mut self,
        update: Self::Update,
        ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Handle a custom resource-specific action.
    ///
    /// The actor processes one message at a time, so whatever this method does
    /// to `self` is atomic with respect to every other request for the store.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}

// =============================================================================
// 2. THE GENERIC MESSAGES & ERRORS
// =============================================================================

/// Errors that can occur within the actor framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

impl FrameworkError {
    /// Recovers the entity's own error type from an [`FrameworkError::EntityError`].
    ///
    /// Any other variant (or an entity error of a different type) is handed back
    /// unchanged so the caller can map it to a communication failure.
    pub fn entity_error<E>(self) -> Result<E, FrameworkError>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match self {
            FrameworkError::EntityError(inner) => inner
                .downcast::<E>()
                .map(|typed| *typed)
                .map_err(FrameworkError::EntityError),
            other => Err(other),
        }
    }
}

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Predicate used by [`ResourceRequest::List`].
pub type Filter<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Internal message type sent to the actor to request operations.
///
/// The variants are the resource lifecycle (create, read, update) plus
/// `Action` for domain operations such as stock reservation, and `List` for
/// filtered scans (e.g. "all invoices of one tenant").
pub enum ResourceRequest<T: ActorEntity> {
    Create {
        params: T::Create,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Update {
        id: T::Id,
        update: T::Update,
        respond_to: Response<T>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
    List {
        filter: Filter<T>,
        respond_to: Response<Vec<T>>,
    },
}

impl<T: ActorEntity> Debug for ResourceRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRequest::Create { params, .. } => f
                .debug_struct("Create")
                .field("params", params)
                .finish_non_exhaustive(),
            ResourceRequest::Get { id, .. } => {
                f.debug_struct("Get").field("id", id).finish_non_exhaustive()
            }
            ResourceRequest::Update { id, update, .. } => f
                .debug_struct("Update")
                .field("id", id)
                .field("update", update)
                .finish_non_exhaustive(),
            ResourceRequest::Action { id, action, .. } => f
                .debug_struct("Action")
                .field("id", id)
                .field("action", action)
                .finish_non_exhaustive(),
            ResourceRequest::List { .. } => f.debug_struct("List").finish_non_exhaustive(),
        }
    }
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// The generic actor that manages a collection of entities.
///
/// # Concurrency Model
/// The actor owns `store` exclusively and processes its queue sequentially, so
/// no `Mutex` is needed and a check-then-mutate inside
/// [`ActorEntity::handle_action`] cannot interleave with another request.
/// This is what makes a stock decrement atomic per item.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates the actor (server half) and a cloneable client.
    ///
    /// `buffer_size` bounds the request queue; senders wait when it is full.
    /// `next_id_fn` mints identifiers for `Create` requests.
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
        };
        (actor, ResourceClient::new(sender))
    }

    /// Runs the actor's event loop until every client has been dropped.
    pub async fn run(mut self, context: T::Context) {
        // "InventoryItem" instead of "retail_billing::model::inventory::InventoryItem"
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let id = (self.next_id_fn)();
                    match T::from_create_params(id.clone(), params) {
                        Ok(item) => {
                            self.store.insert(id.clone(), item);
                            info!(entity_type, %id, size = self.store.len(), "Created");
                            let _ = respond_to.send(Ok(id));
                        }
                        Err(e) => {
                            warn!(entity_type, error = %e, "Create failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    debug!(entity_type, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    let Some(item) = self.store.get_mut(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    // Work on a copy so a rejected update leaves the stored entity untouched.
                    let mut candidate = item.clone();
                    match candidate.on_update(update, &context).await {
                        Ok(()) => {
                            *item = candidate.clone();
                            info!(entity_type, %id, "Updated");
                            let _ = respond_to.send(Ok(candidate));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Update failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let Some(item) = self.store.get_mut(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let result = item
                        .handle_action(action, &context)
                        .await
                        .map_err(|e| FrameworkError::EntityError(Box::new(e)));
                    match &result {
                        Ok(_) => debug!(entity_type, %id, "Action ok"),
                        Err(e) => warn!(entity_type, %id, error = %e, "Action failed"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::List { filter, respond_to } => {
                    let items: Vec<T> = self.store.values().filter(|v| filter(*v)).cloned().collect();
                    debug!(entity_type, matched = items.len(), "List");
                    let _ = respond_to.send(Ok(items));
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

/// A type-safe client for interacting with a [`ResourceActor`].
///
/// Holds only a sender, so cloning is cheap; the actor stops once every clone
/// has been dropped.
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: ActorEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::Create) -> Result<T::Id, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to })
            .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to })
            .await
    }

    pub async fn update(&self, id: T::Id, update: T::Update) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Update {
            id,
            update,
            respond_to,
        })
        .await
    }

    pub async fn perform_action(
        &self,
        id: T::Id,
        action: T::Action,
    ) -> Result<T::ActionResult, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Action {
            id,
            action,
            respond_to,
        })
        .await
    }

    pub async fn list(
        &self,
        filter: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::List {
            filter: Box::new(filter),
            respond_to,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        id: u32,
        label: String,
        value: u32,
    }

    #[derive(Debug)]
    struct CounterCreate {
        label: String,
    }

    #[derive(Debug)]
    struct CounterUpdate {
        label: Option<String>,
    }

    #[derive(Debug)]
    enum CounterAction {
        Take(u32),
    }

    #[derive(Debug, thiserror::Error, PartialEq)]
    enum CounterError {
        #[error("blank label")]
        BlankLabel,
        #[error("only {0} left")]
        Exhausted(u32),
    }

    #[async_trait]
    impl ActorEntity for Counter {
        type Id = u32;
        type Create = CounterCreate;
        type Update = CounterUpdate;
        type Action = CounterAction;
        type ActionResult = u32;
        type Context = ();
        type Error = CounterError;

        fn from_create_params(id: u32, params: CounterCreate) -> Result<Self, CounterError> {
            if params.label.trim().is_empty() {
                return Err(CounterError::BlankLabel);
            }
            Ok(Self {
                id,
                label: params.label,
                value: 3,
            })
        }

        async fn on_update(&mut self, update: CounterUpdate, _ctx: &()) -> Result<(), CounterError> {
            if let Some(label) = update.label {
                if label.is_empty() {
                    return Err(CounterError::BlankLabel);
                }
                self.label = label;
            }
            Ok(())
        }

        async fn handle_action(&mut self, action: CounterAction, _ctx: &()) -> Result<u32, CounterError> {
            match action {
                CounterAction::Take(n) if n <= self.value => {
                    self.value -= n;
                    Ok(self.value)
                }
                CounterAction::Take(_) => Err(CounterError::Exhausted(self.value)),
            }
        }
    }

    fn spawn_counters() -> ResourceClient<Counter> {
        let seq = Arc::new(AtomicU32::new(1));
        let (actor, client) = ResourceActor::new(8, move || seq.fetch_add(1, Ordering::SeqCst));
        tokio::spawn(actor.run(()));
        client
    }

    #[tokio::test]
    async fn test_actions_are_applied_in_order() {
        let client = spawn_counters();
        let id = client.create(CounterCreate { label: "a".into() }).await.unwrap();
        assert_eq!(id, 1);

        assert_eq!(client.perform_action(id, CounterAction::Take(2)).await.unwrap(), 1);
        let err = client
            .perform_action(id, CounterAction::Take(2))
            .await
            .unwrap_err()
            .entity_error::<CounterError>()
            .unwrap();
        assert_eq!(err, CounterError::Exhausted(1));
    }

    #[tokio::test]
    async fn test_rejected_update_keeps_previous_state() {
        let client = spawn_counters();
        let id = client.create(CounterCreate { label: "a".into() }).await.unwrap();

        let result = client
            .update(id, CounterUpdate { label: Some(String::new()) })
            .await;
        assert!(result.is_err());
        assert_eq!(client.get(id).await.unwrap().unwrap().label, "a");

        let updated = client
            .update(id, CounterUpdate { label: Some("b".into()) })
            .await
            .unwrap();
        assert_eq!(updated.label, "b");
    }

    #[tokio::test]
    async fn test_create_failure_and_missing_ids() {
        let client = spawn_counters();
        let err = client
            .create(CounterCreate { label: " ".into() })
            .await
            .unwrap_err();
        assert!(matches!(err.entity_error::<CounterError>(), Ok(CounterError::BlankLabel)));

        let missing = client.perform_action(42, CounterAction::Take(1)).await.unwrap_err();
        assert!(matches!(missing, FrameworkError::NotFound(ref id) if id == "42"));
        assert!(client.get(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_applies_filter() {
        let client = spawn_counters();
        for label in ["keep", "drop", "keep"] {
            client.create(CounterCreate { label: label.into() }).await.unwrap();
        }
        let kept = client.list(|c: &Counter| c.label == "keep").await.unwrap();
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_entity_error_leaves_other_variants_alone() {
        let err = FrameworkError::ActorClosed.entity_error::<CounterError>();
        assert!(matches!(err, Err(FrameworkError::ActorClosed)));

        let wrong_type = FrameworkError::EntityError(Box::new(std::io::Error::other("disk")))
            .entity_error::<CounterError>();
        assert!(matches!(wrong_type, Err(FrameworkError::EntityError(_))));
    }
}
