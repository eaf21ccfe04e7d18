//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`MockClient`] to script the replies of an actor, or
//! [`create_mock_client`] to get a client plus the raw request receiver and
//! answer requests by hand (useful when the test needs to look at the payload).

use crate::framework::{ActorEntity, FrameworkError, ResourceClient, ResourceRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected request and the canned response for it.
enum Expectation<T: ActorEntity> {
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    Create {
        response: Result<T::Id, FrameworkError>,
    },
    Update {
        id: T::Id,
        response: Result<T, FrameworkError>,
    },
    Action {
        id: T::Id,
        response: Result<T::ActionResult, FrameworkError>,
    },
    List {
        response: Result<Vec<T>, FrameworkError>,
    },
}

impl<T: ActorEntity> Expectation<T> {
    fn name(&self) -> &'static str {
        match self {
            Expectation::Get { .. } => "Get",
            Expectation::Create { .. } => "Create",
            Expectation::Update { .. } => "Update",
            Expectation::Action { .. } => "Action",
            Expectation::List { .. } => "List",
        }
    }
}

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock client with expectation tracking for fluent testing.
///
/// Expectations are consumed in FIFO order. A request that does not match the
/// next expectation (kind or id) panics the mock task, which drops the
/// responder and surfaces as [`FrameworkError::ActorDropped`] to the caller.
///
/// # Example
/// ```ignore
/// let mut mock = MockClient::<InventoryItem>::new();
/// mock.expect_action(ItemId(1)).return_ok(LedgerActionResult::Reserved(reservation));
///
/// let client = LedgerClient::new(mock.client());
/// // Use client in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Expectations<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Expectations<T> = Arc::new(Mutex::new(VecDeque::new()));
        let pending = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = pending
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .pop_front();

                match (request, expectation) {
                    (ResourceRequest::Get { id, respond_to }, Some(Expectation::Get { id: want, response })) => {
                        assert_eq!(id, want, "Get for unexpected id");
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Create { respond_to, .. }, Some(Expectation::Create { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Update { id, respond_to, .. },
                        Some(Expectation::Update { id: want, response }),
                    ) => {
                        assert_eq!(id, want, "Update for unexpected id");
                        let _ = respond_to.send(response);
                    }
                    (
                        ResourceRequest::Action { id, respond_to, .. },
                        Some(Expectation::Action { id: want, response }),
                    ) => {
                        assert_eq!(id, want, "Action for unexpected id");
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::List { respond_to, .. }, Some(Expectation::List { response })) => {
                        let _ = respond_to.send(response);
                    }
                    (request, expectation) => {
                        panic!(
                            "Unexpected request {:?}, expected {}",
                            request,
                            expectation.as_ref().map_or("nothing", Expectation::name)
                        );
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    /// Expects a `get` operation.
    pub fn expect_get(&mut self, id: T::Id) -> ExpectationBuilder<T, Option<T>> {
        self.builder(move |response| Expectation::Get { id, response })
    }

    /// Expects a `create` operation.
    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T::Id> {
        self.builder(|response| Expectation::Create { response })
    }

    /// Expects an `update` operation.
    pub fn expect_update(&mut self, id: T::Id) -> ExpectationBuilder<T, T> {
        self.builder(move |response| Expectation::Update { id, response })
    }

    /// Expects an `action` operation.
    pub fn expect_action(&mut self, id: T::Id) -> ExpectationBuilder<T, T::ActionResult> {
        self.builder(move |response| Expectation::Action { id, response })
    }

    /// Expects a `list` operation. The filter is not applied to the canned reply.
    pub fn expect_list(&mut self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(|response| Expectation::List { response })
    }

    fn builder<R>(
        &self,
        make: impl FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send + 'static,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            make: Box::new(make),
            expectations: self.expectations.clone(),
        }
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let exps = self
            .expectations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !exps.is_empty() {
            panic!("Not all expectations were met. {} remaining", exps.len());
        }
    }
}

/// Builder that records the reply for one expectation.
pub struct ExpectationBuilder<T: ActorEntity, R> {
    make: Box<dyn FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send>,
    expectations: Expectations<T>,
}

impl<T: ActorEntity, R> ExpectationBuilder<T, R> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<R, FrameworkError>) {
        let expectation = (self.make)(response);
        self.expectations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(expectation);
    }
}

// =============================================================================
// RAW CHANNEL HELPERS
// =============================================================================

/// Creates a client and the receiver its requests arrive on.
///
/// The test plays the actor: it pulls requests off `receiver` with
/// [`expect_action`] and friends, asserts on the payload, and answers through
/// the oneshot responder.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Next message must be a Create request.
pub async fn expect_create<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Create, oneshot::Sender<Result<T::Id, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Next message must be an Action request.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(
    T::Id,
    T::Action,
    oneshot::Sender<Result<T::ActionResult, FrameworkError>>,
)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger_actor::LedgerAction;
    use crate::model::{InventoryItem, ItemCreate, ItemId, TenantId};

    fn item(id: u32, quantity: u32) -> InventoryItem {
        InventoryItem {
            id: ItemId(id),
            tenant: TenantId::from("shop-a"),
            name: "Paracetamol".to_string(),
            unit_price: 250,
            quantity,
            reorder_level: 0,
        }
    }

    #[tokio::test]
    async fn test_raw_channel_create() {
        let (client, mut receiver) = create_mock_client::<InventoryItem>(10);

        let create_task = tokio::spawn(async move {
            client
                .create(ItemCreate {
                    tenant: TenantId::from("shop-a"),
                    name: "Paracetamol".to_string(),
                    unit_price: 250,
                    quantity: 5,
                    reorder_level: 1,
                })
                .await
        });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.name, "Paracetamol");
        responder.send(Ok(ItemId(7))).unwrap();

        assert_eq!(create_task.await.unwrap().unwrap(), ItemId(7));
    }

    #[tokio::test]
    async fn test_raw_channel_action_payload() {
        let (client, mut receiver) = create_mock_client::<InventoryItem>(10);

        tokio::spawn(async move {
            let _ = client
                .perform_action(
                    ItemId(3),
                    LedgerAction::Inspect {
                        tenant: TenantId::from("shop-a"),
                    },
                )
                .await;
        });

        let (id, action, _responder) = expect_action(&mut receiver).await.expect("Expected Action");
        assert_eq!(id, ItemId(3));
        assert!(matches!(action, LedgerAction::Inspect { .. }));
    }

    #[tokio::test]
    async fn test_mock_client_with_expectations() {
        let mut mock = MockClient::<InventoryItem>::new();
        mock.expect_create().return_ok(ItemId(1));
        mock.expect_get(ItemId(1)).return_ok(Some(item(1, 5)));
        mock.expect_list().return_ok(vec![item(1, 5), item(2, 0)]);

        let client = mock.client();
        let id = client
            .create(ItemCreate {
                tenant: TenantId::from("shop-a"),
                name: "Paracetamol".to_string(),
                unit_price: 250,
                quantity: 5,
                reorder_level: 0,
            })
            .await
            .unwrap();
        assert_eq!(id, ItemId(1));

        let fetched = client.get(ItemId(1)).await.unwrap();
        assert_eq!(fetched.unwrap().quantity, 5);
        assert_eq!(client.list(|_| true).await.unwrap().len(), 2);

        mock.verify();
    }

    #[tokio::test]
    async fn test_mismatch_surfaces_as_dropped_actor() {
        let mut mock = MockClient::<InventoryItem>::new();
        mock.expect_create().return_ok(ItemId(1));

        let err = mock.client().get(ItemId(1)).await.unwrap_err();
        assert!(matches!(err, FrameworkError::ActorDropped | FrameworkError::ActorClosed));
    }
}
