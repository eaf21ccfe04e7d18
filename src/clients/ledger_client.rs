//! # Ledger Client
//!
//! High-level API over the ledger actor. Every stock operation is a
//! [`LedgerAction`] routed to the single actor that owns the items.

use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::ledger_actor::{LedgerAction, LedgerActionResult, LedgerError};
use crate::model::{InventoryItem, ItemCreate, ItemId, ItemUpdate, Reservation, StockSnapshot, TenantId};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct LedgerClient {
    inner: ResourceClient<InventoryItem>,
}

impl LedgerClient {
    pub fn new(inner: ResourceClient<InventoryItem>) -> Self {
        Self { inner }
    }
}

impl ActorClient<InventoryItem> for LedgerClient {
    type Error = LedgerError;

    fn inner(&self) -> &ResourceClient<InventoryItem> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> LedgerError {
        match e.entity_error::<LedgerError>() {
            Ok(typed) => typed,
            Err(FrameworkError::NotFound(id)) => match id.parse::<ItemId>() {
                Ok(item) => LedgerError::NotFound(item),
                Err(_) => LedgerError::ActorCommunicationError(format!("Item not found: {id}")),
            },
            Err(other) => LedgerError::ActorCommunicationError(other.to_string()),
        }
    }
}

fn unexpected(result: LedgerActionResult) -> LedgerError {
    LedgerError::ActorCommunicationError(format!("unexpected ledger reply: {result:?}"))
}

impl LedgerClient {
    /// Registers a stock item and returns its ledger id.
    #[instrument(skip(self))]
    pub async fn stock_item(&self, params: ItemCreate) -> Result<ItemId, LedgerError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    /// Ownership-checked read of the item's current stock record.
    #[instrument(skip(self))]
    pub async fn inspect(&self, tenant: &TenantId, item: ItemId) -> Result<StockSnapshot, LedgerError> {
        let action = LedgerAction::Inspect {
            tenant: tenant.clone(),
        };
        match self.inner.perform_action(item, action).await {
            Ok(LedgerActionResult::Inspected(snapshot)) => Ok(snapshot),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// Atomically decrements `quantity` units, or fails leaving stock untouched.
    #[instrument(skip(self))]
    pub async fn reserve(
        &self,
        tenant: &TenantId,
        item: ItemId,
        quantity: u32,
    ) -> Result<Reservation, LedgerError> {
        debug!("Reserving {} units of {}", quantity, item);
        let action = LedgerAction::Reserve {
            tenant: tenant.clone(),
            quantity,
        };
        match self.inner.perform_action(item, action).await {
            Ok(LedgerActionResult::Reserved(reservation)) => Ok(reservation),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// Gives back units taken by an earlier [`reserve`](Self::reserve).
    #[instrument(skip(self))]
    pub async fn release(&self, tenant: &TenantId, item: ItemId, quantity: u32) -> Result<u32, LedgerError> {
        let action = LedgerAction::Release {
            tenant: tenant.clone(),
            quantity,
        };
        match self.inner.perform_action(item, action).await {
            Ok(LedgerActionResult::Released(remaining)) => Ok(remaining),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    /// Catalog edit (name, price, reorder level). Existing invoices keep their snapshots.
    #[instrument(skip(self))]
    pub async fn update_item(&self, item: ItemId, update: ItemUpdate) -> Result<InventoryItem, LedgerError> {
        self.inner.update(item, update).await.map_err(Self::map_error)
    }
}
