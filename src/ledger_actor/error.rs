//! Error types for the ledger actor.

use crate::model::ItemId;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// The requested item does not exist.
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    /// The item belongs to another tenant.
    #[error("Item {0} belongs to another tenant")]
    Unauthorized(ItemId),

    /// The requested quantity exceeds the stock on hand.
    #[error("Insufficient stock for {name} ({item}): requested {requested}, available {available}")]
    InsufficientStock {
        item: ItemId,
        name: String,
        requested: u32,
        available: u32,
    },

    /// Zero quantities, or a release that would overflow the counter.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Rejected catalog data (e.g. a blank name).
    #[error("Invalid item: {0}")]
    InvalidItem(String),

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for LedgerError {
    fn from(msg: String) -> Self {
        LedgerError::ActorCommunicationError(msg)
    }
}
