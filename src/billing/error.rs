//! Errors surfaced synchronously by invoice creation and lookup.

use crate::invoice_actor::InvoiceError;
use crate::ledger_actor::LedgerError;
use crate::model::{InvoiceId, ItemId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BillingError {
    #[error("{0}")]
    Validation(String),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    #[error("Unauthorized access to item {0}")]
    ItemUnauthorized(ItemId),

    #[error("Not authorized to access invoice {0}")]
    InvoiceUnauthorized(InvoiceId),

    #[error("Insufficient stock for {name} ({item}): requested {requested}, available {available}")]
    InsufficientStock {
        item: ItemId,
        name: String,
        requested: u32,
        available: u32,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BillingError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BillingError::ItemNotFound(_) | BillingError::InvoiceNotFound(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BillingError::ItemUnauthorized(_) | BillingError::InvoiceUnauthorized(_))
    }
}

impl From<LedgerError> for BillingError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(item) => BillingError::ItemNotFound(item),
            LedgerError::Unauthorized(item) => BillingError::ItemUnauthorized(item),
            LedgerError::InsufficientStock {
                item,
                name,
                requested,
                available,
            } => BillingError::InsufficientStock {
                item,
                name,
                requested,
                available,
            },
            LedgerError::InvalidQuantity(msg) | LedgerError::InvalidItem(msg) => BillingError::Validation(msg),
            LedgerError::ActorCommunicationError(msg) => BillingError::Storage(msg),
        }
    }
}

impl From<InvoiceError> for BillingError {
    fn from(e: InvoiceError) -> Self {
        BillingError::Storage(e.to_string())
    }
}
