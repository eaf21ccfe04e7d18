//! Error types for the invoice actor.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvoiceError {
    /// The draft failed the store's integrity checks.
    #[error("Invalid invoice: {0}")]
    Invalid(String),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for InvoiceError {
    fn from(msg: String) -> Self {
        InvoiceError::ActorCommunicationError(msg)
    }
}
