//! # Invoice Actor
//!
//! Single-writer store of immutable [`Invoice`] records. The actor assigns a
//! random [`InvoiceId`] and checks the draft's totals before inserting.

pub mod entity;
pub mod error;

pub use error::*;

use crate::clients::InvoiceClient;
use crate::framework::ResourceActor;
use crate::model::{Invoice, InvoiceId};

/// Creates the invoice actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<Invoice>, InvoiceClient) {
    let (actor, generic_client) = ResourceActor::new(buffer_size, InvoiceId::new);
    (actor, InvoiceClient::new(generic_client))
}
