//! # Ledger Actor
//!
//! The inventory ledger: one [`ResourceActor`] owning every [`InventoryItem`].
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](crate::framework::ActorEntity) implementation for [`InventoryItem`]
//! - [`error`] - [`LedgerError`]
//! - [`actions`] - [`LedgerAction`] and [`LedgerActionResult`]
//! - [`new()`] - Factory function that creates the actor and client
//!
//! ## Atomicity
//!
//! Requests are processed one at a time, so `Reserve` is a compare-and-decrement
//! that two concurrent callers can never both win when their combined quantity
//! exceeds stock. Decrements across several items are *not* a transaction; the
//! invoice engine compensates with `Release`.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::LedgerClient;
use crate::framework::ResourceActor;
use crate::model::{InventoryItem, ItemId};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Creates the ledger actor and its client.
pub fn new(buffer_size: usize) -> (ResourceActor<InventoryItem>, LedgerClient) {
    let item_id_counter = Arc::new(AtomicU32::new(1));
    let next_item_id = move || ItemId(item_id_counter.fetch_add(1, Ordering::SeqCst));

    let (actor, generic_client) = ResourceActor::new(buffer_size, next_item_id);
    (actor, LedgerClient::new(generic_client))
}
