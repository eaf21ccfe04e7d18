//! Typed wrappers around [`ResourceClient`](crate::framework::ResourceClient).

pub mod actor_client;
pub mod invoice_client;
pub mod ledger_client;

pub use actor_client::*;
pub use invoice_client::*;
pub use ledger_client::*;
