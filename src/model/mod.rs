//! Plain data shared by the actors, the engine and the HTTP surface.

pub mod document;
pub mod inventory;
pub mod invoice;
pub mod tenant;

pub use document::*;
pub use inventory::*;
pub use invoice::*;
pub use tenant::*;
