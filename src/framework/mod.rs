//! Generic actor framework for the billing stores.
//!
//! # Main Components
//!
//! - [`ActorEntity`] - Trait that resource types implement to be managed by actors
//! - [`ResourceActor`] - Generic actor that owns a map of entities
//! - [`ResourceClient`] - Typed, cloneable handle used to talk to an actor
//! - [`FrameworkError`] - Plumbing errors plus the boxed entity error
//!
//! # Testing
//!
//! See [`mock`] for utilities to test clients without spawning full actors.

pub mod core;
pub mod mock;

pub use core::*;
