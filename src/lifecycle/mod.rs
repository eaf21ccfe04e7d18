//! # System Lifecycle & Orchestration
//!
//! [`BillingSystem`] creates every actor and task, injects their dependencies
//! and shuts them down in order: the job queue first (so in-flight receipts
//! can finish), then messaging sessions, then the stores.
//!
//! [`setup_tracing`] initializes structured logging.

pub mod billing_system;
pub mod tracing;

pub use billing_system::{BillingSystem, SystemError};
pub use self::tracing::setup_tracing;
