//! Custom actions for the ledger actor.
//!
//! Every action carries the caller's tenant; the entity checks ownership
//! before touching anything.

use crate::model::{Reservation, StockSnapshot, TenantId};

#[derive(Debug, Clone)]
pub enum LedgerAction {
    /// Ownership-checked read of the current stock record.
    Inspect { tenant: TenantId },
    /// Atomic check-and-decrement.
    ///
    /// # Errors
    /// Fails with `InsufficientStock` if `quantity` exceeds stock on hand, and
    /// with `InvalidQuantity` if `quantity` is zero.
    Reserve { tenant: TenantId, quantity: u32 },
    /// Compensating increment, used to undo a reservation.
    Release { tenant: TenantId, quantity: u32 },
}

/// Results from [`LedgerAction`]s - variants match 1:1.
#[derive(Debug, Clone)]
pub enum LedgerActionResult {
    Inspected(StockSnapshot),
    Reserved(Reservation),
    /// Stock on hand after the release.
    Released(u32),
}
