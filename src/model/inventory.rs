//! Inventory records owned by the ledger actor.

use super::TenantId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ledger-assigned item identifier, displayed as `item_<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl From<u32> for ItemId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item_{}", self.0)
    }
}

/// Accepts both the display form (`item_7`) and the bare number (`7`).
impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("item_").unwrap_or(s).parse().map(ItemId)
    }
}

/// A stock record. `quantity` only moves through ledger reserve/release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: ItemId,
    pub tenant: TenantId,
    pub name: String,
    /// Minor currency units.
    pub unit_price: u64,
    pub quantity: u32,
    pub reorder_level: u32,
}

impl InventoryItem {
    pub fn snapshot(&self) -> StockSnapshot {
        StockSnapshot {
            id: self.id,
            name: self.name.clone(),
            unit_price: self.unit_price,
            quantity: self.quantity,
            reorder_level: self.reorder_level,
        }
    }

    pub fn is_below_reorder_level(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

/// Payload for registering a stock item.
#[derive(Debug, Clone)]
pub struct ItemCreate {
    pub tenant: TenantId,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub reorder_level: u32,
}

/// Catalog edit. Quantity is deliberately absent.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub tenant: TenantId,
    pub name: Option<String>,
    pub unit_price: Option<u64>,
    pub reorder_level: Option<u32>,
}

impl ItemUpdate {
    pub fn new(tenant: TenantId) -> Self {
        Self {
            tenant,
            name: None,
            unit_price: None,
            reorder_level: None,
        }
    }
}

/// Point-in-time view of an item, used for pre-validation and price snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub id: ItemId,
    pub name: String,
    pub unit_price: u64,
    pub quantity: u32,
    pub reorder_level: u32,
}

/// Outcome of a successful decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub item: ItemId,
    pub remaining: u32,
    pub below_reorder_level: bool,
}
