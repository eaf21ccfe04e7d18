//! Invoice records. Persisted once, never modified.

use super::{ItemId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub Uuid);

impl InvoiceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvoiceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for InvoiceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(InvoiceId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Other,
}

/// One requested line of a cart. Never persisted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub item: ItemId,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(item: ItemId, quantity: u32) -> Self {
        Self { item, quantity }
    }
}

/// Caller input to invoice creation. Carries no prices.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub lines: Vec<CartLine>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub item_id: ItemId,
    /// Name at the time of sale.
    pub name: String,
    /// Price at the time of sale, minor units.
    pub unit_price: u64,
    pub quantity: u32,
    pub line_total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub tenant: TenantId,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub total: u64,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

/// Everything the engine computed for an invoice, minus the store-assigned id.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub tenant: TenantId,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub total: u64,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn from_draft(id: InvoiceId, draft: InvoiceDraft) -> Self {
        Self {
            id,
            tenant: draft.tenant,
            customer_name: draft.customer_name,
            customer_contact: draft.customer_contact,
            lines: draft.lines,
            total: draft.total,
            payment_method: draft.payment_method,
            created_at: draft.created_at,
        }
    }
}
