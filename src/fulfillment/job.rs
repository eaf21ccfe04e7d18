//! Fulfillment job data.

use crate::model::{DocumentHandle, Invoice, InvoiceId, TenantId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Render-and-deliver work for one invoice.
#[derive(Debug, Clone)]
pub struct FulfillmentJob {
    pub id: JobId,
    pub tenant: TenantId,
    pub contact: String,
    pub invoice: Invoice,
}

impl FulfillmentJob {
    pub fn new(invoice: Invoice, contact: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            tenant: invoice.tenant.clone(),
            contact: contact.into(),
            invoice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    Render(String),
    SessionNotReady,
    Transport(String),
    InvalidRecipient(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Render(e) => write!(f, "render failed: {e}"),
            FailureReason::SessionNotReady => f.write_str("messaging session not ready"),
            FailureReason::Transport(e) => write!(f, "transport failed: {e}"),
            FailureReason::InvalidRecipient(e) => write!(f, "invalid recipient: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Rendering,
    Delivering,
    Delivered,
    Failed(FailureReason),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Delivered | JobState::Failed(_))
    }
}

/// Observable progress of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: JobId,
    pub invoice_id: InvoiceId,
    pub tenant: TenantId,
    pub contact: String,
    pub state: JobState,
    /// Delivery attempts made so far.
    pub attempts: u32,
    pub document: Option<DocumentHandle>,
    pub updated_at: DateTime<Utc>,
}
