//! [`ActorEntity`] implementation for [`Invoice`].
//!
//! Invoices are insert-only: `Update` and `Action` are uninhabited, so the
//! compiler rules out any mutation after the record is created.

use super::InvoiceError;
use crate::framework::ActorEntity;
use crate::model::{Invoice, InvoiceDraft, InvoiceId};
use async_trait::async_trait;
use std::convert::Infallible;

#[async_trait]
impl ActorEntity for Invoice {
    type Id = InvoiceId;
    type Create = InvoiceDraft;
    type Update = Infallible;
    type Action = Infallible;
    type ActionResult = Infallible;
    type Context = ();
    type Error = InvoiceError;

    fn from_create_params(id: InvoiceId, draft: InvoiceDraft) -> Result<Self, InvoiceError> {
        if draft.lines.is_empty() {
            return Err(InvoiceError::Invalid("invoice has no lines".into()));
        }
        let line_sum = draft
            .lines
            .iter()
            .try_fold(0u64, |acc, line| acc.checked_add(line.line_total))
            .ok_or_else(|| InvoiceError::Invalid("line totals overflow".into()))?;
        if line_sum != draft.total {
            return Err(InvoiceError::Invalid(format!(
                "total {} does not match line totals {}",
                draft.total, line_sum
            )));
        }
        Ok(Invoice::from_draft(id, draft))
    }

    async fn on_update(&mut self, update: Infallible, _ctx: &()) -> Result<(), InvoiceError> {
        match update {}
    }

    async fn handle_action(
        &mut self,
        action: Infallible,
        _ctx: &(),
    ) -> Result<Infallible, InvoiceError> {
        match action {}
    }
}
