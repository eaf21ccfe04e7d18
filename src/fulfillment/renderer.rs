//! Turning an invoice into a deliverable document.

use crate::model::{Document, Invoice};
use std::fmt::Write;
use thiserror::Error;

/// Rendering failures are permanent: the same invoice renders the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("invoice {0} has no lines")]
    EmptyInvoice(String),
    #[error("rendering failed: {0}")]
    Failed(String),
}

/// Pure, deterministic invoice renderer.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, invoice: &Invoice) -> Result<Document, RenderError>;
}

/// Plain-text receipt, `invoice_<id>.txt`.
#[derive(Debug, Clone)]
pub struct TextReceiptRenderer {
    shop_name: String,
}

impl Default for TextReceiptRenderer {
    fn default() -> Self {
        Self::new("Retail Billing")
    }
}

impl TextReceiptRenderer {
    pub fn new(shop_name: impl Into<String>) -> Self {
        Self {
            shop_name: shop_name.into(),
        }
    }
}

/// Minor units to `major.minor`.
pub(super) fn money(amount: u64) -> String {
    format!("{}.{:02}", amount / 100, amount % 100)
}

impl DocumentRenderer for TextReceiptRenderer {
    fn render(&self, invoice: &Invoice) -> Result<Document, RenderError> {
        if invoice.lines.is_empty() {
            return Err(RenderError::EmptyInvoice(invoice.id.to_string()));
        }

        let mut out = String::new();
        let fmt_err = |e: std::fmt::Error| RenderError::Failed(e.to_string());
        writeln!(out, "{}", self.shop_name).map_err(fmt_err)?;
        writeln!(out, "Invoice {}", invoice.id).map_err(fmt_err)?;
        writeln!(out, "Date: {}", invoice.created_at.format("%Y-%m-%d %H:%M UTC")).map_err(fmt_err)?;
        writeln!(out, "Customer: {}", invoice.customer_name).map_err(fmt_err)?;
        if let Some(contact) = &invoice.customer_contact {
            writeln!(out, "Contact: {contact}").map_err(fmt_err)?;
        }
        writeln!(out).map_err(fmt_err)?;
        for line in &invoice.lines {
            writeln!(
                out,
                "{:<24} {:>4} x {:>10} = {:>10}",
                line.name,
                line.quantity,
                money(line.unit_price),
                money(line.line_total)
            )
            .map_err(fmt_err)?;
        }
        writeln!(out).map_err(fmt_err)?;
        writeln!(out, "Total: {}", money(invoice.total)).map_err(fmt_err)?;
        writeln!(out, "Paid by: {:?}", invoice.payment_method).map_err(fmt_err)?;

        Ok(Document {
            file_name: format!("invoice_{}.txt", invoice.id),
            content_type: "text/plain; charset=utf-8".to_string(),
            bytes: out.into_bytes(),
        })
    }
}
