//! Invoice creation against the shared ledger.
//!
//! Stock decrements are per-item atomic operations, not one transaction. The
//! engine therefore validates the whole cart first, then reserves line by
//! line, and releases everything it already took if a later line loses a
//! race or the invoice cannot be stored.

use super::BillingError;
use crate::clients::{ActorClient, InvoiceClient, LedgerClient};
use crate::fulfillment::{FulfillmentJob, FulfillmentQueue};
use crate::model::{
    CartLine, Invoice, InvoiceDraft, InvoiceId, InvoiceLine, ItemId, NewInvoice, StockSnapshot, TenantId,
};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

#[derive(Clone)]
pub struct InvoiceEngine {
    ledger: LedgerClient,
    invoices: InvoiceClient,
    queue: FulfillmentQueue,
}

/// Cart input after trimming and basic checks.
struct ValidatedCart {
    customer_name: String,
    customer_contact: Option<String>,
    lines: Vec<CartLine>,
    /// Total requested per item, in first-seen order.
    demand: Vec<(ItemId, u32)>,
}

fn validate(request: NewInvoice) -> Result<ValidatedCart, BillingError> {
    let customer_name = request.customer_name.trim().to_string();
    if customer_name.is_empty() {
        return Err(BillingError::Validation("Customer name is required".into()));
    }
    if request.lines.is_empty() {
        return Err(BillingError::Validation("At least one item is required".into()));
    }

    let mut demand: Vec<(ItemId, u32)> = Vec::new();
    for line in &request.lines {
        if line.quantity == 0 {
            return Err(BillingError::Validation(format!(
                "Quantity for {} must be at least 1",
                line.item
            )));
        }
        match demand.iter_mut().find(|(item, _)| *item == line.item) {
            Some((_, total)) => {
                *total = total.checked_add(line.quantity).ok_or_else(|| {
                    BillingError::Validation(format!("Quantity for {} is too large", line.item))
                })?;
            }
            None => demand.push((line.item, line.quantity)),
        }
    }

    let customer_contact = request
        .customer_contact
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    Ok(ValidatedCart {
        customer_name,
        customer_contact,
        lines: request.lines,
        demand,
    })
}

/// Snapshots name and price from the ledger. Totals use checked arithmetic.
fn price_lines(
    lines: &[CartLine],
    catalog: &HashMap<ItemId, StockSnapshot>,
) -> Result<(Vec<InvoiceLine>, u64), BillingError> {
    let overflow = || BillingError::Validation("Invoice total is too large".into());
    let mut priced = Vec::with_capacity(lines.len());
    let mut total: u64 = 0;

    for line in lines {
        let item = catalog
            .get(&line.item)
            .ok_or(BillingError::ItemNotFound(line.item))?;
        let line_total = item
            .unit_price
            .checked_mul(u64::from(line.quantity))
            .ok_or_else(overflow)?;
        total = total.checked_add(line_total).ok_or_else(overflow)?;
        priced.push(InvoiceLine {
            item_id: line.item,
            name: item.name.clone(),
            unit_price: item.unit_price,
            quantity: line.quantity,
            line_total,
        });
    }
    Ok((priced, total))
}

impl InvoiceEngine {
    pub fn new(ledger: LedgerClient, invoices: InvoiceClient, queue: FulfillmentQueue) -> Self {
        Self {
            ledger,
            invoices,
            queue,
        }
    }

    /// Validates, prices, reserves and persists a sale, then queues delivery
    /// of the receipt when a contact was given.
    ///
    /// Either every line's stock is taken and the invoice stored, or nothing
    /// changes and the error names the offending item.
    #[instrument(skip(self, request), fields(tenant = %tenant, lines = request.lines.len()))]
    pub async fn create_invoice(&self, tenant: &TenantId, request: NewInvoice) -> Result<Invoice, BillingError> {
        let payment_method = request.payment_method;
        let cart = validate(request)?;

        let mut catalog = HashMap::with_capacity(cart.demand.len());
        for &(item, requested) in &cart.demand {
            let snapshot = self.ledger.inspect(tenant, item).await?;
            if requested > snapshot.quantity {
                warn!(item = %item, requested, available = snapshot.quantity, "Insufficient stock");
                return Err(BillingError::InsufficientStock {
                    item,
                    name: snapshot.name,
                    requested,
                    available: snapshot.quantity,
                });
            }
            catalog.insert(item, snapshot);
        }
        let (lines, total) = price_lines(&cart.lines, &catalog)?;

        let mut reserved: Vec<CartLine> = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            match self.ledger.reserve(tenant, line.item, line.quantity).await {
                Ok(_) => reserved.push(*line),
                Err(e) => {
                    warn!(item = %line.item, error = %e, "Reservation lost a race, rolling back");
                    self.release_all(tenant, &reserved).await;
                    return Err(e.into());
                }
            }
        }

        let draft = InvoiceDraft {
            tenant: tenant.clone(),
            customer_name: cart.customer_name,
            customer_contact: cart.customer_contact,
            lines,
            total,
            payment_method,
            created_at: Utc::now(),
        };
        let invoice = match self.invoices.create(draft).await {
            Ok(invoice) => invoice,
            Err(e) => {
                error!(error = %e, "Persisting invoice failed, rolling back stock");
                self.release_all(tenant, &reserved).await;
                return Err(e.into());
            }
        };
        info!(invoice_id = %invoice.id, total = invoice.total, "Invoice created");

        if let Some(contact) = &invoice.customer_contact {
            let job = FulfillmentJob::new(invoice.clone(), contact.clone());
            match self.queue.submit(job) {
                Ok(job_id) => info!(invoice_id = %invoice.id, job_id = %job_id, "Receipt delivery queued"),
                Err(e) => error!(invoice_id = %invoice.id, error = %e, "Receipt delivery not queued"),
            }
        }

        Ok(invoice)
    }

    /// Undoes reservations newest first. Failures are logged; nothing else can be done.
    async fn release_all(&self, tenant: &TenantId, reserved: &[CartLine]) {
        for line in reserved.iter().rev() {
            if let Err(e) = self.ledger.release(tenant, line.item, line.quantity).await {
                error!(item = %line.item, quantity = line.quantity, error = %e, "Rollback failed");
            }
        }
    }

    /// The tenant's invoices, newest first.
    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn list_invoices(&self, tenant: &TenantId) -> Result<Vec<Invoice>, BillingError> {
        let mut invoices = self.invoices.list_for_tenant(tenant).await?;
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invoices)
    }

    #[instrument(skip(self), fields(tenant = %tenant))]
    pub async fn get_invoice(&self, tenant: &TenantId, id: InvoiceId) -> Result<Invoice, BillingError> {
        let invoice = self
            .invoices
            .get(id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(id))?;
        if &invoice.tenant != tenant {
            warn!(invoice_id = %id, "Invoice requested by another tenant");
            return Err(BillingError::InvoiceUnauthorized(id));
        }
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentMethod;

    fn cart(lines: Vec<CartLine>) -> NewInvoice {
        NewInvoice {
            customer_name: "Devi".into(),
            customer_contact: None,
            lines,
            payment_method: PaymentMethod::Cash,
        }
    }

    #[test]
    fn validation_rejects_missing_name_and_empty_carts() {
        let mut blank = cart(vec![CartLine::new(ItemId(1), 1)]);
        blank.customer_name = "   ".into();
        assert!(matches!(validate(blank), Err(BillingError::Validation(_))));
        assert!(matches!(validate(cart(vec![])), Err(BillingError::Validation(_))));
        assert!(matches!(
            validate(cart(vec![CartLine::new(ItemId(1), 0)])),
            Err(BillingError::Validation(_))
        ));
    }

    #[test]
    fn duplicate_lines_are_combined_for_validation() {
        let validated = validate(cart(vec![
            CartLine::new(ItemId(2), 3),
            CartLine::new(ItemId(1), 1),
            CartLine::new(ItemId(2), 4),
        ]))
        .unwrap();
        assert_eq!(validated.demand, vec![(ItemId(2), 7), (ItemId(1), 1)]);
        assert_eq!(validated.lines.len(), 3);
    }

    #[test]
    fn blank_contact_counts_as_absent() {
        let mut request = cart(vec![CartLine::new(ItemId(1), 1)]);
        request.customer_contact = Some("  ".into());
        assert!(validate(request).unwrap().customer_contact.is_none());
    }

    #[test]
    fn pricing_uses_ledger_snapshots() {
        let catalog = HashMap::from([(
            ItemId(1),
            StockSnapshot {
                id: ItemId(1),
                name: "Ibuprofen".into(),
                unit_price: 450,
                quantity: 10,
                reorder_level: 2,
            },
        )]);
        let (lines, total) = price_lines(&[CartLine::new(ItemId(1), 3)], &catalog).unwrap();
        assert_eq!(lines[0].line_total, 1350);
        assert_eq!(lines[0].name, "Ibuprofen");
        assert_eq!(total, 1350);
    }

    #[test]
    fn pricing_overflow_is_a_validation_error() {
        let catalog = HashMap::from([(
            ItemId(1),
            StockSnapshot {
                id: ItemId(1),
                name: "Gold".into(),
                unit_price: u64::MAX,
                quantity: 10,
                reorder_level: 0,
            },
        )]);
        let result = price_lines(&[CartLine::new(ItemId(1), 2)], &catalog);
        assert!(matches!(result, Err(BillingError::Validation(_))));
    }
}
