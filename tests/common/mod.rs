#![allow(dead_code)]

use retail_billing::clients::LedgerClient;
use retail_billing::config::Config;
use retail_billing::fulfillment::{DocumentRenderer, RenderError, RetryPolicy, TextReceiptRenderer};
use retail_billing::lifecycle::BillingSystem;
use retail_billing::messaging::ManualTransport;
use retail_billing::model::{CartLine, Document, Invoice, ItemCreate, ItemId, NewInvoice, PaymentMethod, TenantId};
use std::sync::Arc;
use std::time::Duration;

pub fn tenant(name: &str) -> TenantId {
    TenantId::from(name)
}

/// Defaults with timeouts short enough for tests.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.messaging.send_timeout = Duration::from_millis(200);
    config.fulfillment.ready_timeout = Duration::from_millis(300);
    config.fulfillment.shutdown_grace = Duration::from_secs(2);
    config.fulfillment.retry = RetryPolicy::exponential(3, Duration::from_millis(10), Duration::from_millis(20));
    config.server.shutdown_grace = Duration::from_secs(1);
    config
}

pub fn start_system() -> (BillingSystem, ManualTransport) {
    start_system_with(test_config(), Arc::new(TextReceiptRenderer::default()))
}

pub fn start_system_with(config: Config, renderer: Arc<dyn DocumentRenderer>) -> (BillingSystem, ManualTransport) {
    let transport = ManualTransport::new();
    let system = BillingSystem::new(&config, Arc::new(transport.clone()), renderer);
    (system, transport)
}

pub async fn stock(ledger: &LedgerClient, tenant: &TenantId, name: &str, unit_price: u64, quantity: u32) -> ItemId {
    ledger
        .stock_item(ItemCreate {
            tenant: tenant.clone(),
            name: name.to_string(),
            unit_price,
            quantity,
            reorder_level: 0,
        })
        .await
        .expect("Failed to stock item")
}

pub fn cart(lines: &[(ItemId, u32)]) -> NewInvoice {
    NewInvoice {
        customer_name: "Meera".to_string(),
        customer_contact: None,
        lines: lines.iter().map(|&(item, qty)| CartLine::new(item, qty)).collect(),
        payment_method: PaymentMethod::Cash,
    }
}

pub fn cart_with_contact(lines: &[(ItemId, u32)], contact: &str) -> NewInvoice {
    NewInvoice {
        customer_contact: Some(contact.to_string()),
        ..cart(lines)
    }
}

/// Renderer that always fails.
pub struct BrokenRenderer;

impl DocumentRenderer for BrokenRenderer {
    fn render(&self, invoice: &Invoice) -> Result<Document, RenderError> {
        Err(RenderError::Failed(format!("no template for {}", invoice.id)))
    }
}
