//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the global subscriber for the service.
//!
//! - `RUST_LOG` wins when set; otherwise `logging.level` from the config is used.
//! - Compact output hides the module prefix (`with_target(false)`); the
//!   structured fields (`tenant`, `item`, `invoice_id`, `job_id`, `state`,
//!   `attempt`) carry the context instead.
//! - `logging.json = true` switches to one JSON object per line.
//!
//! ```bash
//! RUST_LOG=debug retail-billing billing.toml
//! RUST_LOG=retail_billing::messaging=trace retail-billing
//! ```
//!
//! With `info`, a sale reads roughly like:
//!
//! ```text
//! INFO create_invoice: Action ok entity_type="InventoryItem" id=item_1
//! INFO create_invoice: Invoice created invoice_id=5b0e.. total=2500
//! INFO create_invoice: Receipt delivery queued invoice_id=5b0e.. job_id=8c1d..
//! INFO job: Invoice delivered attempt=1
//! ```

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

pub fn setup_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false) // entity_type and span names already say where we are
            .compact()
            .init();
    }
}
