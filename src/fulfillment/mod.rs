//! # Fulfillment
//!
//! Everything that happens to an invoice after the sale has been answered:
//! render the invoice document, wait for the tenant's messaging session, deliver.
//!
//! The engine hands jobs over through [`FulfillmentQueue`]; progress is
//! observable on the [`JobBoard`]. Failures never touch the invoice or stock.

pub mod board;
pub mod job;
pub mod pdf;
pub mod queue;
pub mod renderer;
pub mod retry;
pub mod worker;

pub use board::{JobBoard, JobStats, DEFAULT_RETAINED_JOBS};
pub use job::*;
pub use pdf::PdfInvoiceRenderer;
pub use queue::{FulfillmentError, FulfillmentQueue};
pub use renderer::{DocumentRenderer, RenderError, TextReceiptRenderer};
pub use retry::RetryPolicy;
pub use worker::FulfillmentWorker;
