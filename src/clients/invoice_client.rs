//! # Invoice Client
//!
//! Insert and read access to the invoice store.

use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::invoice_actor::InvoiceError;
use crate::model::{Invoice, InvoiceDraft, TenantId};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct InvoiceClient {
    inner: ResourceClient<Invoice>,
}

impl InvoiceClient {
    pub fn new(inner: ResourceClient<Invoice>) -> Self {
        Self { inner }
    }
}

impl ActorClient<Invoice> for InvoiceClient {
    type Error = InvoiceError;

    fn inner(&self) -> &ResourceClient<Invoice> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> InvoiceError {
        match e.entity_error::<InvoiceError>() {
            Ok(typed) => typed,
            Err(other) => InvoiceError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl InvoiceClient {
    /// Persists the draft and returns the stored record.
    #[instrument(skip(self, draft), fields(tenant = %draft.tenant))]
    pub async fn create(&self, draft: InvoiceDraft) -> Result<Invoice, InvoiceError> {
        debug!("Sending request");
        let id = self.inner.create(draft.clone()).await.map_err(Self::map_error)?;
        Ok(Invoice::from_draft(id, draft))
    }

    /// All invoices created by `tenant`, in no particular order.
    #[instrument(skip(self))]
    pub async fn list_for_tenant(&self, tenant: &TenantId) -> Result<Vec<Invoice>, InvoiceError> {
        let tenant = tenant.clone();
        self.inner
            .list(move |invoice: &Invoice| invoice.tenant == tenant)
            .await
            .map_err(Self::map_error)
    }
}
