//! `/api/sales`: invoice creation and lookup.

use super::{ApiError, AppState, Tenant};
use crate::model::{CartLine, Invoice, InvoiceId, ItemId, NewInvoice, PaymentMethod};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

/// `medicine` may be the numeric id or its display form (`item_3`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemRef {
    Number(u32),
    Text(String),
}

impl ItemRef {
    fn resolve(&self) -> Result<ItemId, ApiError> {
        match self {
            ItemRef::Number(n) => Ok(ItemId(*n)),
            ItemRef::Text(s) => s
                .parse()
                .map_err(|_| ApiError::bad_request(format!("Invalid item reference: {s}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SaleItem {
    pub medicine: ItemRef,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub customer_name: String,
    pub customer_contact: Option<String>,
    #[serde(default)]
    pub items: Vec<SaleItem>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl CreateSaleRequest {
    fn into_new_invoice(self) -> Result<NewInvoice, ApiError> {
        let lines = self
            .items
            .iter()
            .map(|i| i.medicine.resolve().map(|item| CartLine::new(item, i.quantity)))
            .collect::<Result<Vec<_>, ApiError>>()?;
        Ok(NewInvoice {
            customer_name: self.customer_name,
            customer_contact: self.customer_contact,
            lines,
            payment_method: self.payment_method,
        })
    }
}

pub async fn create_sale(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    payload: Result<Json<CreateSaleRequest>, JsonRejection>,
) -> Result<Json<Invoice>, ApiError> {
    let Json(request) = payload?;
    let invoice = state
        .engine
        .create_invoice(&tenant, request.into_new_invoice()?)
        .await?;
    Ok(Json(invoice))
}

pub async fn list_sales(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    Ok(Json(state.engine.list_invoices(&tenant).await?))
}

pub async fn get_sale(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, ApiError> {
    let id: InvoiceId = id
        .parse()
        .map_err(|_| ApiError::not_found("Invoice not found"))?;
    Ok(Json(state.engine.get_invoice(&tenant, id).await?))
}
