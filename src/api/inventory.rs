//! `/api/inventory`: just enough catalog to sell from.

use super::{ApiError, AppState, Tenant};
use crate::model::{ItemCreate, ItemId, StockSnapshot};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItemRequest {
    pub name: String,
    /// Minor currency units.
    pub unit_price: u64,
    pub quantity: u32,
    #[serde(default)]
    pub reorder_level: u32,
}

pub async fn stock_item(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    payload: Result<Json<StockItemRequest>, JsonRejection>,
) -> Result<Json<StockSnapshot>, ApiError> {
    let Json(request) = payload?;
    let id = state
        .ledger
        .stock_item(ItemCreate {
            tenant: tenant.clone(),
            name: request.name,
            unit_price: request.unit_price,
            quantity: request.quantity,
            reorder_level: request.reorder_level,
        })
        .await?;
    Ok(Json(state.ledger.inspect(&tenant, id).await?))
}

pub async fn get_item(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Path(id): Path<String>,
) -> Result<Json<StockSnapshot>, ApiError> {
    let id: ItemId = id
        .parse()
        .map_err(|_| ApiError::not_found(format!("Item not found: {id}")))?;
    Ok(Json(state.ledger.inspect(&tenant, id).await?))
}
