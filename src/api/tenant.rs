use super::ApiError;
use crate::model::TenantId;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// The calling tenant, as asserted by the upstream auth layer.
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("No tenant, authorization denied"))?;
        Ok(Tenant(TenantId::new(value)))
    }
}
