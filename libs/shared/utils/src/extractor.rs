use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::tenant::TenantId;

pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Tenant scope of the current request, read from the `x-tenant-id` header.
///
/// Authentication happens upstream; by the time a request reaches a cell the
/// gateway has already stamped the tenant it is allowed to act for.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub TenantId);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(TENANT_ID_HEADER)
            .ok_or_else(|| AppError::BadRequest("Missing x-tenant-id header".to_string()))?;

        let value_str = header_value
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid x-tenant-id header format".to_string()))?;

        let tenant_id = Uuid::parse_str(value_str.trim())
            .map_err(|_| AppError::BadRequest("x-tenant-id header is not a UUID".to_string()))?;

        Ok(TenantContext(TenantId(tenant_id)))
    }
}
