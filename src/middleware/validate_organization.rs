use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::database::models::{Organization, SubscriptionStatus};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::router::AppState;
use crate::types::OrgScope;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";

/// Organization scope of the request, injected by the middleware below
#[derive(Clone, Debug)]
pub struct RequestScope {
    pub scope: OrgScope,
    pub organization: Option<Organization>,
}

impl RequestScope {
    /// Write routes need one concrete organization
    pub fn organization_id(&self) -> Result<Uuid, ApiError> {
        self.scope
            .organization_id()
            .ok_or_else(|| ApiError::bad_request("This operation needs a single organization in X-Organization-Id"))
    }
}

fn header_scope(headers: &HeaderMap) -> Result<Option<OrgScope>, ApiError> {
    let Some(raw) = headers.get(ORGANIZATION_HEADER) else {
        return Ok(None);
    };
    let raw = raw.to_str().map_err(|_| ApiError::bad_request("X-Organization-Id is not valid text"))?;
    raw.parse::<OrgScope>()
        .map(Some)
        .map_err(|_| ApiError::bad_request(format!("Invalid X-Organization-Id: '{}'", raw)))
}

async fn resolve(state: &AppState, scope: OrgScope) -> Result<RequestScope, ApiError> {
    let OrgScope::Organization(id) = scope else {
        return Ok(RequestScope { scope, organization: None });
    };
    let organization = state.store.get_organization(id).await.map_err(|e| match e {
        DatabaseError::NotFound(_) => {
            tracing::warn!("Organization validation failed: {} does not exist", id);
            ApiError::forbidden(format!("Organization '{}' does not exist", id))
        }
        other => other.into(),
    })?;
    if organization.subscription_status == SubscriptionStatus::Cancelled {
        tracing::warn!("Organization validation failed: {} is cancelled", organization.slug);
        return Err(ApiError::forbidden(format!("Organization '{}' is not active", organization.slug)));
    }
    tracing::debug!("Organization validated: {} ({})", organization.name, organization.id);
    Ok(RequestScope { scope, organization: Some(organization) })
}

/// Tenant routes: the header is required; `all` selects the cross-tenant view
pub async fn validate_organization_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let state = request
        .extensions()
        .get::<AppState>()
        .cloned()
        .ok_or_else(|| ApiError::internal_server_error("Application state missing"))?;
    let scope = header_scope(&headers)?
        .ok_or_else(|| ApiError::bad_request("X-Organization-Id header is required"))?;

    let validated = resolve(&state, scope).await?;
    request.extensions_mut().insert(validated);
    Ok(next.run(request).await)
}

/// Administration routes: a missing header means every organization
pub async fn optional_organization_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let state = request
        .extensions()
        .get::<AppState>()
        .cloned()
        .ok_or_else(|| ApiError::internal_server_error("Application state missing"))?;
    let scope = header_scope(&headers)?.unwrap_or(OrgScope::All);

    let validated = resolve(&state, scope).await?;
    request.extensions_mut().insert(validated);
    Ok(next.run(request).await)
}
