use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{Organization, OrganizationInput};
use crate::error::ApiError;
use crate::filter::Entity;
use crate::handlers::protected::utils::ListQuery;
use crate::middleware::{ApiResponse, ApiResult, RequestScope};
use crate::router::AppState;
use crate::services::Listing;

/// GET /api/organizations
pub async fn list(
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Listing> {
    let listing = state.listing().find(Entity::Organizations, &scope.scope, query.into_filter_data()?).await?;
    Ok(ApiResponse::success(listing))
}

/// POST /api/organizations
pub async fn create(
    Extension(state): Extension<AppState>,
    Json(input): Json<OrganizationInput>,
) -> ApiResult<Organization> {
    let organization = input.into_organization()?;
    state.store.insert_organization(&organization).await?;
    tracing::info!("Created organization {} ({})", organization.slug, organization.id);
    Ok(ApiResponse::created(organization))
}

#[derive(Debug, Serialize)]
pub struct OrganizationView {
    #[serde(flatten)]
    pub organization: Organization,
    /// `None` is unlimited
    pub capacity: Option<usize>,
    pub seats_used: usize,
}

async fn scoped(state: &AppState, scope: &RequestScope, id: Uuid) -> Result<Organization, ApiError> {
    if !scope.scope.includes(id) {
        return Err(ApiError::not_found(format!("Not found: organization {}", id)));
    }
    Ok(state.store.get_organization(id).await?)
}

/// GET /api/organizations/:id
pub async fn show(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<OrganizationView> {
    let organization = scoped(&state, &scope, id).await?;
    let seats_used = state.roles().seats_used(id).await?;
    Ok(ApiResponse::success(OrganizationView { capacity: organization.effective_capacity(), seats_used, organization }))
}

/// PUT /api/organizations/:id
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(input): Json<OrganizationInput>,
) -> ApiResult<Organization> {
    let mut organization = scoped(&state, &scope, id).await?;
    input.apply(&mut organization)?;
    state.store.update_organization(&organization).await?;
    Ok(ApiResponse::success(organization))
}
