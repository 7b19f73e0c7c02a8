use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use uuid::Uuid;

use super::utils::ListQuery;
use crate::database::models::{Donation, DonationInput};
use crate::filter::Entity;
use crate::middleware::{ApiResponse, ApiResult, RequestScope};
use crate::router::AppState;
use crate::services::Listing;

/// GET /api/donations - includes per-currency totals
pub async fn list(
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Listing> {
    let listing = state.listing().find(Entity::Donations, &scope.scope, query.into_filter_data()?).await?;
    Ok(ApiResponse::success(listing))
}

/// POST /api/donations - a body with `pledge_id` records a payment
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(input): Json<DonationInput>,
) -> ApiResult<Donation> {
    let donation = state.payments().create_donation(scope.organization_id()?, input).await?;
    Ok(ApiResponse::created(donation))
}

/// GET /api/donations/:id
pub async fn show(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Donation> {
    Ok(ApiResponse::success(state.store.get_donation(&scope.scope, id).await?))
}

/// PUT /api/donations/:id
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(input): Json<DonationInput>,
) -> ApiResult<Donation> {
    let donation = state.payments().update_donation(&scope.scope, id, input).await?;
    Ok(ApiResponse::success(donation))
}

/// DELETE /api/donations/:id - deleting a payment reopens its pledge balance
pub async fn delete(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<()> {
    state.payments().delete_donation(&scope.scope, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

/// GET /api/payments
pub async fn payments(
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Listing> {
    let listing = state.listing().find(Entity::Payments, &scope.scope, query.into_filter_data()?).await?;
    Ok(ApiResponse::success(listing))
}
