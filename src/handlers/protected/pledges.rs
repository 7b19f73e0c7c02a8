use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use super::utils::ListQuery;
use crate::database::models::{Donation, Pledge, PledgeInput};
use crate::filter::Entity;
use crate::middleware::{ApiResponse, ApiResult, RequestScope};
use crate::router::AppState;
use crate::services::{Listing, PaymentRequest};

/// GET /api/pledges - includes per-currency totals
pub async fn list(
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Listing> {
    let listing = state.listing().find(Entity::Pledges, &scope.scope, query.into_filter_data()?).await?;
    Ok(ApiResponse::success(listing))
}

/// POST /api/pledges
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(input): Json<PledgeInput>,
) -> ApiResult<Pledge> {
    let pledge = state.payments().create_pledge(scope.organization_id()?, input).await?;
    Ok(ApiResponse::created(pledge))
}

/// GET /api/pledges/:id
pub async fn show(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Pledge> {
    Ok(ApiResponse::success(state.store.get_pledge(&scope.scope, id).await?))
}

/// PUT /api/pledges/:id
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(input): Json<PledgeInput>,
) -> ApiResult<Pledge> {
    Ok(ApiResponse::success(state.payments().update_pledge(&scope.scope, id, input).await?))
}

/// DELETE /api/pledges/:id - refused while payments reference the pledge
pub async fn delete(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<()> {
    state.store.delete_pledge(&scope.scope, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

#[derive(Debug, Serialize)]
pub struct PaymentRecorded {
    pub payment: Donation,
    pub pledge: Pledge,
}

/// POST /api/pledges/:id/payments
pub async fn record_payment(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<PaymentRecorded> {
    let (payment, pledge) = state.payments().record_payment(&scope.scope, id, request).await?;
    Ok(ApiResponse::created(PaymentRecorded { payment, pledge }))
}

/// POST /api/pledges/:id/cancel
pub async fn cancel(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Pledge> {
    Ok(ApiResponse::success(state.payments().cancel_pledge(&scope.scope, id).await?))
}
