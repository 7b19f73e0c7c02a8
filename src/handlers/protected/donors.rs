use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::utils::ListQuery;
use crate::database::models::{normalize_email, normalize_phone, Donor, DonorInput};
use crate::error::ApiError;
use crate::filter::Entity;
use crate::middleware::{ApiResponse, ApiResult, RequestScope};
use crate::router::AppState;
use crate::services::Listing;

/// GET /api/donors
pub async fn list(
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Listing> {
    let listing = state.listing().find(Entity::Donors, &scope.scope, query.into_filter_data()?).await?;
    Ok(ApiResponse::success(listing))
}

/// POST /api/donors
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(input): Json<DonorInput>,
) -> ApiResult<Donor> {
    let donor = input.into_donor(scope.organization_id()?)?;
    state.store.insert_donor(&donor).await?;
    tracing::info!("Created donor {} ({})", donor.id, donor.full_name());
    Ok(ApiResponse::created(donor))
}

/// GET /api/donors/:id
pub async fn show(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Donor> {
    Ok(ApiResponse::success(state.store.get_donor(&scope.scope, id).await?))
}

/// PUT /api/donors/:id - only the fields present in the body change
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(input): Json<DonorInput>,
) -> ApiResult<Donor> {
    let mut donor = state.store.get_donor(&scope.scope, id).await?;
    input.apply(&mut donor)?;
    state.store.update_donor(&donor).await?;
    Ok(ApiResponse::success(donor))
}

/// DELETE /api/donors/:id - refused while donations or pledges reference the donor
pub async fn delete(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<()> {
    state.store.delete_donor(&scope.scope, id).await?;
    tracing::info!("Deleted donor {}", id);
    Ok(ApiResponse::<()>::no_content())
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// GET /api/donors/lookup?phone=&email= - phone is tried before email
pub async fn lookup(
    Query(query): Query<LookupQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Option<Donor>> {
    let organization_id = scope.organization_id()?;
    let phone = query.phone.as_deref().and_then(normalize_phone);
    let email = query.email.as_deref().and_then(normalize_email);
    if phone.is_none() && email.is_none() {
        return Err(ApiError::bad_request("Provide a valid phone or email"));
    }

    if let Some(phone) = phone {
        if let Some(donor) = state.store.find_donor_by_phone(organization_id, &phone).await? {
            return Ok(ApiResponse::success(Some(donor)));
        }
    }
    let found = match email {
        Some(email) => state.store.find_donor_by_email(organization_id, &email).await?,
        None => None,
    };
    Ok(ApiResponse::success(found))
}
