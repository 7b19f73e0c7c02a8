use axum::{
    extract::{Extension, Path},
    Json,
};

use crate::filter::{Entity, FilterData};
use crate::middleware::{ApiResponse, ApiResult, RequestScope};
use crate::router::AppState;
use crate::services::Listing;

/// POST /api/find/:entity - filtered search
///
/// Accepts a FilterData JSON body with:
/// - where: filter conditions
/// - order: sort order
/// - q: free-text search
/// - limit/offset or page/per_page: pagination
pub async fn post(
    Path(entity): Path<String>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(filter_data): Json<FilterData>,
) -> ApiResult<Listing> {
    let entity = Entity::parse(&entity)?;
    let listing = state.listing().find(entity, &scope.scope, filter_data).await?;
    Ok(ApiResponse::success(listing))
}
