use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::content::{self, ContentEdit, PageDocument, ResolvedPage};
use crate::middleware::{ApiResponse, ApiResult, RequestScope};
use crate::router::AppState;

// With `X-Organization-Id: all` these routes work on the global template.

/// GET /api/content/home
pub async fn get(
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<ResolvedPage> {
    let page = content::resolve(state.store.as_ref(), scope.scope.organization_id()).await?;
    Ok(ApiResponse::success(page))
}

/// PUT /api/content/home - replaces the whole document
pub async fn put(
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(document): Json<PageDocument>,
) -> ApiResult<PageDocument> {
    let saved = content::put(state.store.as_ref(), scope.scope.organization_id(), document).await?;
    Ok(ApiResponse::success(saved))
}

/// POST /api/content/home/edit - applies a batch of edits, all or nothing
pub async fn edit(
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(edits): Json<Vec<ContentEdit>>,
) -> ApiResult<PageDocument> {
    let saved = content::edit(state.store.as_ref(), scope.scope.organization_id(), edits).await?;
    Ok(ApiResponse::success(saved))
}

#[derive(Debug, Serialize)]
pub struct ResetResult {
    pub removed: bool,
}

/// DELETE /api/content/home - drops the organization override
pub async fn delete(
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<ResetResult> {
    let removed = content::reset(state.store.as_ref(), scope.scope.organization_id()).await?;
    Ok(ApiResponse::success(ResetResult { removed }))
}
