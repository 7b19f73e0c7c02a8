use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{UserRole, UserRoleInput};
use crate::error::ApiError;
use crate::filter::Entity;
use crate::handlers::protected::utils::ListQuery;
use crate::middleware::{ApiResponse, ApiResult, RequestScope};
use crate::router::AppState;
use crate::services::Listing;

/// GET /api/roles
pub async fn list(
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Listing> {
    let listing = state.listing().find(Entity::Roles, &scope.scope, query.into_filter_data()?).await?;
    Ok(ApiResponse::success(listing))
}

/// POST /api/roles - checks duplicates and organization capacity
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(mut input): Json<UserRoleInput>,
) -> ApiResult<UserRole> {
    if input.organization_id.is_none() {
        input.organization_id = scope.scope.organization_id();
    }
    Ok(ApiResponse::created(state.roles().assign(input).await?))
}

async fn set_suspended(state: &AppState, scope: &RequestScope, id: Uuid, suspended: bool) -> Result<UserRole, ApiError> {
    let role = state.store.get_role(id).await?;
    let visible = match role.organization_id {
        Some(org) => scope.scope.includes(org),
        None => scope.scope.organization_id().is_none(),
    };
    if !visible {
        return Err(ApiError::not_found(format!("Not found: role {}", id)));
    }
    Ok(state.roles().set_suspended(id, suspended).await?)
}

/// POST /api/roles/:id/suspend
pub async fn suspend(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<UserRole> {
    Ok(ApiResponse::success(set_suspended(&state, &scope, id, true).await?))
}

/// POST /api/roles/:id/unsuspend
pub async fn unsuspend(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<UserRole> {
    Ok(ApiResponse::success(set_suspended(&state, &scope, id, false).await?))
}

#[derive(Debug, Serialize)]
pub struct UserAccess {
    pub user_id: Uuid,
    pub is_super_admin: bool,
    pub roles: Vec<UserRole>,
}

/// GET /api/roles/user/:user_id - active roles only
pub async fn for_user(Path(user_id): Path<Uuid>, Extension(state): Extension<AppState>) -> ApiResult<UserAccess> {
    let service = state.roles();
    let roles = service.active_roles(user_id).await?;
    let is_super_admin = service.is_super_admin(user_id).await?;
    Ok(ApiResponse::success(UserAccess { user_id, is_super_admin, roles }))
}
