use axum::extract::{Extension, Path, Query};
use chrono::Utc;

use super::utils::ListQuery;
use crate::error::ApiError;
use crate::filter::Entity;
use crate::middleware::{CsvFile, RequestScope};
use crate::router::AppState;

/// GET /api/export/:entity - every matching record as CSV
pub async fn get(
    Path(entity): Path<String>,
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> Result<CsvFile, ApiError> {
    let entity = Entity::parse(&entity)?;
    let bytes = state.listing().export(entity, &scope.scope, query.into_filter_data()?).await?;
    let filename = format!("{}-{}.csv", entity, Utc::now().format("%Y-%m-%d"));
    tracing::info!("Exported {} for {} ({} bytes)", entity, scope.scope, bytes.len());
    Ok(CsvFile { filename, bytes })
}
