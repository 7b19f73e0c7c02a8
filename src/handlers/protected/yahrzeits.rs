use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::utils::ListQuery;
use crate::config::CONFIG;
use crate::database::models::{Yahrzeit, YahrzeitInput};
use crate::error::ApiError;
use crate::filter::Entity;
use crate::middleware::{ApiResponse, ApiResult, RequestScope};
use crate::router::AppState;
use crate::services::{self, Listing};
use crate::yahrzeit::{self, BucketGroup, HebrewDate, MonthGroup, Occurrence};

/// GET /api/yahrzeits
pub async fn list(
    Query(query): Query<ListQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Listing> {
    let listing = state.listing().find(Entity::Yahrzeits, &scope.scope, query.into_filter_data()?).await?;
    Ok(ApiResponse::success(listing))
}

/// A yahrzeit with its next observance
#[derive(Debug, Serialize)]
pub struct YahrzeitView {
    #[serde(flatten)]
    pub yahrzeit: Yahrzeit,
    pub next_date: Option<NaiveDate>,
    pub next_hebrew_date: Option<HebrewDate>,
}

impl YahrzeitView {
    fn new(yahrzeit: Yahrzeit, today: NaiveDate) -> Self {
        let next_date = match yahrzeit::next_occurrence(&yahrzeit, today) {
            Ok(date) => Some(date),
            Err(e) => {
                tracing::warn!("No next date for yahrzeit {}: {}", yahrzeit.id, e);
                None
            }
        };
        Self { next_hebrew_date: next_date.map(yahrzeit::to_hebrew), next_date, yahrzeit }
    }
}

/// POST /api/yahrzeits
pub async fn create(
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(input): Json<YahrzeitInput>,
) -> ApiResult<YahrzeitView> {
    let record = input.into_yahrzeit(scope.organization_id()?)?;
    services::require_donor(state.store.as_ref(), record.organization_id, record.donor_id).await?;
    state.store.insert_yahrzeit(&record).await?;
    tracing::info!("Created yahrzeit {} for {}", record.id, record.deceased_name);
    Ok(ApiResponse::created(YahrzeitView::new(record, Utc::now().date_naive())))
}

/// GET /api/yahrzeits/:id
pub async fn show(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<YahrzeitView> {
    let record = state.store.get_yahrzeit(&scope.scope, id).await?;
    Ok(ApiResponse::success(YahrzeitView::new(record, Utc::now().date_naive())))
}

/// PUT /api/yahrzeits/:id
pub async fn update(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    Json(input): Json<YahrzeitInput>,
) -> ApiResult<YahrzeitView> {
    let mut record = state.store.get_yahrzeit(&scope.scope, id).await?;
    let donor_before = record.donor_id;
    input.apply(&mut record)?;
    if record.donor_id != donor_before {
        services::require_donor(state.store.as_ref(), record.organization_id, record.donor_id).await?;
    }
    state.store.update_yahrzeit(&record).await?;
    Ok(ApiResponse::success(YahrzeitView::new(record, Utc::now().date_naive())))
}

/// DELETE /api/yahrzeits/:id
pub async fn delete(
    Path(id): Path<Uuid>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<()> {
    state.store.delete_yahrzeit(&scope.scope, id).await?;
    Ok(ApiResponse::<()>::no_content())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    Bucket,
    Month,
    None,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub days: Option<i64>,
    /// Defaults to today (UTC)
    pub today: Option<NaiveDate>,
    pub group: Option<Grouping>,
}

impl ScheduleQuery {
    fn window(&self, default_days: i64) -> Result<(NaiveDate, i64), ApiError> {
        let days = self.days.unwrap_or(default_days);
        if !(0..=3660).contains(&days) {
            return Err(ApiError::bad_request("days must be between 0 and 3660"));
        }
        Ok((self.today.unwrap_or_else(|| Utc::now().date_naive()), days))
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Schedule {
    Flat(Vec<Occurrence>),
    Buckets(Vec<BucketGroup>),
    Months(Vec<MonthGroup>),
}

fn grouped(occurrences: Vec<Occurrence>, grouping: Option<&Grouping>) -> Schedule {
    match grouping {
        Some(Grouping::Bucket) => Schedule::Buckets(yahrzeit::group_by_bucket(occurrences)),
        Some(Grouping::Month) => Schedule::Months(yahrzeit::group_by_month(occurrences)),
        Some(Grouping::None) | None => Schedule::Flat(occurrences),
    }
}

/// GET /api/yahrzeits/upcoming?days=&group=bucket|month
pub async fn upcoming(
    Query(query): Query<ScheduleQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Schedule> {
    let (today, days) = query.window(CONFIG.yahrzeit.upcoming_horizon_days)?;
    let records = state.store.list_yahrzeits(&scope.scope).await?;
    let occurrences = yahrzeit::upcoming(records, today, days);
    Ok(ApiResponse::success(grouped(occurrences, query.group.as_ref())))
}

/// GET /api/yahrzeits/reminders?days=
pub async fn reminders(
    Query(query): Query<ScheduleQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
) -> ApiResult<Schedule> {
    let (today, days) = query.window(CONFIG.yahrzeit.reminder_days_before)?;
    let records = state.store.list_yahrzeits(&scope.scope).await?;
    let due = yahrzeit::due_reminders(records, today, days);
    tracing::debug!("{} yahrzeit reminders due within {} days of {}", due.len(), days, today);
    Ok(ApiResponse::success(grouped(due, query.group.as_ref())))
}
