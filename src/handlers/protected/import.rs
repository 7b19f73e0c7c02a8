use axum::{
    body::Bytes,
    extract::{Extension, Path, Query},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::import::{
    self, ImportFormat, ImportKind, ImportOptions, ImportOutcome, ParseWarning, Simulation, ValidationReport,
};
use crate::middleware::{ApiResponse, ApiResult, RequestScope};
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    /// `csv` (default) or `xlsx`
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validate,
    Simulate,
    Commit,
}

impl Stage {
    fn parse(raw: &str) -> Result<Self, ApiError> {
        match raw {
            "validate" => Ok(Stage::Validate),
            "simulate" => Ok(Stage::Simulate),
            "commit" => Ok(Stage::Commit),
            other => Err(ApiError::not_found(format!("Unknown import stage: {}", other))),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ImportResult {
    Validated { parse_warnings: Vec<ParseWarning>, report: ValidationReport },
    Simulated { parse_warnings: Vec<ParseWarning>, simulation: Simulation },
    Committed { parse_warnings: Vec<ParseWarning>, outcome: ImportOutcome },
}

/// POST /api/import/:kind/:stage?format=csv|xlsx - the raw file is the body
pub async fn post(
    Path((kind, stage)): Path<(String, String)>,
    Query(query): Query<ImportQuery>,
    Extension(state): Extension<AppState>,
    Extension(scope): Extension<RequestScope>,
    body: Bytes,
) -> ApiResult<ImportResult> {
    let kind = ImportKind::parse(&kind)?;
    let stage = Stage::parse(&stage)?;
    let format = match query.format.as_deref() {
        Some(raw) => ImportFormat::parse(raw)?,
        None => ImportFormat::default(),
    };
    if body.is_empty() {
        return Err(ApiError::bad_request("Upload the file as the request body"));
    }
    let options = ImportOptions::new(scope.organization_id()?);

    let parsed = import::parse(&body, format)?;
    let report = import::validate(state.store.as_ref(), kind, &parsed.rows, &options).await?;

    let result = match stage {
        Stage::Validate => ImportResult::Validated { parse_warnings: parsed.warnings, report },
        Stage::Simulate => {
            let simulation = import::simulate(&report)?;
            ImportResult::Simulated { parse_warnings: parsed.warnings, simulation }
        }
        Stage::Commit => {
            tracing::info!("Committing {} import of {} rows for {}", kind, parsed.rows.len(), options.organization_id);
            let outcome = import::commit(state.store.as_ref(), report, |done, total| {
                if done == total || done % 100 == 0 {
                    tracing::debug!("Import progress {}/{}", done, total);
                }
            })
            .await?;
            ImportResult::Committed { parse_warnings: parsed.warnings, outcome }
        }
    };
    Ok(ApiResponse::success(result))
}
