// Public routes: service information and health. No organization scope.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::router::AppState;

/// GET /
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Kehilla API",
            "version": version,
            "description": "Donor, pledge and yahrzeit management for congregations and nonprofits",
            "endpoints": {
                "health": "/health",
                "donors": "/api/donors[/:id], /api/donors/lookup",
                "donations": "/api/donations[/:id], /api/payments",
                "pledges": "/api/pledges[/:id], /api/pledges/:id/payments, /api/pledges/:id/cancel",
                "yahrzeits": "/api/yahrzeits[/:id], /api/yahrzeits/upcoming, /api/yahrzeits/reminders",
                "find": "/api/find/:entity",
                "export": "/api/export/:entity",
                "import": "/api/import/:kind/{validate,simulate,commit}",
                "content": "/api/content/home[/edit]",
                "organizations": "/api/organizations[/:id]",
                "roles": "/api/roles, /api/roles/:id/{suspend,unsuspend}, /api/roles/user/:user_id",
            },
            "headers": {
                "X-Organization-Id": "organization uuid, or 'all' for the cross-organization view"
            }
        }
    }))
}

/// GET /health
pub async fn health(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
