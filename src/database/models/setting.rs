use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Key/value settings; `organization_id = None` holds global templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl Setting {
    pub fn new(organization_id: Option<Uuid>, key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            key: key.into(),
            value,
            updated_at: Utc::now(),
        }
    }
}
