use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// One conversion attempt. The source columns are immutable after
/// creation; the result columns are written exactly once, on success.
/// Failed attempts are never persisted, so a stored row always carries
/// a complete result.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, ToSchema)]
pub struct ConversionJob {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub source_filename: String,
    pub source_path: String,
    pub source_size_bytes: i64,
    pub result_filename: Option<String>,
    pub result_path: Option<String>,
    pub result_size_bytes: Option<i64>,
    pub result_format: Option<String>,
    pub duration_seconds: Option<f64>,
    pub resolution: Option<String>,
    pub bitrate: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}
