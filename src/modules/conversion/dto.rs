use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use super::model::ConversionJob;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReconvertRequest {
    #[serde(rename = "videoId")]
    pub video_id: Uuid,
    pub format: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconvertResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "videoId")]
    pub video_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SourceInfo {
    pub filename: String,
    pub size_bytes: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResultInfo {
    pub filename: String,
    pub size_bytes: i64,
    pub format: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MediaInfo {
    pub duration_seconds: Option<f64>,
    pub resolution: Option<String>,
    pub bitrate: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversionSummary {
    pub id: Uuid,
    pub source: SourceInfo,
    pub result: Option<ResultInfo>,
    pub metadata: Option<MediaInfo>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

impl From<ConversionJob> for ConversionSummary {
    fn from(job: ConversionJob) -> Self {
        let result = match (job.result_filename, job.result_size_bytes, job.result_format) {
            (Some(filename), Some(size_bytes), Some(format)) => Some(ResultInfo {
                filename,
                size_bytes,
                format,
            }),
            _ => None,
        };

        let metadata = if job.duration_seconds.is_some()
            || job.resolution.is_some()
            || job.bitrate.is_some()
        {
            Some(MediaInfo {
                duration_seconds: job.duration_seconds,
                resolution: job.resolution,
                bitrate: job.bitrate,
            })
        } else {
            None
        };

        Self {
            id: job.id,
            source: SourceInfo {
                filename: job.source_filename,
                size_bytes: job.source_size_bytes,
            },
            result,
            metadata,
            created_at: job.created_at,
        }
    }
}
