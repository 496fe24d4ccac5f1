use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::common::upload::{is_supported_upload, store_upload, StoredUpload};
use crate::modules::auth::dto::TokenClaims;
use crate::modules::conversion::dto::*;
use crate::modules::conversion::error::ConversionError;
use crate::modules::conversion::repository::ConversionRepository;
use crate::modules::conversion::service::ConversionService;
use crate::state::AppState;
use axum::{
    extract::{Extension, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::path::Path;
use tracing::info;

const DEFAULT_FORMAT: &str = "avi";

/// Upload a video and convert it to the requested container format.
/// Replies once the transcode reaches its terminal state; live progress
/// goes out on the WebSocket channel in the meantime.
#[utoipa::path(
    post,
    path = "/api/convert",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Conversion succeeded", body = ApiResponse<ConversionSummary>),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Conversion",
    security(("bearer_auth" = []))
)]
pub async fn convert(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut format: Option<String> = None;
    let mut upload: Option<StoredUpload> = None;

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        let name = field.name().unwrap_or("").to_string();

        if name == "video" {
            let content_type = field.content_type().unwrap_or("").to_string();
            if !is_supported_upload(&content_type) {
                // Rejected before any job exists; nothing is written.
                return ApiError(
                    ConversionError::UnsupportedInput.to_string(),
                    StatusCode::BAD_REQUEST,
                )
                .into_response();
            }

            match store_upload(Path::new(&state.config.upload_dir), field).await {
                Ok(stored) => {
                    info!("Stored upload {} ({} bytes)", stored.filename, stored.size_bytes);
                    upload = Some(stored);
                }
                Err(e) => {
                    return ApiError(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
                        .into_response();
                }
            }
        } else if name == "format" {
            format = field.text().await.ok();
        }
    }

    let Some(upload) = upload else {
        return ApiError("No file uploaded.".to_string(), StatusCode::BAD_REQUEST).into_response();
    };

    let format = format
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FORMAT.to_string());

    match ConversionService::convert_upload(state, claims.sub, upload, format).await {
        Ok(job) => ApiSuccess(
            ApiResponse::success(ConversionSummary::from(job), "Video converted successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError(e.to_string(), e.status_code()).into_response(),
    }
}

/// Re-run an earlier conversion against a different format without
/// re-uploading. Creates a new record; the original is untouched.
#[utoipa::path(
    post,
    path = "/api/reconvert",
    request_body = ReconvertRequest,
    responses(
        (status = 200, description = "Reconversion succeeded", body = ReconvertResponse),
        (status = 404, description = "Video Not Found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Conversion",
    security(("bearer_auth" = []))
)]
pub async fn reconvert(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Json(req): Json<ReconvertRequest>,
) -> impl IntoResponse {
    match ConversionService::reconvert(state, claims.sub, req.video_id, req.format).await {
        Ok(job) => Json(ReconvertResponse {
            success: true,
            message: "Video reconverted successfully".to_string(),
            video_id: job.id,
        })
        .into_response(),
        Err(e) => ApiError(e.to_string(), e.status_code()).into_response(),
    }
}

/// The caller's conversion history, newest first.
#[utoipa::path(
    get,
    path = "/api/history",
    responses(
        (status = 200, description = "History retrieved", body = ApiResponse<Vec<ConversionSummary>>),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Conversion",
    security(("bearer_auth" = []))
)]
pub async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
) -> impl IntoResponse {
    match ConversionRepository::list_by_owner(&state.db, claims.sub).await {
        Ok(jobs) => {
            let summaries: Vec<ConversionSummary> =
                jobs.into_iter().map(ConversionSummary::from).collect();
            ApiSuccess(
                ApiResponse::success(summaries, "History retrieved successfully"),
                StatusCode::OK,
            )
            .into_response()
        }
        Err(e) => ApiError(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}
