use axum::{
    body::Body,
    extract::{Extension, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::common::response::ApiError;
use crate::modules::auth::dto::TokenClaims;
use crate::modules::conversion::repository::ConversionRepository;
use crate::state::AppState;

/// Stream a converted artifact back to its owner.
/// A missing record, a record owned by someone else, and a vanished
/// backing file all answer 404.
#[utoipa::path(
    get,
    path = "/api/download/{id}",
    params(
        ("id" = Uuid, Path, description = "Conversion job ID")
    ),
    responses(
        (status = 200, description = "Converted file stream"),
        (status = 404, description = "Not Found"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Conversion",
    security(("bearer_auth" = []))
)]
pub async fn download(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let record = match ConversionRepository::find_by_id_and_owner(&state.db, id, claims.sub).await
    {
        Ok(Some(record)) => record,
        Ok(None) => {
            return ApiError("Video not found".to_string(), StatusCode::NOT_FOUND).into_response()
        }
        Err(e) => {
            tracing::error!("Database error: {}", e);
            return ApiError(e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response();
        }
    };

    let (result_path, result_filename) = match (record.result_path, record.result_filename) {
        (Some(path), Some(filename)) => (path, filename),
        _ => return ApiError("Video not found".to_string(), StatusCode::NOT_FOUND).into_response(),
    };

    let file = match tokio::fs::File::open(&result_path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!("Converted file missing at {}: {}", result_path, e);
            return ApiError("Video not found".to_string(), StatusCode::NOT_FOUND)
                .into_response();
        }
    };

    let content_type = mime_guess::from_path(&result_filename)
        .first_or_octet_stream()
        .to_string();
    let disposition = format!("attachment; filename=\"{}\"", result_filename);

    let body = Body::from_stream(ReaderStream::new(file));

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}
