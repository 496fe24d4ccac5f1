use super::dto::{AuthResponse, LoginRequest, RegisterRequest, TokenClaims, UserResponse};
use super::service::AuthService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Bad Request")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    match AuthService::register(state, payload).await {
        Ok(user) => ApiSuccess(
            ApiResponse::success(user, "User registered successfully"),
            StatusCode::CREATED,
        )
        .into_response(),
        Err(e) => ApiError(e.to_string(), StatusCode::BAD_REQUEST).into_response(),
    }
}

/// Login user and get an access token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    match AuthService::login(state, payload).await {
        Ok(response) => ApiSuccess(
            ApiResponse::success(response, "Login successful"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError(e.to_string(), StatusCode::UNAUTHORIZED).into_response(),
    }
}

/// Current authenticated user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<TokenClaims>,
) -> impl IntoResponse {
    match AuthService::get_me(state, claims.sub).await {
        Ok(user) => {
            ApiSuccess(ApiResponse::success(user, "User retrieved"), StatusCode::OK).into_response()
        }
        Err(e) => ApiError(e.to_string(), StatusCode::UNAUTHORIZED).into_response(),
    }
}
