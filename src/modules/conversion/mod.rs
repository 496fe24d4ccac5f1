use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};

use crate::common::upload::MAX_UPLOAD_BYTES;
use crate::state::AppState;

pub mod dto;
pub mod error;
pub mod events;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;
pub mod stream_handler;
pub mod ws_handler;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/convert",
            post(handler::convert).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/reconvert", post(handler::reconvert))
        .route("/history", get(handler::history))
        .route("/download/{id}", get(stream_handler::download))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware,
        ))
}
