use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod middleware;
mod modules;
mod routes;
mod state;

use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::connect_to_db;
use crate::infrastructure::ffmpeg::engine::FfmpegEngine;
use crate::infrastructure::notify::ProgressNotifier;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt::init();

    info!("Starting server...");

    let config = AppConfig::new().expect("Failed to load configuration");

    let db = connect_to_db(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!()
        .run(&db)
        .await
        .expect("Failed to run migrations");

    std::fs::create_dir_all(&config.upload_dir).expect("Failed to create upload directory");
    std::fs::create_dir_all(&config.converted_dir).expect("Failed to create converted directory");

    let engine = FfmpegEngine::new(&config.ffmpeg_path, &config.ffprobe_path);
    let notifier = Arc::new(ProgressNotifier::new());

    let port = config.server_port;
    let state = AppState::new(config, db, engine, notifier);

    let app = app::create_app(state).await;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Failed to bind server port");
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await.expect("Server error");
}
