use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::ffmpeg::engine::FfmpegEngine;
use crate::infrastructure::notify::ProgressNotifier;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub engine: FfmpegEngine,
    pub notifier: Arc<ProgressNotifier>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        engine: FfmpegEngine,
        notifier: Arc<ProgressNotifier>,
    ) -> Self {
        Self {
            config,
            db,
            engine,
            notifier,
        }
    }
}
