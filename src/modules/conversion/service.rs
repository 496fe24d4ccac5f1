use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::ConversionError;
use super::events::ProgressEvent;
use super::model::ConversionJob;
use super::repository::{ConversionRepository, NewConversionJob};
use crate::common::upload::{unix_millis, StoredUpload};
use crate::infrastructure::ffmpeg::engine::{TranscodeEvent, TranscodeStream};
use crate::infrastructure::notify::ProgressNotifier;
use crate::state::AppState;

/// The original artifact a job transcodes from. Fresh conversions build it
/// from the stored upload; reconversions rehydrate it from the record they
/// share a source with.
struct SourceFile {
    filename: String,
    path: PathBuf,
    size_bytes: i64,
}

/// Deletes the destination file unless the job reached a complete,
/// persisted result. Keeps partial output of a failed transcode from ever
/// being mistaken for a valid artifact, on every exit path.
struct DestFileGuard {
    path: PathBuf,
    armed: bool,
}

impl DestFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for DestFileGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Result filenames get their own timestamp so reconverting the same source
/// to the same format twice yields two distinct artifacts.
fn converted_filename(source_filename: &str, format: &str, now_ms: i128) -> String {
    let stem = Path::new(source_filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");
    format!("{}-{}.{}", stem, now_ms, format)
}

pub struct ConversionService;

impl ConversionService {
    /// Fresh conversion of a just-stored upload.
    pub async fn convert_upload(
        state: AppState,
        owner_id: Uuid,
        upload: StoredUpload,
        format: String,
    ) -> Result<ConversionJob, ConversionError> {
        let source = SourceFile {
            filename: upload.filename,
            path: upload.path,
            size_bytes: upload.size_bytes,
        };
        Self::run_job(state, owner_id, source, format).await
    }

    /// Re-run the transcode of an existing record against another format.
    /// Produces a new record sharing the source; the original record and
    /// its result are never touched.
    pub async fn reconvert(
        state: AppState,
        owner_id: Uuid,
        video_id: Uuid,
        format: String,
    ) -> Result<ConversionJob, ConversionError> {
        let record = ConversionRepository::find_by_id_and_owner(&state.db, video_id, owner_id)
            .await
            .map_err(|e| ConversionError::Database(e.to_string()))?
            .ok_or(ConversionError::RecordNotFound)?;

        let source = SourceFile {
            filename: record.source_filename.clone(),
            path: PathBuf::from(&record.source_path),
            size_bytes: record.source_size_bytes,
        };

        if !source.path.exists() {
            return Err(ConversionError::Storage(format!(
                "Source file missing: {}",
                record.source_path
            )));
        }

        Self::run_job(state, owner_id, source, format).await
    }

    /// One job: Submitted -> Running -> {Succeeded, Failed}. The work runs
    /// in its own task so a dropped HTTP connection cannot cancel a
    /// transcode mid-flight; the job always reaches a terminal state.
    async fn run_job(
        state: AppState,
        owner_id: Uuid,
        source: SourceFile,
        format: String,
    ) -> Result<ConversionJob, ConversionError> {
        let job_id = Uuid::new_v4();
        let task_state = state.clone();

        let handle = tokio::spawn(async move {
            let result = Self::execute(task_state.clone(), job_id, owner_id, source, format).await;
            if let Err(err) = &result {
                // The terminal error goes out here, inside the task, so it
                // is delivered even when the HTTP caller has gone away.
                error!("Conversion job {} failed: {}", job_id, err);
                task_state
                    .notifier
                    .publish(&ProgressEvent::error(job_id, err.to_string()));
            }
            result
        });

        match handle.await {
            Ok(result) => result,
            Err(join_err) => {
                error!("Conversion job {} aborted: {}", job_id, join_err);
                let err = ConversionError::Engine("conversion task aborted".to_string());
                state
                    .notifier
                    .publish(&ProgressEvent::error(job_id, err.to_string()));
                Err(err)
            }
        }
    }

    async fn execute(
        state: AppState,
        job_id: Uuid,
        owner_id: Uuid,
        source: SourceFile,
        format: String,
    ) -> Result<ConversionJob, ConversionError> {
        let result_filename = converted_filename(&source.filename, &format, unix_millis());
        let result_path = Path::new(&state.config.converted_dir).join(&result_filename);
        let mut dest_guard = DestFileGuard::new(result_path.clone());

        let mut stream = state
            .engine
            .transcode(&source.path, &format, &result_path)
            .await
            .map_err(|e| ConversionError::Engine(e.to_string()))?;

        Self::await_terminal(&mut stream, &state.notifier, job_id)
            .await
            .map_err(ConversionError::Engine)?;

        // Metadata is an enrichment; a probe failure never fails the job.
        let metadata = match state.engine.probe(&result_path).await {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!("Probe failed for {}: {}", result_path.display(), e);
                None
            }
        };

        let result_size_bytes = tokio::fs::metadata(&result_path)
            .await
            .map_err(|e| ConversionError::Storage(format!("Converted file unreadable: {}", e)))?
            .len() as i64;

        let job = ConversionRepository::insert(
            &state.db,
            NewConversionJob {
                id: job_id,
                owner_id,
                source_filename: source.filename,
                source_path: source.path.to_string_lossy().to_string(),
                source_size_bytes: source.size_bytes,
                result_filename,
                result_path: result_path.to_string_lossy().to_string(),
                result_size_bytes,
                result_format: format,
                duration_seconds: metadata.as_ref().and_then(|m| m.duration_seconds),
                resolution: metadata.as_ref().and_then(|m| m.resolution.clone()),
                bitrate: metadata.as_ref().and_then(|m| m.bitrate),
            },
        )
        .await
        .map_err(|e| ConversionError::Database(e.to_string()))?;

        dest_guard.disarm();

        // Terminal success goes out only once the record exists, so a
        // persist failure still yields exactly one terminal event.
        state.notifier.publish(&ProgressEvent::complete(job_id));
        info!("Conversion job {} completed: {}", job_id, job.result_filename.as_deref().unwrap_or(""));

        Ok(job)
    }

    /// Relay engine events to the live channel until the stream reaches a
    /// terminal event. Publication order matches adapter order; the
    /// terminal `complete`/`error` is left to the caller.
    async fn await_terminal(
        stream: &mut TranscodeStream,
        notifier: &ProgressNotifier,
        job_id: Uuid,
    ) -> Result<(), String> {
        while let Some(event) = stream.next().await {
            match event {
                TranscodeEvent::Started { command } => {
                    info!("FFmpeg process started: {}", command);
                    notifier.publish(&ProgressEvent::start(job_id));
                }
                TranscodeEvent::Progress { percent } => {
                    notifier.publish(&ProgressEvent::progress(job_id, percent));
                }
                TranscodeEvent::Completed => return Ok(()),
                TranscodeEvent::Failed { reason } => return Err(reason),
            }
        }
        Err("transcode ended without a terminal event".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn stream_of(events: Vec<TranscodeEvent>) -> TranscodeStream {
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        TranscodeStream::new(rx)
    }

    #[tokio::test]
    async fn relays_events_in_order_until_completion() {
        let notifier = ProgressNotifier::new();
        let (_generation, mut rx) = notifier.register();
        let job_id = Uuid::new_v4();

        let mut stream = stream_of(vec![
            TranscodeEvent::Started {
                command: "ffmpeg -i in.mp4".to_string(),
            },
            TranscodeEvent::Progress { percent: 40.0 },
            TranscodeEvent::Progress { percent: 80.0 },
            TranscodeEvent::Completed,
        ]);

        let outcome = ConversionService::await_terminal(&mut stream, &notifier, job_id).await;
        assert!(outcome.is_ok());

        assert_eq!(rx.recv().await, Some(ProgressEvent::start(job_id)));
        assert_eq!(rx.recv().await, Some(ProgressEvent::progress(job_id, 40.0)));
        assert_eq!(rx.recv().await, Some(ProgressEvent::progress(job_id, 80.0)));
        // No terminal event from the relay itself; the orchestrator
        // publishes it after the record persists.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn failure_reason_is_propagated_not_published_twice() {
        let notifier = ProgressNotifier::new();
        let (_generation, mut rx) = notifier.register();
        let job_id = Uuid::new_v4();

        let mut stream = stream_of(vec![
            TranscodeEvent::Started {
                command: "ffmpeg".to_string(),
            },
            TranscodeEvent::Failed {
                reason: "unknown muxer".to_string(),
            },
        ]);

        let outcome = ConversionService::await_terminal(&mut stream, &notifier, job_id).await;
        assert_eq!(outcome, Err("unknown muxer".to_string()));

        assert_eq!(rx.recv().await, Some(ProgressEvent::start(job_id)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stream_ending_early_is_a_failure() {
        let notifier = ProgressNotifier::new();
        let job_id = Uuid::new_v4();

        let mut stream = stream_of(vec![TranscodeEvent::Progress { percent: 10.0 }]);
        let outcome = ConversionService::await_terminal(&mut stream, &notifier, job_id).await;
        assert!(outcome.is_err());
    }

    #[test]
    fn converted_filenames_are_timestamp_disambiguated() {
        let a = converted_filename("video-1700000000000.mp4", "webm", 1700000000111);
        let b = converted_filename("video-1700000000000.mp4", "webm", 1700000000222);
        assert_eq!(a, "video-1700000000000-1700000000111.webm");
        assert_ne!(a, b);
    }

    #[test]
    fn dest_guard_removes_file_unless_disarmed() {
        let dir = tempfile::tempdir().unwrap();

        let abandoned = dir.path().join("partial.avi");
        std::fs::write(&abandoned, b"partial").unwrap();
        {
            let _guard = DestFileGuard::new(abandoned.clone());
        }
        assert!(!abandoned.exists());

        let kept = dir.path().join("complete.avi");
        std::fs::write(&kept, b"complete").unwrap();
        {
            let mut guard = DestFileGuard::new(kept.clone());
            guard.disarm();
        }
        assert!(kept.exists());
    }
}
