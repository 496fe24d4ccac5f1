use anyhow::{anyhow, Result};
use axum::extract::multipart::Field;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;
use tracing::error;

// Mirrors the classic multer setup: 100MB cap, enforced at the router layer.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub struct StoredUpload {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: i64,
}

/// Only plain MP4 uploads are accepted; everything else is rejected
/// before a job ever exists.
pub fn is_supported_upload(content_type: &str) -> bool {
    content_type == "video/mp4"
}

pub fn unix_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

/// Upload filenames are timestamp-suffixed so concurrent uploads never
/// collide on disk. The original extension is kept.
pub fn upload_filename(original_name: &str, now_ms: i128) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    format!("video-{}.{}", now_ms, ext)
}

/// Stream a multipart field to a file under `upload_dir`.
/// A partially written file is removed if the stream breaks mid-way.
pub async fn store_upload(upload_dir: &Path, mut field: Field<'_>) -> Result<StoredUpload> {
    let original_name = field.file_name().unwrap_or("video.mp4").to_string();
    let filename = upload_filename(&original_name, unix_millis());
    let path = upload_dir.join(&filename);

    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| anyhow!("Failed to create upload file: {}", e))?;

    let mut size_bytes: i64 = 0;

    while let Some(chunk) = field.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                error!("Upload stream error: {}", e);
                let _ = tokio::fs::remove_file(&path).await;
                return Err(anyhow!("Upload stream interrupted"));
            }
        };

        if let Err(e) = file.write_all(&chunk).await {
            error!("Upload write error: {}", e);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(anyhow!("Failed to write upload: {}", e));
        }

        size_bytes += chunk.len() as i64;
    }

    file.flush()
        .await
        .map_err(|e| anyhow!("Failed to flush upload: {}", e))?;

    Ok(StoredUpload {
        filename,
        path,
        size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_video_uploads() {
        assert!(is_supported_upload("video/mp4"));
        assert!(!is_supported_upload("text/plain"));
        assert!(!is_supported_upload("application/octet-stream"));
    }

    #[test]
    fn upload_filename_keeps_extension_and_timestamp() {
        let name = upload_filename("clip.mp4", 1700000000000);
        assert_eq!(name, "video-1700000000000.mp4");

        let fallback = upload_filename("noext", 42);
        assert_eq!(fallback, "video-42.mp4");
    }

    #[test]
    fn upload_filenames_disambiguate_by_timestamp() {
        assert_ne!(
            upload_filename("clip.mp4", 1),
            upload_filename("clip.mp4", 2)
        );
    }
}
