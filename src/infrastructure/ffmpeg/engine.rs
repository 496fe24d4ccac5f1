use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::warn;

use super::probe::{parse_probe_output, MediaMetadata};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const STDERR_TAIL_LINES: usize = 8;

/// Lifecycle of one external transcode. `Completed` and `Failed` are
/// terminal; at most one of them is emitted per job.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscodeEvent {
    Started { command: String },
    Progress { percent: f32 },
    Completed,
    Failed { reason: String },
}

/// Finite, non-restartable sequence of events for one transcode.
pub struct TranscodeStream {
    rx: mpsc::Receiver<TranscodeEvent>,
}

impl TranscodeStream {
    pub(crate) fn new(rx: mpsc::Receiver<TranscodeEvent>) -> Self {
        Self { rx }
    }

    pub async fn next(&mut self) -> Option<TranscodeEvent> {
        self.rx.recv().await
    }
}

/// Wraps the external ffmpeg/ffprobe binaries. The target format string is
/// handed to ffmpeg unvalidated; the engine is the authority on what it
/// supports and rejects the rest through a `Failed` event.
#[derive(Clone)]
pub struct FfmpegEngine {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegEngine {
    pub fn new(ffmpeg: &str, ffprobe: &str) -> Self {
        Self {
            ffmpeg: ffmpeg.to_string(),
            ffprobe: ffprobe.to_string(),
        }
    }

    /// Start a transcode and return its event stream. Spawn failures are
    /// returned directly; everything after spawn arrives as events.
    pub async fn transcode(
        &self,
        source: &Path,
        target_format: &str,
        dest: &Path,
    ) -> Result<TranscodeStream> {
        // Percentages need the source duration; without it progress lines
        // are still consumed but no percentage is synthesized.
        let total_duration = match self.probe(source).await {
            Ok(meta) => meta.duration_seconds,
            Err(e) => {
                warn!("Could not probe source duration: {}", e);
                None
            }
        };

        let args = build_transcode_args(source, target_format, dest);
        let command = format!("{} {}", self.ffmpeg, args.join(" "));

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| anyhow!("Failed to spawn ffmpeg: {}", e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stderr not captured"))?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let _ = tx.send(TranscodeEvent::Started { command }).await;

            let stderr_task = tokio::spawn(async move {
                let mut tail: VecDeque<String> = VecDeque::new();
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tail.len() >= STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                tail.into_iter().collect::<Vec<_>>().join("\n")
            });

            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(out_time_us) = parse_progress_line(&line) {
                    if let Some(total) = total_duration {
                        let percent = percent_complete(out_time_us, total);
                        let _ = tx.send(TranscodeEvent::Progress { percent }).await;
                    }
                }
            }

            let status = child.wait().await;
            let stderr_tail = stderr_task.await.unwrap_or_default();

            let terminal = match status {
                Ok(status) if status.success() => TranscodeEvent::Completed,
                Ok(status) => {
                    let reason = if stderr_tail.is_empty() {
                        format!("ffmpeg exited with {}", status)
                    } else {
                        stderr_tail
                    };
                    TranscodeEvent::Failed { reason }
                }
                Err(e) => TranscodeEvent::Failed {
                    reason: format!("ffmpeg process error: {}", e),
                },
            };

            let _ = tx.send(terminal).await;
        });

        Ok(TranscodeStream::new(rx))
    }

    /// Extract container metadata via ffprobe. Callers treat a failure
    /// here as non-fatal.
    pub async fn probe(&self, path: &Path) -> Result<MediaMetadata> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| anyhow!("Failed to run ffprobe: {}", e))?;

        if !output.status.success() {
            return Err(anyhow!("ffprobe exited with {}", output.status));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }
}

fn build_transcode_args(source: &Path, target_format: &str, dest: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-i".to_string(),
        source.to_string_lossy().to_string(),
        "-f".to_string(),
        target_format.to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        dest.to_string_lossy().to_string(),
    ]
}

/// ffmpeg `-progress` emits key=value lines; the out_time keys carry
/// microseconds. Values can be negative or `N/A` early in the run.
fn parse_progress_line(line: &str) -> Option<i64> {
    let value = line
        .strip_prefix("out_time_us=")
        .or_else(|| line.strip_prefix("out_time_ms="))?;
    value.trim().parse::<i64>().ok().filter(|us| *us >= 0)
}

fn percent_complete(out_time_us: i64, total_duration_seconds: f64) -> f32 {
    if total_duration_seconds <= 0.0 {
        return 0.0;
    }
    let elapsed = out_time_us as f64 / 1_000_000.0;
    ((elapsed / total_duration_seconds) * 100.0).clamp(0.0, 100.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn parses_out_time_lines() {
        assert_eq!(parse_progress_line("out_time_us=1500000"), Some(1_500_000));
        assert_eq!(parse_progress_line("out_time_ms=1500000"), Some(1_500_000));
        assert_eq!(parse_progress_line("frame=42"), None);
        assert_eq!(parse_progress_line("out_time_us=N/A"), None);
        assert_eq!(parse_progress_line("out_time_us=-125000"), None);
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(percent_complete(5_000_000, 10.0), 50.0);
        assert_eq!(percent_complete(20_000_000, 10.0), 100.0);
        assert_eq!(percent_complete(1_000_000, 0.0), 0.0);
    }

    #[test]
    fn format_string_is_passed_through_verbatim() {
        let args = build_transcode_args(
            &PathBuf::from("uploads/in.mp4"),
            "definitely-not-a-muxer",
            &PathBuf::from("converted/out.avi"),
        );
        let f = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[f + 1], "definitely-not-a-muxer");
        assert_eq!(args.last().unwrap(), "converted/out.avi");
    }
}
