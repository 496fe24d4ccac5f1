use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Best-effort description of a media file. Every field is optional;
/// whatever ffprobe reports is kept, the rest stays empty.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MediaMetadata {
    pub duration_seconds: Option<f64>,
    pub resolution: Option<String>,
    pub bitrate: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
}

pub(crate) fn parse_probe_output(json: &str) -> Result<MediaMetadata> {
    let output: ProbeOutput =
        serde_json::from_str(json).map_err(|e| anyhow!("Invalid ffprobe output: {}", e))?;

    let (duration_seconds, bitrate) = match &output.format {
        Some(format) => (
            format.duration.as_deref().and_then(|d| d.parse::<f64>().ok()),
            format.bit_rate.as_deref().and_then(|b| b.parse::<i64>().ok()),
        ),
        None => (None, None),
    };

    let resolution = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .and_then(|s| match (s.width, s.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        });

    Ok(MediaMetadata {
        duration_seconds,
        resolution,
        bitrate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_probe_output() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "12.480000", "bit_rate": "1205959"}
        }"#;

        let meta = parse_probe_output(json).unwrap();
        assert_eq!(meta.duration_seconds, Some(12.48));
        assert_eq!(meta.resolution.as_deref(), Some("1920x1080"));
        assert_eq!(meta.bitrate, Some(1205959));
    }

    #[test]
    fn tolerates_missing_sections() {
        let meta = parse_probe_output(r#"{"streams": []}"#).unwrap();
        assert_eq!(meta.duration_seconds, None);
        assert_eq!(meta.resolution, None);
        assert_eq!(meta.bitrate, None);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_probe_output("not json").is_err());
    }
}
