use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages pushed to the live progress channel. The `status` tag and
/// field names are the wire contract the browser client listens on; the
/// job id distinguishes interleaved concurrent jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEvent {
    Start {
        #[serde(rename = "jobId")]
        job_id: Uuid,
        message: String,
    },
    Progress {
        #[serde(rename = "jobId")]
        job_id: Uuid,
        percent: f32,
    },
    Complete {
        #[serde(rename = "jobId")]
        job_id: Uuid,
        message: String,
    },
    Error {
        #[serde(rename = "jobId")]
        job_id: Uuid,
        message: String,
    },
}

impl ProgressEvent {
    pub fn start(job_id: Uuid) -> Self {
        ProgressEvent::Start {
            job_id,
            message: "Conversion started".to_string(),
        }
    }

    pub fn progress(job_id: Uuid, percent: f32) -> Self {
        ProgressEvent::Progress { job_id, percent }
    }

    pub fn complete(job_id: Uuid) -> Self {
        ProgressEvent::Complete {
            job_id,
            message: "Conversion completed".to_string(),
        }
    }

    pub fn error(job_id: Uuid, message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            job_id,
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_event_wire_shape() {
        let job_id = Uuid::new_v4();
        let json = serde_json::to_string(&ProgressEvent::start(job_id)).unwrap();
        assert!(json.contains("\"status\":\"start\""));
        assert!(json.contains("\"message\":\"Conversion started\""));
        assert!(json.contains("\"jobId\""));
        assert!(json.contains(&job_id.to_string()));
    }

    #[test]
    fn progress_event_wire_shape() {
        let json =
            serde_json::to_string(&ProgressEvent::progress(Uuid::new_v4(), 42.5)).unwrap();
        assert!(json.contains("\"status\":\"progress\""));
        assert!(json.contains("\"percent\":42.5"));
    }

    #[test]
    fn error_event_carries_reason() {
        let json =
            serde_json::to_string(&ProgressEvent::error(Uuid::new_v4(), "boom")).unwrap();
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("\"message\":\"boom\""));
    }

    #[test]
    fn only_complete_and_error_are_terminal() {
        let id = Uuid::new_v4();
        assert!(!ProgressEvent::start(id).is_terminal());
        assert!(!ProgressEvent::progress(id, 10.0).is_terminal());
        assert!(ProgressEvent::complete(id).is_terminal());
        assert!(ProgressEvent::error(id, "x").is_terminal());
    }
}
