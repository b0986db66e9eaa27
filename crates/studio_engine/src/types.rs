use std::path::PathBuf;

use serde::Serialize;

/// Opaque job identifier assigned by the backend.
pub type JobId = String;
/// Caller-chosen token correlating a request with its completion event.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Local video to upload as the `video` multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUpload {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteJobStatus {
    Pending,
    Uploading,
    Processing,
    Running,
    Done,
    Error,
    NotFound,
}

impl RemoteJobStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "uploading" => Some(Self::Uploading),
            "processing" => Some(Self::Processing),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            "not_found" => Some(Self::NotFound),
            _ => None,
        }
    }
}

/// Decoded body of `GET /video/status/{job_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusReport {
    pub status: RemoteJobStatus,
    pub video_url: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
    pub elapsed_sec: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Connection failure, timeout or 5xx.
    #[error("backend unavailable: {message}")]
    RemoteUnavailable {
        status: Option<u16>,
        message: String,
    },
    /// 4xx with the server's detail message.
    #[error("{detail}")]
    ValidationRejected { status: u16, detail: String },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
    #[error("invalid api base url: {0}")]
    InvalidBaseUrl(String),
    #[error("could not read {path}: {message}")]
    LocalFile { path: String, message: String },
}

impl ApiError {
    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            status: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("could not write result: {0}")]
    Persist(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ChatCompleted {
        request: RequestId,
        result: Result<String, ApiError>,
    },
    JobSubmitted {
        submission: RequestId,
        result: Result<JobId, ApiError>,
    },
    /// Polling interval elapsed for the active polling task.
    PollDue { job_id: JobId },
    StatusFetched {
        job_id: JobId,
        seq: u64,
        result: Result<JobStatusReport, ApiError>,
    },
    PreviewReady {
        preview_id: u64,
        path: PathBuf,
    },
    PreviewFailed {
        preview_id: u64,
        message: String,
    },
    DownloadCompleted {
        job_id: JobId,
        result: Result<PathBuf, DownloadError>,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::RemoteJobStatus;

    #[test]
    fn parses_reference_and_worker_statuses() {
        assert_eq!(RemoteJobStatus::parse("done"), Some(RemoteJobStatus::Done));
        assert_eq!(RemoteJobStatus::parse(" Running "), Some(RemoteJobStatus::Running));
        assert_eq!(RemoteJobStatus::parse("not_found"), Some(RemoteJobStatus::NotFound));
        assert_eq!(RemoteJobStatus::parse("queued"), None);
    }
}
