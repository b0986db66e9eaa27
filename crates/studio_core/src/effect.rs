use std::path::PathBuf;
use std::time::Duration;

use crate::{ChatMessage, ChatRequestId, JobId, PreviewId, Role, SelectedFile, SubmissionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreatePreview {
        preview_id: PreviewId,
        source: PathBuf,
    },
    RevokePreview {
        preview_id: PreviewId,
    },
    SubmitJob {
        submission: SubmissionId,
        file: SelectedFile,
        prompt: String,
    },
    StartPolling {
        job_id: JobId,
        interval: Duration,
    },
    StopPolling {
        job_id: JobId,
    },
    FetchStatus {
        job_id: JobId,
        seq: u64,
    },
    DownloadResult {
        job_id: JobId,
        url: String,
        file_stem: String,
    },
    SendChat {
        request: ChatRequestId,
        turns: Vec<ChatTurn>,
    },
}

/// One `{ role, content }` entry of a completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for ChatTurn {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.text.clone(),
        }
    }
}
