use std::path::PathBuf;

use crate::{ChatRequestId, JobId, PreviewId, SelectedFile, StatusOutcome, SubmissionId, SubmitFailure};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a file, by drag-and-drop or by browsing.
    FileSelected(SelectedFile),
    /// Engine finished the playable copy of a selected file.
    PreviewReady {
        preview_id: PreviewId,
        path: PathBuf,
    },
    /// User removed the selected file.
    UploadCleared,
    /// User edited the style prompt.
    PromptChanged(String),
    /// User asked to submit the selected file with the current prompt.
    SubmitClicked,
    /// Backend answered a job submission.
    JobSubmitted {
        submission: SubmissionId,
        result: Result<JobId, SubmitFailure>,
    },
    /// Polling interval elapsed for a job.
    PollTick { job_id: JobId },
    /// Backend answered a status poll.
    StatusReceived {
        job_id: JobId,
        seq: u64,
        outcome: StatusOutcome,
    },
    /// User asked to save the finished video.
    DownloadClicked,
    /// Engine finished (or gave up on) saving the result.
    DownloadFinished {
        job_id: JobId,
        result: Result<PathBuf, String>,
    },
    /// User edited the chat input.
    ChatInputChanged(String),
    /// User sent the chat input.
    SendClicked,
    /// Backend answered (or failed) a chat completion.
    ChatReplied {
        request: ChatRequestId,
        result: Result<String, String>,
    },
    /// User reset the conversation.
    ChatCleared,
    /// User dismissed the current notice.
    NoticeDismissed,
    /// Session is ending; release every held resource.
    Shutdown,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
