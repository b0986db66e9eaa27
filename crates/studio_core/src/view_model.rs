use std::path::PathBuf;

use crate::job::DownloadState;
use crate::{resolve_locator, AppState, ChatMessage, JobId, JobPhase, JobStatus, Notice, PreviewId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub upload: Option<UploadView>,
    pub prompt: String,
    pub can_submit: bool,
    pub job: JobView,
    /// Job currently targeted by the polling task, if any.
    pub polling: Option<JobId>,
    pub chat: ChatView,
    pub notice: Option<Notice>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadView {
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub preview_id: PreviewId,
    pub preview_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobView {
    pub status: JobStatus,
    pub job_id: Option<JobId>,
    pub error_detail: Option<String>,
    /// Download target, resolved against the API base.
    pub result_url: Option<String>,
    pub elapsed_secs: Option<u64>,
    pub download: DownloadView,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DownloadView {
    #[default]
    Unavailable,
    Ready,
    InProgress,
    Saved(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatView {
    pub messages: Vec<ChatMessage>,
    pub draft: String,
    pub sending: bool,
    pub can_send: bool,
}

impl AppViewModel {
    pub(crate) fn project(state: &AppState, dirty: bool) -> Self {
        let phase = state.job.phase();
        let upload = state.upload.current().map(|upload| UploadView {
            name: upload.file.name.clone(),
            size: upload.file.size,
            mime: upload.file.mime.clone(),
            preview_id: upload.preview,
            preview_path: upload.preview_path.clone(),
        });

        let (error_detail, result_url) = match phase {
            JobPhase::Failed { detail, .. } => (Some(detail.clone()), None),
            JobPhase::Done { result_locator, .. } => (
                None,
                Some(resolve_locator(&state.settings.api_base, result_locator)),
            ),
            _ => (None, None),
        };

        let download = match (phase, state.job.download()) {
            (JobPhase::Done { .. }, DownloadState::Idle) => DownloadView::Ready,
            (_, DownloadState::InProgress) => DownloadView::InProgress,
            (_, DownloadState::Saved(path)) => DownloadView::Saved(path.clone()),
            (_, DownloadState::Failed(reason)) => DownloadView::Failed(reason.clone()),
            _ => DownloadView::Unavailable,
        };

        Self {
            can_submit: !state.closed
                && upload.is_some()
                && !state.upload.prompt().trim().is_empty()
                && !phase.is_in_flight(),
            upload,
            prompt: state.upload.prompt().to_string(),
            job: JobView {
                status: phase.status(),
                job_id: phase.job_id().map(str::to_string),
                error_detail,
                result_url,
                elapsed_secs: state.job.elapsed_secs(),
                download,
            },
            polling: state
                .job
                .polling()
                .map(|task| task.target_job_id.clone()),
            chat: ChatView {
                messages: state.chat.messages().to_vec(),
                draft: state.chat.draft().to_string(),
                sending: state.chat.is_sending(),
                can_send: state.chat.can_send(),
            },
            notice: state.notice.clone(),
            dirty,
        }
    }
}
