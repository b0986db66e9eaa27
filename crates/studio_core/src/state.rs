use std::time::Duration;

use crate::chat::ChatState;
use crate::job::JobState;
use crate::upload::UploadState;
use crate::view_model::AppViewModel;
use crate::ChatHistoryMode;

/// Reference polling cadence of the backend status endpoint.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
    pub poll_interval: Duration,
    pub chat_history: ChatHistoryMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            chat_history: ChatHistoryMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    InvalidMediaType,
    RemoteUnavailable,
    ValidationRejected,
    DownloadSaved,
    DownloadFailed,
}

/// User-facing message produced by a failed or finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub(crate) fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self.kind, NoticeKind::DownloadSaved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) settings: Settings,
    pub(crate) upload: UploadState,
    pub(crate) job: JobState,
    pub(crate) chat: ChatState,
    pub(crate) notice: Option<Notice>,
    pub(crate) closed: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::project(self, self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
