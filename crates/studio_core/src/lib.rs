//! Studio core: pure state machine for the chat and video-stylization workflows.
//!
//! Nothing in this crate performs IO. Commands and remote responses arrive as
//! [`Msg`]s, [`update`] folds them into [`AppState`] and returns the
//! [`Effect`]s the engine must carry out.
mod chat;
mod effect;
mod job;
mod locator;
mod msg;
mod state;
mod update;
mod upload;
mod view_model;

pub use chat::{
    ChatHistoryMode, ChatMessage, ChatRequestId, MessageId, Role, CLEARED_TEXT, FALLBACK_TEXT,
    GREETING_TEXT,
};
pub use effect::{ChatTurn, Effect};
pub use job::{
    JobId, JobPhase, JobStatus, PollingTask, RemoteStatus, StatusOutcome, StatusReport,
    SubmissionId, SubmitFailure,
};
pub use locator::resolve_locator;
pub use msg::Msg;
pub use state::{AppState, Notice, NoticeKind, Settings, DEFAULT_API_BASE, DEFAULT_POLL_INTERVAL};
pub use update::update;
pub use upload::{PendingUpload, PreviewId, SelectedFile};
pub use view_model::{AppViewModel, ChatView, DownloadView, JobView, UploadView};
