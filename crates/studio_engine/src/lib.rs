//! Studio engine: HTTP client, polling scheduler, preview store and effect execution.
mod api;
mod engine;
mod filename;
mod persist;
mod poll;
mod preview;
mod types;

pub use api::{ApiClient, ApiSettings, ReqwestApiClient};
pub use engine::{EngineConfig, EngineHandle};
pub use filename::result_filename;
pub use persist::{ResultWriter, SaveError};
pub use poll::PollScheduler;
pub use preview::{PreviewCopy, PreviewError, PreviewStats, PreviewStore};
pub use types::{
    ApiError, ChannelEventSink, ChatTurn, DownloadError, EngineEvent, EventSink, JobId,
    JobStatusReport, RemoteJobStatus, RequestId, VideoUpload,
};
