use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use studio_logging::{studio_info, studio_warn};
use tokio::runtime::Runtime;

use crate::api::{ApiClient, ApiSettings, ReqwestApiClient};
use crate::filename::result_filename;
use crate::persist::ResultWriter;
use crate::poll::PollScheduler;
use crate::preview::{PreviewError, PreviewStore};
use crate::{
    ApiError, ChannelEventSink, ChatTurn, DownloadError, EngineEvent, EventSink, JobId, RequestId,
    VideoUpload,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api: ApiSettings,
    /// Where downloaded results are written.
    pub output_dir: PathBuf,
    /// Where preview copies live; system temp dir when `None`.
    pub preview_dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        Self {
            api: ApiSettings::default(),
            output_dir,
            preview_dir: None,
        }
    }
}

enum EngineCommand {
    SendChat {
        request: RequestId,
        turns: Vec<ChatTurn>,
    },
    SubmitJob {
        submission: RequestId,
        upload: VideoUpload,
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
    CreatePreview {
        preview_id: u64,
        source: PathBuf,
    },
    RevokePreview {
        preview_id: u64,
    },
    Download {
        job_id: JobId,
        url: String,
        file_stem: String,
    },
}

/// Runs engine work on a dedicated thread with its own tokio runtime.
///
/// Commands are handled in the order they are sent. Network calls run
/// concurrently on the runtime, as do preview copies; their results come back
/// through [`EngineHandle::recv_timeout`]. Dropping the handle stops polling and revokes
/// every preview still held.
pub struct EngineHandle {
    cmd_tx: Option<mpsc::Sender<EngineCommand>>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, ApiError> {
        let client = ReqwestApiClient::new(config.api.clone())?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    pub fn with_client(config: EngineConfig, client: Arc<dyn ApiClient>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));

        let worker = thread::spawn(move || {
            let runtime = Runtime::new().expect("tokio runtime");
            let mut worker = Worker {
                scheduler: PollScheduler::new(runtime.handle().clone()),
                previews: Arc::new(Mutex::new(PreviewStore::new(config.preview_dir.clone()))),
                config,
                client,
                sink,
                runtime,
            };
            while let Ok(command) = cmd_rx.recv() {
                worker.handle(command);
            }
            worker.teardown();
        });

        Self {
            cmd_tx: Some(cmd_tx),
            event_rx,
            worker: Some(worker),
        }
    }

    pub fn send_chat(&self, request: RequestId, turns: Vec<ChatTurn>) {
        self.send(EngineCommand::SendChat { request, turns });
    }

    pub fn submit_job(&self, submission: RequestId, upload: VideoUpload, prompt: impl Into<String>) {
        self.send(EngineCommand::SubmitJob {
            submission,
            upload,
            prompt: prompt.into(),
        });
    }

    pub fn start_polling(&self, job_id: impl Into<JobId>, interval: Duration) {
        self.send(EngineCommand::StartPolling {
            job_id: job_id.into(),
            interval,
        });
    }

    pub fn stop_polling(&self, job_id: impl Into<JobId>) {
        self.send(EngineCommand::StopPolling {
            job_id: job_id.into(),
        });
    }

    pub fn fetch_status(&self, job_id: impl Into<JobId>, seq: u64) {
        self.send(EngineCommand::FetchStatus {
            job_id: job_id.into(),
            seq,
        });
    }

    pub fn create_preview(&self, preview_id: u64, source: PathBuf) {
        self.send(EngineCommand::CreatePreview { preview_id, source });
    }

    pub fn revoke_preview(&self, preview_id: u64) {
        self.send(EngineCommand::RevokePreview { preview_id });
    }

    pub fn download(&self, job_id: impl Into<JobId>, url: impl Into<String>, file_stem: impl Into<String>) {
        self.send(EngineCommand::Download {
            job_id: job_id.into(),
            url: url.into(),
            file_stem: file_stem.into(),
        });
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(command);
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        // Closing the command channel ends the worker loop.
        self.cmd_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

struct Worker {
    config: EngineConfig,
    client: Arc<dyn ApiClient>,
    sink: Arc<dyn EventSink>,
    scheduler: PollScheduler,
    previews: Arc<Mutex<PreviewStore>>,
    runtime: Runtime,
}

impl Worker {
    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::SendChat { request, turns } => {
                let client = self.client.clone();
                let sink = self.sink.clone();
                self.runtime.spawn(async move {
                    let result = client.complete_chat(&turns).await;
                    if let Err(err) = &result {
                        studio_warn!("Chat request {} failed: {}", request, err);
                    }
                    sink.emit(EngineEvent::ChatCompleted { request, result });
                });
            }
            EngineCommand::SubmitJob {
                submission,
                upload,
                prompt,
            } => {
                let client = self.client.clone();
                let sink = self.sink.clone();
                self.runtime.spawn(async move {
                    let result = client.submit_video_job(&upload, &prompt).await;
                    match &result {
                        Ok(job_id) => studio_info!(
                            "Submission {} of {} accepted as job {}",
                            submission,
                            upload.file_name,
                            job_id
                        ),
                        Err(err) => studio_warn!("Submission {} failed: {}", submission, err),
                    }
                    sink.emit(EngineEvent::JobSubmitted { submission, result });
                });
            }
            EngineCommand::StartPolling { job_id, interval } => {
                self.scheduler.start(job_id, interval, self.sink.clone());
            }
            EngineCommand::StopPolling { job_id } => {
                if self.scheduler.stop(&job_id) {
                    studio_info!("Stopped polling job {}", job_id);
                }
            }
            EngineCommand::FetchStatus { job_id, seq } => {
                let client = self.client.clone();
                let sink = self.sink.clone();
                self.runtime.spawn(async move {
                    let result = client.fetch_job_status(&job_id).await;
                    if let Err(err) = &result {
                        studio_warn!("Status poll {} for job {} failed: {}", seq, job_id, err);
                    }
                    sink.emit(EngineEvent::StatusFetched {
                        job_id,
                        seq,
                        result,
                    });
                });
            }
            EngineCommand::CreatePreview { preview_id, source } => {
                let copy = match lock(&self.previews).reserve(preview_id) {
                    Ok(copy) => copy,
                    Err(err) => {
                        self.sink.emit(preview_failed(preview_id, &source, err));
                        return;
                    }
                };
                let previews = self.previews.clone();
                let sink = self.sink.clone();
                // Copying a large video must not hold up later commands.
                self.runtime.spawn_blocking(move || {
                    let copied = copy.copy_from(&source);
                    let event = match lock(&previews).finish(preview_id, copied) {
                        Ok(path) => EngineEvent::PreviewReady { preview_id, path },
                        Err(err) => preview_failed(preview_id, &source, err),
                    };
                    sink.emit(event);
                });
            }
            EngineCommand::RevokePreview { preview_id } => {
                lock(&self.previews).revoke(preview_id);
            }
            EngineCommand::Download {
                job_id,
                url,
                file_stem,
            } => {
                let client = self.client.clone();
                let sink = self.sink.clone();
                let output_dir = self.config.output_dir.clone();
                self.runtime.spawn(async move {
                    let result = download_to(client.as_ref(), &url, &file_stem, output_dir).await;
                    match &result {
                        Ok(path) => studio_info!("Saved result of job {} to {:?}", job_id, path),
                        Err(err) => studio_warn!("Download for job {} failed: {}", job_id, err),
                    }
                    sink.emit(EngineEvent::DownloadCompleted { job_id, result });
                });
            }
        }
    }

    fn teardown(&mut self) {
        self.scheduler.stop_active();
        let mut previews = lock(&self.previews);
        let revoked = previews.revoke_all();
        let stats = previews.stats();
        studio_info!(
            "Engine stopped; revoked {} preview(s) at teardown ({} created, {} revoked)",
            revoked,
            stats.created,
            stats.revoked
        );
    }
}

fn lock(previews: &Mutex<PreviewStore>) -> MutexGuard<'_, PreviewStore> {
    previews.lock().unwrap_or_else(PoisonError::into_inner)
}

fn preview_failed(preview_id: u64, source: &std::path::Path, err: PreviewError) -> EngineEvent {
    studio_warn!("Preview {} for {:?} failed: {}", preview_id, source, err);
    EngineEvent::PreviewFailed {
        preview_id,
        message: err.to_string(),
    }
}

async fn download_to(
    client: &dyn ApiClient,
    url: &str,
    file_stem: &str,
    output_dir: PathBuf,
) -> Result<PathBuf, DownloadError> {
    let bytes = client.download(url).await?;
    let filename = result_filename(file_stem, url);
    tokio::task::spawn_blocking(move || ResultWriter::new(output_dir).save(&filename, &bytes))
        .await
        .map_err(|err| DownloadError::Persist(err.to_string()))?
        .map_err(|err| DownloadError::Persist(err.to_string()))
}
