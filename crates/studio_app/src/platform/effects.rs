use std::time::Duration;

use studio_core::{
    ChatTurn as CoreTurn, Effect, Msg, RemoteStatus, StatusOutcome, StatusReport, SubmitFailure,
};
use studio_engine::{
    ApiError, ChatTurn, EngineConfig, EngineEvent, EngineHandle, JobStatusReport, RemoteJobStatus,
    VideoUpload,
};
use studio_logging::{studio_debug, studio_info, studio_warn};

/// Carries core effects out on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let engine = EngineHandle::new(config)?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CreatePreview { preview_id, source } => {
                    self.engine.create_preview(preview_id, source);
                }
                Effect::RevokePreview { preview_id } => {
                    self.engine.revoke_preview(preview_id);
                }
                Effect::SubmitJob {
                    submission,
                    file,
                    prompt,
                } => {
                    studio_info!(
                        "SubmitJob submission={} file={} size={} prompt_len={}",
                        submission,
                        file.name,
                        file.size,
                        prompt.len()
                    );
                    let upload = VideoUpload {
                        path: file.path,
                        file_name: file.name,
                        mime: file.mime,
                    };
                    self.engine.submit_job(submission, upload, prompt);
                }
                Effect::StartPolling { job_id, interval } => {
                    self.engine.start_polling(job_id, interval);
                }
                Effect::StopPolling { job_id } => {
                    self.engine.stop_polling(job_id);
                }
                Effect::FetchStatus { job_id, seq } => {
                    self.engine.fetch_status(job_id, seq);
                }
                Effect::DownloadResult {
                    job_id,
                    url,
                    file_stem,
                } => {
                    studio_info!("DownloadResult job_id={} url={}", job_id, url);
                    self.engine.download(job_id, url, file_stem);
                }
                Effect::SendChat { request, turns } => {
                    let turns = turns.iter().map(to_engine_turn).collect();
                    self.engine.send_chat(request, turns);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event that the core cares about.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        let event = self.engine.recv_timeout(timeout)?;
        Some(event_to_msg(event).unwrap_or(Msg::NoOp))
    }
}

fn to_engine_turn(turn: &CoreTurn) -> ChatTurn {
    ChatTurn::new(turn.role.as_str(), turn.content.clone())
}

pub(crate) fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::ChatCompleted { request, result } => Some(Msg::ChatReplied {
            request,
            result: result.map_err(|err| err.to_string()),
        }),
        EngineEvent::JobSubmitted { submission, result } => Some(Msg::JobSubmitted {
            submission,
            result: result.map_err(submit_failure),
        }),
        EngineEvent::PollDue { job_id } => Some(Msg::PollTick { job_id }),
        EngineEvent::StatusFetched {
            job_id,
            seq,
            result,
        } => {
            let outcome = match result {
                Ok(report) => StatusOutcome::Report(status_report(report)),
                Err(err) => {
                    studio_warn!("Status poll {} for job {} failed: {}", seq, job_id, err);
                    StatusOutcome::Transient(err.to_string())
                }
            };
            Some(Msg::StatusReceived {
                job_id,
                seq,
                outcome,
            })
        }
        EngineEvent::PreviewReady { preview_id, path } => {
            studio_debug!("Preview {} ready at {:?}", preview_id, path);
            Some(Msg::PreviewReady { preview_id, path })
        }
        EngineEvent::PreviewFailed {
            preview_id,
            message,
        } => {
            studio_warn!("Preview {} unavailable: {}", preview_id, message);
            None
        }
        EngineEvent::DownloadCompleted { job_id, result } => Some(Msg::DownloadFinished {
            job_id,
            result: result.map_err(|err| err.to_string()),
        }),
    }
}

fn submit_failure(err: ApiError) -> SubmitFailure {
    match err {
        ApiError::ValidationRejected { detail, .. } => SubmitFailure::Rejected(detail),
        other => SubmitFailure::Unavailable(other.to_string()),
    }
}

fn status_report(report: JobStatusReport) -> StatusReport {
    let status = match report.status {
        RemoteJobStatus::Pending | RemoteJobStatus::Uploading => RemoteStatus::Pending,
        RemoteJobStatus::Processing | RemoteJobStatus::Running => RemoteStatus::Processing,
        RemoteJobStatus::Done => RemoteStatus::Done {
            result_locator: report.video_url,
        },
        RemoteJobStatus::Error => RemoteStatus::Error {
            detail: report.error,
        },
        RemoteJobStatus::NotFound => RemoteStatus::NotFound {
            detail: report.message.or(report.error),
        },
    };
    StatusReport {
        status,
        elapsed_secs: report.elapsed_sec,
    }
}
