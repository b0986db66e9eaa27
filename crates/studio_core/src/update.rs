use studio_logging::{studio_debug, studio_info};

use crate::job::StatusApplied;
use crate::{AppState, Effect, Msg, Notice, NoticeKind, StatusOutcome, SubmitFailure};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    if state.closed {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::FileSelected(file) => {
            if !file.is_video() {
                state.notice = Some(Notice::new(
                    NoticeKind::InvalidMediaType,
                    format!("Please select a video file ({} is {}).", file.name, file.mime),
                ));
                state.mark_dirty();
                return (state, Vec::new());
            }

            let mut effects = Vec::with_capacity(3);
            if let Some(job_id) = state.job.discard() {
                effects.push(Effect::StopPolling { job_id });
            }
            let source = file.path.clone();
            let (preview_id, replaced) = state.upload.replace(file);
            if let Some(preview_id) = replaced {
                effects.push(Effect::RevokePreview { preview_id });
            }
            effects.push(Effect::CreatePreview { preview_id, source });
            state.notice = None;
            state.mark_dirty();
            effects
        }
        Msg::PreviewReady { preview_id, path } => {
            if !state.upload.preview_ready(preview_id, path) {
                studio_debug!("Ignoring preview {} of a replaced upload", preview_id);
                return (state, Vec::new());
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::UploadCleared => {
            let stopped = state.job.discard();
            let revoked = state.upload.dispose();
            if stopped.is_none() && revoked.is_none() {
                return (state, Vec::new());
            }
            state.mark_dirty();
            release(stopped, revoked)
        }
        Msg::PromptChanged(prompt) => {
            state.upload.set_prompt(prompt);
            state.mark_dirty();
            Vec::new()
        }
        Msg::SubmitClicked => {
            let prompt = state.upload.prompt().trim().to_string();
            let file = state
                .upload
                .current()
                .filter(|_| !prompt.is_empty() && !state.job.phase().is_in_flight())
                .map(|upload| upload.file.clone());
            let Some(file) = file else {
                return (state, Vec::new());
            };

            let mut effects = Vec::with_capacity(2);
            if let Some(job_id) = state.job.stop_polling() {
                effects.push(Effect::StopPolling { job_id });
            }
            let submission = state.job.begin_submission();
            studio_info!("Submitting {} as submission {}", file.name, submission);
            effects.push(Effect::SubmitJob {
                submission,
                file,
                prompt,
            });
            state.notice = None;
            state.mark_dirty();
            effects
        }
        Msg::JobSubmitted { submission, result } => match result {
            Ok(job_id) => {
                if !state.job.accept_submission(submission, &job_id) {
                    studio_debug!("Dropping job {} from superseded submission {}", job_id, submission);
                    return (state, Vec::new());
                }
                state.mark_dirty();
                vec![Effect::StartPolling {
                    job_id,
                    interval: state.settings.poll_interval,
                }]
            }
            Err(failure) => {
                if !state.job.reject_submission(submission) {
                    return (state, Vec::new());
                }
                state.notice = Some(match failure {
                    SubmitFailure::Unavailable(detail) => Notice::new(
                        NoticeKind::RemoteUnavailable,
                        format!("Could not submit the video: {detail}"),
                    ),
                    SubmitFailure::Rejected(detail) => {
                        Notice::new(NoticeKind::ValidationRejected, detail)
                    }
                });
                state.mark_dirty();
                Vec::new()
            }
        },
        Msg::PollTick { job_id } => match state.job.issue_poll(&job_id) {
            Some(seq) => vec![Effect::FetchStatus { job_id, seq }],
            // Timer outlived its job; make sure it stops.
            None => vec![Effect::StopPolling { job_id }],
        },
        Msg::StatusReceived {
            job_id,
            seq,
            outcome,
        } => match outcome {
            StatusOutcome::Report(report) => match state.job.apply_status(&job_id, seq, report) {
                StatusApplied::Stale => {
                    studio_debug!("Discarding stale status for job {} (poll {})", job_id, seq);
                    Vec::new()
                }
                StatusApplied::Unchanged => Vec::new(),
                StatusApplied::Advanced => {
                    state.mark_dirty();
                    Vec::new()
                }
                StatusApplied::Terminal(job_id) => {
                    studio_info!(
                        "Job {} finished as {}",
                        job_id,
                        state.job.phase().status().label()
                    );
                    state.mark_dirty();
                    vec![Effect::StopPolling { job_id }]
                }
            },
            StatusOutcome::Transient(reason) => {
                studio_debug!("Poll {} for job {} failed: {}", seq, job_id, reason);
                Vec::new()
            }
        },
        Msg::DownloadClicked => {
            let file_stem = state
                .upload
                .current()
                .map(|upload| upload.file.stem())
                .unwrap_or_else(|| "result".to_string());
            match state.job.begin_download() {
                Some((job_id, locator)) => {
                    state.mark_dirty();
                    vec![Effect::DownloadResult {
                        job_id,
                        url: crate::resolve_locator(&state.settings.api_base, &locator),
                        file_stem,
                    }]
                }
                None => Vec::new(),
            }
        }
        Msg::DownloadFinished { job_id, result } => {
            let notice = match &result {
                Ok(path) => Notice::new(
                    NoticeKind::DownloadSaved,
                    format!("Saved result to {}", path.display()),
                ),
                Err(reason) => Notice::new(
                    NoticeKind::DownloadFailed,
                    format!("Could not save the result: {reason}"),
                ),
            };
            if state.job.finish_download(&job_id, result) {
                state.notice = Some(notice);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ChatInputChanged(text) => {
            state.chat.set_draft(text);
            state.mark_dirty();
            Vec::new()
        }
        Msg::SendClicked => match state.chat.begin_send(state.settings.chat_history) {
            Some((request, turns)) => {
                state.mark_dirty();
                vec![Effect::SendChat { request, turns }]
            }
            None => Vec::new(),
        },
        Msg::ChatReplied { request, result } => {
            if state.chat.settle(request, result) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ChatCleared => {
            state.chat.reset();
            state.mark_dirty();
            Vec::new()
        }
        Msg::NoticeDismissed => {
            if state.notice.take().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Shutdown => {
            state.closed = true;
            state.mark_dirty();
            release(state.job.stop_polling(), state.upload.dispose())
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn release(stopped: Option<crate::JobId>, revoked: Option<crate::PreviewId>) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if let Some(job_id) = stopped {
        effects.push(Effect::StopPolling { job_id });
    }
    if let Some(preview_id) = revoked {
        effects.push(Effect::RevokePreview { preview_id });
    }
    effects
}
