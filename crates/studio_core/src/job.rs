use std::path::PathBuf;

/// Opaque job identifier assigned by the backend.
pub type JobId = String;
pub type SubmissionId = u64;

const MISSING_LOCATOR_DETAIL: &str = "job finished without a result locator";
const UNKNOWN_ERROR_DETAIL: &str = "unknown error";
const NOT_FOUND_DETAIL: &str = "job not found";

/// Lifecycle of the current video job. Each variant carries exactly the data
/// that is valid in that phase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Submitting {
        submission: SubmissionId,
    },
    Pending {
        job_id: JobId,
    },
    Processing {
        job_id: JobId,
    },
    Done {
        job_id: JobId,
        result_locator: String,
    },
    Failed {
        job_id: JobId,
        detail: String,
    },
}

impl JobPhase {
    pub fn job_id(&self) -> Option<&str> {
        match self {
            JobPhase::Idle | JobPhase::Submitting { .. } => None,
            JobPhase::Pending { job_id }
            | JobPhase::Processing { job_id }
            | JobPhase::Done { job_id, .. }
            | JobPhase::Failed { job_id, .. } => Some(job_id),
        }
    }

    /// A submission or server-side job is still running.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            JobPhase::Submitting { .. } | JobPhase::Pending { .. } | JobPhase::Processing { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Done { .. } | JobPhase::Failed { .. })
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobPhase::Idle => JobStatus::Idle,
            JobPhase::Submitting { .. } => JobStatus::Submitting,
            JobPhase::Pending { .. } => JobStatus::Pending,
            JobPhase::Processing { .. } => JobStatus::Processing,
            JobPhase::Done { .. } => JobStatus::Done,
            JobPhase::Failed { .. } => JobStatus::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Submitting,
    Pending,
    Processing,
    Done,
    Error,
}

impl JobStatus {
    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Submitting => "uploading",
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }
}

/// Status as reported by the backend, already decoded by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Pending,
    Processing,
    Done { result_locator: Option<String> },
    Error { detail: Option<String> },
    NotFound { detail: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: RemoteStatus,
    pub elapsed_secs: Option<u64>,
}

impl StatusReport {
    pub fn new(status: RemoteStatus) -> Self {
        Self {
            status,
            elapsed_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Report(StatusReport),
    /// The poll failed; the next tick tries again.
    Transient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailure {
    Unavailable(String),
    Rejected(String),
}

/// The single polling task of a session.
///
/// Sequence numbers continue across tasks, so a late response from an earlier
/// task never passes the guard of a later one, even for a reused job id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingTask {
    pub target_job_id: JobId,
    issued: u64,
    applied: u64,
}

impl PollingTask {
    fn new(target_job_id: JobId, floor: u64) -> Self {
        Self {
            target_job_id,
            issued: floor,
            applied: floor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum DownloadState {
    #[default]
    Idle,
    InProgress,
    Saved(PathBuf),
    Failed(String),
}

/// Outcome of feeding a poll response into the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StatusApplied {
    /// Response belongs to a superseded job, a stopped task, or an older poll.
    Stale,
    Unchanged,
    Advanced,
    /// The job reached a terminal phase; polling for it has been dropped.
    Terminal(JobId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JobState {
    phase: JobPhase,
    polling: Option<PollingTask>,
    next_submission: SubmissionId,
    last_seq: u64,
    elapsed_secs: Option<u64>,
    download: DownloadState,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            phase: JobPhase::Idle,
            polling: None,
            next_submission: 1,
            last_seq: 0,
            elapsed_secs: None,
            download: DownloadState::Idle,
        }
    }
}

impl JobState {
    pub(crate) fn phase(&self) -> &JobPhase {
        &self.phase
    }

    pub(crate) fn polling(&self) -> Option<&PollingTask> {
        self.polling.as_ref()
    }

    pub(crate) fn elapsed_secs(&self) -> Option<u64> {
        self.elapsed_secs
    }

    pub(crate) fn download(&self) -> &DownloadState {
        &self.download
    }

    pub(crate) fn begin_submission(&mut self) -> SubmissionId {
        let submission = self.next_submission;
        self.next_submission += 1;
        self.phase = JobPhase::Submitting { submission };
        self.elapsed_secs = None;
        self.download = DownloadState::Idle;
        submission
    }

    fn is_awaiting(&self, submission: SubmissionId) -> bool {
        self.phase == JobPhase::Submitting { submission }
    }

    /// Moves to `Pending` and arms polling. Returns false for superseded submissions.
    pub(crate) fn accept_submission(&mut self, submission: SubmissionId, job_id: &str) -> bool {
        if !self.is_awaiting(submission) {
            return false;
        }
        self.phase = JobPhase::Pending {
            job_id: job_id.to_string(),
        };
        self.polling = Some(PollingTask::new(job_id.to_string(), self.last_seq));
        true
    }

    pub(crate) fn reject_submission(&mut self, submission: SubmissionId) -> bool {
        if !self.is_awaiting(submission) {
            return false;
        }
        self.phase = JobPhase::Idle;
        true
    }

    /// Drops the current job. Returns the job whose polling must be stopped.
    pub(crate) fn discard(&mut self) -> Option<JobId> {
        let stopped = self.stop_polling();
        self.phase = JobPhase::Idle;
        self.elapsed_secs = None;
        self.download = DownloadState::Idle;
        stopped
    }

    pub(crate) fn stop_polling(&mut self) -> Option<JobId> {
        self.polling.take().map(|task| task.target_job_id)
    }

    fn is_polling(&self, job_id: &str) -> bool {
        let targets_job = self
            .polling
            .as_ref()
            .is_some_and(|task| task.target_job_id == job_id);
        targets_job && !self.phase.is_terminal() && self.phase.job_id() == Some(job_id)
    }

    /// Issues the next poll sequence number for `job_id`, if it is still polled.
    pub(crate) fn issue_poll(&mut self, job_id: &str) -> Option<u64> {
        if !self.is_polling(job_id) {
            return None;
        }
        let task = self.polling.as_mut()?;
        task.issued += 1;
        self.last_seq = task.issued;
        Some(task.issued)
    }

    pub(crate) fn apply_status(&mut self, job_id: &str, seq: u64, report: StatusReport) -> StatusApplied {
        if !self.is_polling(job_id) {
            return StatusApplied::Stale;
        }
        let Some(task) = self.polling.as_mut() else {
            return StatusApplied::Stale;
        };
        if seq <= task.applied {
            return StatusApplied::Stale;
        }
        task.applied = seq;

        let elapsed_changed = report.elapsed_secs.is_some() && report.elapsed_secs != self.elapsed_secs;
        if report.elapsed_secs.is_some() {
            self.elapsed_secs = report.elapsed_secs;
        }

        let job_id = job_id.to_string();
        let next = match report.status {
            RemoteStatus::Pending => None,
            RemoteStatus::Processing => match self.phase {
                JobPhase::Pending { .. } => Some(JobPhase::Processing { job_id }),
                _ => None,
            },
            RemoteStatus::Done {
                result_locator: Some(result_locator),
            } => Some(JobPhase::Done {
                job_id,
                result_locator,
            }),
            RemoteStatus::Done {
                result_locator: None,
            } => Some(JobPhase::Failed {
                job_id,
                detail: MISSING_LOCATOR_DETAIL.to_string(),
            }),
            RemoteStatus::Error { detail } => Some(JobPhase::Failed {
                job_id,
                detail: detail.unwrap_or_else(|| UNKNOWN_ERROR_DETAIL.to_string()),
            }),
            RemoteStatus::NotFound { detail } => Some(JobPhase::Failed {
                job_id,
                detail: detail.unwrap_or_else(|| NOT_FOUND_DETAIL.to_string()),
            }),
        };

        match next {
            Some(phase) => {
                self.phase = phase;
                if self.phase.is_terminal() {
                    match self.stop_polling() {
                        Some(stopped) => StatusApplied::Terminal(stopped),
                        None => StatusApplied::Advanced,
                    }
                } else {
                    StatusApplied::Advanced
                }
            }
            None if elapsed_changed => StatusApplied::Advanced,
            None => StatusApplied::Unchanged,
        }
    }

    /// Marks the download as started and returns the locator to fetch.
    pub(crate) fn begin_download(&mut self) -> Option<(JobId, String)> {
        if self.download == DownloadState::InProgress {
            return None;
        }
        let JobPhase::Done {
            job_id,
            result_locator,
        } = &self.phase
        else {
            return None;
        };
        let target = (job_id.clone(), result_locator.clone());
        self.download = DownloadState::InProgress;
        Some(target)
    }

    pub(crate) fn finish_download(&mut self, job_id: &str, result: Result<PathBuf, String>) -> bool {
        if self.download != DownloadState::InProgress || self.phase.job_id() != Some(job_id) {
            return false;
        }
        self.download = match result {
            Ok(path) => DownloadState::Saved(path),
            Err(reason) => DownloadState::Failed(reason),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(job_id: &str) -> JobState {
        let mut job = JobState::default();
        let submission = job.begin_submission();
        assert!(job.accept_submission(submission, job_id));
        job
    }

    #[test]
    fn processing_never_moves_back_to_pending() {
        let mut job = pending("a");
        let seq = job.issue_poll("a").unwrap();
        job.apply_status("a", seq, StatusReport::new(RemoteStatus::Processing));
        let seq = job.issue_poll("a").unwrap();
        let applied = job.apply_status("a", seq, StatusReport::new(RemoteStatus::Pending));

        assert_eq!(applied, StatusApplied::Unchanged);
        assert_eq!(job.phase().status(), JobStatus::Processing);
    }

    #[test]
    fn older_sequence_is_stale_after_newer_applied() {
        let mut job = pending("a");
        let first = job.issue_poll("a").unwrap();
        let second = job.issue_poll("a").unwrap();

        job.apply_status("a", second, StatusReport::new(RemoteStatus::Processing));
        let applied = job.apply_status("a", first, StatusReport::new(RemoteStatus::Pending));
        assert_eq!(applied, StatusApplied::Stale);
    }

    #[test]
    fn done_without_locator_is_a_failure() {
        let mut job = pending("a");
        let seq = job.issue_poll("a").unwrap();
        let applied = job.apply_status(
            "a",
            seq,
            StatusReport::new(RemoteStatus::Done {
                result_locator: None,
            }),
        );
        assert_eq!(applied, StatusApplied::Terminal("a".to_string()));
        assert_eq!(
            job.phase(),
            &JobPhase::Failed {
                job_id: "a".to_string(),
                detail: MISSING_LOCATOR_DETAIL.to_string(),
            }
        );
        assert!(job.polling().is_none());
    }

    #[test]
    fn reused_job_id_rejects_responses_from_the_earlier_task() {
        let mut job = pending("a");
        let old_seq = job.issue_poll("a").unwrap();

        job.discard();
        let submission = job.begin_submission();
        assert!(job.accept_submission(submission, "a"));
        let new_seq = job.issue_poll("a").unwrap();
        assert!(new_seq > old_seq);

        let late = job.apply_status("a", old_seq, StatusReport::new(RemoteStatus::Processing));
        assert_eq!(late, StatusApplied::Stale);
        assert_eq!(job.phase().status(), JobStatus::Pending);

        let fresh = job.apply_status("a", new_seq, StatusReport::new(RemoteStatus::Processing));
        assert_eq!(fresh, StatusApplied::Advanced);
    }

    #[test]
    fn elapsed_time_alone_counts_as_change() {
        let mut job = pending("a");
        let seq = job.issue_poll("a").unwrap();
        let applied = job.apply_status(
            "a",
            seq,
            StatusReport {
                status: RemoteStatus::Pending,
                elapsed_secs: Some(12),
            },
        );
        assert_eq!(applied, StatusApplied::Advanced);
        assert_eq!(job.elapsed_secs(), Some(12));
    }
}
