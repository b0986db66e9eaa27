use std::sync::Arc;
use std::time::Duration;

use studio_logging::{studio_debug, studio_info};
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{EngineEvent, EventSink, JobId};

struct ActivePoll {
    job_id: JobId,
    cancel: CancellationToken,
}

/// Owns the session's single polling timer.
///
/// The timer only emits [`EngineEvent::PollDue`]; whoever receives it decides
/// whether a status request is still wanted. Starting a new task cancels the
/// previous one first, and dropping the scheduler cancels whatever is active.
pub struct PollScheduler {
    runtime: Handle,
    active: Option<ActivePoll>,
}

impl PollScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            active: None,
        }
    }

    pub fn active_job(&self) -> Option<&str> {
        self.active.as_ref().map(|poll| poll.job_id.as_str())
    }

    /// Starts ticking every `interval` for `job_id`; the first tick comes one
    /// interval after the call.
    pub fn start(&mut self, job_id: JobId, interval: Duration, sink: Arc<dyn EventSink>) {
        self.stop_active();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let target = job_id.clone();
        let period = interval.max(Duration::from_millis(1));
        studio_info!("Polling job {} every {:?}", job_id, period);

        self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        sink.emit(EngineEvent::PollDue { job_id: target.clone() });
                    }
                }
            }
            studio_debug!("Polling task for job {} stopped", target);
        });

        self.active = Some(ActivePoll { job_id, cancel });
    }

    /// Stops polling if `job_id` is the active target. Returns whether a task was stopped.
    pub fn stop(&mut self, job_id: &str) -> bool {
        if self.active_job() != Some(job_id) {
            return false;
        }
        self.stop_active()
    }

    pub fn stop_active(&mut self) -> bool {
        match self.active.take() {
            Some(poll) => {
                poll.cancel.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop_active();
    }
}
