use std::sync::{Arc, Mutex};
use std::time::Duration;

use studio_engine::{EngineEvent, EventSink, PollScheduler};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn due_for(&self, job_id: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, EngineEvent::PollDue { job_id: id } if id == job_id))
            .count()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn ticks_after_each_interval_until_stopped() {
    let sink = Arc::new(TestSink::default());
    let mut scheduler = PollScheduler::new(tokio::runtime::Handle::current());

    scheduler.start("j-1".to_string(), Duration::from_millis(20), sink.clone());
    assert_eq!(sink.due_for("j-1"), 0, "first tick waits one interval");
    tokio::time::sleep(Duration::from_millis(110)).await;
    let ticks = sink.due_for("j-1");
    assert!(ticks >= 2, "expected several ticks, got {ticks}");

    assert!(scheduler.stop("j-1"));
    assert_eq!(scheduler.active_job(), None);
    tokio::time::sleep(Duration::from_millis(30)).await;
    let after_stop = sink.due_for("j-1");
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(sink.due_for("j-1"), after_stop);
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_ignores_other_job_ids() {
    let sink = Arc::new(TestSink::default());
    let mut scheduler = PollScheduler::new(tokio::runtime::Handle::current());

    scheduler.start("j-1".to_string(), Duration::from_secs(5), sink);
    assert!(!scheduler.stop("j-2"));
    assert_eq!(scheduler.active_job(), Some("j-1"));
    assert!(scheduler.stop_active());
    assert!(!scheduler.stop_active());
}

#[tokio::test(flavor = "multi_thread")]
async fn restarting_cancels_previous_task() {
    let sink = Arc::new(TestSink::default());
    let mut scheduler = PollScheduler::new(tokio::runtime::Handle::current());

    scheduler.start("old".to_string(), Duration::from_millis(20), sink.clone());
    scheduler.start("new".to_string(), Duration::from_millis(20), sink.clone());
    assert_eq!(scheduler.active_job(), Some("new"));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sink.due_for("old"), 0);
    assert!(sink.due_for("new") >= 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn dropping_scheduler_stops_ticks() {
    let sink = Arc::new(TestSink::default());
    {
        let mut scheduler = PollScheduler::new(tokio::runtime::Handle::current());
        scheduler.start("j-1".to_string(), Duration::from_millis(20), sink.clone());
    }
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(sink.due_for("j-1"), 0);
}
