use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use studio_engine::{
    ApiClient, ApiError, ChatTurn, DownloadError, EngineConfig, EngineEvent, EngineHandle, JobId,
    JobStatusReport, RemoteJobStatus, VideoUpload,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct FakeApi {
    chats: Mutex<Vec<Vec<ChatTurn>>>,
}

#[async_trait]
impl ApiClient for FakeApi {
    async fn complete_chat(&self, turns: &[ChatTurn]) -> Result<String, ApiError> {
        self.chats.lock().unwrap().push(turns.to_vec());
        Ok(format!("echo: {}", turns.last().map(|t| t.content.as_str()).unwrap_or("")))
    }

    async fn submit_video_job(&self, upload: &VideoUpload, prompt: &str) -> Result<JobId, ApiError> {
        if prompt.is_empty() {
            return Err(ApiError::ValidationRejected {
                status: 422,
                detail: "prompt required".to_string(),
            });
        }
        Ok(format!("job-{}", upload.file_name))
    }

    async fn fetch_job_status(&self, _job_id: &str) -> Result<JobStatusReport, ApiError> {
        Ok(JobStatusReport {
            status: RemoteJobStatus::Processing,
            video_url: None,
            error: None,
            message: None,
            elapsed_sec: Some(3),
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        if url.contains("missing") {
            return Err(ApiError::ValidationRejected {
                status: 404,
                detail: "gone".to_string(),
            });
        }
        Ok(b"rendered".to_vec())
    }
}

fn engine(output: &TempDir, previews: &TempDir) -> (EngineHandle, Arc<FakeApi>) {
    let api = Arc::new(FakeApi::default());
    let config = EngineConfig {
        preview_dir: Some(previews.path().to_path_buf()),
        ..EngineConfig::default_with_output(output.path().to_path_buf())
    };
    (EngineHandle::with_client(config, api.clone()), api)
}

fn next_event(engine: &EngineHandle) -> EngineEvent {
    engine.recv_timeout(WAIT).expect("engine event")
}

#[test]
fn chat_and_submission_complete_with_their_ids() {
    let output = TempDir::new().unwrap();
    let previews = TempDir::new().unwrap();
    let (engine, api) = engine(&output, &previews);

    engine.send_chat(7, vec![ChatTurn::new("user", "hello")]);
    assert_eq!(
        next_event(&engine),
        EngineEvent::ChatCompleted {
            request: 7,
            result: Ok("echo: hello".to_string())
        }
    );
    assert_eq!(api.chats.lock().unwrap().len(), 1);

    let upload = VideoUpload {
        path: output.path().join("unused.mp4"),
        file_name: "cat.mp4".to_string(),
        mime: "video/mp4".to_string(),
    };
    engine.submit_job(2, upload, "");
    match next_event(&engine) {
        EngineEvent::JobSubmitted { submission, result } => {
            assert_eq!(submission, 2);
            assert!(matches!(result, Err(ApiError::ValidationRejected { status: 422, .. })));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn polling_emits_due_events_and_status_fetches_echo_seq() {
    let output = TempDir::new().unwrap();
    let previews = TempDir::new().unwrap();
    let (engine, _api) = engine(&output, &previews);

    engine.start_polling("j-1", Duration::from_millis(10));
    assert_eq!(
        next_event(&engine),
        EngineEvent::PollDue {
            job_id: "j-1".to_string()
        }
    );
    engine.stop_polling("j-1");

    engine.fetch_status("j-1", 4);
    // Ticks queued before the stop may still be in the channel.
    let fetched = std::iter::from_fn(|| engine.recv_timeout(WAIT))
        .find(|event| matches!(event, EngineEvent::StatusFetched { .. }))
        .expect("status event");
    match fetched {
        EngineEvent::StatusFetched { job_id, seq, result } => {
            assert_eq!(job_id, "j-1");
            assert_eq!(seq, 4);
            assert_eq!(result.unwrap().status, RemoteJobStatus::Processing);
        }
        _ => unreachable!(),
    }
}

#[test]
fn previews_are_revoked_on_shutdown() {
    let output = TempDir::new().unwrap();
    let previews = TempDir::new().unwrap();
    let source = output.path().join("clip.mp4");
    std::fs::write(&source, b"frames").unwrap();

    let (engine, _api) = engine(&output, &previews);
    engine.create_preview(1, source.clone());
    let first = match next_event(&engine) {
        EngineEvent::PreviewReady { preview_id: 1, path } => path,
        other => panic!("unexpected event {other:?}"),
    };
    engine.create_preview(2, source);
    let second = match next_event(&engine) {
        EngineEvent::PreviewReady { preview_id: 2, path } => path,
        other => panic!("unexpected event {other:?}"),
    };

    engine.revoke_preview(1);
    engine.create_preview(3, output.path().join("missing.mp4"));
    assert!(matches!(
        next_event(&engine),
        EngineEvent::PreviewFailed { preview_id: 3, .. }
    ));
    assert!(!first.exists());
    assert!(second.exists());

    drop(engine);
    assert!(!second.exists());
}

#[test]
fn download_writes_result_into_output_dir() {
    let output = TempDir::new().unwrap();
    let previews = TempDir::new().unwrap();
    let (engine, _api) = engine(&output, &previews);

    engine.download("j-1", "http://localhost:8000/files/j-1.webm", "cat");
    let saved = match next_event(&engine) {
        EngineEvent::DownloadCompleted { job_id, result } => {
            assert_eq!(job_id, "j-1");
            result.expect("saved")
        }
        other => panic!("unexpected event {other:?}"),
    };
    assert!(saved.starts_with(output.path()));
    let name = saved.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("cat--") && name.ends_with(".webm"), "{name}");
    assert_eq!(std::fs::read(&saved).unwrap(), b"rendered");

    engine.download("j-2", "http://localhost:8000/files/missing.mp4", "cat");
    match next_event(&engine) {
        EngineEvent::DownloadCompleted { result, .. } => {
            assert!(matches!(result, Err(DownloadError::Api(_))));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn preview_revoked_right_after_creation_leaves_no_file() {
    let output = TempDir::new().unwrap();
    let previews = TempDir::new().unwrap();
    let source = output.path().join("clip.mp4");
    std::fs::write(&source, vec![7u8; 256 * 1024]).unwrap();

    let (engine, _api) = engine(&output, &previews);
    engine.create_preview(1, source);
    engine.revoke_preview(1);
    match next_event(&engine) {
        EngineEvent::PreviewReady { preview_id: 1, .. }
        | EngineEvent::PreviewFailed { preview_id: 1, .. } => {}
        other => panic!("unexpected event {other:?}"),
    }

    // Handled after the revoke, so its event orders the check behind it.
    engine.create_preview(2, output.path().join("missing.mp4"));
    assert!(matches!(
        next_event(&engine),
        EngineEvent::PreviewFailed { preview_id: 2, .. }
    ));
    assert_eq!(std::fs::read_dir(previews.path()).unwrap().count(), 0);
}
