use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::bail;
use studio_core::{update, AppState, AppViewModel, DownloadView, JobStatus, MessageId, Msg};
use studio_logging::{studio_debug, studio_info};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::media;
use super::ui::render::{render_chat, render_job, render_notice};

const EVENT_WAIT: Duration = Duration::from_millis(50);

/// Owns the core state and the engine for one command invocation.
struct Session {
    state: AppState,
    runner: EffectRunner,
}

impl Session {
    fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            state: AppState::with_settings(config.core_settings()),
            runner: EffectRunner::new(config.engine_config())?,
        })
    }

    /// Folds `msg` into the state and hands the effects to the engine.
    /// Returns whether the view changed.
    fn dispatch(&mut self, msg: Msg) -> bool {
        studio_debug!("dispatch {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.enqueue(effects);
        let dirty = state.consume_dirty();
        self.state = state;
        dirty
    }

    fn pump(&mut self) -> bool {
        match self.runner.next_msg(EVENT_WAIT) {
            Some(msg) => self.dispatch(msg),
            None => false,
        }
    }

    fn view(&self) -> AppViewModel {
        self.state.view()
    }

    fn close(mut self) {
        self.dispatch(Msg::Shutdown);
        // Dropping the runner joins the engine, which revokes what is left.
    }
}

/// Where the stylize run stands after the latest message.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StylizeProgress {
    Running,
    StartDownload,
    Finished,
    Failed(String),
}

fn stylize_progress(view: &AppViewModel, want_download: bool) -> StylizeProgress {
    match view.job.status {
        JobStatus::Error => StylizeProgress::Failed(
            view.job
                .error_detail
                .clone()
                .unwrap_or_else(|| "job failed".to_string()),
        ),
        JobStatus::Idle => match view.notice.as_ref().filter(|notice| notice.is_error()) {
            Some(notice) => StylizeProgress::Failed(notice.text.clone()),
            None => StylizeProgress::Running,
        },
        JobStatus::Done if !want_download => StylizeProgress::Finished,
        JobStatus::Done => match &view.job.download {
            DownloadView::Ready => StylizeProgress::StartDownload,
            DownloadView::Saved(_) => StylizeProgress::Finished,
            DownloadView::Failed(reason) => StylizeProgress::Failed(reason.clone()),
            DownloadView::InProgress | DownloadView::Unavailable => StylizeProgress::Running,
        },
        JobStatus::Submitting | JobStatus::Pending | JobStatus::Processing => {
            StylizeProgress::Running
        }
    }
}

pub fn run_stylize(
    config: &AppConfig,
    file: &Path,
    prompt: &str,
    download: bool,
) -> anyhow::Result<()> {
    let selected = media::inspect(file)?;
    let mut session = Session::new(config)?;

    session.dispatch(Msg::FileSelected(selected));
    if let Some(notice) = render_notice(&session.view()) {
        session.close();
        bail!("{notice}");
    }
    session.dispatch(Msg::PromptChanged(prompt.to_string()));
    session.dispatch(Msg::SubmitClicked);
    if session.view().job.status == JobStatus::Idle {
        session.close();
        bail!("nothing was submitted; the prompt must not be empty");
    }

    let mut printed = Vec::new();
    let outcome = loop {
        let view = session.view();
        let lines = render_job(&view);
        if lines != printed {
            for line in &lines {
                println!("{line}");
            }
            printed = lines;
        }

        match stylize_progress(&view, download) {
            StylizeProgress::Running => {
                session.pump();
            }
            StylizeProgress::StartDownload => {
                session.dispatch(Msg::DownloadClicked);
            }
            StylizeProgress::Finished => break Ok(()),
            StylizeProgress::Failed(reason) => break Err(reason),
        }
    };

    session.close();
    match outcome {
        Ok(()) => {
            studio_info!("Stylize run finished");
            Ok(())
        }
        Err(reason) => bail!("stylization failed: {reason}"),
    }
}

pub fn run_chat(config: &AppConfig) -> anyhow::Result<()> {
    let mut session = Session::new(config)?;
    let lines = spawn_stdin_reader();

    let mut last_shown = print_chat(&session.view(), None);
    prompt_marker()?;

    loop {
        if session.pump() {
            last_shown = print_chat(&session.view(), last_shown);
        }

        match lines.try_recv() {
            Ok(line) => {
                let line = line.trim();
                match line {
                    "" => {}
                    "/quit" => break,
                    "/clear" => {
                        session.dispatch(Msg::ChatCleared);
                    }
                    text => {
                        if awaiting_reply(&session.view()) {
                            println!("(still waiting for the previous reply)");
                        }
                        session.dispatch(Msg::ChatInputChanged(text.to_string()));
                        session.dispatch(Msg::SendClicked);
                    }
                }
                last_shown = print_chat(&session.view(), last_shown);
                prompt_marker()?;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                // Input closed; leave once the outstanding reply is in.
                if !session.view().chat.sending {
                    break;
                }
            }
        }
    }

    session.close();
    Ok(())
}

/// Whether a new line has to wait for an outstanding chat reply.
fn awaiting_reply(view: &AppViewModel) -> bool {
    view.chat.sending
}

fn print_chat(view: &AppViewModel, after: Option<MessageId>) -> Option<MessageId> {
    for line in render_chat(view, after) {
        println!("{line}");
    }
    view.chat.messages.last().map(|message| message.id).or(after)
}

fn prompt_marker() -> io::Result<()> {
    print!("you> ");
    io::stdout().flush()
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
