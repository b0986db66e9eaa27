use studio_core::{AppViewModel, ChatMessage, DownloadView, MessageId, Role};

/// Status block for the stylize workflow.
pub fn render_job(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(upload) = &view.upload {
        lines.push(format!(
            "File: {} ({} B, {})",
            upload.name,
            format_with_commas(upload.size),
            upload.mime
        ));
        if let Some(preview) = &upload.preview_path {
            lines.push(format!("Preview: {}", preview.display()));
        }
    }

    let job = &view.job;
    let mut status = format!("Status: {}", job.status.label());
    if let Some(job_id) = &job.job_id {
        status.push_str(&format!(" [job {job_id}]"));
    }
    if let Some(elapsed) = job.elapsed_secs {
        status.push_str(&format!(" after {elapsed}s"));
    }
    lines.push(status);

    if let Some(detail) = &job.error_detail {
        lines.push(format!("  error: {detail}"));
    }
    if let Some(url) = &job.result_url {
        lines.push(format!("  result: {url}"));
    }
    match &job.download {
        DownloadView::InProgress => lines.push("  downloading...".to_string()),
        DownloadView::Saved(path) => lines.push(format!("  saved to {}", path.display())),
        DownloadView::Failed(reason) => lines.push(format!("  download failed: {reason}")),
        DownloadView::Unavailable | DownloadView::Ready => {}
    }
    lines
}

/// Assistant turns newer than `after`; the user's own turns are already on screen.
pub fn render_chat(view: &AppViewModel, after: Option<MessageId>) -> Vec<String> {
    view.chat
        .messages
        .iter()
        .filter(|message| after.map_or(true, |last| message.id > last))
        .filter(|message| message.role == Role::Assistant)
        .map(format_message)
        .collect()
}

pub fn render_notice(view: &AppViewModel) -> Option<String> {
    view.notice.as_ref().map(|notice| {
        let prefix = if notice.is_error() { "error" } else { "note" };
        format!("{prefix}: {}", notice.text)
    })
}

fn format_message(message: &ChatMessage) -> String {
    format!("assistant> {}", message.text)
}

fn format_with_commas(value: u64) -> String {
    let mut out = String::new();
    for (i, ch) in value.to_string().chars().rev().enumerate() {
        if i != 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}
