use std::path::{Path, PathBuf};

pub type PreviewId = u64;

/// A local file picked by the user, before any upload happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime: String,
}

impl SelectedFile {
    pub fn is_video(&self) -> bool {
        self.mime.trim().to_ascii_lowercase().starts_with("video/")
    }

    /// File name without its extension, used to name downloaded results.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or("result")
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub file: SelectedFile,
    pub preview: PreviewId,
    /// Playable copy of the file, once the engine has made one.
    pub preview_path: Option<PathBuf>,
}

/// Owns the selected file and the id of its preview resource. Every id handed
/// out by `replace` is returned exactly once, by a later `replace` or `dispose`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UploadState {
    current: Option<PendingUpload>,
    prompt: String,
    next_preview: PreviewId,
}

impl Default for UploadState {
    fn default() -> Self {
        Self {
            current: None,
            prompt: String::new(),
            next_preview: 1,
        }
    }
}

impl UploadState {
    pub(crate) fn current(&self) -> Option<&PendingUpload> {
        self.current.as_ref()
    }

    pub(crate) fn prompt(&self) -> &str {
        &self.prompt
    }

    pub(crate) fn set_prompt(&mut self, prompt: String) {
        self.prompt = prompt;
    }

    /// Installs `file` with a fresh preview id; returns `(new, replaced)`.
    pub(crate) fn replace(&mut self, file: SelectedFile) -> (PreviewId, Option<PreviewId>) {
        let preview = self.next_preview;
        self.next_preview += 1;
        let replaced = self
            .current
            .replace(PendingUpload {
                file,
                preview,
                preview_path: None,
            })
            .map(|old| old.preview);
        (preview, replaced)
    }

    /// Records where the preview for `preview` can be played. Returns false
    /// when that preview no longer belongs to the held upload.
    pub(crate) fn preview_ready(&mut self, preview: PreviewId, path: PathBuf) -> bool {
        match self.current.as_mut() {
            Some(upload) if upload.preview == preview => {
                upload.preview_path = Some(path);
                true
            }
            _ => false,
        }
    }

    /// Releases the held upload. Idempotent.
    pub(crate) fn dispose(&mut self) -> Option<PreviewId> {
        self.current.take().map(|upload| upload.preview)
    }
}
