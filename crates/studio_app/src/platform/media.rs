use std::fs;
use std::path::Path;

use anyhow::{ensure, Context};
use studio_core::SelectedFile;

/// Guess a Content-Type from a file extension.
pub(crate) fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "ogv" => "video/ogg",
        "mpeg" | "mpg" => "video/mpeg",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Describes a local file the way a file picker would.
pub(crate) fn inspect(path: &Path) -> anyhow::Result<SelectedFile> {
    let meta = fs::metadata(path).with_context(|| format!("reading {}", path.display()))?;
    ensure!(meta.is_file(), "{} is not a file", path.display());
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SelectedFile {
        path: path.to_path_buf(),
        name,
        size: meta.len(),
        mime: content_type_for_path(path).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{content_type_for_path, inspect};
    use std::path::Path;

    #[test]
    fn video_extensions_map_to_video_types() {
        assert_eq!(content_type_for_path(Path::new("a/clip.MP4")), "video/mp4");
        assert_eq!(content_type_for_path(Path::new("clip.mov")), "video/quicktime");
        assert_eq!(content_type_for_path(Path::new("notes.txt")), "text/plain");
        assert_eq!(content_type_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn inspect_reads_size_and_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cat.webm");
        std::fs::write(&path, b"12345").unwrap();

        let file = inspect(&path).unwrap();
        assert_eq!(file.name, "cat.webm");
        assert_eq!(file.size, 5);
        assert_eq!(file.mime, "video/webm");
        assert!(file.is_video());

        assert!(inspect(dir.path()).is_err());
    }
}
