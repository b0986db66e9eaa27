use sha2::{Digest, Sha256};

const DEFAULT_EXTENSION: &str = "mp4";

/// Portable, deterministic name for a downloaded result:
/// `{sanitized_stem}--{short_hash(locator)}.{ext}`.
///
/// The extension comes from the locator's last path segment when it looks
/// like one, otherwise `mp4`.
pub fn result_filename(stem: &str, locator: &str) -> String {
    let sanitized = sanitize_stem(stem);
    let hash = short_hash(locator);
    let ext = locator_extension(locator).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!("{sanitized}--{hash}.{ext}")
}

fn sanitize_stem(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let mut final_name: String = compacted.chars().take(80).collect();
    if final_name.is_empty() {
        final_name = "result".to_string();
    }
    if is_reserved_windows_name(&final_name) {
        final_name.push('_');
    }
    final_name
}

fn locator_extension(locator: &str) -> Option<String> {
    let path = locator.split(['?', '#']).next().unwrap_or(locator);
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    let valid = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| ext.to_ascii_lowercase())
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::{locator_extension, result_filename, sanitize_stem};

    #[test]
    fn name_is_deterministic_per_locator() {
        let a = result_filename("cat", "/files/abc123.mp4");
        let b = result_filename("cat", "/files/abc123.mp4");
        let c = result_filename("cat", "/files/def456.mp4");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("cat--"));
        assert!(a.ends_with(".mp4"));
        assert_eq!(a.len(), "cat--".len() + 8 + ".mp4".len());
    }

    #[test]
    fn extension_comes_from_last_segment_only() {
        assert_eq!(locator_extension("/files/x.WebM?sig=1"), Some("webm".to_string()));
        assert_eq!(locator_extension("/video/download/abc123"), None);
        assert_eq!(locator_extension("/v1.2/download/abc"), None);
        assert!(result_filename("cat", "/video/download/abc123").ends_with(".mp4"));
    }

    #[test]
    fn stem_is_sanitized() {
        assert_eq!(sanitize_stem("my:video??clip"), "my_video_clip");
        assert_eq!(sanitize_stem("..."), "result");
        assert_eq!(sanitize_stem("con"), "con_");
    }
}
