//! Recognized media formats.

use std::path::Path;

/// Video file extensions the library indexes (lowercase, without dot).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Suffix of the detection result sidecar the worker writes next to a video.
pub const RESULT_SUFFIX: &str = ".json";

/// Check whether a path has a recognized video extension (case-insensitive).
pub fn is_video(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Sidecar result path for a video, e.g. `a.mp4` -> `a.mp4.json`.
pub fn result_path(video: &Path) -> std::path::PathBuf {
    let mut os = video.as_os_str().to_owned();
    os.push(RESULT_SUFFIX);
    os.into()
}

/// Older sidecar naming, e.g. `a.mp4` -> `a.json`.
pub fn legacy_result_path(video: &Path) -> Option<std::path::PathBuf> {
    if !is_video(video) {
        return None;
    }
    Some(video.with_extension("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video() {
        assert!(is_video("a.mp4"));
        assert!(is_video("dir/B.MKV"));
        assert!(is_video("x.WebM"));
        assert!(!is_video("a.mp4.json"));
        assert!(!is_video("notes.txt"));
        assert!(!is_video("mp4"));
    }

    #[test]
    fn test_result_paths() {
        let video = Path::new("cam/a.mp4");
        assert_eq!(result_path(video), Path::new("cam/a.mp4.json"));
        assert_eq!(legacy_result_path(video).unwrap(), Path::new("cam/a.json"));
        assert!(legacy_result_path(Path::new("cam/a.txt")).is_none());
    }
}
