//! FFprobe duration probing.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Something that can report the duration of a media file.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    /// Duration of the file at `path` in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;
}

/// Probe backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeDuration {
    binary: PathBuf,
}

impl Default for FfprobeDuration {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FfprobeDuration {
    /// Use the given ffprobe binary (name on PATH or absolute path).
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Create from environment variables (`FFPROBE_PATH`).
    pub fn from_env() -> Self {
        Self::new(std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()))
    }

    /// Resolve the binary, failing if it cannot be found.
    pub fn resolve(&self) -> MediaResult<PathBuf> {
        which::which(&self.binary)
            .map_err(|_| MediaError::FfprobeNotFound(self.binary.display().to_string()))
    }
}

#[async_trait]
impl DurationProbe for FfprobeDuration {
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let binary = self.resolve()?;

        let output = Command::new(binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::ffprobe_failed(
                "FFprobe failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
                output.status.code(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration = parse_duration_output(&stdout)?;
        debug!(path = %path.display(), duration, "Probed duration");
        Ok(duration)
    }
}

/// Parse ffprobe's bare `format=duration` output (e.g. "12.345000").
pub fn parse_duration_output(output: &str) -> MediaResult<f64> {
    let text = output.lines().next().unwrap_or("").trim();
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(MediaError::InvalidOutput(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_output() {
        assert!((parse_duration_output("12.345000\n").unwrap() - 12.345).abs() < 1e-9);
        assert!((parse_duration_output("  3\n").unwrap() - 3.0).abs() < 1e-9);
        assert!(parse_duration_output("N/A\n").is_err());
        assert!(parse_duration_output("").is_err());
        assert!(parse_duration_output("nan").is_err());
        assert!(parse_duration_output("-1").is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let probe = FfprobeDuration::default();
        let err = probe
            .probe_duration(Path::new("/definitely/not/here.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("a.mp4");
        std::fs::write(&video, b"not really a video").unwrap();

        let probe = FfprobeDuration::new("vscan-no-such-ffprobe-binary");
        let err = probe.probe_duration(&video).await.unwrap_err();
        assert!(matches!(err, MediaError::FfprobeNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_binary_and_parses_stdout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-ffprobe");
        std::fs::write(&script, "#!/bin/sh\necho 42.5\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let video = dir.path().join("a.mp4");
        std::fs::write(&video, b"x").unwrap();

        let probe = FfprobeDuration::new(&script);
        let duration = probe.probe_duration(&video).await.unwrap();
        assert!((duration - 42.5).abs() < 1e-9);
    }
}
