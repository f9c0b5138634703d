//! FFprobe CLI wrapper and media format helpers.
//!
//! This crate provides:
//! - Duration probing through `ffprobe`, behind the [`DurationProbe`] trait
//! - Recognized video extensions and result sidecar naming

pub mod error;
pub mod formats;
pub mod probe;

pub use error::{MediaError, MediaResult};
pub use formats::{is_video, legacy_result_path, result_path, VIDEO_EXTENSIONS};
pub use probe::{parse_duration_output, DurationProbe, FfprobeDuration};
