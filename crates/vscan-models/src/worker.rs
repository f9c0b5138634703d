//! Records streamed back by the inference worker.
//!
//! The worker answers `POST /process` with newline-delimited JSON. Each line
//! is decoded independently; anything that is not one of the known shapes
//! becomes [`WorkerRecord::Unparsed`] instead of failing the stream.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single detection reported by the worker, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Detection(pub serde_json::Value);

impl Detection {
    /// Detected class name, when the worker supplied one.
    pub fn category(&self) -> Option<&str> {
        self.0.get("category").and_then(|v| v.as_str())
    }
}

/// One decoded NDJSON line from the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerRecord {
    /// `{"status":"starting"}`
    Starting,
    /// `{"status":"progress","frame":..,"total_frames":..,"progress":..}`
    Progress {
        frame: u64,
        total_frames: u64,
        progress: f64,
    },
    /// `{"status":"complete","detections":[..]}`
    Complete { detections: Vec<Detection> },
    /// `{"error":".."}`
    Error { message: String },
    /// Blank, malformed or unrecognized line
    Unparsed,
}

/// Loose wire shape; every field optional so odd lines still decode.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    frame: Option<u64>,
    #[serde(default)]
    total_frames: Option<u64>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    detections: Option<Vec<Detection>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl WorkerRecord {
    /// Decode a single line. Never fails.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return WorkerRecord::Unparsed;
        }

        let raw: RawRecord = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(_) => return WorkerRecord::Unparsed,
        };

        if let Some(error) = raw.error {
            let message = match error {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            return WorkerRecord::Error { message };
        }

        match raw.status.as_deref() {
            Some("starting") => WorkerRecord::Starting,
            Some("progress") => {
                let frame = raw.frame.unwrap_or(0);
                let total_frames = raw.total_frames.unwrap_or(0);
                let progress = raw
                    .progress
                    .or_else(|| {
                        (total_frames > 0).then(|| frame as f64 / total_frames as f64)
                    })
                    .unwrap_or(0.0)
                    .clamp(0.0, 1.0);
                WorkerRecord::Progress {
                    frame,
                    total_frames,
                    progress,
                }
            }
            Some("complete") => WorkerRecord::Complete {
                detections: raw.detections.unwrap_or_default(),
            },
            _ => WorkerRecord::Unparsed,
        }
    }

    /// Whether this record carries nothing usable.
    pub fn is_unparsed(&self) -> bool {
        matches!(self, WorkerRecord::Unparsed)
    }
}
