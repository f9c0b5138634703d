//! Worker request types.

use serde::{Deserialize, Serialize};

/// Body of `POST /process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Media path relative to the shared library root
    pub path: String,
}

impl ProcessRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_request_body() {
        let body = serde_json::to_string(&ProcessRequest::new("cam/a.mp4")).unwrap();
        assert_eq!(body, r#"{"path":"cam/a.mp4"}"#);
    }
}
