//! Relative path validation.

use std::path::{Component, Path};

use thiserror::Error;

/// Result type for path validation.
pub type PathResult<T> = Result<T, PathError>;

/// Why a client-supplied relative path was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Path is empty")]
    Empty,

    #[error("Path traversal is not allowed: {0}")]
    Traversal(String),

    #[error("Path must be relative: {0}")]
    Absolute(String),
}

/// Validate a client-supplied path relative to the library root.
///
/// Rejects empty or blank paths, absolute paths and any path containing `..`.
/// The path is returned verbatim, so names with surrounding spaces stay
/// addressable.
pub fn validate_relative_path(path: &str) -> PathResult<&str> {
    if path.trim().is_empty() {
        return Err(PathError::Empty);
    }
    if path.contains("..") {
        return Err(PathError::Traversal(path.to_string()));
    }
    if path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute() {
        return Err(PathError::Absolute(path.to_string()));
    }
    Ok(path)
}

/// Render a relative filesystem path with `/` separators.
pub fn to_posix_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
