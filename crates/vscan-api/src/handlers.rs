//! Request handlers.

pub mod health;
pub mod library;
pub mod processing;

pub use health::*;
pub use library::*;
pub use processing::*;

use serde::Serialize;

/// `{"success": true}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
