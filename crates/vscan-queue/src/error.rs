//! Queue error types.

use thiserror::Error;
use vscan_ml_client::MlError;
use vscan_models::PathError;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error(transparent)]
    Worker(#[from] MlError),
}
