//! Client for the inference worker.
//!
//! The worker accepts one job at a time on `POST /process` and streams
//! newline-delimited JSON records back until the job ends. It also serves
//! telemetry on `GET /stats` and a liveness probe on `GET /health`.

pub mod client;
pub mod error;
pub mod ndjson;
pub mod types;

pub use client::{MlClient, MlClientConfig, ProcessStream};
pub use error::{MlError, MlResult};
pub use ndjson::NdjsonDecoder;
pub use types::ProcessRequest;
