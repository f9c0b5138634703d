//! Background services.

pub mod library_sync;
pub mod telemetry;

pub use library_sync::LibrarySync;
pub use telemetry::TelemetryPoller;
