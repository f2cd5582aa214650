//! # Switchyard Telemetry
//!
//! Logging and metrics for the Switchyard dispatch engine.
//!
//! - [`Logger`] is the logging collaborator the dispatcher reports through.
//!   [`TracingLogger`] forwards to `tracing`.
//! - [`init_logging`] installs a `tracing-subscriber` with JSON or pretty
//!   output.
//! - [`metrics`] records dispatch counters through the `metrics` facade.
//!   No exporter is installed; the host picks one.

#![doc(html_root_url = "https://docs.rs/switchyard-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod logger;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logger::{Logger, TracingLogger};
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type alias using [`TelemetryError`].
pub type TelemetryResult<T> = Result<T, TelemetryError>;
