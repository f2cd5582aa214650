//! The logging collaborator.

use std::error::Error;

/// Receives the dispatcher's log lines: mount announcements and errors
/// that no handler accepted.
pub trait Logger: Send + Sync + 'static {
    /// Logs an informational message.
    fn log(&self, message: &str);

    /// Logs an error, with its cause if there is one.
    fn error(&self, message: &str, error: Option<&(dyn Error + 'static)>);
}

/// Forwards to `tracing` under the `switchyard` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(target: "switchyard", "{message}");
    }

    fn error(&self, message: &str, error: Option<&(dyn Error + 'static)>) {
        match error {
            Some(error) => tracing::error!(target: "switchyard", error = %error, "{message}"),
            None => tracing::error!(target: "switchyard", "{message}"),
        }
    }
}
