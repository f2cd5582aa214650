//! Dispatch counters.
//!
//! | Metric | Labels | Description |
//! |--------|--------|-------------|
//! | `switchyard_requests_total` | `outcome` | Requests handled, by how they ended |
//! | `switchyard_errors_total` | `kind` | Errors that escaped every route handler |
//! | `switchyard_gateway_messages_total` | `gateway` | Gateway messages received, by gateway path |
//!
//! Counters go through the `metrics` facade. Without an installed recorder
//! every call is a no-op.

use metrics::{counter, describe_counter};

/// Requests handled, labelled by outcome.
pub const REQUESTS_TOTAL: &str = "switchyard_requests_total";

/// Errors that reached the global scope, labelled by error tag name.
pub const ERRORS_TOTAL: &str = "switchyard_errors_total";

/// Gateway messages received, labelled by gateway path.
pub const GATEWAY_MESSAGES_TOTAL: &str = "switchyard_gateway_messages_total";

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A chain produced an outcome.
    Handled,
    /// No chain answered.
    NotFound,
    /// An error reached the global scope and a global handler took it.
    Recovered,
    /// An error reached the global scope and nothing took it.
    Failed,
}

impl RequestOutcome {
    /// Returns the label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::NotFound => "not_found",
            Self::Recovered => "recovered",
            Self::Failed => "failed",
        }
    }
}

/// Registers descriptions for every Switchyard counter.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Requests handled, by outcome");
    describe_counter!(ERRORS_TOTAL, "Errors that escaped every route handler");
    describe_counter!(GATEWAY_MESSAGES_TOTAL, "Gateway messages received");
}

/// Counts a finished request.
pub fn record_request(outcome: RequestOutcome) {
    counter!(REQUESTS_TOTAL, "outcome" => outcome.as_str()).increment(1);
}

/// Counts an error that reached the global scope.
pub fn record_error(kind: &'static str) {
    counter!(ERRORS_TOTAL, "kind" => kind).increment(1);
}

/// Counts a received gateway message.
pub fn record_gateway_message(gateway: &str) {
    counter!(GATEWAY_MESSAGES_TOTAL, "gateway" => gateway.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(RequestOutcome::Handled.as_str(), "handled");
        assert_eq!(RequestOutcome::NotFound.as_str(), "not_found");
        assert_eq!(RequestOutcome::Recovered.as_str(), "recovered");
        assert_eq!(RequestOutcome::Failed.as_str(), "failed");
    }

    #[test]
    fn test_recording_without_recorder() {
        describe_metrics();
        record_request(RequestOutcome::Handled);
        record_error("HttpException");
        record_gateway_message("/chat");
    }
}
