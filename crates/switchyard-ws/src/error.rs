//! Error types for gateway channels.

use thiserror::Error;

/// Result type for gateway operations.
pub type WsResult<T> = Result<T, WsError>;

/// Errors raised while upgrading or serving a gateway channel.
#[derive(Debug, Error)]
pub enum WsError {
    /// The request is not an acceptable upgrade request.
    #[error("not a gateway upgrade request: {reason}")]
    NotUpgradeRequest {
        /// Why the request was rejected.
        reason: String,
    },

    /// The connection could not be taken over after the handshake.
    #[error("upgrade failed: {0}")]
    UpgradeFailed(#[from] hyper::Error),

    /// Transport error on an open channel.
    #[error("channel error: {0}")]
    Channel(#[from] tungstenite::Error),
}

impl WsError {
    /// Creates a rejected-upgrade error.
    pub fn not_upgrade(reason: impl Into<String>) -> Self {
        Self::NotUpgradeRequest {
            reason: reason.into(),
        }
    }

    /// Returns true if the error came from the upgrade check.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NotUpgradeRequest { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_upgrade() {
        let err = WsError::not_upgrade("missing Upgrade header");
        assert!(err.is_rejection());
        assert_eq!(
            err.to_string(),
            "not a gateway upgrade request: missing Upgrade header"
        );
    }

    #[test]
    fn test_channel_error() {
        let err = WsError::from(tungstenite::Error::ConnectionClosed);
        assert!(!err.is_rejection());
        assert!(err.to_string().starts_with("channel error"));
    }
}
