//! Registration errors.

use switchyard_core::InjectionError;
use switchyard_router::RouteError;
use thiserror::Error;

/// Errors raised while registering components or settings.
#[derive(Debug, Error)]
pub enum MountError {
    /// A mounted path is not a valid pattern.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// A controller or gateway could not be resolved at mount time.
    #[error(transparent)]
    Injection(#[from] InjectionError),

    /// A CORS origin is not a valid header value.
    #[error("invalid CORS origin '{origin}'")]
    InvalidOrigin {
        /// The rejected origin.
        origin: String,
    },

    /// The configuration could not be applied.
    #[error(transparent)]
    Config(#[from] switchyard_config::ConfigError),
}

/// Result type alias using [`MountError`].
pub type MountResult<T> = Result<T, MountError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = MountError::InvalidOrigin {
            origin: "bad\norigin".to_string(),
        };
        assert_eq!(err.to_string(), "invalid CORS origin 'bad\norigin'");

        let err = MountError::from(RouteError::EmptyCapture {
            pattern: "/users/:".to_string(),
        });
        assert_eq!(err.to_string(), "capture without a name in pattern '/users/:'");
    }
}
