//! Error taxonomy for the dispatch engine.
//!
//! Every [`DispatchError`] carries an [`ErrorTag`]. Tags form a single-parent
//! hierarchy rooted at [`tags::ERROR`], and exception handlers declare the tag
//! they catch. A handler catches an error when its tag is the error's own tag
//! or one of its ancestors.
//!
//! ```text
//! Error
//! ├── HttpException
//! │   ├── BadRequestException
//! │   │   └── ValidationException
//! │   ├── UnauthorizedException
//! │   ├── ForbiddenException
//! │   └── NotFoundException
//! └── InternalException
//! ```
//!
//! Application code extends the hierarchy with its own `static` tags:
//!
//! ```
//! use switchyard_core::{tags, DispatchError, ErrorTag};
//! use http::StatusCode;
//!
//! static PAYMENT_REQUIRED: ErrorTag = ErrorTag::new("PaymentRequired", Some(&tags::HTTP_EXCEPTION));
//!
//! let err = DispatchError::tagged(&PAYMENT_REQUIRED, StatusCode::PAYMENT_REQUIRED, "top up first");
//! assert!(err.tag().is_a(&tags::HTTP_EXCEPTION));
//! assert!(!err.tag().is_a(&tags::NOT_FOUND));
//! ```

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::di::InjectionError;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// A node in the error-type hierarchy.
///
/// Tags are compared by address, so each tag must be declared as a `static`.
#[derive(Debug)]
pub struct ErrorTag {
    name: &'static str,
    parent: Option<&'static ErrorTag>,
}

impl ErrorTag {
    /// Declares a tag with an optional parent.
    #[must_use]
    pub const fn new(name: &'static str, parent: Option<&'static ErrorTag>) -> Self {
        Self { name, parent }
    }

    /// Returns the tag name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the parent tag, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<&'static ErrorTag> {
        self.parent
    }

    /// Iterates from this tag up to the root, starting with the tag itself.
    pub fn ancestors(&'static self) -> impl Iterator<Item = &'static ErrorTag> {
        std::iter::successors(Some(self), |tag| tag.parent)
    }

    /// Returns how many parent links separate this tag from `ancestor`.
    ///
    /// `Some(0)` means the tags are identical; `None` means `ancestor` is
    /// not on this tag's chain.
    #[must_use]
    pub fn distance_to(&'static self, ancestor: &ErrorTag) -> Option<usize> {
        self.ancestors().position(|tag| std::ptr::eq(tag, ancestor))
    }

    /// Returns true if `ancestor` is this tag or one of its ancestors.
    #[must_use]
    pub fn is_a(&'static self, ancestor: &ErrorTag) -> bool {
        self.distance_to(ancestor).is_some()
    }
}

impl PartialEq for ErrorTag {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for ErrorTag {}

impl std::fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Built-in error tags.
pub mod tags {
    use super::ErrorTag;

    /// Root of the hierarchy; a handler for this tag catches everything.
    pub static ERROR: ErrorTag = ErrorTag::new("Error", None);

    /// Errors that map onto an HTTP status.
    pub static HTTP_EXCEPTION: ErrorTag = ErrorTag::new("HttpException", Some(&ERROR));

    /// 400: the request could not be understood.
    pub static BAD_REQUEST: ErrorTag = ErrorTag::new("BadRequestException", Some(&HTTP_EXCEPTION));

    /// Body validation failed.
    pub static VALIDATION: ErrorTag = ErrorTag::new("ValidationException", Some(&BAD_REQUEST));

    /// 401: missing or invalid credentials.
    pub static UNAUTHORIZED: ErrorTag =
        ErrorTag::new("UnauthorizedException", Some(&HTTP_EXCEPTION));

    /// 403: the caller may not perform the operation.
    pub static FORBIDDEN: ErrorTag = ErrorTag::new("ForbiddenException", Some(&HTTP_EXCEPTION));

    /// 404: the addressed resource does not exist.
    pub static NOT_FOUND: ErrorTag = ErrorTag::new("NotFoundException", Some(&HTTP_EXCEPTION));

    /// Failures inside the engine or a handler.
    pub static INTERNAL: ErrorTag = ErrorTag::new("InternalException", Some(&ERROR));
}

/// A single body-validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Path of the offending field (e.g. `name`, `address.zip`).
    pub field: String,
    /// Human-readable description of the constraint.
    pub message: String,
}

impl Violation {
    /// Creates a violation.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while dispatching a request.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The request body failed validation.
    #[error("Validation failed with {} violation(s)", violations.len())]
    Validation {
        /// Every violation reported by the validator.
        violations: Vec<Violation>,
    },

    /// An error carrying an HTTP status.
    #[error("{message}")]
    Http {
        /// Tag used for exception-handler matching.
        tag: &'static ErrorTag,
        /// Status reported when the error reaches the top-level fallback.
        status: StatusCode,
        /// Human-readable message.
        message: String,
    },

    /// A component could not be resolved.
    #[error(transparent)]
    Injection(#[from] InjectionError),

    /// A component was asked to run a handler it does not expose.
    #[error("component {component} has no handler '{handler}'")]
    UnknownHandler {
        /// Component type name.
        component: &'static str,
        /// Requested handler key.
        handler: String,
    },

    /// Any other failure.
    #[error("{message}")]
    Internal {
        /// Human-readable message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl DispatchError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation { violations }
    }

    /// Creates an error with a custom tag and status.
    #[must_use]
    pub fn tagged(tag: &'static ErrorTag, status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            tag,
            status,
            message: message.into(),
        }
    }

    /// Creates an HTTP error, picking the built-in tag for the status.
    #[must_use]
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        let tag = match status {
            StatusCode::BAD_REQUEST => &tags::BAD_REQUEST,
            StatusCode::UNAUTHORIZED => &tags::UNAUTHORIZED,
            StatusCode::FORBIDDEN => &tags::FORBIDDEN,
            StatusCode::NOT_FOUND => &tags::NOT_FOUND,
            _ => &tags::HTTP_EXCEPTION,
        };
        Self::tagged(tag, status, message)
    }

    /// Creates a 400 error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::http(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::http(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::http(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::http(StatusCode::NOT_FOUND, message)
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the tag used for exception-handler matching.
    #[must_use]
    pub fn tag(&self) -> &'static ErrorTag {
        match self {
            Self::Validation { .. } => &tags::VALIDATION,
            Self::Http { tag, .. } => tag,
            Self::Injection(_) | Self::UnknownHandler { .. } | Self::Internal { .. } => {
                &tags::INTERNAL
            }
        }
    }

    /// Returns the status this error would map to on its own.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Http { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the violations of a validation error.
    #[must_use]
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            Self::Validation { violations } => Some(violations),
            _ => None,
        }
    }

    /// Renders the error as a JSON value for response bodies.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "name": self.tag().name(),
            "message": self.to_string(),
        });
        if let Some(violations) = self.violations() {
            value["violations"] = json!(violations);
        }
        value
    }
}

/// An error that no exception handler in any scope accepted.
#[derive(Error, Debug)]
#[error("unhandled {tag}: {0}", tag = .0.tag())]
pub struct UnhandledError(pub DispatchError);
