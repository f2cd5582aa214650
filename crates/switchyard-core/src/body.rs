//! Declared body types.
//!
//! A [`BodyType`] tells the body-transform and body-validation stages what
//! an endpoint expects. It is a pair of monomorphized function pointers, so
//! declarations stay `Copy` and free of trait objects.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{DispatchError, DispatchResult, Violation};

/// Types that can check their own invariants after deserialization.
///
/// # Example
///
/// ```
/// use switchyard_core::{Validate, Violation};
///
/// struct NewUser {
///     name: String,
/// }
///
/// impl Validate for NewUser {
///     fn validate(&self) -> Vec<Violation> {
///         if self.name.len() > 3 {
///             Vec::new()
///         } else {
///             vec![Violation::new("name", "must be longer than 3 characters")]
///         }
///     }
/// }
/// ```
pub trait Validate {
    /// Returns every violated constraint; empty means valid.
    fn validate(&self) -> Vec<Violation>;
}

/// The declared type of a request body.
#[derive(Clone, Copy)]
pub struct BodyType {
    name: &'static str,
    untyped: bool,
    coerce: fn(Value) -> DispatchResult<Value>,
    validate: Option<fn(&Value) -> Vec<Violation>>,
}

impl BodyType {
    /// Any JSON value; transformation is the identity and validation is
    /// skipped.
    #[must_use]
    pub fn untyped() -> Self {
        Self {
            name: "Value",
            untyped: true,
            coerce: Ok,
            validate: None,
        }
    }

    /// A body that must deserialize into `T`.
    #[must_use]
    pub fn of<T: DeserializeOwned + Serialize>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            untyped: false,
            coerce: coerce::<T>,
            validate: None,
        }
    }

    /// A body that must deserialize into `T` and pass [`Validate`].
    #[must_use]
    pub fn validated<T: DeserializeOwned + Serialize + Validate>() -> Self {
        Self {
            validate: Some(validate::<T>),
            ..Self::of::<T>()
        }
    }

    /// Returns the type name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true for the generic untyped value.
    #[must_use]
    pub const fn is_untyped(&self) -> bool {
        self.untyped
    }

    /// Converts a raw parsed body into the declared shape.
    ///
    /// # Errors
    ///
    /// Returns a bad request if the body does not fit the type.
    pub fn coerce(&self, raw: Value) -> DispatchResult<Value> {
        (self.coerce)(raw)
    }

    /// Checks a transformed body. Types without [`Validate`] never fail.
    #[must_use]
    pub fn validate(&self, value: &Value) -> Vec<Violation> {
        self.validate.map_or_else(Vec::new, |check| check(value))
    }
}

impl Default for BodyType {
    fn default() -> Self {
        Self::untyped()
    }
}

impl fmt::Debug for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyType")
            .field("name", &self.name)
            .field("validated", &self.validate.is_some())
            .finish()
    }
}

fn coerce<T: DeserializeOwned + Serialize>(raw: Value) -> DispatchResult<Value> {
    let typed: T = serde_json::from_value(raw)
        .map_err(|e| DispatchError::bad_request(format!("Invalid request body: {e}")))?;
    serde_json::to_value(typed)
        .map_err(|e| DispatchError::internal_with_source("failed to re-serialize body", e))
}

fn validate<T: DeserializeOwned + Validate>(value: &Value) -> Vec<Violation> {
    match T::deserialize(value) {
        Ok(typed) => typed.validate(),
        Err(e) => vec![Violation::new("", e.to_string())],
    }
}
