//! Body intake, transformation and validation collaborators.

use bytes::Bytes;
use serde_json::Value;
use switchyard_core::{BodyType, DispatchError, DispatchResult, Violation};

/// Converts a raw parsed body into the declared type.
pub trait BodyTransformer: Send + Sync + 'static {
    /// Converts `raw` into the shape `ty` describes.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not fit the type.
    fn transform(&self, ty: &BodyType, raw: Value) -> DispatchResult<Value>;
}

/// Checks a transformed body.
pub trait BodyValidator: Send + Sync + 'static {
    /// Returns every violated constraint; empty means valid.
    fn validate(&self, ty: &BodyType, value: &Value) -> Vec<Violation>;
}

/// Transforms through the type's serde round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeTransformer;

impl BodyTransformer for SerdeTransformer {
    fn transform(&self, ty: &BodyType, raw: Value) -> DispatchResult<Value> {
        ty.coerce(raw)
    }
}

/// Validates with the type's own [`Validate`](switchyard_core::Validate)
/// implementation, if it declared one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredValidator;

impl BodyValidator for DeclaredValidator {
    fn validate(&self, ty: &BodyType, value: &Value) -> Vec<Violation> {
        ty.validate(value)
    }
}

/// Parses a request body as JSON. An empty body reads as `null`.
///
/// # Errors
///
/// Returns a bad request if the body is not valid JSON.
pub fn parse_body(bytes: &Bytes) -> DispatchResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
        .map_err(|e| DispatchError::bad_request(format!("Invalid JSON body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use switchyard_core::tags;

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(&Bytes::new()).unwrap(), Value::Null);
        assert_eq!(parse_body(&Bytes::from_static(b"  \n")).unwrap(), Value::Null);
        assert_eq!(
            parse_body(&Bytes::from_static(br#"{"name":"a"}"#)).unwrap(),
            json!({ "name": "a" })
        );

        let err = parse_body(&Bytes::from_static(b"{oops")).unwrap_err();
        assert_eq!(err.tag(), &tags::BAD_REQUEST);
    }

    #[test]
    fn test_defaults_delegate_to_body_type() {
        let ty = BodyType::untyped();
        assert_eq!(SerdeTransformer.transform(&ty, json!(1)).unwrap(), json!(1));
        assert!(DeclaredValidator.validate(&ty, &json!(1)).is_empty());
    }
}
