//! Built-in transformers for path and query values.

use serde_json::Value;
use switchyard_core::{injectable, DispatchError, DispatchResult, Transformer};
use uuid::Uuid;

/// Parses a decimal integer.
///
/// ```rust
/// use switchyard_core::Transformer;
/// use switchyard_extract::IntegerTransformer;
///
/// assert_eq!(IntegerTransformer.transform("42").unwrap(), 42);
/// assert!(IntegerTransformer.transform("4x2").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerTransformer;

injectable!(IntegerTransformer => Singleton);

impl Transformer for IntegerTransformer {
    fn transform(&self, raw: &str) -> DispatchResult<Value> {
        raw.trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| DispatchError::bad_request(format!("Expected an integer, got '{raw}'")))
    }
}

/// Validates a UUID and normalizes it to lowercase hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTransformer;

injectable!(UuidTransformer => Singleton);

impl Transformer for UuidTransformer {
    fn transform(&self, raw: &str) -> DispatchResult<Value> {
        Uuid::parse_str(raw.trim())
            .map(|uuid| Value::String(uuid.hyphenated().to_string()))
            .map_err(|_| DispatchError::bad_request(format!("Expected a UUID, got '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use switchyard_core::tags;

    #[test]
    fn test_integer() {
        assert_eq!(IntegerTransformer.transform("7").unwrap(), json!(7));
        assert_eq!(IntegerTransformer.transform(" -12 ").unwrap(), json!(-12));

        let err = IntegerTransformer.transform("seven").unwrap_err();
        assert_eq!(err.tag(), &tags::BAD_REQUEST);
        assert!(err.to_string().contains("seven"));
    }

    #[test]
    fn test_uuid() {
        let value = UuidTransformer
            .transform("67E55044-10B1-426F-9247-BB680E5FE0C8")
            .unwrap();
        assert_eq!(value, json!("67e55044-10b1-426f-9247-bb680e5fe0c8"));

        let err = UuidTransformer.transform("not-a-uuid").unwrap_err();
        assert_eq!(err.tag(), &tags::BAD_REQUEST);
    }
}
