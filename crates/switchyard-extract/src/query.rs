//! Query string parsing.

use serde_json::{Map, Value};
use switchyard_core::{DispatchError, DispatchResult};

/// Decoded query parameters in their original order.
///
/// # Example
///
/// ```rust
/// use switchyard_extract::QueryMap;
///
/// let query = QueryMap::parse(Some("tag=a&limit=10&tag=b")).unwrap();
/// assert_eq!(query.get("limit"), Some("10"));
/// assert_eq!(query.get("tag"), Some("a"));
/// assert_eq!(query.get_all("tag").collect::<Vec<_>>(), vec!["a", "b"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap {
    pairs: Vec<(String, String)>,
}

impl QueryMap {
    /// Decodes a raw query string. `None` yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns a bad request if the query string is not valid
    /// `application/x-www-form-urlencoded` data.
    pub fn parse(raw: Option<&str>) -> DispatchResult<Self> {
        let pairs = serde_urlencoded::from_str(raw.unwrap_or(""))
            .map_err(|e| DispatchError::bad_request(format!("Invalid query string: {e}")))?;
        Ok(Self { pairs })
    }

    /// Returns the first value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns every value for `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if the query had no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Converts the query into a JSON object. Repeated keys become arrays.
    #[must_use]
    pub fn to_object(&self) -> Value {
        let mut object = Map::new();
        for (key, value) in &self.pairs {
            let value = Value::String(value.clone());
            match object.get_mut(key) {
                None => {
                    object.insert(key.clone(), value);
                }
                Some(Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
        }
        Value::Object(object)
    }
}
