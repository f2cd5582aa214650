//! Path captures produced by a route match.
//!
//! Captures are stored in declaration order using a small-vector so that the
//! common case (a handful of captures per route) stays on the stack.

use smallvec::SmallVec;

/// Captures stored inline before spilling to the heap.
const INLINE_PARAMS: usize = 4;

/// Named path captures from a matched pattern.
///
/// Lookup returns the first capture with the given name, so a pattern that
/// repeats a name (`/a/:id/b/:id`) exposes the left-most value.
///
/// # Example
///
/// ```rust
/// use switchyard_router::Params;
///
/// let mut params = Params::new();
/// params.push("userId", "123");
///
/// assert_eq!(params.get("userId"), Some("123"));
/// assert_eq!(params.get("postId"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty capture set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a capture.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value captured under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_push_and_get() {
        let mut params = Params::new();
        params.push("id", "123");
        params.push("name", "alice");

        assert_eq!(params.get("id"), Some("123"));
        assert_eq!(params.get("name"), Some("alice"));
        assert_eq!(params.get("unknown"), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_params_first_capture_wins() {
        let mut params = Params::new();
        params.push("id", "outer");
        params.push("id", "inner");

        assert_eq!(params.get("id"), Some("outer"));
    }

    #[test]
    fn test_params_spill_to_heap() {
        let params: Params = (0..10)
            .map(|i| (format!("key{i}"), format!("value{i}")))
            .collect();

        assert_eq!(params.len(), 10);
        assert_eq!(params.get("key7"), Some("value7"));
        let names: Vec<_> = params.iter().map(|(n, _)| n).take(2).collect();
        assert_eq!(names, vec!["key0", "key1"]);
    }
}
