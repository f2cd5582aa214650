//! Path pattern parsing and matching.
//!
//! A pattern is split on `/` into segments. Empty segments are ignored, so
//! `/users`, `/users/` and `//users` describe the same route. Three segment
//! kinds are understood:
//!
//! | Syntax              | Kind      | Matches                           |
//! |---------------------|-----------|-----------------------------------|
//! | `users`             | literal   | exactly `users`                   |
//! | `:id` or `{id}`     | capture   | any single segment, stored as `id`|
//! | `*` or `*rest`      | wildcard  | the remainder of the path         |

use crate::params::Params;
use crate::RouteError;

/// A single parsed segment of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text that must match exactly.
    Literal(String),
    /// Named single-segment capture.
    Capture(String),
    /// Catch-all for the remaining path, optionally named.
    Wildcard(Option<String>),
}

/// A compiled path pattern.
///
/// # Example
///
/// ```rust
/// use switchyard_router::Pattern;
///
/// let pattern = Pattern::parse("/users/:id").unwrap();
/// let params = pattern.matches("/users/42").unwrap();
/// assert_eq!(params.get("id"), Some("42"));
/// assert!(pattern.matches("/users").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parses a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::WildcardNotLast`] if a wildcard is followed by
    /// more segments, and [`RouteError::EmptyCapture`] for `:` or `{}`.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let parts: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());

        for (index, part) in parts.iter().enumerate() {
            let segment = if let Some(name) = part.strip_prefix('*') {
                if index + 1 != parts.len() {
                    return Err(RouteError::WildcardNotLast {
                        pattern: raw.to_string(),
                    });
                }
                Segment::Wildcard((!name.is_empty()).then(|| name.to_string()))
            } else if let Some(name) = part.strip_prefix(':') {
                Segment::Capture(Self::capture_name(raw, name)?)
            } else if let Some(name) = part.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Segment::Capture(Self::capture_name(raw, name)?)
            } else {
                Segment::Literal((*part).to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    fn capture_name(raw: &str, name: &str) -> Result<String, RouteError> {
        if name.is_empty() {
            return Err(RouteError::EmptyCapture {
                pattern: raw.to_string(),
            });
        }
        Ok(name.to_string())
    }

    /// Returns the pattern as it was written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Matches a request path, returning the captures on success.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard(name) => {
                    if let Some(name) = name {
                        params.push(name.clone(), parts.get(index..).unwrap_or(&[]).join("/"));
                    }
                    return Some(params);
                }
                Segment::Literal(text) => {
                    if parts.get(index) != Some(&text.as_str()) {
                        return None;
                    }
                }
                Segment::Capture(name) => {
                    let value = parts.get(index)?;
                    params.push(name.clone(), *value);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_match() {
        let pattern = Pattern::parse("/health").unwrap();
        assert!(pattern.matches("/health").is_some());
        assert!(pattern.matches("/health/").is_some());
        assert!(pattern.matches("/healthz").is_none());
        assert!(pattern.matches("/health/extra").is_none());
    }

    #[test]
    fn test_both_capture_syntaxes() {
        let colon = Pattern::parse("/orgs/:org/users/:user").unwrap();
        let brace = Pattern::parse("/orgs/{org}/users/{user}").unwrap();

        for pattern in [colon, brace] {
            let params = pattern.matches("/orgs/acme/users/7").unwrap();
            assert_eq!(params.get("org"), Some("acme"));
            assert_eq!(params.get("user"), Some("7"));
        }
    }

    #[test]
    fn test_wildcards() {
        let anonymous = Pattern::parse("*").unwrap();
        assert!(anonymous.matches("/").is_some());
        assert!(anonymous.matches("/anything/at/all").is_some());

        let named = Pattern::parse("/files/*path").unwrap();
        let params = named.matches("/files/img/logo.png").unwrap();
        assert_eq!(params.get("path"), Some("img/logo.png"));
        assert!(named.matches("/other").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let root = Pattern::parse("/").unwrap();
        assert!(root.segments().is_empty());
        assert!(root.matches("/").is_some());
        assert!(root.matches("").is_some());
        assert!(root.matches("/x").is_none());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(matches!(
            Pattern::parse("/files/*path/tail"),
            Err(RouteError::WildcardNotLast { .. })
        ));
        assert!(matches!(
            Pattern::parse("/users/:"),
            Err(RouteError::EmptyCapture { .. })
        ));
        assert!(matches!(
            Pattern::parse("/users/{}"),
            Err(RouteError::EmptyCapture { .. })
        ));
    }

    #[test]
    fn test_as_str_preserves_input() {
        let pattern = Pattern::parse("/users/{id}/").unwrap();
        assert_eq!(pattern.as_str(), "/users/{id}/");
    }
}
