//! Ordered route table.
//!
//! Unlike a radix tree, the table keeps entries in insertion order and
//! yields every entry matching a request, first registered first. The
//! caller decides when to stop: dispatch runs each match in turn until one
//! produces a response, so earlier registrations shadow later duplicates.

use http::Method;

use crate::params::Params;
use crate::pattern::Pattern;
use crate::RouteError;

/// Which request methods an entry accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    /// Accepts every method.
    Any,
    /// Accepts exactly one method.
    Only(Method),
}

impl MethodFilter {
    /// Returns true if `method` passes the filter.
    #[must_use]
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(expected) => expected == method,
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

#[derive(Debug, Clone)]
struct Entry<H> {
    method: MethodFilter,
    pattern: Pattern,
    handler: H,
}

/// A matched entry with its captures.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    /// The handler registered for the entry.
    pub handler: &'a H,
    /// The pattern the entry was registered with.
    pub pattern: &'a str,
    /// Path captures extracted from the request path.
    pub params: Params,
}

/// An insertion-ordered route table.
///
/// # Example
///
/// ```rust
/// use switchyard_router::RouteTable;
/// use http::Method;
///
/// let mut table = RouteTable::new();
/// table.route(Method::GET, "/users/:id", "first").unwrap();
/// table.route(Method::GET, "/users/:id", "second").unwrap();
///
/// let handlers: Vec<_> = table
///     .matches(&Method::GET, "/users/1")
///     .map(|m| *m.handler)
///     .collect();
/// assert_eq!(handlers, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    entries: Vec<Entry<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTable<H> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an entry.
    pub fn add(
        &mut self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        handler: H,
    ) -> Result<(), RouteError> {
        let pattern = Pattern::parse(pattern)?;
        self.entries.push(Entry {
            method: method.into(),
            pattern,
            handler,
        });
        Ok(())
    }

    /// Appends an entry for a single method.
    pub fn route(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.add(MethodFilter::Only(method), pattern, handler)
    }

    /// Appends an entry accepting every method.
    pub fn all(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        self.add(MethodFilter::Any, pattern, handler)
    }

    /// Iterates over entries matching `method` and `path`, in insertion order.
    pub fn matches<'a>(
        &'a self,
        method: &'a Method,
        path: &'a str,
    ) -> impl Iterator<Item = RouteMatch<'a, H>> + 'a {
        self.entries.iter().filter_map(move |entry| {
            if !entry.method.accepts(method) {
                return None;
            }
            let params = entry.pattern.matches(path)?;
            Some(RouteMatch {
                handler: &entry.handler,
                pattern: entry.pattern.as_str(),
                params,
            })
        })
    }

    /// Returns `(method filter, pattern)` for each entry, in insertion order.
    pub fn describe(&self) -> impl Iterator<Item = (&MethodFilter, &str)> {
        self.entries
            .iter()
            .map(|entry| (&entry.method, entry.pattern.as_str()))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table: RouteTable<()> = RouteTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_method_filtering() {
        let mut table = RouteTable::new();
        table.route(Method::GET, "/users", "list").unwrap();
        table.route(Method::POST, "/users", "create").unwrap();

        let get: Vec<_> = table.matches(&Method::GET, "/users").map(|m| *m.handler).collect();
        assert_eq!(get, vec!["list"]);

        let post: Vec<_> = table.matches(&Method::POST, "/users").map(|m| *m.handler).collect();
        assert_eq!(post, vec!["create"]);

        assert_eq!(table.matches(&Method::DELETE, "/users").count(), 0);
    }

    #[test]
    fn test_insertion_order_beats_specificity() {
        let mut table = RouteTable::new();
        table.route(Method::GET, "/users/:id", "param").unwrap();
        table.route(Method::GET, "/users/me", "static").unwrap();

        let first = table.matches(&Method::GET, "/users/me").next().unwrap();
        assert_eq!(*first.handler, "param");
        assert_eq!(first.params.get("id"), Some("me"));
        assert_eq!(first.pattern, "/users/:id");
    }

    #[test]
    fn test_catch_all_entry() {
        let mut table = RouteTable::new();
        table.all("*", "global").unwrap();
        table.route(Method::GET, "/health", "health").unwrap();

        let hits: Vec<_> = table.matches(&Method::GET, "/health").map(|m| *m.handler).collect();
        assert_eq!(hits, vec!["global", "health"]);

        let misses: Vec<_> = table.matches(&Method::PUT, "/nowhere").map(|m| *m.handler).collect();
        assert_eq!(misses, vec!["global"]);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut table = RouteTable::new();
        assert!(table.route(Method::GET, "/a/*rest/b", ()).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_describe() {
        let mut table = RouteTable::new();
        table.all("*", ()).unwrap();
        table.route(Method::GET, "/health", ()).unwrap();

        let described: Vec<_> = table.describe().collect();
        assert_eq!(described[0], (&MethodFilter::Any, "*"));
        assert_eq!(described[1], (&MethodFilter::Only(Method::GET), "/health"));
    }
}
