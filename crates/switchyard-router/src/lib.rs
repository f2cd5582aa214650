//! Ordered route table for Switchyard.
//!
//! This crate is the routing primitive underneath the dispatch engine. It
//! maps `(method, path)` pairs to handlers using compiled path patterns and
//! keeps entries in registration order, so that duplicate registrations are
//! resolved by "first registered wins" at dispatch time.
//!
//! # Features
//!
//! - **Path captures**: `:id` and `{id}` syntax
//! - **Wildcards**: `*` and named `*rest` catch-alls
//! - **Method filters**: per-method entries plus catch-all entries
//! - **Pass-through iteration**: every matching entry is visible, in order
//!
//! # Example
//!
//! ```rust
//! use switchyard_router::RouteTable;
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table.route(Method::GET, "/users/:id", "getUser").unwrap();
//!
//! let hit = table.matches(&Method::GET, "/users/123").next().unwrap();
//! assert_eq!(*hit.handler, "getUser");
//! assert_eq!(hit.params.get("id"), Some("123"));
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod params;
mod pattern;
mod table;

pub use params::Params;
pub use pattern::{Pattern, Segment};
pub use table::{MethodFilter, RouteMatch, RouteTable};

use thiserror::Error;

/// Errors raised while registering a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A wildcard segment was followed by further segments.
    #[error("wildcard must be the last segment in pattern '{pattern}'")]
    WildcardNotLast {
        /// The offending pattern.
        pattern: String,
    },

    /// A capture segment had no name.
    #[error("capture without a name in pattern '{pattern}'")]
    EmptyCapture {
        /// The offending pattern.
        pattern: String,
    },
}
