//! # Switchyard Middleware
//!
//! Route chain execution for the Switchyard dispatch engine.
//!
//! Every mounted endpoint runs through a [`RouteChain`] with a fixed stage
//! order. The order cannot be changed; components only choose which
//! middleware, parameters and exception handlers fill the stages.
//!
//! | Stage | Runs | On error |
//! |-------|------|----------|
//! | 1. Body intake | body-carrying methods | escapes |
//! | 2. Component middleware | always, in declaration order | escapes |
//! | 3. Endpoint middleware | always, in declaration order | escapes |
//! | 4. Body transform | body-carrying methods | endpoint → component handlers |
//! | 5. Body validation | typed bodies only | endpoint → component handlers |
//! | 6. Handler | always | endpoint → component handlers |
//!
//! ## Example
//!
//! ```
//! use switchyard_middleware::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages.len(), 6);
//! assert_eq!(stages[0].name(), "body_intake");
//! assert!(stages[5].is_resolved());
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod body;
mod chain;
mod stage;

pub use body::{parse_body, BodyTransformer, BodyValidator, DeclaredValidator, SerdeTransformer};
pub use chain::{default_body_methods, ChainServices, MiddlewareChain, RouteChain};
pub use stage::Stage;
