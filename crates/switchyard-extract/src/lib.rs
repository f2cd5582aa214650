//! # Switchyard Extract
//!
//! Parameter binding for the Switchyard dispatch engine.
//!
//! A handler declares its parameters as an ordered list of
//! [`ParamSpec`](switchyard_core::ParamSpec)s. At dispatch time the
//! [`ParamBinder`] turns that list into positional
//! [`Arguments`](switchyard_core::Arguments):
//!
//! | Spec | Source | Argument |
//! |------|--------|----------|
//! | `Request` | the whole request | [`Argument::Request`](switchyard_core::Argument::Request) |
//! | `Path(name)` | a path capture | string, or the transformer's output |
//! | `Path` without name | every capture | object |
//! | `Query(name)` | a query value | string, or the transformer's output |
//! | `Query` without name | the whole query | object |
//! | `Body` | the transformed body | value |
//!
//! Missing values bind as absent rather than failing. Only a transformer
//! rejecting a present value, or a transformer that cannot be resolved,
//! fails the binding.

#![forbid(unsafe_code)]

mod binder;
mod query;
mod transform;

pub use binder::ParamBinder;
pub use query::QueryMap;
pub use transform::{IntegerTransformer, UuidTransformer};
