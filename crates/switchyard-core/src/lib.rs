//! # Switchyard Core
//!
//! Core types for the Switchyard dispatch engine.
//!
//! - [`MetadataRegistry`] - append-only store of declared routes, message
//!   subscriptions, middleware, exception handlers and parameter bindings
//! - [`Declare`] - the declaration pass that fills the registry
//! - [`Container`] - dependency injection with singleton and transient lifecycles
//! - [`Component`], [`Middleware`], [`ExceptionHandler`], [`Transformer`] -
//!   the traits dispatch targets implement
//! - [`DispatchError`] and [`ErrorTag`] - the tagged error taxonomy
//! - [`ExceptionResolver`] - scope-ordered exception-handler selection
//! - [`RequestContext`] and [`Outcome`] - per-request state and responses

#![doc(html_root_url = "https://docs.rs/switchyard-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod component;
mod context;
mod declare;
pub mod di;
mod error;
mod exception;
mod metadata;
mod outcome;

pub use body::{BodyType, Validate};
pub use component::{
    to_json, unknown_handler, Argument, Arguments, BoxFuture, Component, ComponentRef,
    ControllerRef, ExceptionHandler, ExceptionHandlerRef, Middleware, MiddlewareRef, StageResult,
    Transformer, TransformerRef,
};
pub use context::{Environment, ExecutionContext, RequestContext, RequestView};
pub use declare::{Declaration, Declare, EndpointDeclaration};
pub use di::{Container, Injectable, InjectionError, Lifecycle};
pub use error::{tags, DispatchError, DispatchResult, ErrorTag, UnhandledError, Violation};
pub use exception::{ExceptionResolver, ResolutionPolicy, ValidationExceptionHandler};
pub use metadata::{
    Annotation, BodyTypeRef, GatewaySpec, MessageSpec, MetadataKind, MetadataRegistry, ParamSpec,
    RouteSpec, Target,
};
pub use outcome::{Outcome, Response, ResponseEnvelope};
pub use switchyard_router::Params;
