//! Component traits and type references.
//!
//! Everything the engine dispatches to is a component resolved from the
//! [`Container`]: controllers and gateways implement [`Component`],
//! guards implement [`Middleware`], error renderers implement
//! [`ExceptionHandler`] and parameter converters implement [`Transformer`].
//!
//! Declarations never hold instances. They hold a [`ComponentRef`], a typed
//! pointer to a resolver function, so that every dispatch resolves a fresh
//! reference and honours the component's [`Lifecycle`](crate::di::Lifecycle).

use std::any::TypeId;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::context::{RequestContext, RequestView};
use crate::di::{Container, Injectable, InjectionError};
use crate::error::{DispatchError, DispatchResult, ErrorTag};
use crate::outcome::Outcome;

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a middleware stage produces: `Some` short-circuits the chain with a
/// response, `None` lets the next stage run.
pub type StageResult = DispatchResult<Option<Outcome>>;

/// A controller or gateway exposing named handlers.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use serde_json::{json, Value};
/// use switchyard_core::{unknown_handler, Arguments, BoxFuture, Component, DispatchResult};
///
/// struct Health;
///
/// impl Component for Health {
///     fn invoke(self: Arc<Self>, handler: &str, _args: Arguments) -> BoxFuture<'static, DispatchResult<Value>> {
///         match handler {
///             "check" => Box::pin(async { Ok(json!({ "ok": true })) }),
///             other => unknown_handler::<Self>(other),
///         }
///     }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// Runs the handler registered under `handler` with bound arguments.
    fn invoke(
        self: Arc<Self>,
        handler: &str,
        args: Arguments,
    ) -> BoxFuture<'static, DispatchResult<Value>>;
}

/// Returns a ready future failing with [`DispatchError::UnknownHandler`].
#[must_use]
pub fn unknown_handler<C: ?Sized>(handler: &str) -> BoxFuture<'static, DispatchResult<Value>> {
    let error = DispatchError::UnknownHandler {
        component: std::any::type_name::<C>(),
        handler: handler.to_string(),
    };
    Box::pin(std::future::ready(Err(error)))
}

/// Serializes a handler result.
///
/// # Errors
///
/// Returns an internal error if `value` cannot be represented as JSON.
pub fn to_json<T: Serialize>(value: &T) -> DispatchResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| DispatchError::internal_with_source("failed to serialize handler result", e))
}

/// A request-guarding or request-transforming step.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the middleware name, used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Inspects or mutates the request.
    ///
    /// Returning `Ok(Some(outcome))` stops the chain and answers the request.
    fn apply<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, StageResult>;
}

/// Renders errors of one tag family into a response.
pub trait ExceptionHandler: Send + Sync + 'static {
    /// The tag this handler catches, including every descendant tag.
    fn target() -> &'static ErrorTag
    where
        Self: Sized;

    /// Produces the response for `error`.
    fn handle(&self, error: DispatchError) -> BoxFuture<'_, Outcome>;
}

/// Converts a raw path or query string into a typed value.
pub trait Transformer: Send + Sync + 'static {
    /// Converts `raw`.
    ///
    /// # Errors
    ///
    /// Returns an error, usually a bad request, if `raw` is not acceptable.
    fn transform(&self, raw: &str) -> DispatchResult<Value>;
}

/// A resolvable reference to a component type.
pub struct ComponentRef<T: ?Sized> {
    name: &'static str,
    type_id: TypeId,
    resolve: fn(&Container) -> Result<Arc<T>, InjectionError>,
}

impl<T: ?Sized> ComponentRef<T> {
    /// Returns the referenced type's name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the referenced type's id.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Resolves an instance from the container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot build the type.
    pub fn resolve(&self, container: &Container) -> Result<Arc<T>, InjectionError> {
        (self.resolve)(container)
    }
}

impl<T: ?Sized> Clone for ComponentRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for ComponentRef<T> {}

impl<T: ?Sized> PartialEq for ComponentRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl<T: ?Sized> fmt::Debug for ComponentRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Reference to a controller or gateway.
pub type ControllerRef = ComponentRef<dyn Component>;

/// Reference to a middleware.
pub type MiddlewareRef = ComponentRef<dyn Middleware>;

/// Reference to a transformer.
pub type TransformerRef = ComponentRef<dyn Transformer>;

impl ComponentRef<dyn Component> {
    /// References component type `C`.
    #[must_use]
    pub fn of<C: Component + Injectable>() -> Self {
        Self {
            name: std::any::type_name::<C>(),
            type_id: TypeId::of::<C>(),
            resolve: |container| container.resolve::<C>().map(|c| c as Arc<dyn Component>),
        }
    }
}

impl ComponentRef<dyn Middleware> {
    /// References middleware type `M`.
    #[must_use]
    pub fn of<M: Middleware + Injectable>() -> Self {
        Self {
            name: std::any::type_name::<M>(),
            type_id: TypeId::of::<M>(),
            resolve: |container| container.resolve::<M>().map(|m| m as Arc<dyn Middleware>),
        }
    }
}

impl ComponentRef<dyn Transformer> {
    /// References transformer type `T`.
    #[must_use]
    pub fn of<T: Transformer + Injectable>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            resolve: |container| container.resolve::<T>().map(|t| t as Arc<dyn Transformer>),
        }
    }
}

/// Reference to an exception handler together with the tag it catches.
#[derive(Clone, Copy, PartialEq)]
pub struct ExceptionHandlerRef {
    inner: ComponentRef<dyn ExceptionHandler>,
    target: &'static ErrorTag,
}

impl ExceptionHandlerRef {
    /// References exception handler type `H`.
    #[must_use]
    pub fn of<H: ExceptionHandler + Injectable>() -> Self {
        Self {
            inner: ComponentRef {
                name: std::any::type_name::<H>(),
                type_id: TypeId::of::<H>(),
                resolve: |container| {
                    container
                        .resolve::<H>()
                        .map(|h| h as Arc<dyn ExceptionHandler>)
                },
            },
            target: H::target(),
        }
    }

    /// Returns the handler type's name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Returns the tag the handler catches.
    #[must_use]
    pub const fn target(&self) -> &'static ErrorTag {
        self.target
    }

    /// Returns true if the handler catches `error`.
    #[must_use]
    pub fn catches(&self, error: &DispatchError) -> bool {
        error.tag().is_a(self.target)
    }

    /// Resolves an instance from the container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot build the handler.
    pub fn resolve(
        &self,
        container: &Container,
    ) -> Result<Arc<dyn ExceptionHandler>, InjectionError> {
        self.inner.resolve(container)
    }
}

impl fmt::Debug for ExceptionHandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.inner.name, self.target)
    }
}

/// A single bound handler argument.
#[derive(Debug, Clone)]
pub enum Argument {
    /// The inbound request with its per-request context.
    Request(RequestView),
    /// A path capture, or every capture when no name was declared.
    Path(Option<Value>),
    /// A query value, or the whole query when no name was declared.
    Query(Option<Value>),
    /// The transformed and validated body.
    Body(Option<Value>),
    /// The `value` of an inbound socket message.
    Message(Value),
}

impl Argument {
    /// Returns the JSON value carried by the argument, if any.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Request(_) => None,
            Self::Path(value) | Self::Query(value) | Self::Body(value) => value.as_ref(),
            Self::Message(value) => Some(value),
        }
    }
}

/// Positional handler arguments, aligned with the declared parameters.
#[derive(Debug, Clone, Default)]
pub struct Arguments(Vec<Argument>);

impl Arguments {
    /// Wraps a list of arguments.
    #[must_use]
    pub fn new(args: Vec<Argument>) -> Self {
        Self(args)
    }

    /// Arguments for a socket message handler.
    #[must_use]
    pub fn message(value: Value) -> Self {
        Self(vec![Argument::Message(value)])
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the argument at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.0.get(index)
    }

    /// Iterates over the arguments in order.
    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.0.iter()
    }

    /// Returns the JSON value at `index`, if present.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.get(index).and_then(Argument::value)
    }

    /// Returns the string value at `index`, if present and a string.
    #[must_use]
    pub fn text(&self, index: usize) -> Option<&str> {
        self.value(index).and_then(Value::as_str)
    }

    /// Returns the request view at `index`.
    #[must_use]
    pub fn request(&self, index: usize) -> Option<&RequestView> {
        match self.get(index) {
            Some(Argument::Request(view)) => Some(view),
            _ => None,
        }
    }

    /// Deserializes the value at `index`. An absent value reads as `null`,
    /// so `Option<T>` accepts it.
    ///
    /// # Errors
    ///
    /// Returns a bad request if the value does not fit `T`.
    pub fn parse<T: DeserializeOwned>(&self, index: usize) -> DispatchResult<T> {
        let value = self.value(index).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value)
            .map_err(|e| DispatchError::bad_request(format!("argument {index}: {e}")))
    }
}

impl From<Vec<Argument>> for Arguments {
    fn from(args: Vec<Argument>) -> Self {
        Self(args)
    }
}

impl IntoIterator for Arguments {
    type Item = Argument;
    type IntoIter = std::vec::IntoIter<Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
