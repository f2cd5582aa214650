//! Declarative component metadata.
//!
//! Components describe their routes, subscriptions, middleware and
//! exception handlers by implementing [`Declare`]. The declaration pass
//! writes into a [`MetadataRegistry`]; mounting reads it back.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::{json, Value};
//! use switchyard_core::{
//!     injectable, unknown_handler, Arguments, BoxFuture, Component, Declaration, Declare,
//!     DispatchResult, MetadataRegistry, ParamSpec,
//! };
//!
//! #[derive(Default)]
//! struct Users;
//! injectable!(Users => Singleton);
//!
//! impl Component for Users {
//!     fn invoke(self: Arc<Self>, handler: &str, args: Arguments) -> BoxFuture<'static, DispatchResult<Value>> {
//!         match handler {
//!             "get" => Box::pin(async move { Ok(json!({ "id": args.text(0) })) }),
//!             other => unknown_handler::<Self>(other),
//!         }
//!     }
//! }
//!
//! impl Declare for Users {
//!     fn declare(d: &mut Declaration<'_, Self>) {
//!         d.controller("/users");
//!         d.get("/:id", "get").param(ParamSpec::path("id"));
//!     }
//! }
//!
//! let mut registry = MetadataRegistry::new();
//! registry.declare::<Users>();
//! assert_eq!(registry.controller_root(std::any::TypeId::of::<Users>()), Some("/users"));
//! ```

use std::marker::PhantomData;

use http::Method;

use crate::body::{BodyType, Validate};
use crate::component::{
    Component, ExceptionHandler, ExceptionHandlerRef, Middleware, MiddlewareRef, Transformer,
    TransformerRef,
};
use crate::di::Injectable;
use crate::metadata::{Annotation, MessageSpec, MetadataRegistry, ParamSpec, RouteSpec, Target};

/// A component that declares its own metadata.
pub trait Declare: Component + Injectable {
    /// Records the component's metadata.
    fn declare(declaration: &mut Declaration<'_, Self>);
}

impl MetadataRegistry {
    /// Runs the declaration pass of `C`.
    pub fn declare<C: Declare>(&mut self) {
        let mut declaration = Declaration {
            registry: self,
            _component: PhantomData,
        };
        C::declare(&mut declaration);
    }
}

/// Component-scope declarations for `C`.
pub struct Declaration<'r, C> {
    registry: &'r mut MetadataRegistry,
    _component: PhantomData<fn() -> C>,
}

impl<C: 'static> Declaration<'_, C> {
    /// Marks the component as an HTTP controller rooted at `root`.
    pub fn controller(&mut self, root: &str) -> &mut Self {
        self.record(Annotation::ControllerRoot(root.to_string()));
        self
    }

    /// Marks the component as a socket gateway rooted at `root`.
    pub fn gateway(&mut self, root: &str) -> &mut Self {
        self.record(Annotation::GatewayRoot(root.to_string()));
        self
    }

    /// Runs `M` before every endpoint of the component.
    pub fn apply_middleware<M: Middleware + Injectable>(&mut self) -> &mut Self {
        self.record(Annotation::Middleware(MiddlewareRef::of::<M>()));
        self
    }

    /// Lets `H` handle errors raised by any endpoint of the component.
    pub fn handle_exceptions<H: ExceptionHandler + Injectable>(&mut self) -> &mut Self {
        self.record(Annotation::ExceptionHandler(ExceptionHandlerRef::of::<H>()));
        self
    }

    /// Declares a `GET` endpoint.
    pub fn get(&mut self, path: &str, handler: &str) -> EndpointDeclaration<'_> {
        self.route(Method::GET, path, handler)
    }

    /// Declares a `POST` endpoint.
    pub fn post(&mut self, path: &str, handler: &str) -> EndpointDeclaration<'_> {
        self.route(Method::POST, path, handler)
    }

    /// Declares a `PUT` endpoint.
    pub fn put(&mut self, path: &str, handler: &str) -> EndpointDeclaration<'_> {
        self.route(Method::PUT, path, handler)
    }

    /// Declares a `PATCH` endpoint.
    pub fn patch(&mut self, path: &str, handler: &str) -> EndpointDeclaration<'_> {
        self.route(Method::PATCH, path, handler)
    }

    /// Declares a `DELETE` endpoint.
    pub fn delete(&mut self, path: &str, handler: &str) -> EndpointDeclaration<'_> {
        self.route(Method::DELETE, path, handler)
    }

    /// Declares an endpoint. An empty path means `/`.
    pub fn route(&mut self, method: Method, path: &str, handler: &str) -> EndpointDeclaration<'_> {
        let path = if path.is_empty() { "/" } else { path };
        self.record(Annotation::Route(RouteSpec {
            method,
            path: path.to_string(),
            handler: handler.to_string(),
        }));
        EndpointDeclaration {
            target: Target::handler::<C>(handler),
            registry: &mut *self.registry,
        }
    }

    /// Subscribes `handler` to socket messages named `message`.
    pub fn subscribe(&mut self, message: &str, handler: &str) -> &mut Self {
        self.record(Annotation::Message(MessageSpec {
            message: message.to_string(),
            handler: handler.to_string(),
        }));
        self
    }

    fn record(&mut self, annotation: Annotation) {
        self.registry.record(Target::component::<C>(), annotation);
    }
}

/// Endpoint-scope declarations for one handler.
pub struct EndpointDeclaration<'r> {
    registry: &'r mut MetadataRegistry,
    target: Target,
}

impl EndpointDeclaration<'_> {
    /// Appends a parameter binding. Bindings are positional.
    pub fn param(&mut self, spec: ParamSpec) -> &mut Self {
        self.record(Annotation::Param(spec));
        self
    }

    /// Binds the untyped body.
    pub fn body(&mut self) -> &mut Self {
        self.param(ParamSpec::body())
    }

    /// Binds the body deserialized as `T`.
    pub fn body_of<T>(&mut self) -> &mut Self
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        self.param(ParamSpec::body_as(BodyType::of::<T>()))
    }

    /// Binds the body deserialized as `T` and checked with [`Validate`].
    pub fn validated_body<T>(&mut self) -> &mut Self
    where
        T: serde::de::DeserializeOwned + serde::Serialize + Validate,
    {
        self.param(ParamSpec::body_as(BodyType::validated::<T>()))
    }

    /// Binds a path capture.
    pub fn path_param(&mut self, name: &'static str) -> &mut Self {
        self.param(ParamSpec::path(name))
    }

    /// Binds a path capture converted by `T`.
    pub fn path_param_with<T: Transformer + Injectable>(&mut self, name: &'static str) -> &mut Self {
        self.param(ParamSpec::path_with(name, TransformerRef::of::<T>()))
    }

    /// Binds a query value.
    pub fn query_param(&mut self, name: &'static str) -> &mut Self {
        self.param(ParamSpec::query(name))
    }

    /// Binds a query value converted by `T`.
    pub fn query_param_with<T: Transformer + Injectable>(&mut self, name: &'static str) -> &mut Self {
        self.param(ParamSpec::query_with(name, TransformerRef::of::<T>()))
    }

    /// Binds the inbound request.
    pub fn request(&mut self) -> &mut Self {
        self.param(ParamSpec::request())
    }

    /// Runs `M` before this endpoint only, after component middleware.
    pub fn middleware<M: Middleware + Injectable>(&mut self) -> &mut Self {
        self.record(Annotation::Middleware(MiddlewareRef::of::<M>()));
        self
    }

    /// Lets `H` handle errors raised by this endpoint. Consulted before
    /// component-scope handlers.
    pub fn exception_handler<H: ExceptionHandler + Injectable>(&mut self) -> &mut Self {
        self.record(Annotation::ExceptionHandler(ExceptionHandlerRef::of::<H>()));
        self
    }

    fn record(&mut self, annotation: Annotation) {
        self.registry.record(self.target.clone(), annotation);
    }
}
