//! Metadata registry.
//!
//! The registry associates a [`Target`] (a component type or one of its
//! handlers) with annotations grouped by [`MetadataKind`]. Annotations are
//! append-only: each declaration concatenates to the sequence already
//! recorded, and the recorded order is the order routes are mounted in.
//!
//! The registry is filled by an explicit declaration pass (see
//! [`Declare`](crate::declare::Declare)) and read by the mounters. After
//! registration it is only read.

use std::any::TypeId;
use std::collections::HashMap;

use http::Method;

use crate::body::BodyType;
use crate::component::{ExceptionHandlerRef, MiddlewareRef, TransformerRef};

/// What an annotation is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A component type.
    Component(TypeId),
    /// A handler of a component type, by handler key.
    Handler(TypeId, String),
}

impl Target {
    /// Targets component type `C`.
    #[must_use]
    pub fn component<C: 'static>() -> Self {
        Self::Component(TypeId::of::<C>())
    }

    /// Targets handler `handler` of component type `C`.
    #[must_use]
    pub fn handler<C: 'static>(handler: impl Into<String>) -> Self {
        Self::Handler(TypeId::of::<C>(), handler.into())
    }
}

/// Groups of annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    /// Root path of an HTTP controller.
    ControllerRoot,
    /// Root path of a socket gateway.
    GatewayRoot,
    /// HTTP endpoints of a controller.
    Routes,
    /// Message subscriptions of a gateway.
    MessageEndpoints,
    /// Middleware applied at component or endpoint scope.
    Middleware,
    /// Exception handlers at component or endpoint scope.
    ExceptionHandlers,
    /// Parameter bindings of a handler.
    Params,
}

/// An HTTP endpoint: `{method, path, handler}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    /// Request method.
    pub method: Method,
    /// Endpoint path relative to the controller root.
    pub path: String,
    /// Handler key passed to [`Component::invoke`](crate::Component::invoke).
    pub handler: String,
}

impl RouteSpec {
    /// Joins the controller root with this endpoint's path, dropping one
    /// trailing slash from the endpoint path.
    ///
    /// ```
    /// use http::Method;
    /// use switchyard_core::RouteSpec;
    ///
    /// let spec = RouteSpec { method: Method::GET, path: "/".into(), handler: "check".into() };
    /// assert_eq!(spec.full_path("/health"), "/health");
    ///
    /// let spec = RouteSpec { method: Method::GET, path: "/:id/".into(), handler: "get".into() };
    /// assert_eq!(spec.full_path("/users"), "/users/:id");
    /// ```
    #[must_use]
    pub fn full_path(&self, root: &str) -> String {
        let path = self.path.strip_suffix('/').unwrap_or(&self.path);
        let joined = format!("{root}{path}");
        if joined.is_empty() {
            "/".to_string()
        } else {
            joined
        }
    }
}

/// A gateway message subscription: `{message, handler}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSpec {
    /// Message name matched against the inbound `message` field.
    pub message: String,
    /// Handler key passed to [`Component::invoke`](crate::Component::invoke).
    pub handler: String,
}

/// A mounted gateway endpoint: `{root, message, handler}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySpec {
    /// Root path the upgrade is accepted on.
    pub root: String,
    /// Message name.
    pub message: String,
    /// Handler key.
    pub handler: String,
}

/// How one handler parameter is bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamSpec {
    /// The request body, transformed to the declared type.
    Body(Option<BodyTypeRef>),
    /// A path capture. Without a name, every capture as an object.
    Path {
        /// Capture name.
        name: Option<&'static str>,
        /// Optional converter for the raw value.
        transformer: Option<TransformerRef>,
    },
    /// A query value. Without a name, the whole query as an object.
    Query {
        /// Query key.
        name: Option<&'static str>,
        /// Optional converter for the raw value.
        transformer: Option<TransformerRef>,
    },
    /// The inbound request and its context.
    Request,
}

/// A [`BodyType`] compared by name, so [`ParamSpec`] stays `PartialEq`.
#[derive(Debug, Clone, Copy)]
pub struct BodyTypeRef(pub BodyType);

impl PartialEq for BodyTypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.name() == other.0.name()
    }
}

impl ParamSpec {
    /// An untyped body.
    #[must_use]
    pub const fn body() -> Self {
        Self::Body(None)
    }

    /// A body of the given type.
    #[must_use]
    pub const fn body_as(ty: BodyType) -> Self {
        Self::Body(Some(BodyTypeRef(ty)))
    }

    /// A named path capture.
    #[must_use]
    pub const fn path(name: &'static str) -> Self {
        Self::Path {
            name: Some(name),
            transformer: None,
        }
    }

    /// A named path capture converted by `transformer`.
    #[must_use]
    pub const fn path_with(name: &'static str, transformer: TransformerRef) -> Self {
        Self::Path {
            name: Some(name),
            transformer: Some(transformer),
        }
    }

    /// Every path capture.
    #[must_use]
    pub const fn path_all() -> Self {
        Self::Path {
            name: None,
            transformer: None,
        }
    }

    /// A named query value.
    #[must_use]
    pub const fn query(name: &'static str) -> Self {
        Self::Query {
            name: Some(name),
            transformer: None,
        }
    }

    /// A named query value converted by `transformer`.
    #[must_use]
    pub const fn query_with(name: &'static str, transformer: TransformerRef) -> Self {
        Self::Query {
            name: Some(name),
            transformer: Some(transformer),
        }
    }

    /// The whole query.
    #[must_use]
    pub const fn query_all() -> Self {
        Self::Query {
            name: None,
            transformer: None,
        }
    }

    /// The inbound request.
    #[must_use]
    pub const fn request() -> Self {
        Self::Request
    }
}

/// A single recorded annotation.
#[derive(Debug, Clone)]
pub enum Annotation {
    /// Marks a component as an HTTP controller rooted at the path.
    ControllerRoot(String),
    /// Marks a component as a socket gateway rooted at the path.
    GatewayRoot(String),
    /// An HTTP endpoint.
    Route(RouteSpec),
    /// A message subscription.
    Message(MessageSpec),
    /// A middleware reference.
    Middleware(MiddlewareRef),
    /// An exception handler reference.
    ExceptionHandler(ExceptionHandlerRef),
    /// A parameter binding.
    Param(ParamSpec),
}

impl Annotation {
    /// Returns the group this annotation is stored under.
    #[must_use]
    pub const fn kind(&self) -> MetadataKind {
        match self {
            Self::ControllerRoot(_) => MetadataKind::ControllerRoot,
            Self::GatewayRoot(_) => MetadataKind::GatewayRoot,
            Self::Route(_) => MetadataKind::Routes,
            Self::Message(_) => MetadataKind::MessageEndpoints,
            Self::Middleware(_) => MetadataKind::Middleware,
            Self::ExceptionHandler(_) => MetadataKind::ExceptionHandlers,
            Self::Param(_) => MetadataKind::Params,
        }
    }
}

/// Append-only store of annotations.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: HashMap<Target, HashMap<MetadataKind, Vec<Annotation>>>,
}

impl MetadataRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an annotation to the target's sequence for its kind.
    pub fn record(&mut self, target: Target, annotation: Annotation) {
        self.entries
            .entry(target)
            .or_default()
            .entry(annotation.kind())
            .or_default()
            .push(annotation);
    }

    /// Returns every annotation of `kind` on `target`, in recording order.
    #[must_use]
    pub fn read(&self, target: &Target, kind: MetadataKind) -> &[Annotation] {
        self.entries
            .get(target)
            .and_then(|kinds| kinds.get(&kind))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns true if anything was recorded for `target`.
    #[must_use]
    pub fn contains(&self, target: &Target) -> bool {
        self.entries.contains_key(target)
    }

    /// Returns the controller root path. A later declaration overrides an
    /// earlier one.
    #[must_use]
    pub fn controller_root(&self, component: TypeId) -> Option<&str> {
        self.read(&Target::Component(component), MetadataKind::ControllerRoot)
            .iter()
            .rev()
            .find_map(|annotation| match annotation {
                Annotation::ControllerRoot(root) => Some(root.as_str()),
                _ => None,
            })
    }

    /// Returns the gateway root path. A later declaration overrides an
    /// earlier one.
    #[must_use]
    pub fn gateway_root(&self, component: TypeId) -> Option<&str> {
        self.read(&Target::Component(component), MetadataKind::GatewayRoot)
            .iter()
            .rev()
            .find_map(|annotation| match annotation {
                Annotation::GatewayRoot(root) => Some(root.as_str()),
                _ => None,
            })
    }

    /// Returns the component's HTTP endpoints in declaration order.
    pub fn routes(&self, component: TypeId) -> impl Iterator<Item = &RouteSpec> {
        self.read(&Target::Component(component), MetadataKind::Routes)
            .iter()
            .filter_map(|annotation| match annotation {
                Annotation::Route(spec) => Some(spec),
                _ => None,
            })
    }

    /// Returns the component's message subscriptions in declaration order.
    pub fn message_endpoints(&self, component: TypeId) -> impl Iterator<Item = &MessageSpec> {
        self.read(&Target::Component(component), MetadataKind::MessageEndpoints)
            .iter()
            .filter_map(|annotation| match annotation {
                Annotation::Message(spec) => Some(spec),
                _ => None,
            })
    }

    /// Returns middleware attached to `target`, in declaration order.
    pub fn middleware(&self, target: &Target) -> impl Iterator<Item = &MiddlewareRef> {
        self.read(target, MetadataKind::Middleware)
            .iter()
            .filter_map(|annotation| match annotation {
                Annotation::Middleware(reference) => Some(reference),
                _ => None,
            })
    }

    /// Returns exception handlers attached to `target`, in declaration order.
    pub fn exception_handlers(&self, target: &Target) -> impl Iterator<Item = &ExceptionHandlerRef> {
        self.read(target, MetadataKind::ExceptionHandlers)
            .iter()
            .filter_map(|annotation| match annotation {
                Annotation::ExceptionHandler(reference) => Some(reference),
                _ => None,
            })
    }

    /// Returns the parameter bindings of `target`, in positional order.
    pub fn params(&self, target: &Target) -> impl Iterator<Item = &ParamSpec> {
        self.read(target, MetadataKind::Params)
            .iter()
            .filter_map(|annotation| match annotation {
                Annotation::Param(spec) => Some(spec),
                _ => None,
            })
    }
}
