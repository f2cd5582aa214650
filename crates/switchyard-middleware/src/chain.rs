//! Middleware and route chains.
//!
//! A [`MiddlewareChain`] runs an ordered list of middleware until one of
//! them answers. A [`RouteChain`] is the full per-endpoint pipeline:
//!
//! ```text
//! body intake → component middleware → endpoint middleware
//!     → body transform → body validation → handler
//!                  ↓ error
//!     endpoint handlers → component handlers → (escape)
//! ```
//!
//! Every stage may short-circuit by producing an [`Outcome`]. Producing
//! nothing lets the next stage run.

use std::sync::Arc;

use http::Method;
use serde_json::Value;
use switchyard_core::{
    BodyType, Container, ControllerRef, DispatchError, DispatchResult, ExceptionHandlerRef,
    ExceptionResolver, MiddlewareRef, Outcome, ParamSpec, RequestContext, ResolutionPolicy,
    StageResult,
};
use switchyard_extract::ParamBinder;

use crate::body::{parse_body, BodyTransformer, BodyValidator, DeclaredValidator, SerdeTransformer};
use crate::stage::Stage;

/// Collaborators shared by every chain of an application.
#[derive(Clone)]
pub struct ChainServices {
    container: Arc<Container>,
    transformer: Arc<dyn BodyTransformer>,
    validator: Arc<dyn BodyValidator>,
    resolver: ExceptionResolver,
    body_methods: Vec<Method>,
}

impl ChainServices {
    /// Creates services with the default body collaborators, first-match
    /// resolution and `POST`, `PUT`, `PATCH` as body-carrying methods.
    #[must_use]
    pub fn new(container: Arc<Container>) -> Self {
        Self {
            container,
            transformer: Arc::new(SerdeTransformer),
            validator: Arc::new(DeclaredValidator),
            resolver: ExceptionResolver::default(),
            body_methods: default_body_methods(),
        }
    }

    /// Replaces the body transformer.
    #[must_use]
    pub fn with_transformer(mut self, transformer: Arc<dyn BodyTransformer>) -> Self {
        self.transformer = transformer;
        self
    }

    /// Replaces the body validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn BodyValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Sets the exception-resolution policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.resolver = ExceptionResolver::new(policy);
        self
    }

    /// Sets which methods carry a body.
    #[must_use]
    pub fn with_body_methods(mut self, methods: Vec<Method>) -> Self {
        self.body_methods = methods;
        self
    }

    /// Returns the container.
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Returns the exception resolver.
    #[must_use]
    pub fn resolver(&self) -> &ExceptionResolver {
        &self.resolver
    }

    /// Returns true if requests with `method` carry a body.
    #[must_use]
    pub fn carries_body(&self, method: &Method) -> bool {
        self.body_methods.contains(method)
    }
}

impl std::fmt::Debug for ChainServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainServices")
            .field("container", &self.container)
            .field("resolver", &self.resolver)
            .field("body_methods", &self.body_methods)
            .finish_non_exhaustive()
    }
}

/// Methods that carry a body unless configured otherwise.
#[must_use]
pub fn default_body_methods() -> Vec<Method> {
    vec![Method::POST, Method::PUT, Method::PATCH]
}

/// An ordered list of middleware, resolved on every run.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareChain {
    middleware: Vec<MiddlewareRef>,
}

impl MiddlewareChain {
    /// Creates a chain.
    #[must_use]
    pub fn new(middleware: Vec<MiddlewareRef>) -> Self {
        Self { middleware }
    }

    /// Returns the middleware in order.
    #[must_use]
    pub fn middleware(&self) -> &[MiddlewareRef] {
        &self.middleware
    }

    /// Returns true if the chain has no middleware.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Runs each middleware in order, stopping at the first that answers.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by resolution or by a middleware.
    pub async fn run(&self, container: &Container, ctx: &mut RequestContext) -> StageResult {
        for reference in &self.middleware {
            let middleware = reference.resolve(container)?;
            if let Some(outcome) = middleware.apply(ctx).await? {
                tracing::debug!(
                    middleware = middleware.name(),
                    status = outcome.status().as_u16(),
                    "middleware short-circuited"
                );
                return Ok(Some(outcome));
            }
        }
        Ok(None)
    }
}

/// The pipeline mounted for one endpoint.
#[derive(Debug, Clone)]
pub struct RouteChain {
    component: ControllerRef,
    handler: String,
    component_middleware: MiddlewareChain,
    endpoint_middleware: MiddlewareChain,
    params: Vec<ParamSpec>,
    body_type: BodyType,
    endpoint_handlers: Vec<ExceptionHandlerRef>,
    component_handlers: Vec<ExceptionHandlerRef>,
}

impl RouteChain {
    /// Starts a chain invoking `handler` on `component`.
    #[must_use]
    pub fn new(component: ControllerRef, handler: impl Into<String>) -> Self {
        Self {
            component,
            handler: handler.into(),
            component_middleware: MiddlewareChain::default(),
            endpoint_middleware: MiddlewareChain::default(),
            params: Vec::new(),
            body_type: BodyType::untyped(),
            endpoint_handlers: Vec::new(),
            component_handlers: Vec::new(),
        }
    }

    /// Sets the component-scope middleware.
    #[must_use]
    pub fn component_middleware(mut self, middleware: Vec<MiddlewareRef>) -> Self {
        self.component_middleware = MiddlewareChain::new(middleware);
        self
    }

    /// Sets the endpoint-scope middleware.
    #[must_use]
    pub fn endpoint_middleware(mut self, middleware: Vec<MiddlewareRef>) -> Self {
        self.endpoint_middleware = MiddlewareChain::new(middleware);
        self
    }

    /// Sets the parameter bindings. The body type is taken from the first
    /// typed body parameter.
    #[must_use]
    pub fn params(mut self, params: Vec<ParamSpec>) -> Self {
        self.body_type = params
            .iter()
            .find_map(|spec| match spec {
                ParamSpec::Body(Some(ty)) => Some(ty.0),
                _ => None,
            })
            .unwrap_or_default();
        self.params = params;
        self
    }

    /// Sets the endpoint-scope exception handlers.
    #[must_use]
    pub fn endpoint_handlers(mut self, handlers: Vec<ExceptionHandlerRef>) -> Self {
        self.endpoint_handlers = handlers;
        self
    }

    /// Sets the component-scope exception handlers.
    #[must_use]
    pub fn component_handlers(mut self, handlers: Vec<ExceptionHandlerRef>) -> Self {
        self.component_handlers = handlers;
        self
    }

    /// Returns the handler key.
    #[must_use]
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Returns the component reference.
    #[must_use]
    pub fn component(&self) -> &ControllerRef {
        &self.component
    }

    /// Returns the declared body type.
    #[must_use]
    pub fn body_type(&self) -> &BodyType {
        &self.body_type
    }

    /// Runs the chain.
    ///
    /// # Errors
    ///
    /// Returns errors from body intake and middleware, and errors from the
    /// later stages that no endpoint or component handler accepted.
    pub async fn run(&self, services: &ChainServices, ctx: &mut RequestContext) -> StageResult {
        let carries_body = services.carries_body(ctx.method());

        for stage in Stage::all().into_iter().filter(|s| !s.is_resolved()) {
            if stage.needs_body() && !carries_body {
                continue;
            }
            if let Some(outcome) = self.run_stage(stage, services, ctx).await? {
                tracing::debug!(stage = %stage, handler = %self.handler, "chain short-circuited");
                return Ok(Some(outcome));
            }
        }

        match self.invoke(services, ctx, carries_body).await {
            Ok(value) => Ok(Some(Outcome::ok(value))),
            Err(error) => self.recover(services, error).await.map(Some),
        }
    }

    /// Runs one stage whose errors escape the chain.
    async fn run_stage(
        &self,
        stage: Stage,
        services: &ChainServices,
        ctx: &mut RequestContext,
    ) -> StageResult {
        match stage {
            Stage::BodyIntake => {
                if ctx.raw_body().is_none() {
                    let raw = parse_body(ctx.request().body())?;
                    ctx.set_raw_body(raw);
                }
                Ok(None)
            }
            Stage::ComponentMiddleware => {
                self.component_middleware
                    .run(services.container(), ctx)
                    .await
            }
            Stage::EndpointMiddleware => {
                self.endpoint_middleware
                    .run(services.container(), ctx)
                    .await
            }
            Stage::BodyTransform | Stage::BodyValidation | Stage::Handler => Ok(None),
        }
    }

    /// Runs the stages whose errors go through exception resolution.
    async fn invoke(
        &self,
        services: &ChainServices,
        ctx: &mut RequestContext,
        carries_body: bool,
    ) -> DispatchResult<Value> {
        ctx.clear_body();
        for stage in Stage::all().into_iter().filter(|s| s.is_resolved()) {
            if stage.needs_body() && !carries_body {
                continue;
            }
            match stage {
                Stage::BodyTransform => {
                    let raw = ctx.raw_body().cloned().unwrap_or(Value::Null);
                    let body = services.transformer.transform(&self.body_type, raw)?;
                    ctx.set_body(body);
                }
                Stage::BodyValidation if !self.body_type.is_untyped() => {
                    let violations = ctx
                        .body()
                        .map(|body| services.validator.validate(&self.body_type, body))
                        .unwrap_or_default();
                    if !violations.is_empty() {
                        return Err(DispatchError::validation(violations));
                    }
                }
                Stage::Handler => {
                    let args = ParamBinder::new(services.container()).map_to(ctx, &self.params)?;
                    let component = self.component.resolve(services.container())?;
                    return component.invoke(&self.handler, args).await;
                }
                _ => {}
            }
        }
        Err(DispatchError::internal(format!(
            "route chain for '{}' has no handler stage",
            self.handler
        )))
    }

    async fn recover(&self, services: &ChainServices, error: DispatchError) -> DispatchResult<Outcome> {
        let scopes = [&self.endpoint_handlers[..], &self.component_handlers[..]];
        let Some(reference) = services.resolver().resolve(&error, &scopes) else {
            return Err(error);
        };
        tracing::debug!(
            exception_handler = reference.name(),
            error = %error,
            "route error handled"
        );
        let handler = reference.resolve(services.container())?;
        Ok(handler.handle(error).await)
    }
}
