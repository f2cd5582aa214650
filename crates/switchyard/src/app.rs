//! The dispatch facade.

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use http::{HeaderValue, Method, Request};
use switchyard_config::SwitchyardConfig;
use switchyard_core::{
    Container, DispatchError, Environment, ExceptionHandlerRef, ExecutionContext, MetadataRegistry,
    MiddlewareRef, Outcome, RequestContext, ResolutionPolicy, Response, StageResult,
    UnhandledError, ValidationExceptionHandler,
};
use switchyard_middleware::{BodyTransformer, BodyValidator, ChainServices, MiddlewareChain};
use switchyard_router::RouteTable;
use switchyard_telemetry::metrics::{self, RequestOutcome};
use switchyard_telemetry::{Logger, TracingLogger};

use crate::error::{MountError, MountResult};
use crate::mount::Entry;

/// Gateway settings applied when a gateway is mounted.
#[derive(Debug, Clone)]
pub(crate) struct GatewaySettings {
    pub(crate) protocol: String,
    pub(crate) max_message_bytes: usize,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            protocol: "websocket".to_string(),
            max_message_bytes: 64 * 1024,
        }
    }
}

/// A dispatch application: the route table plus the global scope.
///
/// Registration takes `&mut self` and happens before serving. [`App::handle`]
/// takes `&self`, so a built app is shared across requests behind an `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// let mut app = App::new(Container::new());
/// app.set_global_middleware(vec![MiddlewareRef::of::<RequestLog>()])?
///     .register_routes::<HealthController>()?
///     .register_gateways::<ChatGateway>()?
///     .enable_cors("*")?;
///
/// let response = app.handle(request, Environment::new(), ExecutionContext::new()).await;
/// ```
pub struct App {
    pub(crate) registry: MetadataRegistry,
    pub(crate) declared: HashSet<TypeId>,
    pub(crate) table: RouteTable<Entry>,
    pub(crate) services: ChainServices,
    pub(crate) global_handlers: Vec<ExceptionHandlerRef>,
    pub(crate) cors_origin: Option<HeaderValue>,
    pub(crate) gateway: GatewaySettings,
    pub(crate) logger: Arc<dyn Logger>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(Container::new())
    }
}

impl App {
    /// Creates an app resolving components from `container`.
    ///
    /// The global scope starts with [`ValidationExceptionHandler`].
    #[must_use]
    pub fn new(container: Container) -> Self {
        Self {
            registry: MetadataRegistry::new(),
            declared: HashSet::new(),
            table: RouteTable::new(),
            services: ChainServices::new(Arc::new(container)),
            global_handlers: vec![ExceptionHandlerRef::of::<ValidationExceptionHandler>()],
            cors_origin: None,
            gateway: GatewaySettings::default(),
            logger: Arc::new(TracingLogger),
        }
    }

    /// Creates an app with CORS, resolution policy, body methods and
    /// gateway settings taken from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(container: Container, config: &SwitchyardConfig) -> MountResult<Self> {
        config.validate()?;
        let mut app = Self::new(container);
        app.set_resolution_policy(config.dispatch.resolution_policy);
        app.services = app
            .services
            .clone()
            .with_body_methods(config.dispatch.body_methods()?);
        app.gateway = GatewaySettings {
            protocol: config.gateway.protocol.clone(),
            max_message_bytes: config.gateway.max_message_bytes,
        };
        if let Some(origin) = &config.dispatch.cors_origin {
            app.enable_cors(origin)?;
        }
        Ok(app)
    }

    /// Replaces the logger used for mount announcements and unhandled errors.
    pub fn set_logger(&mut self, logger: Arc<dyn Logger>) -> &mut Self {
        self.logger = logger;
        self
    }

    /// Replaces the body transformer.
    pub fn set_body_transformer(&mut self, transformer: Arc<dyn BodyTransformer>) -> &mut Self {
        self.services = self.services.clone().with_transformer(transformer);
        self
    }

    /// Replaces the body validator.
    pub fn set_body_validator(&mut self, validator: Arc<dyn BodyValidator>) -> &mut Self {
        self.services = self.services.clone().with_validator(validator);
        self
    }

    /// Sets how a handler is picked when several in one scope accept an error.
    pub fn set_resolution_policy(&mut self, policy: ResolutionPolicy) -> &mut Self {
        self.services = self.services.clone().with_policy(policy);
        self
    }

    /// Sets which methods carry a JSON body.
    pub fn set_body_methods(&mut self, methods: Vec<Method>) -> &mut Self {
        self.services = self.services.clone().with_body_methods(methods);
        self
    }

    /// Adds middleware that runs for every request.
    ///
    /// The chain is appended to the route table as a catch-all entry, so it
    /// only runs before routes registered after this call.
    ///
    /// # Errors
    ///
    /// Never fails for the catch-all pattern; the signature matches the
    /// other registration calls.
    pub fn set_global_middleware(&mut self, middleware: Vec<MiddlewareRef>) -> MountResult<&mut Self> {
        if middleware.is_empty() {
            return Ok(self);
        }
        self.table
            .all("*", Entry::Global(MiddlewareChain::new(middleware)))?;
        Ok(self)
    }

    /// Appends handlers to the global scope, after the built-in validation
    /// handler.
    pub fn set_global_exception_handlers(&mut self, handlers: Vec<ExceptionHandlerRef>) -> &mut Self {
        self.global_handlers.extend(handlers);
        self
    }

    /// Adds `access-control-allow-origin: <origin>` to every response.
    ///
    /// # Errors
    ///
    /// Returns [`MountError::InvalidOrigin`] if `origin` is not a valid
    /// header value.
    pub fn enable_cors(&mut self, origin: &str) -> MountResult<&mut Self> {
        let value = HeaderValue::from_str(origin).map_err(|_| MountError::InvalidOrigin {
            origin: origin.to_string(),
        })?;
        self.cors_origin = Some(value);
        Ok(self)
    }

    /// Returns the container components are resolved from.
    #[must_use]
    pub fn container(&self) -> &Container {
        self.services.container()
    }

    /// Returns the metadata collected from registered components.
    #[must_use]
    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    /// Returns `(method, pattern)` for each route-table entry, in order.
    /// Catch-all entries report `*` as their method.
    pub fn routes(&self) -> impl Iterator<Item = (String, &str)> {
        self.table.describe().map(|(filter, pattern)| {
            let method = match filter {
                switchyard_router::MethodFilter::Only(method) => method.to_string(),
                switchyard_router::MethodFilter::Any => "*".to_string(),
            };
            (method, pattern)
        })
    }

    /// Dispatches one request.
    ///
    /// Matching route-table entries run in order until one produces an
    /// outcome. No outcome at all yields the 404 envelope. An error that
    /// escapes the table is offered to the global scope; if no handler takes
    /// it, it is logged and rendered as the 500 envelope. The CORS header is
    /// added to every response.
    pub async fn handle(
        &self,
        request: Request<Bytes>,
        env: Environment,
        execution: ExecutionContext,
    ) -> Response {
        let mut ctx = RequestContext::new(request, env, execution);
        let (outcome, label) = match self.dispatch(&mut ctx).await {
            Ok(Some(outcome)) => (outcome, RequestOutcome::Handled),
            Ok(None) => (Outcome::not_found(), RequestOutcome::NotFound),
            Err(error) => self.recover(error).await,
        };
        metrics::record_request(label);

        tracing::debug!(
            request_id = %ctx.request_id(),
            http.method = %ctx.method(),
            http.path = ctx.path(),
            http.status_code = outcome.status().as_u16(),
            duration_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request dispatched"
        );
        self.finish(outcome)
    }

    /// Renders an error raised outside the route table, such as a failure
    /// to read the request body, through the global scope.
    pub async fn handle_error(&self, error: DispatchError) -> Response {
        let (outcome, label) = self.recover(error).await;
        metrics::record_request(label);
        self.finish(outcome)
    }

    async fn dispatch(&self, ctx: &mut RequestContext) -> StageResult {
        let method = ctx.method().clone();
        let path = ctx.path().to_string();

        for matched in self.table.matches(&method, &path) {
            ctx.set_params(matched.params);
            let outcome = match matched.handler {
                Entry::Global(chain) => chain.run(self.container(), ctx).await?,
                Entry::Route(chain) => chain.run(&self.services, ctx).await?,
                Entry::Gateway(dispatcher) => Some(self.accept_gateway(dispatcher, ctx)),
            };
            if outcome.is_some() {
                return Ok(outcome);
            }
        }
        Ok(None)
    }

    async fn recover(&self, error: DispatchError) -> (Outcome, RequestOutcome) {
        let scopes = [&self.global_handlers[..]];
        let Some(reference) = self.services.resolver().resolve(&error, &scopes) else {
            return (self.fail(error), RequestOutcome::Failed);
        };
        match reference.resolve(self.container()) {
            Ok(handler) => (handler.handle(error).await, RequestOutcome::Recovered),
            Err(injection) => {
                self.logger.error(
                    &format!("cannot resolve exception handler {}", reference.name()),
                    Some(&injection),
                );
                (self.fail(error), RequestOutcome::Failed)
            }
        }
    }

    fn fail(&self, error: DispatchError) -> Outcome {
        metrics::record_error(error.tag().name());
        let unhandled = UnhandledError(error);
        self.logger.error(&unhandled.to_string(), Some(&unhandled));
        Outcome::internal_error(&unhandled.0)
    }

    fn finish(&self, outcome: Outcome) -> Response {
        let mut response = outcome.into_response();
        if let Some(origin) = &self.cors_origin {
            response
                .headers_mut()
                .insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        }
        response
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.table.len())
            .field("global_handlers", &self.global_handlers)
            .field("cors_origin", &self.cors_origin)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}
