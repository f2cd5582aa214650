//! Route chain behaviour: stage order, short-circuits and error scopes.

use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use support::Trail;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use switchyard_core::{
    injectable, tags, unknown_handler, Arguments, BodyType, BoxFuture, Component, Container,
    ControllerRef, DispatchError, DispatchResult, Environment, ErrorTag, ExceptionHandler,
    ExceptionHandlerRef, ExecutionContext, Injectable, InjectionError, Lifecycle, Middleware,
    MiddlewareRef, Outcome, ParamSpec, RequestContext, StageResult, Validate, Violation,
};
use switchyard_middleware::{ChainServices, RouteChain};

mod support {
    use std::sync::Mutex;

    /// Records which steps ran, in order.
    #[derive(Default)]
    pub struct Trail(Mutex<Vec<&'static str>>);

    impl Trail {
        pub fn push(&self, step: &'static str) {
            self.0.lock().unwrap().push(step);
        }

        pub fn steps(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }
}

#[derive(Serialize, Deserialize)]
struct NewUser {
    name: String,
}

impl Validate for NewUser {
    fn validate(&self) -> Vec<Violation> {
        if self.name.len() > 3 {
            Vec::new()
        } else {
            vec![Violation::new("name", "must be longer than 3 characters")]
        }
    }
}

struct Users {
    trail: Arc<Trail>,
}

impl Injectable for Users {
    const LIFECYCLE: Lifecycle = Lifecycle::Singleton;

    fn create(container: &Container) -> Result<Self, InjectionError> {
        Ok(Self {
            trail: container.get_required()?,
        })
    }
}

impl Component for Users {
    fn invoke(
        self: Arc<Self>,
        handler: &str,
        args: Arguments,
    ) -> BoxFuture<'static, DispatchResult<Value>> {
        match handler {
            "echo" => Box::pin(async move {
                self.trail.push("handler");
                Ok(args.value(0).cloned().unwrap_or(Value::Null))
            }),
            "missing" => Box::pin(async move {
                self.trail.push("handler");
                Err(DispatchError::not_found("no such user"))
            }),
            "broken" => Box::pin(async { Err(DispatchError::internal("database offline")) }),
            other => unknown_handler::<Self>(other),
        }
    }
}

macro_rules! step_middleware {
    ($name:ident, $step:literal, $answer:expr) => {
        struct $name {
            trail: Arc<Trail>,
        }

        impl Injectable for $name {
            fn create(container: &Container) -> Result<Self, InjectionError> {
                Ok(Self {
                    trail: container.get_required()?,
                })
            }
        }

        impl Middleware for $name {
            fn apply<'a>(&'a self, _ctx: &'a mut RequestContext) -> BoxFuture<'a, StageResult> {
                Box::pin(async move {
                    self.trail.push($step);
                    $answer
                })
            }
        }
    };
}

step_middleware!(ComponentStep, "component", Ok(None));
step_middleware!(EndpointStep, "endpoint", Ok(None));
step_middleware!(
    Deny,
    "deny",
    Ok(Some(Outcome::json(StatusCode::FORBIDDEN, json!({ "denied": true }))))
);
step_middleware!(Explode, "explode", Err(DispatchError::unauthorized("who are you")));

macro_rules! catcher {
    ($name:ident, $tag:expr, $label:literal) => {
        #[derive(Default)]
        struct $name;
        injectable!($name);

        impl ExceptionHandler for $name {
            fn target() -> &'static ErrorTag {
                $tag
            }

            fn handle(&self, error: DispatchError) -> BoxFuture<'_, Outcome> {
                Box::pin(async move {
                    Outcome::json(
                        error.status_code(),
                        json!({ "handled_by": $label, "message": error.to_string() }),
                    )
                })
            }
        }
    };
}

catcher!(NotFoundCatcher, &tags::NOT_FOUND, "endpoint");
catcher!(CatchEverything, &tags::ERROR, "component");
catcher!(BadRequestCatcher, &tags::BAD_REQUEST, "endpoint");

fn services() -> (ChainServices, Arc<Trail>) {
    let trail = Arc::new(Trail::default());
    let mut container = Container::new();
    container.register(Arc::clone(&trail));
    (ChainServices::new(Arc::new(container)), trail)
}

fn context(method: Method, body: &'static str) -> RequestContext {
    let request = http::Request::builder()
        .method(method)
        .uri("/users")
        .body(Bytes::from_static(body.as_bytes()))
        .unwrap();
    RequestContext::new(request, Environment::new(), ExecutionContext::new())
}

fn chain(handler: &str) -> RouteChain {
    RouteChain::new(ControllerRef::of::<Users>(), handler)
}

#[tokio::test]
async fn success_wraps_result_in_ok_envelope() {
    let (services, _) = services();
    let mut ctx = context(Method::POST, r#"{"name":"alice"}"#);
    let outcome = chain("echo")
        .params(vec![ParamSpec::body()])
        .run(&services, &mut ctx)
        .await
        .unwrap()
        .unwrap();

    let envelope = outcome.envelope().unwrap();
    assert_eq!(envelope.status, StatusCode::OK);
    assert_eq!(envelope.data, json!({ "name": "alice" }));
}

#[tokio::test]
async fn middleware_runs_component_then_endpoint_then_handler() {
    let (services, trail) = services();
    let mut ctx = context(Method::GET, "");
    chain("echo")
        .component_middleware(vec![MiddlewareRef::of::<ComponentStep>()])
        .endpoint_middleware(vec![MiddlewareRef::of::<EndpointStep>()])
        .run(&services, &mut ctx)
        .await
        .unwrap();

    assert_eq!(trail.steps(), vec!["component", "endpoint", "handler"]);
}

#[tokio::test]
async fn short_circuit_skips_later_stages() {
    let (services, trail) = services();
    let mut ctx = context(Method::GET, "");
    let outcome = chain("echo")
        .component_middleware(vec![MiddlewareRef::of::<Deny>()])
        .endpoint_middleware(vec![MiddlewareRef::of::<EndpointStep>()])
        .run(&services, &mut ctx)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.status(), StatusCode::FORBIDDEN);
    assert_eq!(trail.steps(), vec!["deny"]);
}

#[tokio::test]
async fn get_skips_body_intake() {
    let (services, _) = services();
    let mut ctx = context(Method::GET, "{not json");
    let outcome = chain("echo")
        .params(vec![ParamSpec::body()])
        .run(&services, &mut ctx)
        .await
        .unwrap()
        .unwrap();

    assert!(ctx.raw_body().is_none());
    assert_eq!(outcome.envelope().unwrap().data, Value::Null);
}

#[tokio::test]
async fn malformed_body_escapes_the_chain() {
    let (services, trail) = services();
    let mut ctx = context(Method::POST, "{not json");
    let err = chain("echo")
        .component_handlers(vec![ExceptionHandlerRef::of::<CatchEverything>()])
        .run(&services, &mut ctx)
        .await
        .unwrap_err();

    assert_eq!(err.tag(), &tags::BAD_REQUEST);
    assert!(trail.steps().is_empty());
}

#[tokio::test]
async fn validation_failure_skips_handler_and_escapes() {
    let (services, trail) = services();
    let mut ctx = context(Method::POST, r#"{"name":"a"}"#);
    let err = chain("echo")
        .params(vec![ParamSpec::body_as(BodyType::validated::<NewUser>())])
        .run(&services, &mut ctx)
        .await
        .unwrap_err();

    assert_eq!(err.tag(), &tags::VALIDATION);
    assert_eq!(err.violations().unwrap()[0].field, "name");
    assert!(trail.steps().is_empty());
}

#[tokio::test]
async fn valid_typed_body_reaches_handler() {
    let (services, _) = services();
    let mut ctx = context(Method::PUT, r#"{"name":"alice","extra":1}"#);
    let outcome = chain("echo")
        .params(vec![ParamSpec::body_as(BodyType::validated::<NewUser>())])
        .run(&services, &mut ctx)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.envelope().unwrap().data, json!({ "name": "alice" }));
}

#[tokio::test]
async fn transform_errors_reach_component_handlers() {
    let (services, trail) = services();
    let mut ctx = context(Method::POST, r#"{"nickname":"al"}"#);
    let outcome = chain("echo")
        .params(vec![ParamSpec::body_as(BodyType::of::<NewUser>())])
        .component_handlers(vec![ExceptionHandlerRef::of::<CatchEverything>()])
        .run(&services, &mut ctx)
        .await
        .unwrap()
        .unwrap();

    let envelope = outcome.envelope().unwrap();
    assert_eq!(envelope.status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope.data["handled_by"], "component");
    assert!(trail.steps().is_empty());
}

#[tokio::test]
async fn validation_errors_reach_endpoint_handlers_first() {
    let (services, trail) = services();
    let mut ctx = context(Method::POST, r#"{"name":"a"}"#);
    let outcome = chain("echo")
        .params(vec![ParamSpec::body_as(BodyType::validated::<NewUser>())])
        .endpoint_handlers(vec![ExceptionHandlerRef::of::<BadRequestCatcher>()])
        .component_handlers(vec![ExceptionHandlerRef::of::<CatchEverything>()])
        .run(&services, &mut ctx)
        .await
        .unwrap()
        .unwrap();

    let envelope = outcome.envelope().unwrap();
    assert_eq!(envelope.status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope.data["handled_by"], "endpoint");
    assert!(trail.steps().is_empty());
}

#[tokio::test]
async fn endpoint_handlers_take_priority() {
    let (services, _) = services();
    let mut ctx = context(Method::GET, "");
    let outcome = chain("missing")
        .endpoint_handlers(vec![ExceptionHandlerRef::of::<NotFoundCatcher>()])
        .component_handlers(vec![ExceptionHandlerRef::of::<CatchEverything>()])
        .run(&services, &mut ctx)
        .await
        .unwrap()
        .unwrap();

    let envelope = outcome.envelope().unwrap();
    assert_eq!(envelope.status, StatusCode::NOT_FOUND);
    assert_eq!(envelope.data["handled_by"], "endpoint");
}

#[tokio::test]
async fn component_handlers_catch_what_endpoint_handlers_miss() {
    let (services, _) = services();
    let mut ctx = context(Method::GET, "");
    let outcome = chain("broken")
        .endpoint_handlers(vec![ExceptionHandlerRef::of::<NotFoundCatcher>()])
        .component_handlers(vec![ExceptionHandlerRef::of::<CatchEverything>()])
        .run(&services, &mut ctx)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.envelope().unwrap().data["handled_by"], "component");
}

#[tokio::test]
async fn unmatched_errors_escape() {
    let (services, _) = services();
    let mut ctx = context(Method::GET, "");
    let err = chain("broken")
        .endpoint_handlers(vec![ExceptionHandlerRef::of::<NotFoundCatcher>()])
        .run(&services, &mut ctx)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "database offline");
}

#[tokio::test]
async fn middleware_errors_bypass_route_handlers() {
    let (services, trail) = services();
    let mut ctx = context(Method::GET, "");
    let err = chain("echo")
        .endpoint_middleware(vec![MiddlewareRef::of::<Explode>()])
        .component_handlers(vec![ExceptionHandlerRef::of::<CatchEverything>()])
        .run(&services, &mut ctx)
        .await
        .unwrap_err();

    assert_eq!(err.tag(), &tags::UNAUTHORIZED);
    assert_eq!(trail.steps(), vec!["explode"]);
}

#[tokio::test]
async fn unknown_handler_is_an_internal_error() {
    let (services, _) = services();
    let mut ctx = context(Method::GET, "");
    let err = chain("nope").run(&services, &mut ctx).await.unwrap_err();
    assert!(matches!(err, DispatchError::UnknownHandler { .. }));
}
