//! Per-request state.
//!
//! A [`RequestContext`] is created by the dispatcher for each inbound request
//! and threaded by `&mut` through every stage of a route chain. Environment
//! bindings and the execution context travel with it, so nothing
//! request-scoped is ever written to a shared component.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{Extensions, Method, Request};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use switchyard_router::Params;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// String-keyed bindings supplied by the host with each request
/// (secrets, storage handles, feature flags).
///
/// # Example
///
/// ```
/// use switchyard_core::Environment;
/// use serde_json::json;
///
/// let env: Environment = [("REGION".to_string(), json!("eu-west"))].into_iter().collect();
/// assert_eq!(env.get_str("REGION"), Some("eu-west"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment(Arc<Map<String, Value>>);

impl Environment {
    /// Creates empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing map.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(Arc::new(map))
    }

    /// Returns the binding named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the binding named `key` if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl FromIterator<(String, Value)> for Environment {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

/// Background work tied to a request.
///
/// Work registered with [`wait_until`](Self::wait_until) starts immediately
/// on the tokio runtime and may outlive the response; the host calls
/// [`settle`](Self::settle) to wait for it.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ExecutionContext {
    /// Creates a context with no pending work.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `work` and tracks it until settled.
    pub fn wait_until<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(work);
        self.pending.lock().push(handle);
    }

    /// Returns the number of tracked tasks not yet settled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Waits for every tracked task, including tasks registered while
    /// settling.
    pub async fn settle(&self) {
        loop {
            let batch: Vec<_> = std::mem::take(&mut *self.pending.lock());
            if batch.is_empty() {
                return;
            }
            for handle in batch {
                if let Err(err) = handle.await {
                    tracing::warn!(error = %err, "background task failed");
                }
            }
        }
    }
}

/// Read-only view of a request, handed to handlers that declare a request
/// parameter.
#[derive(Debug, Clone)]
pub struct RequestView {
    request: Arc<Request<Bytes>>,
    params: Params,
    env: Environment,
    execution: ExecutionContext,
    request_id: Uuid,
}

impl RequestView {
    /// Returns the inbound request.
    #[must_use]
    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    /// Returns the path captures of the matched route.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns the environment bindings.
    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Returns the execution context.
    #[must_use]
    pub fn execution(&self) -> &ExecutionContext {
        &self.execution
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

/// Per-request state threaded through a route chain.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use switchyard_core::{Environment, ExecutionContext, RequestContext};
///
/// let request = http::Request::post("/users").body(Bytes::from_static(b"{}")).unwrap();
/// let ctx = RequestContext::new(request, Environment::new(), ExecutionContext::new());
///
/// assert_eq!(ctx.path(), "/users");
/// assert!(ctx.raw_body().is_none());
/// ```
#[derive(Debug)]
pub struct RequestContext {
    request_id: Uuid,
    request: Arc<Request<Bytes>>,
    params: Params,
    env: Environment,
    execution: ExecutionContext,
    raw_body: Option<Value>,
    body: Option<Value>,
    extensions: Extensions,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context for `request`.
    #[must_use]
    pub fn new(request: Request<Bytes>, env: Environment, execution: ExecutionContext) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            request: Arc::new(request),
            params: Params::new(),
            env,
            execution,
            raw_body: None,
            body: None,
            extensions: Extensions::new(),
            started_at: Instant::now(),
        }
    }

    /// Returns the time-ordered request id.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the inbound request.
    #[must_use]
    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Returns the raw query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.request.uri().query()
    }

    /// Returns the path captures of the route currently running.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Replaces the path captures. Called before each matched entry runs.
    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    /// Returns the environment bindings.
    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Returns the execution context.
    #[must_use]
    pub fn execution(&self) -> &ExecutionContext {
        &self.execution
    }

    /// Returns the parsed but untransformed body.
    #[must_use]
    pub fn raw_body(&self) -> Option<&Value> {
        self.raw_body.as_ref()
    }

    /// Stores the parsed body.
    pub fn set_raw_body(&mut self, value: Value) {
        self.raw_body = Some(value);
    }

    /// Returns the transformed body.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Stores the transformed body.
    pub fn set_body(&mut self, value: Value) {
        self.body = Some(value);
    }

    /// Clears the transformed body. Each matched entry transforms afresh.
    pub fn clear_body(&mut self) {
        self.body = None;
    }

    /// Returns request-scoped extensions set by middleware or the host.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns mutable request-scoped extensions.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Returns the time spent on the request so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns a cheap, shareable view for handlers.
    #[must_use]
    pub fn view(&self) -> RequestView {
        RequestView {
            request: Arc::clone(&self.request),
            params: self.params.clone(),
            env: self.env.clone(),
            execution: self.execution.clone(),
            request_id: self.request_id,
        }
    }
}
