//! # Switchyard
//!
//! Declarative request dispatch for HTTP controllers and WebSocket gateways.
//!
//! Components declare their routes, message subscriptions, middleware and
//! exception handlers once. [`App`] mounts them into an ordered route table
//! and dispatches each request through a fixed pipeline:
//!
//! ```text
//! body intake → component middleware → endpoint middleware
//!     → body transform → body validation → handler → {data, status}
//!                   ↓ error
//!     endpoint handlers → component handlers → global handlers → 500
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use switchyard::prelude::*;
//!
//! #[derive(Default)]
//! struct Health;
//! injectable!(Health => Singleton);
//!
//! impl Component for Health {
//!     fn invoke(self: Arc<Self>, handler: &str, _args: Arguments) -> BoxFuture<'static, DispatchResult<Value>> {
//!         match handler {
//!             "check" => Box::pin(async { Ok(json!({ "ok": true })) }),
//!             other => unknown_handler::<Self>(other),
//!         }
//!     }
//! }
//!
//! impl Declare for Health {
//!     fn declare(d: &mut Declaration<'_, Self>) {
//!         d.controller("/health");
//!         d.get("/", "check");
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mut app = App::default();
//! app.register_routes::<Health>().unwrap();
//!
//! let request = http::Request::get("/health").body(bytes::Bytes::new()).unwrap();
//! let response = app.handle(request, Environment::new(), ExecutionContext::new()).await;
//! assert_eq!(response.status(), 200);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;
mod mount;
pub mod server;

pub use app::App;
pub use error::{MountError, MountResult};

pub use switchyard_config as config;
pub use switchyard_core as core;
pub use switchyard_extract as extract;
pub use switchyard_middleware as middleware;
pub use switchyard_router as router;
pub use switchyard_telemetry as telemetry;
pub use switchyard_ws as ws;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use switchyard::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{App, MountError, MountResult};

    pub use switchyard_core::{
        injectable, tags, to_json, unknown_handler, Arguments, BodyType, BoxFuture, Component,
        Container, Declaration, Declare, DispatchError, DispatchResult, Environment, ErrorTag,
        ExceptionHandler, ExceptionHandlerRef, ExecutionContext, Injectable, InjectionError,
        Lifecycle, Middleware, MiddlewareRef, Outcome, ParamSpec, RequestContext,
        ResolutionPolicy, StageResult, Transformer, Validate, Violation,
    };

    pub use switchyard_extract::{IntegerTransformer, UuidTransformer};

    pub use switchyard_config::{ConfigLoader, SwitchyardConfig};

    pub use switchyard_telemetry::{init_logging, LogConfig, Logger, TracingLogger};

    pub use serde_json::{json, Value};
}
