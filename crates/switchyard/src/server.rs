//! HTTP/1 server adapter.
//!
//! Drives hyper connections and hands every request to [`App::handle`]
//! with the shared environment bindings and a fresh execution context.
//! Upgrades are enabled, so mounted gateways can take over a connection.
//!
//! ```rust,ignore
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! switchyard::server::serve(listener, Arc::new(app), Environment::new()).await?;
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use switchyard_core::{DispatchError, Environment, ExecutionContext, Response};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::app::App;

/// Errors raised by the server loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener failed.
    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serves `app` on `listener` until the task is dropped.
///
/// # Errors
///
/// Returns an error if the listener's address cannot be read.
pub async fn serve(listener: TcpListener, app: Arc<App>, env: Environment) -> Result<(), ServerError> {
    serve_with_shutdown(listener, app, env, std::future::pending()).await
}

/// Serves `app` on `listener` until `shutdown` completes.
///
/// Connections already accepted keep running on their own tasks.
///
/// # Errors
///
/// Returns an error if the listener's address cannot be read.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    app: Arc<App>,
    env: Environment,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send,
{
    tracing::info!("Server listening on {}", listener.local_addr()?);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => match result {
                Ok((stream, remote_addr)) => {
                    let app = Arc::clone(&app);
                    let env = env.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, app, env).await {
                            tracing::debug!("Connection error from {}: {}", remote_addr, e);
                        }
                    });
                }
                Err(e) => tracing::error!("Failed to accept connection: {}", e),
            },
            () = &mut shutdown => {
                tracing::info!("Shutdown signal received, stopping server");
                break;
            }
        }
    }
    Ok(())
}

async fn serve_connection(stream: TcpStream, app: Arc<App>, env: Environment) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let service = service_fn(move |request: Request<Incoming>| {
        let app = Arc::clone(&app);
        let env = env.clone();
        async move { Ok::<_, Infallible>(handle_request(&app, request, env).await) }
    });

    http1::Builder::new()
        .serve_connection(io, service)
        .with_upgrades()
        .await
}

async fn handle_request(app: &App, request: Request<Incoming>, env: Environment) -> Response {
    let (parts, body) = request.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            return app
                .handle_error(DispatchError::bad_request(format!(
                    "Failed to read request body: {e}"
                )))
                .await;
        }
    };
    app.handle(Request::from_parts(parts, body), env, ExecutionContext::new())
        .await
}

/// Binds a listener on `addr`.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    Ok(TcpListener::bind(addr).await?)
}
