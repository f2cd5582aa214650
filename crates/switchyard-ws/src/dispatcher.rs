//! Per-channel message dispatch.

use std::sync::Arc;

use futures_util::stream::FuturesUnordered;
use futures_util::{SinkExt, StreamExt};
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use serde_json::Value;
use switchyard_core::{Arguments, Component};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, warn};
use tungstenite::protocol::Role;
use tungstenite::Message;

use crate::error::WsResult;

/// An inbound frame: `{"message": <name>, "value": <payload>}`.
#[derive(Debug, Deserialize)]
struct Inbound {
    message: String,
    #[serde(default)]
    value: Value,
}

/// One subscribed message name and the handler it invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRoute {
    /// Message name matched against inbound frames.
    pub message: String,
    /// Handler key passed to the component.
    pub handler: String,
}

impl MessageRoute {
    /// Creates a route.
    pub fn new(message: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            handler: handler.into(),
        }
    }
}

/// Dispatches a channel's inbound messages to one gateway component.
///
/// Every route whose message name matches an inbound frame is invoked, in
/// declaration order, and each result is sent back on the same channel.
/// Strings go out as-is, other values as JSON. `null` results send nothing.
pub struct GatewayDispatcher {
    path: String,
    component: Arc<dyn Component>,
    routes: Vec<MessageRoute>,
    max_message_bytes: usize,
}

impl GatewayDispatcher {
    /// Creates a dispatcher for the gateway mounted at `path`.
    pub fn new(
        path: impl Into<String>,
        component: Arc<dyn Component>,
        routes: Vec<MessageRoute>,
    ) -> Self {
        Self {
            path: path.into(),
            component,
            routes,
            max_message_bytes: usize::MAX,
        }
    }

    /// Drops inbound frames larger than `limit` bytes.
    #[must_use]
    pub fn with_max_message_bytes(mut self, limit: usize) -> Self {
        self.max_message_bytes = limit;
        self
    }

    /// Returns the mount path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the subscribed routes.
    #[must_use]
    pub fn routes(&self) -> &[MessageRoute] {
        &self.routes
    }

    /// Handles one inbound text frame and returns the replies to send.
    ///
    /// Frames that are oversized or not `{message, value}` JSON are logged
    /// and produce no replies. Handler errors are logged and skipped.
    pub async fn dispatch(&self, raw: &str) -> Vec<String> {
        if raw.len() > self.max_message_bytes {
            warn!(
                gateway = %self.path,
                size = raw.len(),
                limit = self.max_message_bytes,
                "dropping oversized gateway message"
            );
            return Vec::new();
        }

        let inbound: Inbound = match serde_json::from_str(raw) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(gateway = %self.path, error = %e, "dropping malformed gateway message");
                return Vec::new();
            }
        };
        switchyard_telemetry::metrics::record_gateway_message(&self.path);

        let mut replies = Vec::new();
        let mut matched = false;
        for route in self.routes.iter().filter(|r| r.message == inbound.message) {
            matched = true;
            let args = Arguments::message(inbound.value.clone());
            match Arc::clone(&self.component).invoke(&route.handler, args).await {
                Ok(Value::Null) => {}
                Ok(Value::String(text)) => replies.push(text),
                Ok(other) => replies.push(other.to_string()),
                Err(e) => error!(
                    gateway = %self.path,
                    message = %route.message,
                    handler = %route.handler,
                    error = %e,
                    "gateway handler failed"
                ),
            }
        }
        if !matched {
            debug!(gateway = %self.path, message = %inbound.message, "no subscriber for message");
        }
        replies
    }

    /// Serves an established channel until the peer closes it.
    ///
    /// Each inbound frame is dispatched on its own future, so a slow
    /// subscriber does not hold up later messages. Replies are sent as their
    /// handlers finish, which may differ from arrival order.
    ///
    /// # Errors
    ///
    /// Returns transport errors from reading or sending frames.
    pub async fn serve<S>(&self, stream: WebSocketStream<S>) -> WsResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut sink, mut source) = stream.split();
        let mut in_flight = FuturesUnordered::new();

        loop {
            tokio::select! {
                frame = source.next() => {
                    let Some(frame) = frame else { break };
                    let text = match frame? {
                        Message::Text(text) => text.as_str().to_owned(),
                        Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                            Ok(text) => text,
                            Err(_) => {
                                warn!(gateway = %self.path, "dropping non-UTF-8 binary frame");
                                continue;
                            }
                        },
                        Message::Close(_) => break,
                        _ => continue,
                    };
                    in_flight.push(async move { self.dispatch(&text).await });
                }
                Some(replies) = in_flight.next(), if !in_flight.is_empty() => {
                    for reply in replies {
                        sink.send(Message::text(reply)).await?;
                    }
                }
            }
        }

        // Finish messages already received; the peer may have stopped reading.
        while let Some(replies) = in_flight.next().await {
            for reply in replies {
                if let Err(e) = sink.send(Message::text(reply)).await {
                    debug!(gateway = %self.path, error = %e, "dropping reply after close");
                    break;
                }
            }
        }

        debug!(gateway = %self.path, "gateway channel closed");
        Ok(())
    }

    /// Waits for the HTTP connection to be handed over, then serves it as
    /// a channel on a new task.
    pub fn spawn(self: Arc<Self>, on_upgrade: OnUpgrade) -> JoinHandle<()> {
        tokio::spawn(async move {
            let upgraded = match on_upgrade.await {
                Ok(upgraded) => upgraded,
                Err(e) => {
                    warn!(gateway = %self.path, error = %e, "gateway upgrade failed");
                    return;
                }
            };
            let stream =
                WebSocketStream::from_raw_socket(TokioIo::new(upgraded), Role::Server, None).await;
            if let Err(e) = self.serve(stream).await {
                debug!(gateway = %self.path, error = %e, "gateway channel ended with error");
            }
        })
    }
}

impl std::fmt::Debug for GatewayDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayDispatcher")
            .field("path", &self.path)
            .field("routes", &self.routes)
            .field("max_message_bytes", &self.max_message_bytes)
            .finish_non_exhaustive()
    }
}
