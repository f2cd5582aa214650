//! # Switchyard WebSocket gateways
//!
//! A gateway is a component mounted at a root path whose handlers are
//! keyed by message name instead of HTTP method.
//!
//! - [`check_upgrade`] and [`upgrade_response`] perform the opening
//!   handshake. The `Upgrade` header must equal the configured protocol
//!   token.
//! - [`GatewayDispatcher`] owns one channel's dispatch table. Inbound
//!   frames are `{"message": <name>, "value": <payload>}`; each subscribed
//!   handler's result is sent back on the same channel.
//!
//! ```rust,ignore
//! let accept = check_upgrade(&request, "websocket")?;
//! let response = upgrade_response(&accept, "websocket")?;
//! Arc::new(dispatcher).spawn(hyper::upgrade::on(&mut request));
//! ```

#![doc(html_root_url = "https://docs.rs/switchyard-ws/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dispatcher;
mod error;
mod upgrade;

pub use dispatcher::{GatewayDispatcher, MessageRoute};
pub use error::{WsError, WsResult};
pub use upgrade::{check_upgrade, compute_accept_key, upgrade_response};
