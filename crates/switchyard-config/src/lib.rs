//! Typed configuration for Switchyard.
//!
//! - TOML and JSON files
//! - Environment variable overrides (`PREFIX__SECTION__KEY`)
//! - Strict parsing: unknown fields are rejected
//!
//! # Configuration File Format
//!
//! ```toml
//! [dispatch]
//! cors_origin = "https://app.example.com"
//! resolution_policy = "first_match"   # or "most_specific"
//! body_methods = ["POST", "PUT", "PATCH"]
//!
//! [gateway]
//! protocol = "websocket"
//! max_message_bytes = 65536
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"                     # or "pretty"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `SWITCHYARD__DISPATCH__CORS_ORIGIN=*`
//! - `SWITCHYARD__DISPATCH__BODY_METHODS=POST,PUT`
//! - `SWITCHYARD__GATEWAY__MAX_MESSAGE_BYTES=1048576`
//! - `SWITCHYARD__LOGGING__LEVEL=debug`

#![doc(html_root_url = "https://docs.rs/switchyard-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{DispatchConfig, GatewayConfig, LoggingConfig, SwitchyardConfig};
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
