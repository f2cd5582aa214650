//! Configuration types.

use http::Method;
use serde::{Deserialize, Serialize};
use switchyard_core::ResolutionPolicy;
use switchyard_telemetry::{LogConfig, LogFormat};

use crate::error::{ConfigError, ConfigResult};

/// Complete Switchyard configuration.
///
/// ```
/// use switchyard_config::SwitchyardConfig;
///
/// let config = SwitchyardConfig::default();
/// assert_eq!(config.gateway.protocol, "websocket");
/// assert!(config.dispatch.cors_origin.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct SwitchyardConfig {
    /// Dispatch settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SwitchyardConfig {
    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        self.dispatch.body_methods()?;

        if let Some(origin) = &self.dispatch.cors_origin {
            if origin.is_empty() {
                return Err(ConfigError::invalid_value(
                    "dispatch.cors_origin",
                    "must not be empty; omit it to disable CORS",
                ));
            }
            if http::HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::invalid_value(
                    "dispatch.cors_origin",
                    "not a valid header value",
                ));
            }
        }

        if self.gateway.protocol.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "gateway.protocol",
                "must not be empty",
            ));
        }
        if self.gateway.max_message_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "gateway.max_message_bytes",
                "must be greater than zero",
            ));
        }

        switchyard_telemetry::create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        Ok(())
    }
}

/// Dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Value of `access-control-allow-origin` added to every response.
    #[serde(default)]
    pub cors_origin: Option<String>,

    /// How a handler is picked when several in one scope accept an error.
    #[serde(default)]
    pub resolution_policy: ResolutionPolicy,

    /// Methods whose requests carry a JSON body.
    #[serde(default = "default_body_methods")]
    pub body_methods: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cors_origin: None,
            resolution_policy: ResolutionPolicy::default(),
            body_methods: default_body_methods(),
        }
    }
}

impl DispatchConfig {
    /// Parses the body-carrying methods.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a method name is invalid.
    pub fn body_methods(&self) -> ConfigResult<Vec<Method>> {
        self.body_methods
            .iter()
            .map(|name| {
                Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes()).map_err(|_| {
                    ConfigError::invalid_value(
                        "dispatch.body_methods",
                        format!("'{name}' is not an HTTP method"),
                    )
                })
            })
            .collect()
    }
}

fn default_body_methods() -> Vec<String> {
    ["POST", "PUT", "PATCH"].map(String::from).to_vec()
}

/// Gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Token the `Upgrade` header must carry.
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Largest accepted inbound message.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

fn default_protocol() -> String {
    "websocket".to_string()
}

const fn default_max_message_bytes() -> usize {
    64 * 1024
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Whether to install a subscriber.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Converts to the telemetry crate's [`LogConfig`].
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            ..LogConfig::default()
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}
