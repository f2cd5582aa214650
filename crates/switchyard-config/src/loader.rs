//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use switchyard_core::ResolutionPolicy;
use switchyard_telemetry::LogFormat;

use crate::error::{ConfigError, ConfigResult};
use crate::SwitchyardConfig;

/// Loads configuration in layers, later layers overriding earlier ones:
///
/// 1. Defaults
/// 2. A TOML or JSON file, or a string
/// 3. Environment variables (`PREFIX__SECTION__KEY`)
///
/// ```no_run
/// use switchyard_config::ConfigLoader;
///
/// # fn main() -> Result<(), switchyard_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("switchyard.toml")?
///     .with_env_prefix("SWITCHYARD")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: SwitchyardConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = SwitchyardConfig::default();
        self
    }

    /// Loads a file. The format follows the extension (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, malformed or
    /// contains unknown fields.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
        self.with_string(&content, format)
    }

    /// Loads a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> ConfigResult<Self> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `format` (`"toml"` or `"json"`).
    ///
    /// ```
    /// use switchyard_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[dispatch]\ncors_origin = \"*\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.dispatch.cors_origin.as_deref(), Some("*"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the format is unsupported or parsing fails.
    pub fn with_string(mut self, content: &str, format: &str) -> ConfigResult<Self> {
        self.config = match format.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        Ok(self)
    }

    /// Reads overrides from variables named `PREFIX__SECTION__KEY` at load.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_ascii_uppercase());
        self
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Returns an error if an override cannot be parsed or validation fails.
    pub fn load(mut self) -> ConfigResult<SwitchyardConfig> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            for (key, value) in env::vars().filter(|(k, _)| k.starts_with(&marker)) {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without validating it.
    #[must_use]
    pub fn load_unvalidated(self) -> SwitchyardConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> ConfigResult<()> {
        let rest = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;
        let parts: Vec<&str> = rest.split("__").collect();

        match parts.as_slice() {
            ["DISPATCH", "CORS_ORIGIN"] => {
                self.config.dispatch.cors_origin = (!value.is_empty()).then(|| value.to_string());
            }
            ["DISPATCH", "RESOLUTION_POLICY"] => {
                self.config.dispatch.resolution_policy = match value.to_ascii_lowercase().as_str() {
                    "first_match" => ResolutionPolicy::FirstMatch,
                    "most_specific" => ResolutionPolicy::MostSpecific,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'first_match' or 'most_specific'",
                        ))
                    }
                };
            }
            ["DISPATCH", "BODY_METHODS"] => {
                self.config.dispatch.body_methods = value
                    .split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(String::from)
                    .collect();
            }
            ["GATEWAY", "PROTOCOL"] => {
                self.config.gateway.protocol = value.to_string();
            }
            ["GATEWAY", "MAX_MESSAGE_BYTES"] => {
                self.config.gateway.max_message_bytes = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
            }
            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_ascii_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            _ => {}
        }

        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().with_defaults().load().unwrap();
        assert_eq!(config, SwitchyardConfig::default());
    }

    #[test]
    fn test_with_string_toml() {
        let toml = r#"
            [dispatch]
            cors_origin = "https://example.com"
            resolution_policy = "most_specific"
            body_methods = ["POST"]

            [gateway]
            max_message_bytes = 1024

            [logging]
            level = "debug"
            format = "pretty"
        "#;
        let config = ConfigLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(
            config.dispatch.cors_origin.as_deref(),
            Some("https://example.com")
        );
        assert_eq!(
            config.dispatch.resolution_policy,
            ResolutionPolicy::MostSpecific
        );
        assert_eq!(config.dispatch.body_methods, vec!["POST"]);
        assert_eq!(config.gateway.protocol, "websocket");
        assert_eq!(config.gateway.max_message_bytes, 1024);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_with_string_json() {
        let json = r#"{"gateway": {"protocol": "chat"}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "JSON")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.gateway.protocol, "chat");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result = ConfigLoader::new().with_string("[dispatch]\nretries = 3", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));

        let result = ConfigLoader::new().with_string(r#"{"server": {}}"#, "json");
        assert!(matches!(result, Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ConfigLoader::new().with_string("a: b", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(f)) if f == "yaml"));
    }

    #[test]
    fn test_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[dispatch]\ncors_origin = \"*\"").unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.dispatch.cors_origin.as_deref(), Some("*"));
    }

    #[test]
    fn test_with_file_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/switchyard.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));

        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/switchyard.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, SwitchyardConfig::default());
    }

    #[test]
    fn test_load_validates() {
        let result = ConfigLoader::new()
            .with_string("[gateway]\nmax_message_bytes = 0", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    // Process environment is not mutated in tests; overrides go through
    // apply_env_var directly.

    #[test]
    fn test_apply_env_dispatch() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("SY__DISPATCH__CORS_ORIGIN", "*", "SY")
            .unwrap();
        loader
            .apply_env_var("SY__DISPATCH__RESOLUTION_POLICY", "most_specific", "SY")
            .unwrap();
        loader
            .apply_env_var("SY__DISPATCH__BODY_METHODS", "post, delete", "SY")
            .unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.dispatch.cors_origin.as_deref(), Some("*"));
        assert_eq!(
            config.dispatch.resolution_policy,
            ResolutionPolicy::MostSpecific
        );
        assert_eq!(config.dispatch.body_methods, vec!["post", "delete"]);
    }

    #[test]
    fn test_apply_env_clears_cors() {
        let mut loader = ConfigLoader::new()
            .with_string("[dispatch]\ncors_origin = \"*\"", "toml")
            .unwrap();
        loader
            .apply_env_var("SY__DISPATCH__CORS_ORIGIN", "", "SY")
            .unwrap();
        assert!(loader.load_unvalidated().dispatch.cors_origin.is_none());
    }

    #[test]
    fn test_apply_env_gateway_and_logging() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("SY__GATEWAY__MAX_MESSAGE_BYTES", "2048", "SY")
            .unwrap();
        loader
            .apply_env_var("SY__LOGGING__FORMAT", "pretty", "SY")
            .unwrap();
        loader
            .apply_env_var("SY__LOGGING__ENABLED", "off", "SY")
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.gateway.max_message_bytes, 2048);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_apply_env_invalid_values() {
        let mut loader = ConfigLoader::new();
        assert!(loader
            .apply_env_var("SY__GATEWAY__MAX_MESSAGE_BYTES", "lots", "SY")
            .is_err());
        assert!(loader
            .apply_env_var("SY__DISPATCH__RESOLUTION_POLICY", "random", "SY")
            .is_err());
        assert!(loader
            .apply_env_var("SY__LOGGING__ENABLED", "maybe", "SY")
            .is_err());
    }

    #[test]
    fn test_apply_env_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("SY__SERVER__PORT", "80", "SY").is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool(""), None);
    }
}
