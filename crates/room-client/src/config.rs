//! Room client configuration.
//!
//! Configuration is loaded from environment variables by the binary, or built
//! directly with [`Config::new`] by a host application. The API key is held
//! as a [`SecretString`] and redacted in Debug output.

use common::secret::SecretString;
use common::types::RoomName;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default signaling discovery endpoint.
pub const DEFAULT_DISCOVERY_URL: &str = "https://dispatcher.webrtc.ecl.ntt.com/signaling";

/// Default `Origin` header sent on discovery and WebSocket upgrade requests.
pub const DEFAULT_ORIGIN: &str = "https://minecraft-voice-chat-test.web.app";

/// Default interval between application-level `PING` events.
pub const DEFAULT_KEEPALIVE_INTERVAL_SECONDS: u64 = 25;

/// Default timeout for the discovery request.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Payload sent to the room when another participant joins.
pub const DEFAULT_GREETING: &str = "from minecraft";

/// Room client configuration.
#[derive(Clone)]
pub struct Config {
    /// Application API key, sent as the `apiKey` connection parameter.
    pub api_key: SecretString,

    /// Room to join after connecting.
    pub room_id: RoomName,

    /// Discovery endpoint returning `{"domain": ...}`.
    pub discovery_url: String,

    /// Application origin.
    pub origin: String,

    /// Interval between keepalive `PING` events (default: 25s).
    pub keepalive_interval: Duration,

    /// Timeout for the discovery request and the WebSocket upgrade, in
    /// seconds (default: 10).
    pub http_timeout_seconds: u64,

    /// Data broadcast when a participant joins the room.
    pub greeting: String,

    /// Prometheus listener address; metrics are not exported when unset.
    pub metrics_bind_address: Option<String>,

    /// Emit JSON log lines instead of human-readable output.
    pub log_json: bool,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("room_id", &self.room_id)
            .field("discovery_url", &self.discovery_url)
            .field("origin", &self.origin)
            .field("keepalive_interval", &self.keepalive_interval)
            .field("http_timeout_seconds", &self.http_timeout_seconds)
            .field("greeting", &self.greeting)
            .field("metrics_bind_address", &self.metrics_bind_address)
            .field("log_json", &self.log_json)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Configuration with defaults for everything except the credentials.
    pub fn new(api_key: SecretString, room_id: impl Into<RoomName>) -> Self {
        Self {
            api_key,
            room_id: room_id.into(),
            discovery_url: DEFAULT_DISCOVERY_URL.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            keepalive_interval: Duration::from_secs(DEFAULT_KEEPALIVE_INTERVAL_SECONDS),
            http_timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS,
            greeting: DEFAULT_GREETING.to_string(),
            metrics_bind_address: None,
            log_json: false,
        }
    }

    /// Point discovery at another endpoint.
    #[must_use]
    pub fn with_discovery_url(mut self, url: impl Into<String>) -> Self {
        self.discovery_url = url.into();
        self
    }

    /// Set the keepalive interval. Sub-second precision is kept.
    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    pub fn keepalive_interval(&self) -> Duration {
        self.keepalive_interval
    }

    /// HTTP timeout as a [`Duration`].
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = SecretString::from(
            vars.get("RC_API_KEY")
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar("RC_API_KEY".to_string()))?
                .clone(),
        );

        let room_id = vars
            .get("RC_ROOM_ID")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("RC_ROOM_ID".to_string()))?
            .as_str();

        let mut config = Config::new(api_key, room_id);

        if let Some(url) = vars.get("RC_DISCOVERY_URL") {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "RC_DISCOVERY_URL must be an http(s) URL, got '{url}'"
                )));
            }
            config.discovery_url.clone_from(url);
        }

        if let Some(origin) = vars.get("RC_ORIGIN") {
            config.origin.clone_from(origin);
        }

        if let Some(greeting) = vars.get("RC_GREETING") {
            config.greeting.clone_from(greeting);
        }

        config.keepalive_interval = Duration::from_secs(parse_seconds(
            vars,
            "RC_KEEPALIVE_INTERVAL_SECONDS",
            DEFAULT_KEEPALIVE_INTERVAL_SECONDS,
        )?);

        config.http_timeout_seconds =
            parse_seconds(vars, "RC_HTTP_TIMEOUT_SECONDS", DEFAULT_HTTP_TIMEOUT_SECONDS)?;

        config.metrics_bind_address = vars.get("RC_METRICS_BIND_ADDRESS").cloned();

        config.log_json = vars
            .get("RC_LOG_JSON")
            .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1");

        Ok(config)
    }
}

/// Parse a positive number of seconds, falling back to `default` when unset.
fn parse_seconds(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    match raw.parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidValue(format!(
            "{name} must be a positive integer, got '{raw}'"
        ))),
        Ok(seconds) => Ok(seconds),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "RC_API_KEY".to_string(),
                "5bea388b-3f95-4e1e-acb5-a34efdd0c480".to_string(),
            ),
            ("RC_ROOM_ID".to_string(), "room1".to_string()),
        ])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(
            config.api_key.expose_secret(),
            "5bea388b-3f95-4e1e-acb5-a34efdd0c480"
        );
        assert_eq!(config.room_id.as_str(), "room1");
        assert_eq!(config.discovery_url, DEFAULT_DISCOVERY_URL);
        assert_eq!(config.origin, DEFAULT_ORIGIN);
        assert_eq!(config.keepalive_interval(), Duration::from_secs(25));
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.greeting, "from minecraft");
        assert!(config.metrics_bind_address.is_none());
        assert!(!config.log_json);
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert(
            "RC_DISCOVERY_URL".to_string(),
            "http://localhost:8080/signaling".to_string(),
        );
        vars.insert("RC_ORIGIN".to_string(), "https://example.test".to_string());
        vars.insert("RC_KEEPALIVE_INTERVAL_SECONDS".to_string(), "5".to_string());
        vars.insert("RC_HTTP_TIMEOUT_SECONDS".to_string(), "3".to_string());
        vars.insert(
            "RC_METRICS_BIND_ADDRESS".to_string(),
            "127.0.0.1:9100".to_string(),
        );
        vars.insert("RC_LOG_JSON".to_string(), "true".to_string());
        vars.insert("RC_GREETING".to_string(), "hello".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.discovery_url, "http://localhost:8080/signaling");
        assert_eq!(config.origin, "https://example.test");
        assert_eq!(config.keepalive_interval(), Duration::from_secs(5));
        assert_eq!(config.http_timeout_seconds, 3);
        assert_eq!(config.metrics_bind_address.as_deref(), Some("127.0.0.1:9100"));
        assert!(config.log_json);
        assert_eq!(config.greeting, "hello");
    }

    #[test]
    fn test_from_vars_missing_api_key() {
        let mut vars = base_vars();
        vars.remove("RC_API_KEY");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "RC_API_KEY"));
    }

    #[test]
    fn test_from_vars_empty_room_id_is_missing() {
        let mut vars = base_vars();
        vars.insert("RC_ROOM_ID".to_string(), String::new());

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "RC_ROOM_ID"));
    }

    #[test]
    fn test_from_vars_rejects_bad_interval() {
        for bad in ["0", "-1", "soon"] {
            let mut vars = base_vars();
            vars.insert("RC_KEEPALIVE_INTERVAL_SECONDS".to_string(), bad.to_string());
            assert!(
                matches!(Config::from_vars(&vars), Err(ConfigError::InvalidValue(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_vars_rejects_non_http_discovery_url() {
        let mut vars = base_vars();
        vars.insert(
            "RC_DISCOVERY_URL".to_string(),
            "ftp://dispatcher".to_string(),
        );
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = Config::new(SecretString::from("abc"), "room1")
            .with_discovery_url("http://127.0.0.1:1/signaling")
            .with_keepalive_interval(Duration::from_secs(2));

        assert_eq!(config.room_id, RoomName::new("room1"));
        assert_eq!(config.discovery_url, "http://127.0.0.1:1/signaling");
        assert_eq!(config.keepalive_interval(), Duration::from_secs(2));
        assert_eq!(config.origin, DEFAULT_ORIGIN);
    }

    #[test]
    fn test_keepalive_interval_keeps_sub_second_precision() {
        let config = Config::new(SecretString::from("abc"), "room1")
            .with_keepalive_interval(Duration::from_millis(1500));

        assert_eq!(config.keepalive_interval(), Duration::from_millis(1500));
    }

    #[test]
    fn test_debug_redacts_sensitive_fields() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("5bea388b"));
        assert!(debug_output.contains("room1"));
    }
}
