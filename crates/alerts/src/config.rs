//! Alert job configuration types.

use betwatch_core::RiskRules;
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Default request timeout for both outbound clients.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the ClickHouse HTTP interface.
#[derive(Clone)]
pub struct ClickHouseConfig {
    /// Hostname, without scheme
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Database holding the casino tables
    pub database: String,
    /// Use HTTPS
    pub secure: bool,
    pub timeout: Duration,
}

impl std::fmt::Debug for ClickHouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("secure", &self.secure)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClickHouseConfig {
    pub const DEFAULT_DATABASE: &'static str = "casino_dbt_source";
    pub const SECURE_PORT: u16 = 8443;
    pub const PLAIN_PORT: u16 = 8123;

    /// Create a TLS config on the default port and database.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: Self::SECURE_PORT,
            user: user.into(),
            password: password.into(),
            database: Self::DEFAULT_DATABASE.to_string(),
            secure: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Base URL of the HTTP interface.
    pub fn endpoint(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}/", scheme, self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing("CLICKHOUSE_HOST"));
        }
        if self.host.contains("://") || self.host.contains('/') {
            return Err(ConfigError::invalid(
                "CLICKHOUSE_HOST",
                "expected a bare hostname without scheme or path",
            ));
        }
        if self.user.trim().is_empty() {
            return Err(ConfigError::Missing("CLICKHOUSE_USER"));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::invalid("CLICKHOUSE_DATABASE", "must not be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid("CLICKHOUSE_PORT", "must be non-zero"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("BETWATCH_HTTP_TIMEOUT_SECS", "must be positive"));
        }
        Ok(())
    }
}

/// Slack incoming webhook settings.
#[derive(Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub timeout: Duration,
}

// The webhook path is a bearer secret; only the host is printed.
impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let host = Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "invalid".to_string());
        f.debug_struct("WebhookConfig")
            .field("host", &host)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing("SLACK_WEBHOOK_URL"));
        }
        let url = Url::parse(&self.url)
            .map_err(|e| ConfigError::invalid("SLACK_WEBHOOK_URL", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "SLACK_WEBHOOK_URL",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if url.host_str().is_none() {
            return Err(ConfigError::invalid("SLACK_WEBHOOK_URL", "missing host"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::invalid("BETWATCH_HTTP_TIMEOUT_SECS", "must be positive"));
        }
        Ok(())
    }
}

/// Everything one run of the alert job needs.
#[derive(Debug, Clone)]
pub struct AlertJobConfig {
    pub clickhouse: ClickHouseConfig,
    pub webhook: WebhookConfig,
    pub rules: RiskRules,
}

impl AlertJobConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clickhouse.validate()?;
        self.webhook.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clickhouse_defaults() {
        let config = ClickHouseConfig::new("ch.internal", "reader", "secret");
        assert_eq!(config.port, 8443);
        assert!(config.secure);
        assert_eq!(config.database, "casino_dbt_source");
        assert_eq!(config.endpoint(), "https://ch.internal:8443/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_clickhouse_plain_endpoint() {
        let config = ClickHouseConfig {
            port: 8123,
            secure: false,
            ..ClickHouseConfig::new("localhost", "default", "")
        };
        assert_eq!(config.endpoint(), "http://localhost:8123/");
    }

    #[test]
    fn test_clickhouse_rejects_scheme_in_host() {
        let config = ClickHouseConfig::new("https://ch.internal", "reader", "secret");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "CLICKHOUSE_HOST", .. })
        ));
    }

    #[test]
    fn test_clickhouse_requires_user() {
        let config = ClickHouseConfig::new("ch.internal", " ", "secret");
        assert_eq!(config.validate(), Err(ConfigError::Missing("CLICKHOUSE_USER")));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let ch = ClickHouseConfig::new("ch.internal", "reader", "hunter2");
        assert!(!format!("{:?}", ch).contains("hunter2"));

        let hook = WebhookConfig::new("https://hooks.slack.com/services/T000/B000/XXXX");
        let printed = format!("{:?}", hook);
        assert!(printed.contains("hooks.slack.com"));
        assert!(!printed.contains("XXXX"));
    }

    #[test]
    fn test_webhook_validation() {
        assert!(WebhookConfig::new("https://hooks.slack.com/services/T/B/X")
            .validate()
            .is_ok());
        assert_eq!(
            WebhookConfig::new("").validate(),
            Err(ConfigError::Missing("SLACK_WEBHOOK_URL"))
        );
        assert!(WebhookConfig::new("not a url").validate().is_err());
        assert!(WebhookConfig::new("ftp://example.com/hook").validate().is_err());
    }
}
