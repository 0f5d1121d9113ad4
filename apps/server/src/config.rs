//! Application configuration from environment variables.

use betwatch_alerts::{AlertJobConfig, ClickHouseConfig, ConfigError, WebhookConfig};
use betwatch_core::RiskRules;
use std::time::Duration;

pub const CLICKHOUSE_HOST: &str = "CLICKHOUSE_HOST";
pub const CLICKHOUSE_PORT: &str = "CLICKHOUSE_PORT";
pub const CLICKHOUSE_USER: &str = "CLICKHOUSE_USER";
pub const CLICKHOUSE_PASSWORD: &str = "CLICKHOUSE_PASSWORD";
pub const CLICKHOUSE_DATABASE: &str = "CLICKHOUSE_DATABASE";
pub const CLICKHOUSE_SECURE: &str = "CLICKHOUSE_SECURE";
pub const SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";
pub const HTTP_TIMEOUT_SECS: &str = "BETWATCH_HTTP_TIMEOUT_SECS";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub job: AlertJobConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup` and validate it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secure = match optional(CLICKHOUSE_SECURE) {
            Some(value) => parse_bool(CLICKHOUSE_SECURE, &value)?,
            None => true,
        };

        let port = match optional(CLICKHOUSE_PORT) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid(CLICKHOUSE_PORT, e.to_string()))?,
            None if secure => ClickHouseConfig::SECURE_PORT,
            None => ClickHouseConfig::PLAIN_PORT,
        };

        let timeout = match optional(HTTP_TIMEOUT_SECS) {
            Some(value) => Duration::from_secs(
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::invalid(HTTP_TIMEOUT_SECS, e.to_string()))?,
            ),
            None => betwatch_alerts::config::DEFAULT_TIMEOUT,
        };

        let clickhouse = ClickHouseConfig {
            host: required(CLICKHOUSE_HOST)?.trim().to_string(),
            port,
            user: required(CLICKHOUSE_USER)?.trim().to_string(),
            password: required(CLICKHOUSE_PASSWORD)?,
            database: optional(CLICKHOUSE_DATABASE)
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| ClickHouseConfig::DEFAULT_DATABASE.to_string()),
            secure,
            timeout,
        };

        let webhook = WebhookConfig {
            url: required(SLACK_WEBHOOK_URL)?.trim().to_string(),
            timeout,
        };

        let job = AlertJobConfig {
            clickhouse,
            webhook,
            rules: RiskRules::default(),
        };
        job.validate()?;

        Ok(Self { job })
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(name, format!("expected a boolean, got '{}'", other))),
    }
}
