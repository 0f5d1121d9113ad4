//! Hourly betting risk alerts.
//!
//! This crate provides:
//! - ClickHouse reader for rounds matching the risk condition
//! - Slack message rendering and webhook delivery
//! - The alert job tying both together

pub mod config;
pub mod db;
pub mod notifier;
pub mod slack;

pub use config::{AlertJobConfig, ClickHouseConfig, ConfigError, WebhookConfig};
pub use db::{ClickHouseClient, QueryError};
pub use notifier::{run_once, AlertJob, AlertSink, DryRunSink, EventSource, JobError, JobReport};
pub use slack::{format_alert_message, DeliveryError, SlackWebhook, WebhookMessage};
