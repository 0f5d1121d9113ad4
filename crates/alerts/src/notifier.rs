//! Hourly alert job: fetch flagged rounds, format, deliver.

use crate::config::AlertJobConfig;
use crate::db::{ClickHouseClient, QueryError};
use crate::slack::{format_alert_message, DeliveryError, SlackWebhook, WebhookMessage};
use betwatch_core::{BettingEvent, RiskRules};
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Source of flagged betting events.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    async fn fetch(&self, rules: &RiskRules) -> Result<Vec<BettingEvent>, QueryError>;
}

/// Destination for the formatted alert.
#[allow(async_fn_in_trait)]
pub trait AlertSink {
    async fn deliver(&self, message: &WebhookMessage) -> Result<(), DeliveryError>;
}

impl EventSource for ClickHouseClient {
    async fn fetch(&self, rules: &RiskRules) -> Result<Vec<BettingEvent>, QueryError> {
        self.fetch_flagged_events(rules).await
    }
}

impl AlertSink for SlackWebhook {
    async fn deliver(&self, message: &WebhookMessage) -> Result<(), DeliveryError> {
        self.send(message).await
    }
}

/// Sink that logs the payload instead of posting it.
#[derive(Debug, Default)]
pub struct DryRunSink;

impl AlertSink for DryRunSink {
    async fn deliver(&self, message: &WebhookMessage) -> Result<(), DeliveryError> {
        let payload = serde_json::to_string_pretty(message)?;
        info!(payload = %payload, "Dry run: alert not delivered");
        Ok(())
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobReport {
    /// Rows that matched the risk condition
    pub flagged: usize,
}

/// One fetch-format-send cycle.
pub struct AlertJob<S, K> {
    source: S,
    sink: K,
    rules: RiskRules,
}

impl<S: EventSource, K: AlertSink> AlertJob<S, K> {
    pub fn new(source: S, sink: K, rules: RiskRules) -> Self {
        Self {
            source,
            sink,
            rules,
        }
    }

    /// Run using the local wall clock for the message heading.
    pub async fn run(&self) -> Result<JobReport, JobError> {
        self.run_at(chrono::Local::now().naive_local()).await
    }

    /// Run with an explicit heading timestamp.
    ///
    /// Nothing is delivered when the fetch fails.
    pub async fn run_at(&self, now: NaiveDateTime) -> Result<JobReport, JobError> {
        let events = self.source.fetch(&self.rules).await.map_err(|e| {
            error!(error = %e, "ClickHouse query failed");
            e
        })?;

        info!(flagged = events.len(), "Fetched betting activity");
        let message = format_alert_message(&events, now);

        self.sink.deliver(&message).await.map_err(|e| {
            error!(error = %e, "Failed to send alert");
            e
        })?;

        info!(flagged = events.len(), "Alert sent successfully");
        Ok(JobReport {
            flagged: events.len(),
        })
    }

    #[cfg(test)]
    fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }
}

/// Build clients from configuration, run the job once and drop them.
///
/// With `dry_run` the webhook is never contacted and the payload is logged.
pub async fn run_once(config: &AlertJobConfig, dry_run: bool) -> Result<JobReport, JobError> {
    let source = ClickHouseClient::connect(&config.clickhouse)?;

    if dry_run {
        return AlertJob::new(source, DryRunSink, config.rules.clone())
            .run()
            .await;
    }

    let sink = SlackWebhook::new(&config.webhook)?;
    AlertJob::new(source, sink, config.rules.clone()).run().await
}
