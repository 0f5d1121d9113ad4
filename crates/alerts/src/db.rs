//! ClickHouse reader for flagged betting rounds.
//!
//! Talks to the ClickHouse HTTP interface: the SQL statement is posted as the
//! request body and rows come back as `JSONEachRow`, one JSON object per line.

use crate::config::ClickHouseConfig;
use betwatch_core::{BettingEvent, RiskRules};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("ClickHouse request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ClickHouse returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to decode row {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Build the risk query for the given rules.
///
/// Joins rounds with game and player metadata and returns the newest rows
/// first.
pub fn build_query(rules: &RiskRules, database: &str) -> String {
    format!(
        r#"
    SELECT
        e.PlayerId AS user_id,
        p.Email AS nickname,
        c.Name AS game,
        e.CreatedAt AS time,
        e.BetAmount AS bet_amount,
        e.WinAmount AS win_amount
    FROM
        {db}.external_casino_rounds_info e
    JOIN
        {db}.casino_games_for_reports c
        ON c.Id = e.CasinoGameId
    JOIN
        {db}.players p
        ON p.ID = e.PlayerId
    WHERE
        e.CurrencyId = {currency}
        AND e.Status = {status}
        AND e.CreatedAt >= now() - INTERVAL {lookback} SECOND
        AND (
            e.WinAmount >= {high_win}
            OR (e.BetAmount >= {high_bet} AND e.WinAmount = 0)
        )
    ORDER BY
        e.CreatedAt DESC
    FORMAT JSONEachRow
    "#,
        db = database,
        currency = rules.currency_id,
        status = rules.status,
        lookback = rules.lookback_secs(),
        high_win = rules.high_win_threshold,
        high_bet = rules.high_bet_threshold,
    )
}

/// HTTP client for one ClickHouse database.
///
/// Built per run and dropped with the job.
pub struct ClickHouseClient {
    http: reqwest::Client,
    endpoint: String,
    database: String,
    user: String,
    password: String,
}

impl ClickHouseClient {
    pub fn connect(config: &ClickHouseConfig) -> Result<Self, QueryError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint(),
            database: config.database.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
        })
    }

    /// Execute a statement and decode each `JSONEachRow` line into `T`.
    pub async fn query_rows<T: DeserializeOwned>(&self, sql: &str) -> Result<Vec<T>, QueryError> {
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("database", self.database.as_str())])
            .header("X-ClickHouse-User", &self.user)
            .header("X-ClickHouse-Key", &self.password)
            .body(sql.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueryError::Status {
                status,
                body: body.trim().to_string(),
            });
        }

        let body = response.text().await?;
        parse_rows(&body)
    }

    /// Fetch rounds matching the risk condition, newest first.
    pub async fn fetch_flagged_events(
        &self,
        rules: &RiskRules,
    ) -> Result<Vec<BettingEvent>, QueryError> {
        let sql = build_query(rules, &self.database);
        let events: Vec<BettingEvent> = self.query_rows(&sql).await?;

        let unexpected = events.iter().filter(|e| !rules.is_flagged(e)).count();
        if unexpected > 0 {
            warn!(
                unexpected = unexpected,
                total = events.len(),
                "Query returned rows outside the risk condition"
            );
        }

        debug!(rows = events.len(), database = %self.database, "Fetched flagged events");
        Ok(events)
    }
}

/// Decode a `JSONEachRow` body. Blank lines are skipped.
fn parse_rows<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, QueryError> {
    body.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| QueryError::Decode {
                line: idx + 1,
                source,
            })
        })
        .collect()
}
