//! Betting event rows returned by the risk query.

use chrono::NaiveDateTime;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Display format for event timestamps.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single flagged casino round.
///
/// Rows are transient: decoded from the query result, rendered into the
/// alert table and dropped. Field names match the column aliases of the
/// risk query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BettingEvent {
    /// Player id, kept as text so numeric and UUID ids both render
    #[serde(deserialize_with = "display_id")]
    pub user_id: String,
    /// Player e-mail, shown as nickname
    pub nickname: String,
    /// Game display name
    pub game: String,
    /// Round creation time (server wall clock)
    #[serde(deserialize_with = "clickhouse_datetime")]
    pub time: NaiveDateTime,
    /// Stake in the alert currency
    #[serde(deserialize_with = "lenient_number")]
    pub bet_amount: f64,
    /// Payout in the alert currency
    #[serde(deserialize_with = "lenient_number")]
    pub win_amount: f64,
}

impl BettingEvent {
    pub fn new(
        user_id: impl ToString,
        nickname: impl Into<String>,
        game: impl Into<String>,
        time: NaiveDateTime,
        bet_amount: f64,
        win_amount: f64,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            nickname: nickname.into(),
            game: game.into(),
            time,
            bet_amount,
            win_amount,
        }
    }

    /// Event time as `YYYY-MM-DD HH:MM:SS`.
    pub fn time_display(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

/// Accept a JSON number or a numeric string.
///
/// ClickHouse quotes 64-bit integers and decimals in JSON output by default.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient<T> {
        Value(T),
        Text(String),
    }

    match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Value(value) => Ok(value),
        Lenient::Text(text) => text.trim().parse().map_err(de::Error::custom),
    }
}

/// Accept an id as a JSON string or integer and keep its text form.
fn display_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Unsigned(u64),
        Signed(i64),
        Text(String),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Unsigned(id) => id.to_string(),
        Id::Signed(id) => id.to_string(),
        Id::Text(id) => id,
    })
}

/// Parse `DateTime` / `DateTime64` values as rendered by ClickHouse.
fn clickhouse_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_datetime(&text).map_err(de::Error::custom)
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
}
