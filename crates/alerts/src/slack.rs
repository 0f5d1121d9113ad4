//! Slack message rendering and webhook delivery.

use crate::config::WebhookConfig;
use betwatch_core::{format_usd, BettingEvent, TIME_FORMAT};
use chrono::NaiveDateTime;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Slack webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Slack webhook returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Failed to encode Slack payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Notification title, also used as the fallback text.
pub const ALERT_TITLE: &str = "Hourly Betting Activity Alert";

pub const NO_ACTIVITY_TEXT: &str = "No significant betting activity in the last hour.";

pub const TABLE_HEADERS: [&str; 6] = [
    "User ID",
    "Nickname",
    "Game",
    "Time",
    "Bet Amount",
    "Win Amount",
];

/// Incoming webhook payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookMessage {
    /// Fallback shown in notifications
    pub text: String,
    pub blocks: Vec<Block>,
}

/// Block Kit layout block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: TextObject },
}

/// Block Kit text object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Mrkdwn { text: String },
}

impl WebhookMessage {
    /// Single-section message with mrkdwn body.
    pub fn section(fallback: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            text: fallback.into(),
            blocks: vec![Block::Section {
                text: TextObject::Mrkdwn {
                    text: markdown.into(),
                },
            }],
        }
    }

    /// Markdown of the first section, if any.
    pub fn section_text(&self) -> Option<&str> {
        self.blocks.iter().find_map(|block| match block {
            Block::Section {
                text: TextObject::Mrkdwn { text },
            } => Some(text.as_str()),
        })
    }
}

/// Render flagged events as a pipe table, one row per event in input order.
pub fn render_table(events: &[BettingEvent]) -> String {
    let mut lines = Vec::with_capacity(events.len() + 2);
    lines.push(format!("|{}|", TABLE_HEADERS.join("|")));
    lines.push(format!("{}|", "|-".repeat(TABLE_HEADERS.len())));

    for event in events {
        lines.push(format!(
            "|{}|{}|{}|{}|{}|{}|",
            event.user_id,
            event.nickname,
            event.game,
            event.time_display(),
            format_usd(event.bet_amount),
            format_usd(event.win_amount),
        ));
    }

    lines.join("\n")
}

/// Build the hourly alert message.
///
/// An empty slice yields the no-activity notice; otherwise the table is
/// wrapped in a code fence.
pub fn format_alert_message(events: &[BettingEvent], now: NaiveDateTime) -> WebhookMessage {
    let heading = format!("*{} - {}*", ALERT_TITLE, now.format(TIME_FORMAT));

    let body = if events.is_empty() {
        NO_ACTIVITY_TEXT.to_string()
    } else {
        format!("```{}```", render_table(events))
    };

    WebhookMessage::section(ALERT_TITLE, format!("{}\n\n{}", heading, body))
}

/// Slack incoming webhook client.
pub struct SlackWebhook {
    http: reqwest::Client,
    url: String,
}

impl SlackWebhook {
    pub fn new(config: &WebhookConfig) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    /// Post a message. Any non-2xx response is an error.
    pub async fn send(&self, message: &WebhookMessage) -> Result<(), DeliveryError> {
        let response = self.http.post(&self.url).json(message).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn sample_events() -> Vec<BettingEvent> {
        vec![
            BettingEvent::new(
                1001,
                "whale@example.com",
                "Lightning Roulette",
                at(10, 45, 0),
                500.0,
                72000.0,
            ),
            BettingEvent::new(
                1002,
                "loser@example.com",
                "Blackjack",
                at(10, 15, 30),
                25000.0,
                0.0,
            ),
        ]
    }

    // === Rendering ===

    #[test]
    fn test_empty_message() {
        let message = format_alert_message(&[], at(11, 0, 0));
        let text = message.section_text().unwrap();

        assert_eq!(message.text, "Hourly Betting Activity Alert");
        assert_eq!(
            text,
            "*Hourly Betting Activity Alert - 2024-05-01 11:00:00*\n\n\
             No significant betting activity in the last hour."
        );
        assert!(!text.contains("```"));
    }

    #[test]
    fn test_render_table_rows() {
        let table = render_table(&sample_events());
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(
            lines,
            vec![
                "|User ID|Nickname|Game|Time|Bet Amount|Win Amount|",
                "|-|-|-|-|-|-|",
                "|1001|whale@example.com|Lightning Roulette|2024-05-01 10:45:00|$500.00|$72,000.00|",
                "|1002|loser@example.com|Blackjack|2024-05-01 10:15:30|$25,000.00|$0.00|",
            ]
        );
    }

    #[test]
    fn test_render_table_header_only_for_no_rows() {
        assert_eq!(render_table(&[]).lines().count(), 2);
    }

    #[test]
    fn test_message_with_events() {
        let message = format_alert_message(&sample_events(), at(11, 0, 0));
        let text = message.section_text().unwrap();

        assert!(text.starts_with(
            "*Hourly Betting Activity Alert - 2024-05-01 11:00:00*\n\n```|User ID|"
        ));
        assert!(text.ends_with("|$25,000.00|$0.00|```"));
        assert!(!text.contains(NO_ACTIVITY_TEXT));
    }

    #[test]
    fn test_payload_json_shape() {
        let message = format_alert_message(&[], at(11, 0, 0));
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["text"], "Hourly Betting Activity Alert");
        assert_eq!(json["blocks"].as_array().unwrap().len(), 1);
        assert_eq!(json["blocks"][0]["type"], "section");
        assert_eq!(json["blocks"][0]["text"]["type"], "mrkdwn");
        assert!(json["blocks"][0]["text"]["text"]
            .as_str()
            .unwrap()
            .contains(NO_ACTIVITY_TEXT));
    }

    // === Delivery ===

    async fn spawn_webhook(
        status: AxumStatus,
        body: &'static str,
    ) -> (String, Arc<Mutex<Vec<serde_json::Value>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let app = Router::new().route(
            "/services/T000/B000/XXXX",
            post(move |Json(payload): Json<serde_json::Value>| async move {
                sink.lock().unwrap().push(payload);
                (status, body)
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/services/T000/B000/XXXX", addr), received)
    }

    #[tokio::test]
    async fn test_send_success() {
        let (url, received) = spawn_webhook(AxumStatus::OK, "ok").await;
        let webhook = SlackWebhook::new(&WebhookConfig::new(url)).unwrap();

        webhook
            .send(&format_alert_message(&sample_events(), at(11, 0, 0)))
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["text"], "Hourly Betting Activity Alert");
    }

    #[tokio::test]
    async fn test_send_non_success_is_error() {
        let (url, _) = spawn_webhook(AxumStatus::FORBIDDEN, "invalid_token").await;
        let webhook = SlackWebhook::new(&WebhookConfig::new(url)).unwrap();

        let err = webhook
            .send(&format_alert_message(&[], at(11, 0, 0)))
            .await
            .unwrap_err();

        match err {
            DeliveryError::Status { status, body } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, "invalid_token");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
