//! Improvement notifications
//!
//! A day's new best fare is announced as one human-readable line. The
//! webhook notifier posts it either wrapped in a chat adaptive card or as a
//! bare `{"text": ...}` body.

use crate::domain::error::{TrackerError, TrackerResult};
use crate::domain::types::Fare;
use crate::infra::config::NotifierFormat;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, date: &str, fare: &Fare) -> TrackerResult<()>;
}

/// Single-line message for a day's new best fare
pub fn format_message(date: &str, fare: &Fare) -> String {
    format!(
        "Lowest fare found for {}: R$ {} with {}, {} {}",
        date, fare.price, fare.carrier, fare.duration, fare.stops
    )
}

/// Build the webhook request body for a message line
pub fn webhook_body(format: &NotifierFormat, message: &str) -> Value {
    match format {
        NotifierFormat::Text => json!({ "text": message }),
        NotifierFormat::AdaptiveCard => json!({
            "type": "message",
            "attachments": [{
                "contentType": "application/vnd.microsoft.card.adaptive",
                "contentUrl": null,
                "content": {
                    "type": "AdaptiveCard",
                    "body": [{
                        "type": "TextBlock",
                        "size": "Medium",
                        "text": message,
                        "wrap": true,
                    }],
                    "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
                    "version": "1.5",
                },
            }],
        }),
    }
}

/// Posts notifications to a chat webhook
pub struct WebhookNotifier {
    url: String,
    format: NotifierFormat,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: &str, format: NotifierFormat, timeout_ms: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        info!(format = %format.as_str(), "webhook_notifier_initialized");
        Ok(Self { url: url.to_string(), format, client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, date: &str, fare: &Fare) -> TrackerResult<()> {
        let start = Instant::now();
        let message = format_message(date, fare);
        let body = webhook_body(&self.format, &message);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TrackerError::notification(date, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrackerError::notification(date, format!("HTTP {}", status.as_u16())));
        }

        info!(
            date = %date,
            price = %fare.price,
            status = %status.as_u16(),
            latency_ms = %start.elapsed().as_millis(),
            "notification_sent"
        );
        Ok(())
    }
}

/// Logs notifications instead of delivering them (notifier disabled)
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, date: &str, fare: &Fare) -> TrackerResult<()> {
        info!(date = %date, price = %fare.price, message = %format_message(date, fare), "notification_logged");
        Ok(())
    }
}
