//! Notification channel.
//!
//! One operation: post a UTF-8 text payload. Delivery is fire-and-forget
//! from the pipeline's perspective; the outcome is logged, and a missing
//! webhook configuration degrades to logging the payload so a run is never
//! silent.

use anyhow::{anyhow, Context, Result};

pub trait Notifier {
    fn post(&self, text: &str) -> Result<()>;
}

/// Chat webhook (Slack-compatible `{"text": …}` payload).
pub struct WebhookNotifier {
    client: reqwest::blocking::Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::blocking::Client, webhook_url: String) -> Self {
        WebhookNotifier { client, webhook_url }
    }
}

impl Notifier for WebhookNotifier {
    fn post(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&serde_json::json!({"text": text}))
            .send()
            .context("notification request failed")?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "notification channel returned HTTP {}",
                response.status().as_u16()
            ));
        }
        Ok(())
    }
}

/// Fallback when no webhook is configured: the message goes to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn post(&self, text: &str) -> Result<()> {
        log::info!("No notification channel configured. Message:\n{}", text);
        Ok(())
    }
}
