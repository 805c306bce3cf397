// src/notify.rs
//! Best-effort delivery of terminal workflow outcomes.
//! A broken notification channel must never turn a finished run into a
//! failure, so nothing here returns an error to the caller.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::types::WorkflowOutcome;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, outcome: &WorkflowOutcome);
}

/// Publishes the serialized outcome to a webhook topic.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, outcome: &WorkflowOutcome) {
        let result = self
            .client
            .post(&self.url)
            .timeout(Duration::from_secs(10))
            .json(outcome)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!("📤 outcome notification delivered");
            }
            Ok(response) => {
                tracing::warn!("outcome notification rejected with {}", response.status());
            }
            Err(e) => {
                tracing::warn!("outcome notification failed: {}", e);
            }
        }
    }
}

/// Fallback sink when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, outcome: &WorkflowOutcome) {
        match serde_json::to_string(outcome) {
            Ok(json) => tracing::info!("📤 workflow outcome: {}", json),
            Err(e) => tracing::warn!("failed to serialize outcome: {}", e),
        }
    }
}
