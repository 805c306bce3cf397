// HTTP adapter fronting one external step service.
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::Step;
use crate::workflow::StepError;

/// Invokes a remote step by POSTing its JSON input to a configured endpoint.
///
/// Classification follows the service's response: 408/429 and 5xx (plus
/// connection and timeout errors) are transient and retryable, any other
/// non-success status is a permanent rejection of this input.
pub struct HttpStep {
    name: String,
    endpoint: String,
    client: Client,
}

impl HttpStep {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Step for HttpStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, input: Value) -> Result<Value, StepError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&input)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    StepError::Transient(format!("{}: connection error: {}", self.name, e))
                } else {
                    StepError::Validation(format!("{}: request error: {}", self.name, e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StepError::Transient(format!("{}: failed to read response: {}", self.name, e)))?;

        if status.as_u16() == 408 || status.as_u16() == 429 || status.is_server_error() {
            return Err(StepError::Transient(format!(
                "{} returned {}: {}",
                self.name, status, body
            )));
        }

        if !status.is_success() {
            return Err(StepError::Validation(format!(
                "{} rejected input ({}): {}",
                self.name, status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            StepError::Validation(format!("{} returned a non-JSON body: {}", self.name, e))
        })
    }
}
