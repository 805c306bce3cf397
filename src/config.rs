// src/config.rs
//! Environment-driven configuration.
//! Everything tunable (retry bounds, timeouts, the deadline, endpoints) is
//! read here once at startup; nothing else in the crate touches the
//! environment.

use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::steps::STEP_NAMES;
use crate::workflow::RetryConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Run a single execution and exit.
    Once,
    /// Keep running one execution per schedule interval.
    Daily,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier of the tracking sheet handed to ReadWorkItem.
    pub source_id: String,
    /// Step name to endpoint URL for the HTTP step adapters.
    pub step_endpoints: HashMap<String, String>,
    /// Optional webhook for outcome notifications.
    pub webhook_url: Option<String>,
    pub trigger_mode: TriggerMode,
    pub schedule_interval: Duration,
    /// End-to-end budget for one execution.
    pub global_deadline: Duration,
    /// Budget for a single step attempt.
    pub step_timeout: Duration,
    pub retry: RetryConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let source_id =
            std::env::var("SOURCE_SHEET_ID").map_err(|_| ConfigError::MissingVar("SOURCE_SHEET_ID"))?;
        let base_url = std::env::var("STEP_API_BASE_URL")
            .map_err(|_| ConfigError::MissingVar("STEP_API_BASE_URL"))?;

        // Every step gets <base>/<kebab-name> unless an explicit
        // STEP_ENDPOINT_<NAME> override is present.
        let mut step_endpoints = HashMap::new();
        for name in STEP_NAMES {
            let override_var = format!("STEP_ENDPOINT_{}", screaming_snake(name));
            let endpoint = std::env::var(&override_var).unwrap_or_else(|_| {
                format!("{}/{}", base_url.trim_end_matches('/'), kebab(name))
            });
            step_endpoints.insert(name.to_string(), endpoint);
        }

        let trigger_mode = match std::env::var("TRIGGER_MODE").as_deref() {
            Ok("daily") => TriggerMode::Daily,
            _ => TriggerMode::Once,
        };

        Ok(Self {
            source_id,
            step_endpoints,
            webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").ok(),
            trigger_mode,
            schedule_interval: Duration::from_secs(env_u64("SCHEDULE_INTERVAL_SECS", 86_400)),
            global_deadline: Duration::from_secs(env_u64("WORKFLOW_DEADLINE_SECS", 3_600)),
            step_timeout: Duration::from_secs(env_u64("STEP_TIMEOUT_SECS", 300)),
            retry: RetryConfig {
                max_attempts: env_u64("RETRY_MAX_ATTEMPTS", 4) as u32,
                initial_interval: Duration::from_millis(env_u64("RETRY_INITIAL_MS", 500)),
                max_interval: Duration::from_millis(env_u64("RETRY_MAX_INTERVAL_MS", 30_000)),
                multiplier: env_f64("RETRY_MULTIPLIER", 2.0),
            },
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn screaming_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

fn kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('-');
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_name_conversions() {
        assert_eq!(screaming_snake("ReadWorkItem"), "READ_WORK_ITEM");
        assert_eq!(screaming_snake("UploadVideo"), "UPLOAD_VIDEO");
        assert_eq!(kebab("SynthesizeAudio"), "synthesize-audio");
        assert_eq!(kebab("ComposeVideo"), "compose-video");
    }

    // Environment access is process-global, so everything env-related sits
    // in one test.
    #[test]
    fn from_env_builds_endpoints_and_defaults() {
        std::env::set_var("SOURCE_SHEET_ID", "sheet-42");
        std::env::set_var("STEP_API_BASE_URL", "http://steps.internal/");
        std::env::set_var(
            "STEP_ENDPOINT_GENERATE_SCRIPT",
            "http://llm.internal/script",
        );
        std::env::remove_var("TRIGGER_MODE");

        let config = Config::from_env().unwrap();
        assert_eq!(config.source_id, "sheet-42");
        assert_eq!(
            config.step_endpoints["ReadWorkItem"],
            "http://steps.internal/read-work-item"
        );
        assert_eq!(
            config.step_endpoints["GenerateScript"],
            "http://llm.internal/script"
        );
        assert_eq!(config.trigger_mode, TriggerMode::Once);
        assert_eq!(config.global_deadline, Duration::from_secs(3_600));
        assert_eq!(config.retry.max_attempts, 4);

        std::env::remove_var("SOURCE_SHEET_ID");
        std::env::remove_var("STEP_API_BASE_URL");
        std::env::remove_var("STEP_ENDPOINT_GENERATE_SCRIPT");
    }
}
