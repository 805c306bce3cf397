use std::sync::Arc;

mod config;
mod notify;
mod steps;
mod trigger;
mod types;
mod workflow;

use config::{Config, TriggerMode};
use notify::{LogNotifier, Notifier, WebhookNotifier};
use steps::{HttpStep, StepRegistry};
use trigger::WorkflowRunner;
use workflow::{build_video_workflow, StepInvoker, WorkflowEngine};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Every external collaborator is an HTTP step behind one uniform contract.
    let mut registry = StepRegistry::new();
    for (name, endpoint) in &config.step_endpoints {
        tracing::info!("step '{}' -> {}", name, endpoint);
        registry.register(Arc::new(HttpStep::new(name.clone(), endpoint.clone())));
    }
    let registry = Arc::new(registry);

    let notifier: Arc<dyn Notifier> = match &config.webhook_url {
        Some(url) => {
            tracing::info!("outcome notifications -> {}", url);
            Arc::new(WebhookNotifier::new(url.clone()))
        }
        None => {
            tracing::warn!("NOTIFY_WEBHOOK_URL not set, outcomes will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let graph = match build_video_workflow() {
        Ok(graph) => graph,
        Err(e) => {
            tracing::error!("workflow graph is invalid: {}", e);
            std::process::exit(1);
        }
    };

    let invoker = StepInvoker::new(registry, config.retry.clone(), config.step_timeout);
    let engine = Arc::new(WorkflowEngine::new(graph, invoker));
    let runner = Arc::new(WorkflowRunner::new(engine, notifier, &config));

    match config.trigger_mode {
        TriggerMode::Once => {
            let outcome = runner.run_once().await;
            if !outcome.is_success() && !matches!(outcome, types::WorkflowOutcome::NoWork) {
                std::process::exit(1);
            }
        }
        TriggerMode::Daily => {
            runner.run_scheduled().await;
        }
    }
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,video_factory=trace,reqwest=info,hyper=info".to_string()
        } else {
            "info,video_factory=info,reqwest=warn,hyper=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    // JSON logging for production, human-readable for development
    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("🎬 VideoFactory starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );
    tracing::info!("Log level: {}", log_level);

    let sheet_configured = std::env::var("SOURCE_SHEET_ID").is_ok();
    let steps_configured = std::env::var("STEP_API_BASE_URL").is_ok();
    let webhook_configured = std::env::var("NOTIFY_WEBHOOK_URL").is_ok();
    tracing::info!(
        "Configuration - Sheet: {}, Step API: {}, Webhook: {}",
        if sheet_configured { "✅" } else { "❌" },
        if steps_configured { "✅" } else { "❌" },
        if webhook_configured { "✅" } else { "❌" }
    );

    Ok(())
}
