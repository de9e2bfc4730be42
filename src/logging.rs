//! # Structured Logging Module
//!
//! Environment-aware structured logging for the dispatch service. Console
//! output is human readable by default and switches to JSON lines when the
//! configured format is `json`.

use std::sync::OnceLock;

use chrono::Utc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging; later calls are no-ops
pub fn init_structured_logging(config: &LoggingConfig, environment: &str) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let directive = config
            .level
            .clone()
            .unwrap_or_else(|| get_log_level(environment).to_string());
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

        let console_layer = if config.format.eq_ignore_ascii_case("json") {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A subscriber may already be installed by a test harness or an embedding process
        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            format = %config.format,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Default filter directive for an environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for command dispatch operations
pub fn log_command_operation(
    operation: &str,
    cor_id: Option<&str>,
    kind: Option<&str>,
    routing_key: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        cor_id = cor_id,
        kind = kind,
        routing_key = routing_key,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📨 COMMAND_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_repeated_initialization_is_harmless() {
        let config = LoggingConfig::default();
        init_structured_logging(&config, "test");
        init_structured_logging(&config, "test");
        log_command_operation("publish", Some("cor-1"), Some("challenge-create"), None, "ok", None);
    }
}
