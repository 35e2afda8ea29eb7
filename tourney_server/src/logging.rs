//! Structured logging configuration.
//!
//! The tourney library logs through the `log` facade; the subscriber installed
//! here also captures those records, so engine and HTTP events share one output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use tourney_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a rejected API request
pub fn log_rejected_request(error_kind: &str, status_code: u16, message: &str) {
    if status_code >= 500 {
        tracing::error!(
            error_kind = error_kind,
            http_status = status_code,
            "Request failed: {}",
            message
        );
    } else {
        tracing::warn!(
            error_kind = error_kind,
            http_status = status_code,
            "Request rejected: {}",
            message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_log_rejected_request() {
        // Just ensure it doesn't panic without a subscriber
        log_rejected_request("validation", 422, "Goals cannot be negative");
        log_rejected_request("storage", 500, "Internal server error");
    }
}
