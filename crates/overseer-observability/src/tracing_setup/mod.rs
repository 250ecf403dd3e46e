//! Tracing setup: structured logging with span definitions and event types.

pub mod events;
pub mod spans;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use overseer_core::config::ObservabilityConfig;

/// Install the global subscriber. `RUST_LOG` overrides the configured
/// level. Returns `false` if a subscriber was already set, so repeated
/// calls are harmless.
pub fn init(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true),
            )
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };
    installed.is_ok()
}

/// Initialize with a bare filter string.
pub fn init_with_filter(filter: &str) -> bool {
    init(&ObservabilityConfig {
        log_level: filter.to_string(),
        json_logs: false,
    })
}
