use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Used when `RUST_LOG` is unset; request spans come from `tower_http`.
pub const DEFAULT_FILTER: &str = "info,tower_http=info,axum=info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Compact human-readable output on stdout. Safe to call more than once.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(filter())
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// One JSON object per event, for log shippers.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(filter())
        .with_target(true)
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_writer(io::stdout)
        .try_init();
}

/// Pick the output format from `LOG_FORMAT` (`json`, anything else is compact).
pub fn init_logging_from_env() {
    match std::env::var("LOG_FORMAT") {
        Ok(v) if is_json(&v) => init_logging_json(),
        _ => init_logging_default(),
    }
}

fn is_json(format: &str) -> bool {
    format.trim().eq_ignore_ascii_case("json")
}
