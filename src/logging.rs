//! Log setup for the binary.
//!
//! Logs go to stderr so stdout stays free for rendered HTML. The filter is
//! read from `CAPTIONEER_LOG`, then `RUST_LOG`, and defaults to `warn`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CAPTIONEER_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Pick the filter directive from the environment lookup.
pub fn filter_directive<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    non_blank(LOG_ENV)
        .or_else(|| non_blank("RUST_LOG"))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber.
///
/// An unparsable filter falls back to the default level.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let directive = filter_directive(|name| std::env::var(name).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}
