//! Tracing subscriber setup for host applications.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::DEFAULT_LOG_FILTER;

/// Parse `filter`, falling back to [`DEFAULT_LOG_FILTER`] when it is invalid.
pub fn build_filter(filter: &str) -> EnvFilter {
    EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed, so hosts
/// may call this more than once.
pub fn init_logging(filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(build_filter(filter))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_falls_back() {
        assert_eq!(build_filter("meditrack_core=[").to_string(), DEFAULT_LOG_FILTER);
        assert_eq!(build_filter("debug").to_string(), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_logging("warn");
        assert!(!init_logging("warn"));
    }
}
