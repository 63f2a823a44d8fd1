//! Logging setup.
//!
//! Diagnostics go through `tracing` and are written to stderr, keeping
//! stdout for command output. `FITSTEP_LOG` takes an `EnvFilter` directive
//! and overrides the level chosen on the command line.

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding a filter directive.
pub const LOG_ENV: &str = "FITSTEP_LOG";

/// Build the filter from `FITSTEP_LOG`, else from `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging(default_level: &str) {
    let result = fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if result.is_err() {
        tracing::debug!("Logging already initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging("debug");
        init_logging("info");
        tracing::info!("logging initialised");
    }

    #[test]
    fn test_bad_level_falls_back() {
        let filter = env_filter("not a [valid directive");
        assert!(!filter.to_string().is_empty());
    }
}
