//! Tracing subscriber setup

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};

/// Crates whose debug output drowns the proxy's own events
const QUIET_DEPENDENCIES: &[&str] = &["hyper=info", "hyper_util=info", "reqwest=info", "h2=info"];

/// Builds the filter from `RUST_LOG`, falling back to the configured level
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = std::iter::once(level)
            .chain(QUIET_DEPENDENCIES.iter().copied())
            .collect::<Vec<_>>()
            .join(",");

        EnvFilter::new(directives)
    })
}

/// Installs the global subscriber; events are written to stderr so command
/// output on stdout stays machine-readable
pub fn init_logging(config: &LoggingConfig) {
    let filter = build_filter(&config.level);

    let result = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
    };

    if result.is_ok() {
        tracing::info!("Logging initialized with level: {}", config.level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_quiets_dependencies() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }

        let filter = build_filter("debug").to_string();

        assert!(filter.contains("debug"));
        assert!(filter.contains("hyper=info"));
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        let config = LoggingConfig::default();

        init_logging(&config);
        init_logging(&config);
    }
}
