//! Tracing setup for the `remedy` binary.
//!
//! Log lines always go to stderr; stdout carries the run result. Without
//! `RUST_LOG`, the HTTP client stack is held at `warn` so connection noise
//! does not bury the per-batch lines.

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose logs are capped at `warn` unless `RUST_LOG` says otherwise.
const HTTP_TARGETS: [&str; 4] = ["hyper", "hyper_util", "reqwest", "rustls"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    /// Newline-delimited JSON, no ANSI colour.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// Verbosity for remedy's own targets when `RUST_LOG` is unset.
    pub level: Level,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: Level::INFO,
        }
    }
}

impl TelemetryConfig {
    pub fn new(format: LogFormat, level: Level) -> Self {
        Self { format, level }
    }

    /// Filter directives used when `RUST_LOG` is absent or unparsable.
    pub fn default_directives(&self) -> String {
        let mut directives = self.level.as_str().to_ascii_lowercase();
        for target in HTTP_TARGETS {
            directives.push_str(&format!(",{target}=warn"));
        }
        directives
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the existing one
/// stays in place.
pub fn init_tracing(config: &TelemetryConfig) -> bool {
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(config.filter())
            .with(layer.with_ansi(false).json())
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(config.filter())
            .with(layer)
            .try_init(),
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_quiet_http_stack() {
        let directives = TelemetryConfig::new(LogFormat::Text, Level::DEBUG).default_directives();
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.contains("hyper=warn"));
        assert!(!directives.contains("remedy"));
    }

    #[test]
    fn test_log_format_serde() {
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
        let parsed: LogFormat = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(parsed, LogFormat::default());
    }

    #[test]
    fn test_second_init_reports_existing_subscriber() {
        init_tracing(&TelemetryConfig::default());
        assert!(!init_tracing(&TelemetryConfig::new(LogFormat::Json, Level::DEBUG)));
    }
}
