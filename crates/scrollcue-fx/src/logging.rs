#![forbid(unsafe_code)]

//! Logging setup for hosts that want scrollcue's `tracing` output.
//!
//! Library code only emits events; nothing is printed until a host installs
//! a subscriber, either its own or the one from [`init`].

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "SCROLLCUE_LOG";

/// Directives used when [`LOG_ENV`] is unset or invalid.
pub const DEFAULT_DIRECTIVES: &str = "info";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Plain,
    /// One JSON object per event.
    Json,
}

/// Filter built from [`LOG_ENV`], falling back to [`DEFAULT_DIRECTIVES`].
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install a global fmt subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init(format: LogFormat) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(env_filter());
    match format {
        LogFormat::Plain => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names() {
        let json: LogFormat = serde_json::from_str("\"json\"").expect("known format");
        assert_eq!(json, LogFormat::Json);
        assert_eq!(LogFormat::default(), LogFormat::Plain);
    }

    #[test]
    fn second_init_fails() {
        let _ = init(LogFormat::Plain);
        assert!(init(LogFormat::Json).is_err());
    }
}
