//! Tracing subscriber setup shared by the agentchat demos.

use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ObservabilityError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ObservabilityError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("unknown log format: {0}")]
    UnknownFormat(String),
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("a global subscriber is already installed")]
    AlreadyInstalled,
}

/// Builds the filter from `RUST_LOG`, falling back to `default_directive`.
pub fn env_filter(default_directive: &str) -> Result<EnvFilter, ObservabilityError> {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_or_default(from_env.as_deref(), default_directive)
}

/// Uses `directives` when set and valid, otherwise `default_directive`.
/// Only an invalid default is an error.
pub fn filter_or_default(
    directives: Option<&str>,
    default_directive: &str,
) -> Result<EnvFilter, ObservabilityError> {
    match directives.map(EnvFilter::try_new) {
        Some(Ok(filter)) => Ok(filter),
        Some(Err(_)) | None => EnvFilter::try_new(default_directive)
            .map_err(|e| ObservabilityError::Filter(e.to_string())),
    }
}

/// Installs a global fmt subscriber writing to stderr.
pub fn init_tracing(format: LogFormat) -> Result<(), ObservabilityError> {
    let filter = env_filter("info")?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|_| ObservabilityError::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn parses_formats() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Text ".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(ObservabilityError::UnknownFormat(f)) if f == "xml"
        ));
    }

    #[test]
    fn rejects_bad_default_directive() {
        assert!(matches!(
            filter_or_default(None, "agentchat=loud"),
            Err(ObservabilityError::Filter(_))
        ));
        assert!(matches!(
            filter_or_default(Some("agentchat=loud"), "agentchat=loud"),
            Err(ObservabilityError::Filter(_))
        ));
    }

    #[test]
    fn directives_win_over_default() {
        let filter = filter_or_default(Some("agentchat=debug"), "warn").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = filter_or_default(None, "warn").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = filter_or_default(Some("agentchat=loud"), "info").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
