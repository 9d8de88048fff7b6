//! Subscriber installation.
//!
//! `RUST_LOG` selects the filter (default `info`); `STOCKPILOT_LOG_FORMAT`
//! selects `json` (default) or `compact` output.

use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_VAR: &str = "STOCKPILOT_LOG_FORMAT";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Compact,
}

impl LogFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "compact" | "text" => Some(Self::Compact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source. Unknown formats fall back to JSON.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(filter) = lookup(EnvFilter::DEFAULT_ENV).filter(|f| !f.trim().is_empty()) {
            settings.filter = filter;
        }
        if let Some(format) = lookup(LOG_FORMAT_VAR).as_deref().and_then(LogFormat::parse) {
            settings.format = format;
        }
        settings
    }
}

/// Install a global subscriber. Returns `false` if one was already installed.
pub fn init_with(settings: &LogSettings) -> bool {
    let filter = EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    match settings.format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Compact => builder.compact().try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_to_json_at_info() {
        assert_eq!(LogSettings::from_lookup(lookup(&[])), LogSettings::default());
    }

    #[test]
    fn reads_filter_and_format() {
        let settings = LogSettings::from_lookup(lookup(&[
            ("RUST_LOG", "stockpilot_engine=debug"),
            (LOG_FORMAT_VAR, "Compact"),
        ]));
        assert_eq!(settings.filter, "stockpilot_engine=debug");
        assert_eq!(settings.format, LogFormat::Compact);
    }

    #[test]
    fn unknown_format_keeps_json() {
        let settings = LogSettings::from_lookup(lookup(&[(LOG_FORMAT_VAR, "xml")]));
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn second_install_is_a_no_op() {
        let settings = LogSettings::default();
        init_with(&settings);
        assert!(!init_with(&settings));
    }
}
