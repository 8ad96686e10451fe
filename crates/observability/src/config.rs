use std::str::FromStr;

use thiserror::Error;

/// Variable holding the log format (`json` or `text`).
pub const LOG_FORMAT_ENV: &str = "RIPPLE_LOG_FORMAT";

/// Output format of log lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Compact human-readable lines.
    Text,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown log format `{0}` (expected `json` or `text`)")]
pub struct UnknownLogFormat(pub String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "compact" => Ok(LogFormat::Text),
            other => Err(UnknownLogFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives, e.g. `info,ripple_events=debug`.
    pub filter: String,
    pub format: LogFormat,
    /// Include the event target (module path) in each line.
    pub with_target: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Json,
            with_target: false,
        }
    }
}

impl ObservabilityConfig {
    /// Read `RUST_LOG` and `RIPPLE_LOG_FORMAT`.
    ///
    /// An unrecognised format falls back to the default format; the filter is
    /// kept either way. Use [`try_from_env`](Self::try_from_env) to see the error.
    pub fn from_env() -> Self {
        Self::lenient_vars(
            std::env::var("RUST_LOG").ok(),
            std::env::var(LOG_FORMAT_ENV).ok(),
        )
    }

    /// Like [`from_env`](Self::from_env), but an unrecognised format is an error.
    pub fn try_from_env() -> Result<Self, UnknownLogFormat> {
        Self::from_vars(
            std::env::var("RUST_LOG").ok(),
            std::env::var(LOG_FORMAT_ENV).ok(),
        )
    }

    fn from_vars(filter: Option<String>, format: Option<String>) -> Result<Self, UnknownLogFormat> {
        Self::default().with_filter_var(filter).with_format_var(format)
    }

    fn lenient_vars(filter: Option<String>, format: Option<String>) -> Self {
        let config = Self::default().with_filter_var(filter);
        config.clone().with_format_var(format).unwrap_or(config)
    }

    fn with_filter_var(mut self, filter: Option<String>) -> Self {
        if let Some(filter) = filter.filter(|f| !f.trim().is_empty()) {
            self.filter = filter;
        }
        self
    }

    fn with_format_var(mut self, format: Option<String>) -> Result<Self, UnknownLogFormat> {
        if let Some(format) = format {
            self.format = format.parse()?;
        }
        Ok(self)
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }
}
