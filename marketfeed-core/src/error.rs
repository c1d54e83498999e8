//! Error types for marketfeed.
//!
//! This module provides the error hierarchy using `thiserror`.
//! Producer failures are the only errors the update pipeline ever sees; they are
//! logged and masked per feed, and only the initial dashboard load surfaces them.

use thiserror::Error;

/// Result type alias using `MarketError`.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Main error type for all marketfeed operations.
#[derive(Debug, Error)]
pub enum MarketError {
    // ═══════════════════════════════════════════════════════════════════════════
    // PRODUCER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A feed's producer failed while computing a fresh value.
    #[error("Producer for feed '{feed}' failed: {reason}")]
    ProducerFailed { feed: String, reason: String },

    /// The underlying data source could not serve a request.
    #[error("Data source error: {0}")]
    DataSourceError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // DISPLAY ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Updating the display failed.
    #[error("Render failed: {0}")]
    RenderError(String),

    /// A filter value could not be parsed.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// A theme value could not be parsed.
    #[error("Invalid theme: {0}")]
    InvalidTheme(String),

    /// Enumerated item field could not be parsed.
    #[error("Invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Preference storage could not be read or written.
    #[error("Preference storage error: {0}")]
    PreferenceError(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // RUNTIME ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The update scheduler could not change state.
    #[error("Scheduler error: {0}")]
    SchedulerError(String),
}

impl MarketError {
    /// Creates a producer failure for the given feed.
    pub fn producer(feed: impl Into<String>, reason: impl Into<String>) -> Self {
        MarketError::ProducerFailed {
            feed: feed.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this error came from a feed producer.
    ///
    /// These are the errors the update cycle masks with a default value.
    pub fn is_producer_error(&self) -> bool {
        matches!(
            self,
            MarketError::ProducerFailed { .. } | MarketError::DataSourceError(_)
        )
    }

    /// Returns true if the next scheduled cycle may succeed where this one failed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MarketError::ProducerFailed { .. }
                | MarketError::DataSourceError(_)
                | MarketError::RenderError(_)
        )
    }

    /// Returns true if this error was caused by bad user input.
    pub fn is_user_input_error(&self) -> bool {
        matches!(
            self,
            MarketError::InvalidFilter(_)
                | MarketError::InvalidTheme(_)
                | MarketError::InvalidField { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MarketError::producer("trending", "upstream timed out");
        assert!(err.to_string().contains("trending"));
        assert!(err.to_string().contains("upstream timed out"));
    }

    #[test]
    fn test_error_classification() {
        assert!(MarketError::producer("trending", "boom").is_producer_error());
        assert!(MarketError::DataSourceError("down".into()).is_producer_error());
        assert!(!MarketError::RenderError("canvas".into()).is_producer_error());

        assert!(MarketError::RenderError("canvas".into()).is_recoverable());
        assert!(!MarketError::ConfigError("bad".into()).is_recoverable());

        assert!(MarketError::InvalidFilter("sort".into()).is_user_input_error());
        assert!(!MarketError::SchedulerError("x".into()).is_user_input_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let market_result: Result<serde_json::Value> = json_result.map_err(MarketError::from);
        assert!(matches!(market_result, Err(MarketError::JsonError(_))));
    }
}
