//! Unified error types for oxide-finder

use crate::query::SelectionReport;
use crate::session::LogEntry;
use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for oxide-finder
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol errors
    #[error("CDP error: {0}")]
    Cdp(String),

    /// DevTools HTTP endpoint errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No browser has been opened on the session
    #[error("Browser is not opened")]
    BrowserNotOpened,

    /// Element not found
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Element reference no longer attached to the document
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// Selector the driver cannot evaluate
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Range constructed with `min > max`
    #[error("Invalid range: min {min} is greater than max {max}")]
    InvalidRange { min: usize, max: usize },

    /// Driver-level operation timeout
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// The document never reached `readyState == "complete"`
    #[error("Page was not loaded within {timeout_ms}ms")]
    ReadinessTimeout { timeout_ms: u64 },

    /// The element condition never held within the timeout
    #[error("{0}")]
    ConditionTimeout(SelectionReport),

    /// The final fetch no longer satisfied the expected range
    #[error("{0}")]
    Selection(SelectionReport),

    /// Browser console contained unexpected entries
    #[error("expected: <no errors in logs> but was: <[{}]>", join_entries(.0))]
    ConsoleErrors(Vec<LogEntry>),

    /// Navigation failed
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Script execution failed
    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_entries(entries: &[LogEntry]) -> String {
    entries
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create a new WebSocket error
    pub fn websocket<S: Into<String>>(msg: S) -> Self {
        Error::WebSocket(msg.into())
    }

    /// Create a new CDP error
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// Create a new HTTP error
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Error::Http(msg.into())
    }

    /// Create a new element not found error
    pub fn element_not_found<S: Into<String>>(msg: S) -> Self {
        Error::ElementNotFound(msg.into())
    }

    /// Create a new stale element error
    pub fn stale_element<S: Into<String>>(id: S) -> Self {
        Error::StaleElement(id.into())
    }

    /// Create a new invalid selector error
    pub fn invalid_selector<S: Into<String>>(msg: S) -> Self {
        Error::InvalidSelector(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new navigation failed error
    pub fn navigation_failed<S: Into<String>>(msg: S) -> Self {
        Error::NavigationFailed(msg.into())
    }

    /// Create a new script execution failed error
    pub fn script_execution_failed<S: Into<String>>(msg: S) -> Self {
        Error::ScriptExecutionFailed(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Whether this error is a timeout of any kind
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::ReadinessTimeout { .. } | Error::ConditionTimeout(_)
        )
    }

    /// Whether a poll tick may treat this error as "condition not met yet"
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::StaleElement(_) | Error::ElementNotFound(_))
    }

    /// Whether the page's JavaScript context went away mid-navigation
    pub fn is_context_lost(&self) -> bool {
        match self {
            Error::Cdp(msg) | Error::ScriptExecutionFailed(msg) => {
                msg.contains("Execution context was destroyed") || msg.contains("Cannot find context")
            }
            _ => false,
        }
    }

    /// Diagnostics attached to a condition timeout or selection mismatch
    pub fn report(&self) -> Option<&SelectionReport> {
        match self {
            Error::ConditionTimeout(report) | Error::Selection(report) => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Range, Visibility};
    use crate::session::LogLevel;

    #[test]
    fn test_timeout_classification() {
        let report = SelectionReport::new(Range::exact(1), Visibility::All, 0, 0, 0);

        assert!(Error::ConditionTimeout(report.clone()).is_timeout());
        assert!(Error::ReadinessTimeout { timeout_ms: 10 }.is_timeout());
        assert!(Error::timeout("command").is_timeout());
        assert!(!Error::Selection(report).is_timeout());
        assert!(!Error::configuration("bad").is_timeout());
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::stale_element("el-1").is_transient());
        assert!(Error::element_not_found("parent").is_transient());
        assert!(!Error::cdp("boom").is_transient());
    }

    #[test]
    fn test_context_lost_classification() {
        assert!(Error::cdp("CDP error -32000: Cannot find context with specified id").is_context_lost());
        assert!(Error::script_execution_failed("Execution context was destroyed.").is_context_lost());
        assert!(!Error::websocket("Connection is not active").is_context_lost());
        assert!(!Error::BrowserNotOpened.is_context_lost());
    }

    #[test]
    fn test_selection_error_keeps_report() {
        let report = SelectionReport::new(Range::exact(2), Visibility::Hidden, 3, 2, 1);
        let err = Error::Selection(report);

        let attached = err.report().expect("report should be attached");
        assert_eq!(attached.total(), 3);
        assert_eq!(attached.hidden(), 1);
        assert!(err.to_string().starts_with("Waited for 2 hidden elements"));
    }

    #[test]
    fn test_console_errors_message() {
        let entry = LogEntry::new(LogLevel::Severe, "Uncaught TypeError: x is undefined");
        let message = Error::ConsoleErrors(vec![entry]).to_string();

        assert!(message.starts_with("expected: <no errors in logs> but was: <["));
        assert!(message.contains("SEVERE"));
        assert!(message.contains("x is undefined"));
    }
}
