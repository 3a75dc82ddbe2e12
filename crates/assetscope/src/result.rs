//! Result and error types for AssetScope.

use thiserror::Error;

/// Result type for AssetScope operations
pub type SuiteResult<T> = Result<T, SuiteError>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Malformed locator (empty value, unsupported strategy)
    #[error("Invalid locator: {message}")]
    InvalidLocator {
        /// Error message
        message: String,
    },

    /// A wait condition never held within its timeout
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    TimeoutExceeded {
        /// Timeout in milliseconds
        ms: u64,
        /// Description of the condition
        waited_for: String,
    },

    /// No option in a picker matched the requested label
    #[error("Option '{option}' not found in {control} (available: {available:?})")]
    OptionNotFound {
        /// Control that was opened
        control: String,
        /// Requested option label
        option: String,
        /// Labels that were offered
        available: Vec<String>,
    },

    /// Target of a text entry is not an editable input
    #[error("Field '{field}' is not editable (role: {role})")]
    FieldNotEditable {
        /// Field description
        field: String,
        /// Role reported by the accessibility tree
        role: String,
    },

    /// Element never became present, visible and enabled
    #[error("Element {element} not interactable after {ms}ms")]
    ElementNotInteractable {
        /// Element description
        element: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Automation session could not be created or was lost
    #[error("Session unavailable: {message}")]
    SessionUnavailable {
        /// Error message
        message: String,
    },

    /// Navigation did not arrive at the expected screen
    #[error("Expected screen '{expected}' after {action}, but its signature never appeared")]
    UnexpectedScreen {
        /// Screen that should have been reached
        expected: String,
        /// Action that triggered the navigation
        action: String,
    },

    /// Scenario post-condition did not hold
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Fixture error (provision/release failed)
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Automation transport returned an error response
    #[error("Protocol error: {message}")]
    Protocol {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SuiteError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create an invalid locator error
    #[must_use]
    pub fn invalid_locator(message: impl Into<String>) -> Self {
        Self::InvalidLocator {
            message: message.into(),
        }
    }

    /// Create a protocol error
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Whether this is a wait timeout the caller may treat as absence
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeoutExceeded { .. })
    }

    /// Whether a wait may retry after this error (e.g. a stale element
    /// reference while the screen re-renders)
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Whether the whole run should stop (no point running further scenarios)
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SessionUnavailable { .. } | Self::InvalidLocator { .. } | Self::Config { .. }
        )
    }
}

/// Fail with [`SuiteError::AssertionFailed`] unless `condition` holds.
///
/// # Errors
///
/// Returns the assertion failure when `condition` is false.
pub fn ensure(condition: bool, message: impl Into<String>) -> SuiteResult<()> {
    if condition {
        Ok(())
    } else {
        Err(SuiteError::assertion(message))
    }
}

/// Fail unless `actual == expected`, naming both in the message.
///
/// # Errors
///
/// Returns an assertion failure describing the mismatch.
pub fn ensure_eq<T: PartialEq + std::fmt::Debug>(
    actual: &T,
    expected: &T,
    what: &str,
) -> SuiteResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(SuiteError::assertion(format!(
            "{what}: expected {expected:?} but got {actual:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_recoverable() {
        let err = SuiteError::TimeoutExceeded {
            ms: 100,
            waited_for: "spinner gone".into(),
        };
        assert!(err.is_timeout());
        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Timed out after 100ms waiting for spinner gone"
        );
    }

    #[test]
    fn test_session_unavailable_is_fatal() {
        let err = SuiteError::SessionUnavailable {
            message: "connection refused".into(),
        };
        assert!(err.is_fatal());
        assert!(!err.is_timeout());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_only_protocol_errors_are_transient() {
        assert!(SuiteError::protocol("stale element reference").is_transient());
        assert!(!SuiteError::invalid_locator("empty").is_transient());
        assert!(!SuiteError::Config {
            message: "missing url".into(),
        }
        .is_transient());
    }

    #[test]
    fn test_option_not_found_lists_available() {
        let err = SuiteError::OptionNotFound {
            control: "subtype picker".into(),
            option: "Nope".into(),
            available: vec!["A".into(), "B".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'Nope'"));
        assert!(msg.contains("\"A\""));
    }

    #[test]
    fn test_ensure() {
        assert!(ensure(true, "fine").is_ok());
        let err = ensure(false, "count was 3").unwrap_err();
        assert_eq!(err.to_string(), "Assertion failed: count was 3");
    }

    #[test]
    fn test_ensure_eq_message() {
        assert!(ensure_eq(&1, &1, "count").is_ok());
        let err = ensure_eq(&"None", &"BPS", "subtype").unwrap_err();
        assert!(err.to_string().contains("expected \"BPS\" but got \"None\""));
    }
}
