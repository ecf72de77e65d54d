//! Structured expression errors
//!
//! Providers report compile failures as `ExprError` values. The gateway
//! passes them to the caller untouched, so everything a caller needs to
//! decide what to do (skip the binding, log, abort) lives on the error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const UNSUPPORTED_VERSION: &str = "UNSUPPORTED_VERSION";
    pub const UNSUPPORTED_SOURCE: &str = "UNSUPPORTED_SOURCE";
    pub const TYPE_ERROR: &str = "TYPE_ERROR";
}

/// Severity level of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The binding failed; the rest of the template can still render
    Error,
    /// Nothing in the template can be compiled, e.g. an unsupported version
    Fatal,
}

/// Error raised by an expression provider
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("[{code}] {message}{}", suggestion_suffix(.suggestion))]
pub struct ExprError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Expression text that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    pub severity: Severity,
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (suggestion: {})", s),
        None => String::new(),
    }
}

impl ExprError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            expression: None,
            severity: Severity::Error,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder: attach the failing expression text
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    /// Builder: set severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    // ========== Common Error Constructors ==========

    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, format!("Parse error: {}", details.into()))
            .with_suggestion("Check expression syntax")
    }

    pub fn unsupported_version(version: Option<&str>, supported: &[String]) -> Self {
        let version = version.unwrap_or("<none>");
        Self::new(
            codes::UNSUPPORTED_VERSION,
            format!("Unsupported expression version: {}", version),
        )
        .with_suggestion(format!("Supported versions: {}", supported.join(", ")))
        .with_severity(Severity::Fatal)
    }

    pub fn unsupported_source(type_name: &str) -> Self {
        Self::new(
            codes::UNSUPPORTED_SOURCE,
            format!("Cannot compile a {} expression", type_name),
        )
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        Self::new(codes::TYPE_ERROR, format!("Expected {}, got {}", expected, got))
    }
}
