//! Programmer-facing errors raised by the binding engine.
//!
//! User input never produces one of these: a bad edit is a
//! [`crate::control::Parsed::Invalid`] outcome and a rule violation is a
//! validation message. These errors mean the engine was configured wrongly.

use money::MoneyError;

/// Grepable error code for structured error reporting.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("unknown control type: {0}")]
    UnknownType(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("control '{tag}' for '{prop}' needs an options set")]
    MissingOptions { prop: String, tag: String },
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl ErrorCode for BindError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownType(_) => "E_UNKNOWN_TYPE",
            Self::InvalidPath(_) => "E_INVALID_PATH",
            Self::MissingOptions { .. } => "E_MISSING_OPTIONS",
            Self::Money(err) => err.error_code(),
        }
    }
}

impl ErrorCode for MoneyError {
    fn error_code(&self) -> &'static str {
        MoneyError::error_code(self)
    }
}
