//! Error types for trigger tree operations.
//!
//! Errors carry a structured code for programmatic handling and, where one
//! exists, a suggestion for resolving them.

use std::collections::HashMap;

use arbor_expressions::ExpressionError;
use thiserror::Error;

/// Result type alias for arbor operations.
pub type ArborResult<T> = Result<T, ArborError>;

/// Main error type for all arbor operations.
#[derive(Error, Debug)]
pub enum ArborError {
    /// A trigger or argument was rejected.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// Trigger source text failed to parse.
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValTooManyClauses,

    // Expression (EXPR_xxx)
    ExprParse,
    ExprEvaluation,

    // Configuration (CFG_xxx)
    CfgInvalid,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValTooManyClauses => "VAL_001",
            ErrorCode::ExprParse => "EXPR_001",
            ErrorCode::ExprEvaluation => "EXPR_002",
            ErrorCode::CfgInvalid => "CFG_001",
        }
    }
}

impl ArborError {
    /// Normal form expansion produced more clauses than allowed.
    pub fn too_many_clauses(produced: usize, limit: usize) -> Self {
        let mut details = HashMap::new();
        details.insert("clauses".to_string(), produced.to_string());
        details.insert("max_clauses".to_string(), limit.to_string());
        Self::Validation {
            message: format!(
                "expression expands to {} clauses, more than the limit of {}",
                produced, limit
            ),
            code: ErrorCode::ValTooManyClauses,
            details,
            suggestion: Some(
                "Split the trigger into smaller triggers or raise max_clauses".to_string(),
            ),
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::Expression(err) if err.is_parse_error() => ErrorCode::ExprParse,
            Self::Expression(_) => ErrorCode::ExprEvaluation,
            Self::Configuration(_) | Self::Io(_) => ErrorCode::CfgInvalid,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Expression(err) if err.is_parse_error() => {
                Some("Please check the trigger expression syntax")
            }
            Self::Configuration(_) => Some("Please check the trigger tree configuration"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_clauses() {
        let err = ArborError::too_many_clauses(5000, 4096);
        assert_eq!(err.code(), ErrorCode::ValTooManyClauses);
        assert!(err.suggestion().is_some());
        match err {
            ArborError::Validation { details, .. } => {
                assert_eq!(details.get("max_clauses").map(String::as_str), Some("4096"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_expression_error_codes() {
        let err: ArborError = ExpressionError::parse("unexpected ')'", 3).into();
        assert_eq!(err.code(), ErrorCode::ExprParse);
        assert!(err.suggestion().is_some());

        let err: ArborError = ExpressionError::DivisionByZero.into();
        assert_eq!(err.code(), ErrorCode::ExprEvaluation);
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::ValTooManyClauses.as_str(), "VAL_001");
        assert_eq!(ErrorCode::CfgInvalid.as_str(), "CFG_001");
    }
}
