//! Error types for parsing and evaluating expressions.

use thiserror::Error;

/// Result type alias for expression operations.
pub type ExpressionResult<T> = Result<T, ExpressionError>;

/// Errors raised while parsing or evaluating an expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// The source text is not a valid expression.
    #[error("Parse error at offset {position}: {message}")]
    Parse { message: String, position: usize },

    /// A function was called with the wrong number of arguments.
    #[error("Function '{function}' expects {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// A function name that the language does not define.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Operands have types the operator cannot combine.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Division by zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// A numeric result that cannot be represented (NaN or infinite).
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

impl ExpressionError {
    /// Create a parse error at the given byte offset.
    pub fn parse(message: impl Into<String>, position: usize) -> Self {
        Self::Parse {
            message: message.into(),
            position,
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch(message.into())
    }

    /// Whether this error was raised by the parser rather than the evaluator.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::Arity { .. } | Self::UnknownFunction(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ExpressionError::parse("unexpected token ')'", 7);
        assert_eq!(
            err.to_string(),
            "Parse error at offset 7: unexpected token ')'"
        );
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_evaluation_errors_are_not_parse_errors() {
        assert!(!ExpressionError::DivisionByZero.is_parse_error());
        assert!(!ExpressionError::type_mismatch("string > number").is_parse_error());
    }
}
