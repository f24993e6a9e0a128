//! arbor-expressions - Boolean expression language for arbor.
//!
//! This crate provides the expression tree that trigger conditions are written
//! in, a text parser for it, and an evaluator against JSON-shaped state.
//!
//! # Example
//!
//! ```
//! use arbor_expressions::parse;
//! use serde_json::json;
//!
//! let expr = parse("user.age >= 18 && contains(user.roles, 'admin')").unwrap();
//! let state = json!({"user": {"age": 30, "roles": ["admin"]}});
//! assert!(expr.is_true(&state).unwrap());
//! ```

mod error;
mod evaluator;
mod expression;
mod parser;

pub use error::{ExpressionError, ExpressionResult};
pub use evaluator::{is_truthy, values_equal, State};
pub use expression::{Expression, ExpressionType};
pub use parser::parse;
