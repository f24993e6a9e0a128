//! Per-predicate relationship strategies.

use std::collections::HashMap;
use std::sync::Arc;

use arbor_expressions::{Expression, ExpressionType};
use serde_json::Value;

use crate::types::RelationshipType;

/// Compares two predicates of the same expression type.
///
/// Without a registered comparer two predicates relate only when they are
/// structurally equal.
#[cfg_attr(test, mockall::automock)]
pub trait PredicateComparer: Send + Sync {
    /// Expression type this comparer handles.
    fn predicate(&self) -> ExpressionType;

    /// Relationship of `predicate` to `other`.
    fn relationship(&self, predicate: &Expression, other: &Expression) -> RelationshipType;
}

/// Registered comparers keyed by expression type.
pub type PredicateComparers = HashMap<ExpressionType, Arc<dyn PredicateComparer>>;

/// Orders `path op number` predicates that share a path.
///
/// `x > 5` specializes `x > 3`, `x <= 2` specializes `x <= 7`. For `==` and
/// `!=` only identical thresholds relate. Predicates on different paths, or
/// not of the form `accessor op number`, are incomparable.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdComparer {
    kind: ExpressionType,
}

impl ThresholdComparer {
    /// Create a comparer for one comparison operator.
    ///
    /// Returns `None` if `kind` is not a comparison.
    pub fn new(kind: ExpressionType) -> Option<Self> {
        kind.is_comparison().then_some(Self { kind })
    }

    fn threshold<'a>(&self, expression: &'a Expression) -> Option<(&'a str, f64)> {
        if expression.kind() != self.kind {
            return None;
        }
        match expression.children() {
            [path, value] => Some((path.as_accessor()?, value.as_constant().and_then(Value::as_f64)?)),
            _ => None,
        }
    }
}

impl PredicateComparer for ThresholdComparer {
    fn predicate(&self) -> ExpressionType {
        self.kind
    }

    fn relationship(&self, predicate: &Expression, other: &Expression) -> RelationshipType {
        let (Some((path, a)), Some((other_path, b))) =
            (self.threshold(predicate), self.threshold(other))
        else {
            return RelationshipType::Incomparable;
        };
        if path != other_path {
            return RelationshipType::Incomparable;
        }
        if a == b {
            return RelationshipType::Equal;
        }

        // Larger lower bounds and smaller upper bounds are more specific.
        let tighter = match self.kind {
            ExpressionType::GreaterThan | ExpressionType::GreaterThanOrEqual => a > b,
            ExpressionType::LessThan | ExpressionType::LessThanOrEqual => a < b,
            _ => return RelationshipType::Incomparable,
        };
        if tighter {
            RelationshipType::Specializes
        } else {
            RelationshipType::Generalizes
        }
    }
}
