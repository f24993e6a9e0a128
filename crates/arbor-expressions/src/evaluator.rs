//! Evaluation of expressions against runtime state.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::error::{ExpressionError, ExpressionResult};
use crate::expression::{Expression, ExpressionType};

/// Read-only view of the state an expression is evaluated against.
pub trait State {
    /// Resolve a dotted accessor path. `None` when the path does not exist.
    fn lookup(&self, path: &str) -> Option<Value>;
}

impl State for Value {
    fn lookup(&self, path: &str) -> Option<Value> {
        resolve(self, &segments(path)?).cloned()
    }
}

impl State for Map<String, Value> {
    fn lookup(&self, path: &str) -> Option<Value> {
        let segments = segments(path)?;
        let (first, rest) = segments.split_first()?;
        match first {
            Segment::Field(name) => resolve(self.get(*name)?, rest).cloned(),
            Segment::Index(_) => None,
        }
    }
}

impl State for HashMap<String, Value> {
    fn lookup(&self, path: &str) -> Option<Value> {
        let segments = segments(path)?;
        let (first, rest) = segments.split_first()?;
        match first {
            Segment::Field(name) => resolve(self.get(*name)?, rest).cloned(),
            Segment::Index(_) => None,
        }
    }
}

impl<T: State + ?Sized> State for &T {
    fn lookup(&self, path: &str) -> Option<Value> {
        (**self).lookup(path)
    }
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Field(&'a str),
    Index(usize),
}

/// Split `a.b[2].c` into field and index segments.
fn segments(path: &str) -> Option<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (name, mut indices) = match part.find('[') {
            Some(open) => (&part[..open], &part[open..]),
            None => (part, ""),
        };
        if !name.is_empty() {
            segments.push(Segment::Field(name));
        }
        while let Some(stripped) = indices.strip_prefix('[') {
            let close = stripped.find(']')?;
            segments.push(Segment::Index(stripped[..close].trim().parse().ok()?));
            indices = &stripped[close + 1..];
        }
        if !indices.is_empty() {
            return None;
        }
    }
    Some(segments)
}

fn resolve<'v>(mut value: &'v Value, segments: &[Segment<'_>]) -> Option<&'v Value> {
    for segment in segments {
        value = match segment {
            Segment::Field(name) => value.as_object()?.get(*name)?,
            Segment::Index(index) => value.as_array()?.get(*index)?,
        };
    }
    Some(value)
}

/// Truthiness of an evaluated value.
///
/// `false`, `null`, `0` and `""` are false; everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Value equality with numbers compared numerically.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, a)| y.get(key).map_or(false, |b| values_equal(a, b)))
        }
        _ => a == b,
    }
}

impl Expression {
    /// Evaluate against `state`.
    ///
    /// Missing paths evaluate to `null`. Comparing values that have no
    /// ordering, arithmetic on non-numbers and division by zero are errors.
    pub fn try_evaluate(&self, state: &dyn State) -> ExpressionResult<Value> {
        match self {
            Expression::Constant(value) => Ok(value.clone()),
            Expression::Accessor(path) => Ok(state.lookup(path).unwrap_or(Value::Null)),
            Expression::Call { kind, children } => evaluate_call(*kind, children, state),
        }
    }

    /// Evaluate and report whether the result is truthy.
    pub fn is_true(&self, state: &dyn State) -> ExpressionResult<bool> {
        self.try_evaluate(state).map(|value| is_truthy(&value))
    }
}

fn evaluate_call(
    kind: ExpressionType,
    children: &[Expression],
    state: &dyn State,
) -> ExpressionResult<Value> {
    use ExpressionType::*;
    match kind {
        And => {
            for child in children {
                if !child.is_true(state)? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        Or => {
            for child in children {
                if child.is_true(state)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        Not => Ok(Value::Bool(!unary(kind, children)?.is_true(state)?)),
        Exists => Ok(Value::Bool(!unary(kind, children)?.try_evaluate(state)?.is_null())),
        Ignore => Ok(Value::Bool(unary(kind, children)?.is_true(state)?)),
        // Matches with or without its operand.
        Optional => Ok(Value::Bool(true)),
        Equal | NotEqual => {
            let (left, right) = binary(kind, children, state)?;
            let equal = values_equal(&left, &right);
            Ok(Value::Bool(if kind == Equal { equal } else { !equal }))
        }
        LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            let (left, right) = binary(kind, children, state)?;
            let ordering = compare(&left, &right)?;
            Ok(Value::Bool(match kind {
                LessThan => ordering == Ordering::Less,
                LessThanOrEqual => ordering != Ordering::Greater,
                GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        Add | Subtract | Multiply | Divide => {
            let (left, right) = binary(kind, children, state)?;
            arithmetic(kind, &left, &right)
        }
        Contains => {
            let (container, item) = binary(kind, children, state)?;
            contains(&container, &item).map(Value::Bool)
        }
        Constant | Accessor => Err(ExpressionError::type_mismatch(format!(
            "'{}' cannot be applied as an operator",
            kind
        ))),
    }
}

fn unary(kind: ExpressionType, children: &[Expression]) -> ExpressionResult<&Expression> {
    match children {
        [child] => Ok(child),
        _ => Err(ExpressionError::Arity {
            function: kind.to_string(),
            expected: 1,
            actual: children.len(),
        }),
    }
}

fn binary(
    kind: ExpressionType,
    children: &[Expression],
    state: &dyn State,
) -> ExpressionResult<(Value, Value)> {
    match children {
        [left, right] => Ok((left.try_evaluate(state)?, right.try_evaluate(state)?)),
        _ => Err(ExpressionError::Arity {
            function: kind.to_string(),
            expected: 2,
            actual: children.len(),
        }),
    }
}

fn compare(left: &Value, right: &Value) -> ExpressionResult<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
            a.partial_cmp(&b)
                .ok_or_else(|| ExpressionError::InvalidNumber(format!("{} <=> {}", a, b)))
        }
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(ExpressionError::type_mismatch(format!(
            "cannot order {} and {}",
            type_name(left),
            type_name(right)
        ))),
    }
}

fn arithmetic(kind: ExpressionType, left: &Value, right: &Value) -> ExpressionResult<Value> {
    if kind == ExpressionType::Add {
        if let (Value::String(a), Value::String(b)) = (left, right) {
            return Ok(Value::String(format!("{}{}", a, b)));
        }
    }

    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(ExpressionError::type_mismatch(format!(
            "'{}' needs numbers, got {} and {}",
            kind,
            type_name(left),
            type_name(right)
        )));
    };

    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        let exact = match kind {
            ExpressionType::Add => a.checked_add(b),
            ExpressionType::Subtract => a.checked_sub(b),
            ExpressionType::Multiply => a.checked_mul(b),
            _ if b != 0 && a.checked_rem(b) == Some(0) => a.checked_div(b),
            _ => None,
        };
        if let Some(result) = exact {
            return Ok(Value::from(result));
        }
    }

    let result = match kind {
        ExpressionType::Add => a + b,
        ExpressionType::Subtract => a - b,
        ExpressionType::Multiply => a * b,
        _ if b == 0.0 => return Err(ExpressionError::DivisionByZero),
        _ => a / b,
    };
    Number::from_f64(result)
        .map(Value::Number)
        .ok_or_else(|| ExpressionError::InvalidNumber(result.to_string()))
}

fn contains(container: &Value, item: &Value) -> ExpressionResult<bool> {
    match (container, item) {
        (Value::String(text), Value::String(part)) => Ok(text.contains(part.as_str())),
        (Value::Array(items), item) => Ok(items.iter().any(|candidate| values_equal(candidate, item))),
        (Value::Object(map), Value::String(key)) => Ok(map.contains_key(key)),
        (Value::Null, _) => Ok(false),
        _ => Err(ExpressionError::type_mismatch(format!(
            "cannot test whether {} contains {}",
            type_name(container),
            type_name(item)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
