//! Expression tree, type tags and structural operations.

use std::fmt;

use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};

use crate::evaluator::values_equal;

/// Type tag carried by every expression.
///
/// The tag is the key used to look up per-type behavior such as negation or
/// a registered predicate comparer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ExpressionType {
    #[strum(serialize = "constant")]
    Constant,
    #[strum(serialize = "accessor")]
    Accessor,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = "<=")]
    LessThanOrEqual,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = ">=")]
    GreaterThanOrEqual,
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "exists")]
    Exists,
    #[strum(serialize = "contains")]
    Contains,
    #[strum(serialize = "optional")]
    Optional,
    #[strum(serialize = "ignore")]
    Ignore,
}

impl ExpressionType {
    /// The expression type that negates this one, if any.
    ///
    /// `optional` and `ignore` are their own negation: a negation passes
    /// through them to their operand.
    pub fn negation(self) -> Option<ExpressionType> {
        use ExpressionType::*;
        match self {
            Equal => Some(NotEqual),
            NotEqual => Some(Equal),
            LessThan => Some(GreaterThanOrEqual),
            GreaterThanOrEqual => Some(LessThan),
            LessThanOrEqual => Some(GreaterThan),
            GreaterThan => Some(LessThanOrEqual),
            Optional => Some(Optional),
            Ignore => Some(Ignore),
            _ => None,
        }
    }

    /// Whether the type is written in call syntax, `name(args)`.
    pub fn is_function(self) -> bool {
        matches!(
            self,
            ExpressionType::Exists
                | ExpressionType::Contains
                | ExpressionType::Optional
                | ExpressionType::Ignore
        )
    }

    /// Whether the type is a binary comparison.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            ExpressionType::Equal
                | ExpressionType::NotEqual
                | ExpressionType::LessThan
                | ExpressionType::LessThanOrEqual
                | ExpressionType::GreaterThan
                | ExpressionType::GreaterThanOrEqual
        )
    }

    /// Look up a function by its call-syntax name.
    pub fn function(name: &str) -> Option<ExpressionType> {
        match name {
            "exists" => Some(ExpressionType::Exists),
            "contains" => Some(ExpressionType::Contains),
            "optional" => Some(ExpressionType::Optional),
            "ignore" => Some(ExpressionType::Ignore),
            _ => None,
        }
    }

    /// Binding strength used when rendering infix operators.
    fn precedence(self) -> u8 {
        use ExpressionType::*;
        match self {
            Or => 1,
            And => 2,
            Equal | NotEqual => 3,
            LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => 4,
            Add | Subtract => 5,
            Multiply | Divide => 6,
            Not => 7,
            _ => 8,
        }
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A literal value.
    Constant(Value),
    /// A dotted path into state, e.g. `user.addresses[0].city`.
    Accessor(String),
    /// An operator or function applied to child expressions.
    Call {
        kind: ExpressionType,
        children: Vec<Expression>,
    },
}

impl Expression {
    /// Create a constant expression.
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant(value.into())
    }

    /// Create an accessor expression.
    pub fn accessor(path: impl Into<String>) -> Self {
        Expression::Accessor(path.into())
    }

    /// Create an operator or function expression.
    pub fn make_expression(kind: ExpressionType, children: Vec<Expression>) -> Self {
        Expression::Call { kind, children }
    }

    /// Conjunction of `children`.
    ///
    /// No children gives `true` and a single child is returned unchanged.
    pub fn and_expression(mut children: Vec<Expression>) -> Self {
        match children.len() {
            0 => Expression::constant(true),
            1 => children.remove(0),
            _ => Expression::make_expression(ExpressionType::And, children),
        }
    }

    /// Disjunction of `children`.
    ///
    /// No children gives `false` and a single child is returned unchanged.
    pub fn or_expression(mut children: Vec<Expression>) -> Self {
        match children.len() {
            0 => Expression::constant(false),
            1 => children.remove(0),
            _ => Expression::make_expression(ExpressionType::Or, children),
        }
    }

    /// Logical negation of `child`.
    pub fn not_expression(child: Expression) -> Self {
        Expression::make_expression(ExpressionType::Not, vec![child])
    }

    /// The type tag of this expression.
    pub fn kind(&self) -> ExpressionType {
        match self {
            Expression::Constant(_) => ExpressionType::Constant,
            Expression::Accessor(_) => ExpressionType::Accessor,
            Expression::Call { kind, .. } => *kind,
        }
    }

    /// Child expressions; empty for constants and accessors.
    pub fn children(&self) -> &[Expression] {
        match self {
            Expression::Call { children, .. } => children,
            _ => &[],
        }
    }

    /// The literal value if this is a constant.
    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            Expression::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// The path if this is an accessor.
    pub fn as_accessor(&self) -> Option<&str> {
        match self {
            Expression::Accessor(path) => Some(path),
            _ => None,
        }
    }

    /// Structural equality.
    ///
    /// Children of `&&` and `||` are compared without regard to order and
    /// numbers are compared by value, so `1 == 1.0`.
    pub fn deep_equals(&self, other: &Expression) -> bool {
        match (self, other) {
            (Expression::Constant(a), Expression::Constant(b)) => values_equal(a, b),
            (Expression::Accessor(a), Expression::Accessor(b)) => a == b,
            (
                Expression::Call { kind, children },
                Expression::Call {
                    kind: other_kind,
                    children: other_children,
                },
            ) => {
                if kind != other_kind || children.len() != other_children.len() {
                    return false;
                }
                if matches!(kind, ExpressionType::And | ExpressionType::Or) {
                    unordered_equals(children, other_children)
                } else {
                    children
                        .iter()
                        .zip(other_children)
                        .all(|(a, b)| a.deep_equals(b))
                }
            }
            _ => false,
        }
    }

    /// Replace references to `variable` with `binding`.
    ///
    /// An accessor whose whole path is `variable` becomes the binding: a JSON
    /// scalar literal (`2`, `true`, `"red"`) turns into a constant, anything
    /// else into an accessor. A path that continues past the variable, such as
    /// `variable.name`, is re-rooted at the binding path. Returns the new
    /// expression and whether anything changed.
    pub fn substitute(&self, variable: &str, binding: &str) -> (Expression, bool) {
        match self {
            Expression::Accessor(path) if path == variable => (binding_expression(binding), true),
            Expression::Accessor(path) => match path.strip_prefix(variable) {
                Some(rest) if rest.starts_with('.') || rest.starts_with('[') => {
                    (Expression::Accessor(format!("{}{}", binding, rest)), true)
                }
                _ => (self.clone(), false),
            },
            Expression::Constant(_) => (self.clone(), false),
            Expression::Call { kind, children } => {
                let mut changed = false;
                let children = children
                    .iter()
                    .map(|child| {
                        let (child, child_changed) = child.substitute(variable, binding);
                        changed |= child_changed;
                        child
                    })
                    .collect();
                if changed {
                    (Expression::make_expression(*kind, children), true)
                } else {
                    (self.clone(), false)
                }
            }
        }
    }

    /// Whether any accessor in this expression refers to `variable`.
    pub fn references(&self, variable: &str) -> bool {
        self.substitute(variable, "").1
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::Call { kind, .. } => kind.precedence(),
            _ => 8,
        }
    }
}

fn unordered_equals(children: &[Expression], others: &[Expression]) -> bool {
    let mut used = vec![false; others.len()];
    children.iter().all(|child| {
        match (0..others.len()).find(|&i| !used[i] && child.deep_equals(&others[i])) {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

fn binding_expression(binding: &str) -> Expression {
    match serde_json::from_str::<Value>(binding) {
        Ok(value) if !value.is_array() && !value.is_object() => Expression::Constant(value),
        _ => Expression::Accessor(binding.to_string()),
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Constant(value)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(Value::String(text)) => {
                f.write_str("'")?;
                for c in text.chars() {
                    match c {
                        '\'' => f.write_str("\\'")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("'")
            }
            Expression::Constant(value) => write!(f, "{}", value),
            Expression::Accessor(path) => f.write_str(path),
            Expression::Call { kind, children } if kind.is_function() => {
                write!(f, "{}(", kind)?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
            Expression::Call {
                kind: ExpressionType::Not,
                children,
            } => {
                f.write_str("!")?;
                for child in children {
                    write_operand(f, child, ExpressionType::Not.precedence(), false)?;
                }
                Ok(())
            }
            Expression::Call { kind, children } => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", kind)?;
                    }
                    write_operand(f, child, kind.precedence(), i > 0)?;
                }
                Ok(())
            }
        }
    }
}

fn write_operand(
    f: &mut fmt::Formatter<'_>,
    child: &Expression,
    parent: u8,
    right: bool,
) -> fmt::Result {
    let precedence = child.precedence();
    if precedence < parent || (right && precedence == parent) {
        write!(f, "({})", child)
    } else {
        write!(f, "{}", child)
    }
}
