//! Quantified variables expanded over concrete bindings.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How a quantifier combines its bindings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuantifierKind {
    /// Every binding must hold (conjunction).
    All,
    /// Some binding must hold (one clause per binding).
    Any,
}

/// A variable in a trigger expression together with the values it ranges
/// over.
///
/// Bindings are substituted textually for accessors of `variable`: a binding
/// that is a JSON scalar (`1`, `"red"`, `true`) becomes a constant, anything
/// else a state path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantifier {
    /// Variable name as it appears in the expression.
    pub variable: String,
    /// All or any.
    pub kind: QuantifierKind,
    /// Values to substitute, in order.
    pub bindings: Vec<String>,
}

impl Quantifier {
    /// Create a quantifier.
    pub fn new(
        variable: impl Into<String>,
        kind: QuantifierKind,
        bindings: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            variable: variable.into(),
            kind,
            bindings: bindings.into_iter().map(Into::into).collect(),
        }
    }

    /// Every binding must hold.
    pub fn all(
        variable: impl Into<String>,
        bindings: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::new(variable, QuantifierKind::All, bindings)
    }

    /// Any binding may hold.
    pub fn any(
        variable: impl Into<String>,
        bindings: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::new(variable, QuantifierKind::Any, bindings)
    }
}

impl std::fmt::Display for Quantifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} in [{}]", self.kind, self.variable, self.bindings.join(", "))
    }
}
