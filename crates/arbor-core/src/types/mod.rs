//! Core value types.

mod quantifier;
mod relationship;

pub use quantifier::{Quantifier, QuantifierKind};
pub use relationship::RelationshipType;

use serde::{Deserialize, Serialize};

/// Identifier the tree assigns to each trigger it builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TriggerId(pub u64);

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}
