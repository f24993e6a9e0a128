//! Partial-order relationship between clauses, triggers and predicates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// How one condition relates to another.
///
/// Read `a.relationship(b) == Specializes` as "`a` is true in a subset of the
/// states where `b` is true".
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// Strictly more specific.
    Specializes,
    /// Same set of states.
    Equal,
    /// Strictly more general.
    Generalizes,
    /// Neither contains the other.
    Incomparable,
}

impl RelationshipType {
    /// The relationship seen from the other side.
    pub fn swap(self) -> Self {
        match self {
            RelationshipType::Specializes => RelationshipType::Generalizes,
            RelationshipType::Generalizes => RelationshipType::Specializes,
            other => other,
        }
    }

    /// Equal or specializes.
    pub fn is_at_least_as_specific(self) -> bool {
        matches!(self, RelationshipType::Equal | RelationshipType::Specializes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap() {
        assert_eq!(RelationshipType::Specializes.swap(), RelationshipType::Generalizes);
        assert_eq!(RelationshipType::Generalizes.swap(), RelationshipType::Specializes);
        assert_eq!(RelationshipType::Equal.swap(), RelationshipType::Equal);
        assert_eq!(RelationshipType::Incomparable.swap(), RelationshipType::Incomparable);
    }

    #[test]
    fn test_strings() {
        assert_eq!(RelationshipType::Incomparable.to_string(), "incomparable");
        assert_eq!(
            "generalizes".parse::<RelationshipType>().unwrap(),
            RelationshipType::Generalizes
        );
        assert_eq!(
            serde_json::to_string(&RelationshipType::Specializes).unwrap(),
            "\"specializes\""
        );
    }
}
