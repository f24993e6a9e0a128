//! arbor-core - Trigger tree for arbor.
//!
//! This crate indexes many boolean trigger expressions in a lattice ordered
//! by specialization, so the triggers satisfied by a state can be found
//! without evaluating every trigger.
//!
//! # Example
//!
//! ```
//! use arbor_core::{Quantifier, TriggerTree};
//! use serde_json::json;
//!
//! let mut tree = TriggerTree::new();
//! tree.add_trigger_str("item == v", "order", vec![Quantifier::any("v", ["1", "2", "3"])])
//!     .unwrap();
//!
//! let matches = tree.matches(&json!({"item": 2}));
//! assert_eq!(matches.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod traits;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use config::{MatchMode, TriggerTreeConfig};
pub use error::{ArborError, ArborResult, ErrorCode};
pub use traits::{Optimizer, PredicateComparer, PredicateComparers, ThresholdComparer};
pub use tree::{Clause, Node, NodeId, Predicate, Trigger, TriggerTree};
pub use types::{Quantifier, QuantifierKind, RelationshipType, TriggerId};

pub use arbor_expressions::{parse, Expression, ExpressionType, State};
