//! Clauses, triggers and the specialization lattice they are placed in.

mod clause;
mod node;
mod trigger;
mod trigger_tree;

pub use clause::{Clause, Predicate};
pub use node::Node;
pub use trigger::Trigger;
pub use trigger_tree::{NodeId, TriggerTree};
