//! Clause rewrite hook.

use crate::tree::Clause;

/// Rewrites clauses after normal form expansion and before quantifiers are
/// expanded.
///
/// Every registered optimizer runs, in registration order, on every clause of
/// every trigger added afterwards.
#[cfg_attr(test, mockall::automock)]
pub trait Optimizer: Send + Sync {
    /// Rewrite `clause` in place.
    fn optimize(&self, clause: &mut Clause);
}
