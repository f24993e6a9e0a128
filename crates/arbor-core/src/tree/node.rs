//! Lattice vertices.

use std::fmt;
use std::sync::Arc;

use crate::tree::{Clause, Trigger};
use crate::types::{RelationshipType, TriggerId};

/// One vertex of the lattice: a clause and the triggers that contain it.
#[derive(Debug)]
pub struct Node<A> {
    clause: Clause,
    all_triggers: Vec<Arc<Trigger<A>>>,
    triggers: Vec<Arc<Trigger<A>>>,
}

impl<A> Node<A> {
    /// The root: the always-true clause with no triggers.
    pub(crate) fn root() -> Self {
        Self {
            clause: Clause::empty(),
            all_triggers: Vec::new(),
            triggers: Vec::new(),
        }
    }

    pub(crate) fn new(clause: &Clause, trigger: Arc<Trigger<A>>) -> Self {
        Self {
            clause: clause.node_clause(),
            all_triggers: vec![Arc::clone(&trigger)],
            triggers: vec![trigger],
        }
    }

    /// The conjunction this node represents.
    pub fn clause(&self) -> &Clause {
        &self.clause
    }

    /// Most specific triggers placed here.
    pub fn triggers(&self) -> &[Arc<Trigger<A>>] {
        &self.triggers
    }

    /// Every trigger placed here.
    pub fn all_triggers(&self) -> &[Arc<Trigger<A>>] {
        &self.all_triggers
    }

    /// Relationship between the clauses of two nodes.
    pub fn relationship<B>(&self, other: &Node<B>) -> RelationshipType {
        self.clause.relationship(&other.clause)
    }

    /// Place `trigger` here unless a trigger with an equal action already is.
    ///
    /// Returns whether it was placed.
    pub(crate) fn add_trigger(&mut self, trigger: Arc<Trigger<A>>) -> bool
    where
        A: PartialEq,
    {
        if self
            .all_triggers
            .iter()
            .any(|existing| existing.id() == trigger.id() || existing.action() == trigger.action())
        {
            return false;
        }
        self.all_triggers.push(Arc::clone(&trigger));
        insert_minimal(&mut self.triggers, trigger);
        true
    }

    /// Remove a trigger from this node. Returns whether it was here.
    pub(crate) fn remove_trigger(&mut self, id: TriggerId) -> bool {
        let Some(position) = self.all_triggers.iter().position(|t| t.id() == id) else {
            return false;
        };
        self.all_triggers.remove(position);

        if self.triggers.iter().any(|t| t.id() == id) {
            self.triggers.clear();
            for trigger in &self.all_triggers {
                insert_minimal(&mut self.triggers, Arc::clone(trigger));
            }
        }
        true
    }
}

/// Add `trigger` to a set of most specific triggers: it is dropped if it
/// generalizes a member and displaces members it specializes.
fn insert_minimal<A>(triggers: &mut Vec<Arc<Trigger<A>>>, trigger: Arc<Trigger<A>>) {
    let mut i = 0;
    while i < triggers.len() {
        match trigger.relationship(&triggers[i]) {
            RelationshipType::Generalizes => return,
            RelationshipType::Specializes => {
                triggers.remove(i);
            }
            _ => i += 1,
        }
    }
    triggers.push(trigger);
}

impl<A> fmt::Display for Node<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.clause)?;
        for (i, trigger) in self.triggers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", trigger.id())?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::PredicateComparers;
    use crate::tree::trigger::BuildContext;
    use arbor_expressions::parse;

    fn trigger(id: u64, text: &str, action: &'static str) -> Arc<Trigger<&'static str>> {
        let comparers = PredicateComparers::new();
        let context = BuildContext {
            optimizers: &[],
            comparers: &comparers,
            max_clauses: 64,
        };
        Arc::new(Trigger::new(TriggerId(id), parse(text).unwrap(), action, vec![], &context).unwrap())
    }

    #[test]
    fn test_duplicate_action_is_not_added() {
        let first = trigger(1, "exists(a)", "x");
        let mut node = Node::new(&first.clauses()[0], Arc::clone(&first));
        assert!(!node.add_trigger(trigger(2, "exists(a)", "x")));
        assert!(node.add_trigger(trigger(3, "exists(a)", "y")));
        assert_eq!(node.all_triggers().len(), 2);
        assert_eq!(node.triggers().len(), 2);
    }

    #[test]
    fn test_specific_trigger_displaces_general() {
        let general = trigger(1, "exists(blah) || exists(woof)", "general");
        let specific = trigger(2, "exists(blah)", "specific");
        let mut node = Node::new(&specific.clauses()[0], Arc::clone(&general));

        assert!(node.add_trigger(Arc::clone(&specific)));
        assert_eq!(node.all_triggers().len(), 2);
        let ids: Vec<_> = node.triggers().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![TriggerId(2)]);

        assert!(node.remove_trigger(TriggerId(2)));
        let ids: Vec<_> = node.triggers().iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![TriggerId(1)]);
        assert!(!node.remove_trigger(TriggerId(2)));
    }

    #[test]
    fn test_display() {
        let first = trigger(7, "exists(a)", "x");
        let node = Node::new(&first.clauses()[0], Arc::clone(&first));
        assert_eq!(node.to_string(), "(exists(a)) [t7]");
        assert_eq!(Node::<()>::root().to_string(), "() []");
    }
}
