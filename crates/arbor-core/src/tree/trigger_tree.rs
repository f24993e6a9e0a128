//! The trigger tree: a lattice of clauses ordered by specialization.
//!
//! Nodes live in a petgraph arena with edges from a clause to the clauses
//! that specialize it. The root holds the always-true clause. A node can be
//! reached through several parents, so every traversal carries its own
//! visited bookkeeping.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use arbor_expressions::{parse, Expression, State};
use petgraph::dot::{Config as DotConfig, Dot};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use tracing::{debug, trace, warn};

use crate::config::{MatchMode, TriggerTreeConfig};
use crate::error::ArborResult;
use crate::traits::{Optimizer, PredicateComparer, PredicateComparers};
use crate::tree::trigger::BuildContext;
use crate::tree::{Node, Trigger};
use crate::types::{Quantifier, RelationshipType, TriggerId};

/// Index of a node in the lattice.
pub type NodeId = NodeIndex;

/// Outcome of offering a new node to part of the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    /// Unrelated to this part of the lattice.
    None,
    /// An equal node already holds the trigger's action.
    Found,
    /// The trigger was placed.
    Added,
    /// This node specializes the new one and now hangs below it.
    Inserted,
}

#[derive(Default)]
struct AddContext {
    ops: HashMap<NodeId, Operation>,
}

#[derive(Default)]
struct RemoveContext {
    visited: HashSet<NodeId>,
    detached: BTreeSet<NodeId>,
}

struct MatchContext<A> {
    matched: HashMap<NodeId, bool>,
    found: BTreeMap<TriggerId, Arc<Trigger<A>>>,
}

/// Indexes trigger expressions so that the triggers satisfied by a state can
/// be found without evaluating every one of them.
///
/// # Example
///
/// ```
/// use arbor_core::{MatchMode, TriggerTree, TriggerTreeConfig};
/// use serde_json::json;
///
/// let state = json!({"user": {"age": 30, "vip": true}});
///
/// let mut tree = TriggerTree::new();
/// tree.add_trigger_str("user.age > 21", "adult", vec![]).unwrap();
/// tree.add_trigger_str("user.age > 21 && user.vip == true", "vip", vec![]).unwrap();
///
/// // Only the most specific satisfied trigger is reported by default.
/// let matches = tree.matches(&state);
/// assert_eq!(matches.len(), 1);
/// assert_eq!(*matches[0].action(), "vip");
///
/// let config = TriggerTreeConfig::builder()
///     .match_mode(MatchMode::Exhaustive)
///     .build();
/// let mut tree = TriggerTree::with_config(config).unwrap();
/// tree.add_trigger_str("user.age > 21", "adult", vec![]).unwrap();
/// tree.add_trigger_str("user.age > 21 && user.vip == true", "vip", vec![]).unwrap();
/// assert_eq!(tree.matches(&state).len(), 2);
/// ```
pub struct TriggerTree<A> {
    graph: StableDiGraph<Node<A>, ()>,
    root: NodeId,
    optimizers: Vec<Arc<dyn Optimizer>>,
    comparers: PredicateComparers,
    config: TriggerTreeConfig,
    next_id: u64,
    total_triggers: usize,
}

impl<A> TriggerTree<A> {
    /// Create an empty tree with default configuration.
    pub fn new() -> Self {
        Self::empty(TriggerTreeConfig::default())
    }

    /// Create an empty tree, rejecting an unusable configuration.
    pub fn with_config(config: TriggerTreeConfig) -> ArborResult<Self> {
        config.validate()?;
        Ok(Self::empty(config))
    }

    fn empty(config: TriggerTreeConfig) -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(Node::root());
        Self {
            graph,
            root,
            optimizers: Vec::new(),
            comparers: PredicateComparers::new(),
            config,
            next_id: 1,
            total_triggers: 0,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &TriggerTreeConfig {
        &self.config
    }

    /// Register a comparer for its expression type, replacing any previous
    /// one. Only triggers added afterwards use it.
    pub fn register_comparer(
        &mut self,
        comparer: Arc<dyn PredicateComparer>,
    ) -> Option<Arc<dyn PredicateComparer>> {
        self.comparers.insert(comparer.predicate(), comparer)
    }

    /// Registered comparers.
    pub fn comparers(&self) -> &PredicateComparers {
        &self.comparers
    }

    /// Register a clause optimizer for triggers added afterwards.
    pub fn register_optimizer(&mut self, optimizer: Arc<dyn Optimizer>) {
        self.optimizers.push(optimizer);
    }

    /// Number of triggers currently placed.
    pub fn total_triggers(&self) -> usize {
        self.total_triggers
    }

    /// The root node, holding the always-true clause.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node<A>> {
        self.graph.node_weight(id)
    }

    /// Number of nodes, including the root.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Direct specializations of `node`, ordered by node index.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.neighbors(node, Direction::Outgoing)
    }

    fn parents(&self, node: NodeId) -> Vec<NodeId> {
        self.neighbors(node, Direction::Incoming)
    }

    fn neighbors(&self, node: NodeId, direction: Direction) -> Vec<NodeId> {
        let mut neighbors: Vec<NodeId> = self.graph.neighbors_directed(node, direction).collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }

    fn relationship(&self, node: NodeId, other: NodeId) -> RelationshipType {
        self.graph[node].relationship(&self.graph[other])
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        while let Some(edge) = self.graph.find_edge(parent, child) {
            self.graph.remove_edge(edge);
        }
    }

    /// Triggers satisfied by `state`.
    ///
    /// In [`MatchMode::MostSpecific`] a node only reports when none of its
    /// specializations matched, so a satisfied trigger is hidden by a more
    /// specific satisfied one. Use [`MatchMode::Exhaustive`] to get every
    /// satisfied trigger along a specialization chain. Results are in trigger
    /// creation order.
    pub fn matches(&self, state: &dyn State) -> Vec<Arc<Trigger<A>>> {
        let mut context = MatchContext {
            matched: HashMap::new(),
            found: BTreeMap::new(),
        };
        self.match_node(self.root, state, &mut context);
        trace!(matches = context.found.len(), "Matched state against trigger tree");
        context.found.into_values().collect()
    }

    fn match_node(&self, node: NodeId, state: &dyn State, context: &mut MatchContext<A>) -> bool {
        if let Some(&found) = context.matched.get(&node) {
            return found;
        }

        let mut found = false;
        for child in self.children(node) {
            if self.match_node(child, state, context) {
                found = true;
            }
        }

        let exhaustive = self.config.match_mode == MatchMode::Exhaustive;
        if (!found || exhaustive) && self.evaluate(node, state) {
            let current = &self.graph[node];
            let candidates = if exhaustive {
                current.all_triggers()
            } else {
                current.triggers()
            };
            for trigger in candidates {
                if trigger.matches(current.clause(), state) {
                    context.found.insert(trigger.id(), Arc::clone(trigger));
                    found = true;
                }
            }
        }

        context.matched.insert(node, found);
        found
    }

    fn evaluate(&self, node: NodeId, state: &dyn State) -> bool {
        match self.graph[node].clause().try_evaluate(state) {
            Ok(matched) => matched,
            Err(err) => {
                if self.config.log_evaluation_errors {
                    debug!(node = node.index(), error = %err, "Clause evaluation failed");
                } else {
                    trace!(node = node.index(), error = %err, "Clause evaluation failed");
                }
                false
            }
        }
    }

    /// Check the lattice invariants.
    ///
    /// Returns the first node that has a child it does not generalize, or two
    /// children that are related.
    pub fn verify_tree(&self) -> Option<NodeId> {
        self.verify_node(self.root, &mut HashSet::new())
    }

    fn verify_node(&self, node: NodeId, visited: &mut HashSet<NodeId>) -> Option<NodeId> {
        if !visited.insert(node) {
            return None;
        }
        let children = self.children(node);
        for (i, &first) in children.iter().enumerate() {
            if self.relationship(node, first) != RelationshipType::Generalizes {
                return Some(node);
            }
            if children[i + 1..]
                .iter()
                .any(|&second| self.relationship(first, second) != RelationshipType::Incomparable)
            {
                return Some(node);
            }
            if let Some(bad) = self.verify_node(first, visited) {
                return Some(bad);
            }
        }
        None
    }

    /// Indented dump of the lattice, one node per line.
    ///
    /// Nodes with several parents appear once under each.
    pub fn tree_to_string(&self) -> String {
        let mut out = String::new();
        self.write_node(&mut out, self.root, 0);
        out
    }

    fn write_node(&self, out: &mut String, node: NodeId, indent: usize) {
        out.push_str(&format!("{:indent$}{}\n", "", self.graph[node], indent = indent));
        for child in self.children(node) {
            self.write_node(out, child, indent + 2);
        }
    }

    /// Graphviz rendering of the lattice.
    pub fn to_dot(&self) -> String {
        let labels = self
            .graph
            .map(|_, node| node.to_string(), |_, _| String::new());
        format!("{}", Dot::with_config(&labels, &[DotConfig::EdgeNoLabel]))
    }
}

impl<A: PartialEq> TriggerTree<A> {
    /// Normalize `expression` into a trigger and place its clauses.
    ///
    /// The trigger count only grows if some clause was placed; re-adding an
    /// expression with an action already present at its nodes is a no-op.
    pub fn add_trigger(
        &mut self,
        expression: Expression,
        action: A,
        quantifiers: Vec<Quantifier>,
    ) -> ArborResult<Arc<Trigger<A>>> {
        let id = TriggerId(self.next_id);
        self.next_id += 1;

        let context = BuildContext {
            optimizers: &self.optimizers,
            comparers: &self.comparers,
            max_clauses: self.config.max_clauses,
        };
        let trigger = match Trigger::new(id, expression, action, quantifiers, &context) {
            Ok(trigger) => Arc::new(trigger),
            Err(err) => {
                warn!(trigger = %id, error = %err, "Rejected trigger");
                return Err(err);
            }
        };

        let mut added = false;
        for clause in trigger.clauses() {
            let node = self.graph.add_node(Node::new(clause, Arc::clone(&trigger)));
            let op = self.add_node(self.root, node, &mut AddContext::default());
            trace!(trigger = %id, clause = %clause, ?op, "Offered clause to trigger tree");
            added |= op == Operation::Added;
            if self.parents(node).is_empty() {
                self.graph.remove_node(node);
            }
        }

        if added {
            self.total_triggers += 1;
        }
        debug!(
            trigger = %id,
            clauses = trigger.clauses().len(),
            added,
            nodes = self.graph.node_count(),
            "Added trigger"
        );
        Ok(trigger)
    }

    /// Parse `text` and add it as a trigger.
    pub fn add_trigger_str(
        &mut self,
        text: &str,
        action: A,
        quantifiers: Vec<Quantifier>,
    ) -> ArborResult<Arc<Trigger<A>>> {
        let expression = parse(text)?;
        self.add_trigger(expression, action, quantifiers)
    }

    /// Remove a trigger from every node it was placed in.
    ///
    /// Nodes left without triggers are deleted and their specializations
    /// move up to the deleted node's parents.
    pub fn remove_trigger(&mut self, trigger: &Trigger<A>) -> bool {
        let mut context = RemoveContext::default();
        let removed = self.remove_from(self.root, trigger.id(), &mut context);
        let detached = context.detached.len();
        self.reclaim(context.detached);

        if removed {
            self.total_triggers = self.total_triggers.saturating_sub(1);
        }
        debug!(
            trigger = %trigger.id(),
            removed,
            detached,
            nodes = self.graph.node_count(),
            "Removed trigger"
        );
        removed
    }

    fn add_node(&mut self, this: NodeId, new: NodeId, context: &mut AddContext) -> Operation {
        if this == new {
            return Operation::None;
        }
        if let Some(&op) = context.ops.get(&this) {
            return op;
        }

        let relationship = self.relationship(this, new);
        trace!(node = this.index(), new = new.index(), %relationship, "Comparing nodes");
        let op = match relationship {
            RelationshipType::Equal => {
                let triggers = self.graph[new].all_triggers().to_vec();
                let mut op = Operation::Found;
                for trigger in triggers {
                    if self.graph[this].add_trigger(trigger) {
                        op = Operation::Added;
                    }
                }
                op
            }
            RelationshipType::Incomparable => {
                for child in self.children(this) {
                    self.add_node(child, new, context);
                }
                Operation::None
            }
            RelationshipType::Specializes => {
                self.add_specialization(new, this);
                Operation::Inserted
            }
            RelationshipType::Generalizes => {
                let mut found_one = false;
                let mut removals = Vec::new();
                let mut op = Operation::None;
                for child in self.children(this) {
                    match self.add_node(child, new, context) {
                        Operation::None => {}
                        Operation::Inserted => {
                            found_one = true;
                            removals.push(child);
                            op = Operation::Added;
                        }
                        child_op => {
                            found_one = true;
                            if op != Operation::Added {
                                op = child_op;
                            }
                        }
                    }
                }

                if !removals.is_empty() {
                    for removal in removals {
                        self.detach(this, removal);
                    }
                    self.graph.update_edge(this, new, ());
                }
                if !found_one {
                    self.graph.update_edge(this, new, ());
                    op = Operation::Added;
                }
                op
            }
        };

        context.ops.insert(this, op);
        op
    }

    /// Hang `specialization` below `node`, pushing down any children of
    /// `node` that `specialization` generalizes.
    fn add_specialization(&mut self, node: NodeId, specialization: NodeId) -> bool {
        let mut removals = Vec::new();
        for child in self.children(node) {
            if child == specialization {
                return false;
            }
            match self.relationship(specialization, child) {
                RelationshipType::Equal | RelationshipType::Specializes => return false,
                RelationshipType::Generalizes => removals.push(child),
                RelationshipType::Incomparable => {}
            }
        }

        for removal in removals {
            self.detach(node, removal);
            self.add_specialization(specialization, removal);
        }
        self.graph.update_edge(node, specialization, ());
        true
    }

    fn remove_from(&mut self, this: NodeId, id: TriggerId, context: &mut RemoveContext) -> bool {
        if !context.visited.insert(this) {
            return false;
        }

        let mut removed = self.graph[this].remove_trigger(id);
        let mut removals = Vec::new();
        for child in self.children(this) {
            if self.remove_from(child, id, context) {
                removed = true;
            }
            if self.graph[child].triggers().is_empty() {
                removals.push(child);
            }
        }

        for &removal in &removals {
            self.detach(this, removal);
            context.detached.insert(removal);
        }
        // Specializations of a deleted node move up, below whichever
        // remaining descendant of this node generalizes them.
        for removal in removals {
            for specialization in self.children(removal) {
                trace!(
                    node = this.index(),
                    child = specialization.index(),
                    "Moving specialization up"
                );
                self.add_node(this, specialization, &mut AddContext::default());
            }
        }

        removed
    }

    /// Free detached nodes and re-place any specialization that lost its
    /// last parent.
    fn reclaim(&mut self, detached: BTreeSet<NodeId>) {
        let mut orphans = Vec::new();
        for node in detached {
            if self.graph.contains_node(node) && self.parents(node).is_empty() {
                orphans.extend(self.children(node));
                self.graph.remove_node(node);
            }
        }

        while let Some(orphan) = orphans.pop() {
            if orphan == self.root
                || !self.graph.contains_node(orphan)
                || !self.parents(orphan).is_empty()
            {
                continue;
            }
            if !self.graph[orphan].triggers().is_empty() {
                trace!(node = orphan.index(), "Re-placing orphaned node");
                self.add_node(self.root, orphan, &mut AddContext::default());
            }
            if self.parents(orphan).is_empty() {
                orphans.extend(self.children(orphan));
                self.graph.remove_node(orphan);
            }
        }
    }
}

impl<A> Default for TriggerTree<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for TriggerTree<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerTree")
            .field("config", &self.config)
            .field("total_triggers", &self.total_triggers)
            .field("nodes", &self.graph.node_count())
            .field("comparers", &self.comparers.keys().collect::<Vec<_>>())
            .field("optimizers", &self.optimizers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArborError;
    use crate::traits::{MockOptimizer, MockPredicateComparer, ThresholdComparer};
    use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
    use crate::tree::Clause;
    use arbor_expressions::ExpressionType;
    use serde_json::json;

    fn actions(matches: &[Arc<Trigger<&'static str>>]) -> Vec<&'static str> {
        matches.iter().map(|t| *t.action()).collect()
    }

    fn clause_text(tree: &TriggerTree<&'static str>, node: NodeId) -> String {
        tree.node(node).unwrap().clause().to_string()
    }

    #[test]
    fn test_new_tree() {
        let tree: TriggerTree<()> = TriggerTree::new();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.total_triggers(), 0);
        assert!(tree.children(tree.root()).is_empty());
        assert!(tree.verify_tree().is_none());
        assert!(tree.matches(&json!({})).is_empty());
    }

    #[test]
    fn test_general_node_adopts_every_sibling() {
        let mut tree = TriggerTree::new();
        tree.add_trigger_str("exists(a) && exists(b)", "ab", vec![]).unwrap();
        tree.add_trigger_str("exists(a) && exists(c)", "ac", vec![]).unwrap();
        tree.add_trigger_str("exists(a)", "a", vec![]).unwrap();

        let top = tree.children(tree.root());
        assert_eq!(top.len(), 1);
        assert_eq!(clause_text(&tree, top[0]), "(exists(a))");
        let below: Vec<_> = tree
            .children(top[0])
            .into_iter()
            .map(|n| clause_text(&tree, n))
            .collect();
        assert_eq!(below, vec!["(exists(a) && exists(b))", "(exists(a) && exists(c))"]);
        assert_eq!(tree.node_count(), 4);
        assert!(tree.verify_tree().is_none());
    }

    #[test]
    fn test_shared_specialization() {
        let mut tree = TriggerTree::new();
        tree.add_trigger_str("exists(a)", "a", vec![]).unwrap();
        tree.add_trigger_str("exists(a) && exists(b)", "ab", vec![]).unwrap();
        tree.add_trigger_str("exists(b)", "b", vec![]).unwrap();

        assert_eq!(tree.children(tree.root()).len(), 2);
        assert_eq!(tree.node_count(), 4);
        assert!(tree.verify_tree().is_none());
        for top in tree.children(tree.root()) {
            let below = tree.children(top);
            assert_eq!(below.len(), 1);
            assert_eq!(clause_text(&tree, below[0]), "(exists(a) && exists(b))");
        }
        assert_eq!(actions(&tree.matches(&json!({"a": 1, "b": 1}))), vec!["ab"]);
        assert_eq!(actions(&tree.matches(&json!({"b": 1}))), vec!["b"]);
    }

    #[test]
    fn test_removal_moves_specializations_up() {
        let mut tree = TriggerTree::new();
        let general = tree.add_trigger_str("exists(a)", "a", vec![]).unwrap();
        tree.add_trigger_str("exists(a) && exists(b)", "ab", vec![]).unwrap();

        assert!(tree.remove_trigger(&general));
        assert!(!tree.remove_trigger(&general));
        assert_eq!(tree.total_triggers(), 1);
        assert_eq!(tree.node_count(), 2);
        let top = tree.children(tree.root());
        assert_eq!(clause_text(&tree, top[0]), "(exists(a) && exists(b))");
        assert!(tree.verify_tree().is_none());
        assert!(tree.matches(&json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_registered_comparer_orders_nodes() {
        let mut tree = TriggerTree::new();
        let comparer = ThresholdComparer::new(ExpressionType::GreaterThan).unwrap();
        assert!(tree.register_comparer(Arc::new(comparer)).is_none());
        tree.add_trigger_str("x > 5", "high", vec![]).unwrap();
        tree.add_trigger_str("x > 3", "low", vec![]).unwrap();

        let top = tree.children(tree.root());
        assert_eq!(top.len(), 1);
        assert_eq!(clause_text(&tree, top[0]), "(x > 3)");
        assert!(tree.verify_tree().is_none());
        assert_eq!(actions(&tree.matches(&json!({"x": 6}))), vec!["high"]);
        assert_eq!(actions(&tree.matches(&json!({"x": 4}))), vec!["low"]);
        assert!(tree.matches(&json!({"x": "text"})).is_empty());
    }

    #[test]
    fn test_exhaustive_mode_reports_ancestors() {
        let config = TriggerTreeConfig::builder()
            .match_mode(MatchMode::Exhaustive)
            .build();
        let mut tree = TriggerTree::with_config(config).unwrap();
        tree.add_trigger_str("exists(a)", "a", vec![]).unwrap();
        tree.add_trigger_str("exists(a) && exists(b)", "ab", vec![]).unwrap();
        tree.add_trigger_str("true", "always", vec![]).unwrap();

        assert_eq!(
            actions(&tree.matches(&json!({"a": 1, "b": 1}))),
            vec!["a", "ab", "always"]
        );
    }

    #[test]
    fn test_registered_optimizer_runs() {
        let mut optimizer = MockOptimizer::new();
        optimizer
            .expect_optimize()
            .times(1)
            .returning(|clause: &mut Clause| clause.push(arbor_expressions::parse("exists(b)").unwrap()));
        let mut tree = TriggerTree::new();
        tree.register_optimizer(Arc::new(optimizer));

        let trigger = tree.add_trigger_str("exists(a)", "a", vec![]).unwrap();
        assert_eq!(trigger.clauses()[0].to_string(), "(exists(a) && exists(b))");
        assert!(tree.matches(&json!({"a": 1})).is_empty());
    }

    #[test]
    fn test_invalid_text() {
        let mut tree: TriggerTree<u8> = TriggerTree::new();
        let err = tree.add_trigger_str("exists(a) &&", 1, vec![]).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ExprParse);
        assert_eq!(tree.total_triggers(), 0);
    }

    #[test]
    fn test_unrelated_thresholds_stay_siblings() {
        let mut tree = TriggerTree::new();
        let comparer = ThresholdComparer::new(ExpressionType::GreaterThan).unwrap();
        tree.register_comparer(Arc::new(comparer));
        let tight = tree.add_trigger_str("x > 5 && x > 6", "A", vec![]).unwrap();
        let other = tree.add_trigger_str("x > 3 && y == 1", "B", vec![]).unwrap();

        assert_eq!(tight.relationship(&other), RelationshipType::Incomparable);
        assert_eq!(other.relationship(&tight), RelationshipType::Incomparable);
        assert_eq!(tree.children(tree.root()).len(), 2);
        assert!(tree.verify_tree().is_none());
        assert_eq!(actions(&tree.matches(&json!({"x": 10, "y": 1}))), vec!["A", "B"]);
    }

    #[test]
    fn test_verify_reports_inconsistent_comparer() {
        let related = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&related);
        let mut comparer = MockPredicateComparer::new();
        comparer
            .expect_predicate()
            .return_const(ExpressionType::Exists);
        comparer.expect_relationship().returning(move |_, _| {
            if flag.load(AtomicOrdering::SeqCst) {
                RelationshipType::Equal
            } else {
                RelationshipType::Incomparable
            }
        });

        let mut tree = TriggerTree::new();
        tree.register_comparer(Arc::new(comparer));
        tree.add_trigger_str("exists(a)", "a", vec![]).unwrap();
        tree.add_trigger_str("exists(b)", "b", vec![]).unwrap();
        assert_eq!(tree.children(tree.root()).len(), 2);
        assert!(tree.verify_tree().is_none());

        // The comparer now equates siblings it kept apart while building.
        related.store(true, AtomicOrdering::SeqCst);
        assert_eq!(tree.verify_tree(), Some(tree.root()));
    }

    #[test]
    fn test_with_config_rejects_zero_clause_limit() {
        let config = TriggerTreeConfig::builder().max_clauses(0).build();
        let err = TriggerTree::<u8>::with_config(config).unwrap_err();
        assert!(matches!(err, ArborError::Configuration(_)));

        let config = TriggerTreeConfig::builder().max_clauses(1).build();
        let mut tree = TriggerTree::with_config(config).unwrap();
        tree.add_trigger_str("true", 1u8, vec![]).unwrap();
        assert_eq!(tree.total_triggers(), 1);
    }

    #[test]
    fn test_false_trigger_is_not_counted() {
        let mut tree = TriggerTree::new();
        let trigger = tree.add_trigger_str("false", "never", vec![]).unwrap();
        assert!(trigger.clauses().is_empty());
        assert_eq!(tree.total_triggers(), 0);
        assert_eq!(tree.node_count(), 1);
        assert!(!tree.remove_trigger(&trigger));
    }

    #[test]
    fn test_tree_to_string() {
        let mut tree = TriggerTree::new();
        tree.add_trigger_str("exists(a)", "a", vec![]).unwrap();
        tree.add_trigger_str("exists(a) && exists(b)", "ab", vec![]).unwrap();
        assert_eq!(
            tree.tree_to_string(),
            "() []\n  (exists(a)) [t1]\n    (exists(a) && exists(b)) [t2]\n"
        );
    }

    #[test]
    fn test_to_dot() {
        let mut tree = TriggerTree::new();
        tree.add_trigger_str("exists(a)", "a", vec![]).unwrap();
        let dot = tree.to_dot();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("(exists(a)) [t1]"));
        assert!(dot.contains("0 -> 1"));
    }
}
