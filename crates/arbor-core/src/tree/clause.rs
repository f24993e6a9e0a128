//! Conjunctions of predicates and the relationship between them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use arbor_expressions::{Expression, ExpressionResult, ExpressionType, State};

use crate::traits::{PredicateComparer, PredicateComparers};
use crate::types::RelationshipType;

/// One conjunct of a clause.
///
/// Carries the comparer that was registered for its expression type when the
/// owning trigger was built.
#[derive(Clone)]
pub struct Predicate {
    expression: Expression,
    comparer: Option<Arc<dyn PredicateComparer>>,
}

impl Predicate {
    /// Wrap an expression with no comparer.
    pub fn new(expression: Expression) -> Self {
        Self {
            expression,
            comparer: None,
        }
    }

    /// The predicate expression.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Key used to look up a comparer; negations are keyed by their operand.
    pub fn comparer_key(&self) -> ExpressionType {
        match &self.expression {
            Expression::Call {
                kind: ExpressionType::Not,
                children,
            } if children.len() == 1 => children[0].kind(),
            expression => expression.kind(),
        }
    }

    pub(crate) fn resolve_comparer(&mut self, comparers: &PredicateComparers) {
        self.comparer = comparers.get(&self.comparer_key()).cloned();
    }

    /// Relationship of this predicate to `other`.
    ///
    /// Two negations are compared through their operands and the result is
    /// mirrored. Predicates of different types, or of a type without a
    /// comparer, relate only by structural equality.
    pub fn relationship(&self, other: &Predicate) -> RelationshipType {
        let (root, other_root, negated) = match (&self.expression, &other.expression) {
            (
                Expression::Call {
                    kind: ExpressionType::Not,
                    children: mine,
                },
                Expression::Call {
                    kind: ExpressionType::Not,
                    children: theirs,
                },
            ) if mine.len() == 1 && theirs.len() == 1 => (&mine[0], &theirs[0], true),
            (mine, theirs) => (mine, theirs, false),
        };

        if root.kind() == other_root.kind() {
            if let Some(comparer) = self.comparer.as_ref().or(other.comparer.as_ref()) {
                let relationship = comparer.relationship(root, other_root);
                return if negated {
                    relationship.swap()
                } else {
                    relationship
                };
            }
        }

        if self.expression.deep_equals(&other.expression) {
            RelationshipType::Equal
        } else {
            RelationshipType::Incomparable
        }
    }
}

impl From<Expression> for Predicate {
    fn from(expression: Expression) -> Self {
        Self::new(expression)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("expression", &self.expression.to_string())
            .field("comparer", &self.comparer.as_ref().map(|c| c.predicate()))
            .finish()
    }
}

/// A conjunction of predicates: the unit placed in the lattice.
#[derive(Debug, Clone, Default)]
pub struct Clause {
    predicates: Vec<Predicate>,
    any_bindings: BTreeMap<String, String>,
    ignored: Option<Expression>,
    subsumed: bool,
}

impl Clause {
    /// Create a clause from its conjuncts.
    pub fn new(predicates: impl IntoIterator<Item = Expression>) -> Self {
        Self {
            predicates: predicates.into_iter().map(Predicate::new).collect(),
            ..Default::default()
        }
    }

    /// The always-true clause.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Conjuncts in order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Conjunct expressions in order.
    pub fn expressions(&self) -> impl Iterator<Item = &Expression> + '_ {
        self.predicates.iter().map(Predicate::expression)
    }

    /// Number of conjuncts.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Whether this is the always-true clause.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Append a conjunct.
    pub fn push(&mut self, expression: Expression) {
        self.predicates.push(Predicate::new(expression));
    }

    /// Keep only the conjuncts for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Expression) -> bool) {
        self.predicates.retain(|predicate| keep(&predicate.expression));
    }

    /// Replace every conjunct.
    pub fn set_predicates(&mut self, predicates: impl IntoIterator<Item = Expression>) {
        self.predicates = predicates.into_iter().map(Predicate::new).collect();
    }

    /// Variables bound by "any" quantifiers, with the binding chosen.
    pub fn any_bindings(&self) -> &BTreeMap<String, String> {
        &self.any_bindings
    }

    /// Conjunction of the split-out `ignore(...)` predicates.
    pub fn ignored(&self) -> Option<&Expression> {
        self.ignored.as_ref()
    }

    /// Whether a more general clause of the same trigger covers this one.
    pub fn is_subsumed(&self) -> bool {
        self.subsumed
    }

    pub(crate) fn set_subsumed(&mut self, subsumed: bool) {
        self.subsumed = subsumed;
    }

    pub(crate) fn bind(&mut self, variable: &str, binding: &str) {
        self.any_bindings
            .insert(variable.to_string(), binding.to_string());
    }

    pub(crate) fn resolve_comparers(&mut self, comparers: &PredicateComparers) {
        for predicate in &mut self.predicates {
            predicate.resolve_comparer(comparers);
        }
    }

    /// Drop structurally repeated conjuncts, keeping the first.
    pub fn remove_duplicate_predicates(&mut self) {
        let mut unique: Vec<Predicate> = Vec::with_capacity(self.predicates.len());
        for predicate in self.predicates.drain(..) {
            if !unique
                .iter()
                .any(|kept| kept.expression.deep_equals(&predicate.expression))
            {
                unique.push(predicate);
            }
        }
        self.predicates = unique;
    }

    /// Copy placed in a lattice node: same conjuncts and bindings, nothing
    /// ignored, not subsumed.
    pub(crate) fn node_clause(&self) -> Clause {
        Clause {
            predicates: self.predicates.clone(),
            any_bindings: self.any_bindings.clone(),
            ignored: None,
            subsumed: false,
        }
    }

    /// Relationship of this clause to `other`.
    ///
    /// A clause generalizes another when each of its conjuncts is implied by
    /// some conjunct of the other. Fewer conjuncts can never be equal to or
    /// more specific than more conjuncts.
    pub fn relationship(&self, other: &Clause) -> RelationshipType {
        let (shorter, longer, swapped) = if other.len() < self.len() {
            (other, self, true)
        } else {
            (self, other, false)
        };

        let down = shorter.covers(longer);
        let relationship = if shorter.len() != longer.len() {
            if down {
                RelationshipType::Generalizes
            } else {
                RelationshipType::Incomparable
            }
        } else {
            match (down, longer.covers(shorter)) {
                (true, true) if shorter.pairs_equal(longer) && longer.pairs_equal(shorter) => {
                    shorter.binding_relationship(longer)
                }
                (true, false) => RelationshipType::Generalizes,
                (false, true) => RelationshipType::Specializes,
                _ => RelationshipType::Incomparable,
            }
        };

        if swapped {
            relationship.swap()
        } else {
            relationship
        }
    }

    /// Whether every conjunct here equals or generalizes some conjunct of
    /// `other`.
    fn covers(&self, other: &Clause) -> bool {
        self.predicates.iter().all(|predicate| {
            other.predicates.iter().any(|candidate| {
                matches!(
                    predicate.relationship(candidate),
                    RelationshipType::Equal | RelationshipType::Generalizes
                )
            })
        })
    }

    /// Whether every conjunct here has an equal conjunct in `other`.
    fn pairs_equal(&self, other: &Clause) -> bool {
        self.predicates.iter().all(|predicate| {
            other
                .predicates
                .iter()
                .any(|candidate| predicate.relationship(candidate) == RelationshipType::Equal)
        })
    }

    /// Break a tie between clauses with equal conjuncts by their "any"
    /// bindings: binding more variables is more specific.
    fn binding_relationship(&self, other: &Clause) -> RelationshipType {
        let mine = &self.any_bindings;
        let theirs = &other.any_bindings;
        let conflict = mine
            .iter()
            .any(|(variable, binding)| theirs.get(variable).is_some_and(|b| b != binding));
        if conflict {
            return RelationshipType::Incomparable;
        }

        let mine_in_theirs = mine.keys().all(|variable| theirs.contains_key(variable));
        let theirs_in_mine = theirs.keys().all(|variable| mine.contains_key(variable));
        match (mine_in_theirs, theirs_in_mine) {
            (true, true) => RelationshipType::Equal,
            (false, true) => RelationshipType::Specializes,
            (true, false) => RelationshipType::Generalizes,
            (false, false) => RelationshipType::Incomparable,
        }
    }

    /// Same conjuncts, ignoring order.
    pub fn deep_equals(&self, other: &Clause) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut used = vec![false; other.len()];
        self.predicates.iter().all(|predicate| {
            let found = other.predicates.iter().enumerate().position(|(i, candidate)| {
                !used[i] && predicate.expression.deep_equals(&candidate.expression)
            });
            match found {
                Some(i) => {
                    used[i] = true;
                    true
                }
                None => false,
            }
        })
    }

    /// Whether this clause is the one placed as `node_clause` and its ignored
    /// predicate, if any, holds in `state`.
    pub fn matches(&self, node_clause: &Clause, state: &dyn State) -> bool {
        if !self.deep_equals(node_clause) {
            return false;
        }
        match &self.ignored {
            Some(ignored) => ignored.is_true(state).unwrap_or(false),
            None => true,
        }
    }

    /// Move `ignore(...)` conjuncts out of the clause into its ignored
    /// predicate.
    pub fn split_ignores(&mut self) {
        let (ignores, predicates): (Vec<Predicate>, Vec<Predicate>) = self
            .predicates
            .drain(..)
            .partition(|predicate| predicate.expression.kind() == ExpressionType::Ignore);
        self.predicates = predicates;
        if !ignores.is_empty() {
            self.ignored = Some(Expression::and_expression(
                ignores.into_iter().map(|p| p.expression).collect(),
            ));
        }
    }

    /// Evaluate the conjunction, not including the ignored predicate.
    pub fn try_evaluate(&self, state: &dyn State) -> ExpressionResult<bool> {
        for predicate in &self.predicates {
            if !predicate.expression.is_true(state)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The conjunction as a single expression.
    pub fn to_expression(&self) -> Expression {
        Expression::and_expression(self.expressions().cloned().collect())
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subsumed {
            f.write_str("*")?;
        }
        f.write_str("(")?;
        for (i, expression) in self.expressions().enumerate() {
            if i > 0 {
                f.write_str(" && ")?;
            }
            write!(f, "{}", expression)?;
        }
        f.write_str(")")?;
        if let Some(ignored) = &self.ignored {
            write!(f, " ignored({})", ignored)?;
        }
        for (variable, binding) in &self.any_bindings {
            write!(f, " {}->{}", variable, binding)?;
        }
        Ok(())
    }
}
