//! Triggers: a rule expression normalized into lattice clauses.

use std::fmt;
use std::sync::Arc;

use arbor_expressions::{Expression, ExpressionType, State};
use serde_json::Value;

use crate::error::{ArborError, ArborResult};
use crate::traits::{Optimizer, PredicateComparers};
use crate::tree::Clause;
use crate::types::{Quantifier, QuantifierKind, RelationshipType, TriggerId};

/// Tree state a trigger is normalized against.
pub(crate) struct BuildContext<'a> {
    pub optimizers: &'a [Arc<dyn Optimizer>],
    pub comparers: &'a PredicateComparers,
    pub max_clauses: usize,
}

/// A rule expression, the action to take when it holds, and its clauses in
/// disjunctive normal form.
///
/// Triggers are immutable once built and are shared between the lattice
/// nodes their clauses were placed in.
#[derive(Debug)]
pub struct Trigger<A> {
    id: TriggerId,
    expression: Expression,
    action: A,
    quantifiers: Vec<Quantifier>,
    clauses: Vec<Clause>,
}

impl<A> Trigger<A> {
    pub(crate) fn new(
        id: TriggerId,
        expression: Expression,
        action: A,
        quantifiers: Vec<Quantifier>,
        context: &BuildContext<'_>,
    ) -> ArborResult<Self> {
        let normal_form = push_down_not(&expression, false);
        let mut clauses = generate_clauses(&normal_form, context.max_clauses)?;
        if clauses.len() > context.max_clauses {
            return Err(ArborError::too_many_clauses(clauses.len(), context.max_clauses));
        }

        for clause in &mut clauses {
            clause.remove_duplicate_predicates();
            for optimizer in context.optimizers {
                optimizer.optimize(clause);
            }
        }

        for quantifier in &quantifiers {
            clauses = expand_quantifier(quantifier, clauses, context.max_clauses)?;
        }

        for clause in &mut clauses {
            clause.remove_duplicate_predicates();
            clause.resolve_comparers(context.comparers);
        }
        mark_subsumed(&mut clauses);
        for clause in &mut clauses {
            clause.split_ignores();
        }

        Ok(Self {
            id,
            expression,
            action,
            quantifiers,
            clauses,
        })
    }

    /// Identifier assigned by the tree.
    pub fn id(&self) -> TriggerId {
        self.id
    }

    /// The expression the trigger was built from.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Action payload.
    pub fn action(&self) -> &A {
        &self.action
    }

    /// Quantifiers the expression was expanded with.
    pub fn quantifiers(&self) -> &[Quantifier] {
        &self.quantifiers
    }

    /// Clauses in disjunctive normal form; the trigger holds if any does.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Relationship of this trigger to `other`.
    pub fn relationship<B>(&self, other: &Trigger<B>) -> RelationshipType {
        let first = directional_relationship(&self.clauses, &other.clauses);
        let second = directional_relationship(&other.clauses, &self.clauses);
        match (first, second) {
            (RelationshipType::Equal, RelationshipType::Equal) => RelationshipType::Equal,
            (RelationshipType::Equal | RelationshipType::Specializes, _) => {
                RelationshipType::Specializes
            }
            (_, RelationshipType::Equal | RelationshipType::Specializes) => {
                RelationshipType::Generalizes
            }
            _ => RelationshipType::Incomparable,
        }
    }

    /// Whether some clause of this trigger was placed as `node_clause` and
    /// holds in `state`.
    pub fn matches(&self, node_clause: &Clause, state: &dyn State) -> bool {
        self.clauses
            .iter()
            .any(|clause| clause.matches(node_clause, state))
    }
}

impl<A> fmt::Display for Trigger<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return f.write_str("<Empty>");
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str("\n|| ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

/// Incomparable, equal or specializes: whether every live clause of `clauses`
/// equals or specializes some live clause of `others`.
fn directional_relationship(clauses: &[Clause], others: &[Clause]) -> RelationshipType {
    let mut so_far = RelationshipType::Incomparable;
    for clause in clauses.iter().filter(|clause| !clause.is_subsumed()) {
        let found = others
            .iter()
            .filter(|other| !other.is_subsumed())
            .map(|other| clause.relationship(other))
            .find(|relationship| relationship.is_at_least_as_specific());

        match found {
            None => return RelationshipType::Incomparable,
            Some(RelationshipType::Equal) if so_far == RelationshipType::Incomparable => {
                so_far = RelationshipType::Equal
            }
            Some(RelationshipType::Specializes) => so_far = RelationshipType::Specializes,
            Some(_) => {}
        }
    }
    so_far
}

/// Push negations down to the leaves.
///
/// `&&` and `||` swap under a negation. Leaves with a negated form are
/// replaced by it, `optional` and `ignore` pass the negation through to their
/// operand, and anything else keeps an explicit `!`.
fn push_down_not(expression: &Expression, in_not: bool) -> Expression {
    let kind = expression.kind();
    match kind {
        ExpressionType::And | ExpressionType::Or => {
            let mut children: Vec<Expression> = expression
                .children()
                .iter()
                .map(|child| push_down_not(child, in_not))
                .collect();
            if children.len() == 1 {
                return children.remove(0);
            }
            let kind = match (kind, in_not) {
                (ExpressionType::And, false) | (ExpressionType::Or, true) => ExpressionType::And,
                _ => ExpressionType::Or,
            };
            Expression::make_expression(kind, children)
        }
        ExpressionType::Not if expression.children().len() == 1 => {
            push_down_not(&expression.children()[0], !in_not)
        }
        _ if !in_not => expression.clone(),
        ExpressionType::Constant => match expression.as_constant() {
            Some(Value::Bool(value)) => Expression::constant(!value),
            _ => Expression::not_expression(expression.clone()),
        },
        _ => match kind.negation() {
            Some(negation) if negation == kind => Expression::make_expression(
                kind,
                expression
                    .children()
                    .iter()
                    .map(|child| push_down_not(child, true))
                    .collect(),
            ),
            Some(negation) => Expression::make_expression(negation, expression.children().to_vec()),
            None => Expression::not_expression(expression.clone()),
        },
    }
}

/// Expand a negation-free expression into disjunctive normal form.
fn generate_clauses(expression: &Expression, max_clauses: usize) -> ArborResult<Vec<Clause>> {
    match expression.kind() {
        ExpressionType::And => {
            let mut so_far = vec![Clause::empty()];
            for child in expression.children() {
                let clauses = generate_clauses(child, max_clauses)?;
                if clauses.is_empty() {
                    return Ok(Vec::new());
                }
                let produced = so_far.len().saturating_mul(clauses.len());
                if produced > max_clauses {
                    return Err(ArborError::too_many_clauses(produced, max_clauses));
                }
                so_far = so_far
                    .iter()
                    .flat_map(|old| {
                        clauses.iter().map(move |clause| {
                            Clause::new(old.expressions().chain(clause.expressions()).cloned())
                        })
                    })
                    .collect();
            }
            Ok(so_far)
        }
        ExpressionType::Or => {
            let mut clauses = Vec::new();
            for child in expression.children() {
                clauses.extend(generate_clauses(child, max_clauses)?);
                if clauses.len() > max_clauses {
                    return Err(ArborError::too_many_clauses(clauses.len(), max_clauses));
                }
            }
            Ok(clauses)
        }
        ExpressionType::Optional if expression.children().len() == 1 => {
            let mut clauses = vec![Clause::empty()];
            clauses.extend(generate_clauses(&expression.children()[0], max_clauses)?);
            if clauses.len() > max_clauses {
                return Err(ArborError::too_many_clauses(clauses.len(), max_clauses));
            }
            Ok(clauses)
        }
        _ => Ok(match expression.as_constant() {
            Some(Value::Bool(true)) => vec![Clause::empty()],
            Some(Value::Bool(false)) => Vec::new(),
            _ => vec![Clause::new([expression.clone()])],
        }),
    }
}

fn expand_quantifier(
    quantifier: &Quantifier,
    clauses: Vec<Clause>,
    max_clauses: usize,
) -> ArborResult<Vec<Clause>> {
    let mut expanded = Vec::with_capacity(clauses.len());
    for clause in clauses {
        match quantifier.kind {
            QuantifierKind::All => expanded.push(expand_all(quantifier, clause)),
            QuantifierKind::Any => expanded.extend(expand_any(quantifier, clause)),
        }
        if expanded.len() > max_clauses {
            return Err(ArborError::too_many_clauses(expanded.len(), max_clauses));
        }
    }
    Ok(expanded)
}

/// One conjunct per binding for each predicate that mentions the variable.
/// Without bindings the quantifier is vacuously true, so those predicates
/// are dropped.
fn expand_all(quantifier: &Quantifier, mut clause: Clause) -> Clause {
    if quantifier.bindings.is_empty() {
        clause.retain(|predicate| !predicate.references(&quantifier.variable));
        return clause;
    }

    let mut predicates = Vec::new();
    for predicate in clause.expressions() {
        for binding in &quantifier.bindings {
            let (substituted, changed) = predicate.substitute(&quantifier.variable, binding);
            predicates.push(substituted);
            if !changed {
                break;
            }
        }
    }
    clause.set_predicates(predicates);
    clause
}

/// One clause per binding, each recording the binding it was built from.
/// Without bindings the clause survives only if it never mentions the
/// variable.
fn expand_any(quantifier: &Quantifier, clause: Clause) -> Vec<Clause> {
    if quantifier.bindings.is_empty() {
        let mentioned = clause
            .expressions()
            .any(|predicate| predicate.references(&quantifier.variable));
        return if mentioned { Vec::new() } else { vec![clause] };
    }

    let mut results = Vec::new();
    let mut changed = false;
    for binding in &quantifier.bindings {
        let mut expanded = clause.clone();
        let predicates: Vec<Expression> = clause
            .expressions()
            .map(|predicate| {
                let (substituted, predicate_changed) =
                    predicate.substitute(&quantifier.variable, binding);
                changed |= predicate_changed;
                substituted
            })
            .collect();
        expanded.set_predicates(predicates);
        if changed {
            expanded.bind(&quantifier.variable, binding);
        }
        results.push(expanded);
        if !changed {
            break;
        }
    }
    results
}

/// Drop clauses equal to an earlier one and mark the more specific clause of
/// each specializing pair as subsumed.
fn mark_subsumed(clauses: &mut Vec<Clause>) {
    let mut i = 0;
    while i < clauses.len() {
        if !clauses[i].is_subsumed() {
            let mut j = i + 1;
            while j < clauses.len() {
                if !clauses[j].is_subsumed() {
                    match clauses[i].relationship(&clauses[j]) {
                        RelationshipType::Equal => {
                            clauses.remove(j);
                            continue;
                        }
                        RelationshipType::Specializes => {
                            clauses[i].set_subsumed(true);
                            break;
                        }
                        RelationshipType::Generalizes => clauses[j].set_subsumed(true),
                        RelationshipType::Incomparable => {}
                    }
                }
                j += 1;
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockOptimizer;
    use arbor_expressions::parse;
    use serde_json::json;

    fn build(text: &str, quantifiers: Vec<Quantifier>) -> Trigger<u32> {
        build_with(text, quantifiers, &[], 4096)
    }

    fn build_with(
        text: &str,
        quantifiers: Vec<Quantifier>,
        optimizers: &[Arc<dyn Optimizer>],
        max_clauses: usize,
    ) -> Trigger<u32> {
        let comparers = PredicateComparers::new();
        let context = BuildContext {
            optimizers,
            comparers: &comparers,
            max_clauses,
        };
        Trigger::new(TriggerId(1), parse(text).unwrap(), 1, quantifiers, &context).unwrap()
    }

    fn rendered(trigger: &Trigger<u32>) -> Vec<String> {
        trigger.clauses().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_push_down_not() {
        let expr = parse("!(a == 1 && (b < 2 || !exists(c)))").unwrap();
        assert_eq!(
            push_down_not(&expr, false).to_string(),
            "a != 1 || b >= 2 && exists(c)"
        );

        let expr = parse("!contains(tags, 'x')").unwrap();
        assert_eq!(push_down_not(&expr, false).to_string(), "!contains(tags, 'x')");

        let expr = parse("!ignore(a > 1)").unwrap();
        assert_eq!(push_down_not(&expr, false).to_string(), "ignore(a <= 1)");

        let expr = parse("!true").unwrap();
        assert_eq!(push_down_not(&expr, false), Expression::constant(false));
    }

    #[test]
    fn test_dnf_expansion() {
        let trigger = build("(a == 1 || b == 2) && (c == 3 || d == 4)", vec![]);
        assert_eq!(
            rendered(&trigger),
            vec![
                "(a == 1 && c == 3)",
                "(a == 1 && d == 4)",
                "(b == 2 && c == 3)",
                "(b == 2 && d == 4)",
            ]
        );
    }

    #[test]
    fn test_constants() {
        assert_eq!(rendered(&build("true", vec![])), vec!["()"]);
        assert!(build("false", vec![]).clauses().is_empty());
        assert!(build("exists(a) && false", vec![]).clauses().is_empty());
        assert_eq!(rendered(&build("exists(a) && true", vec![])), vec!["(exists(a))"]);
        assert_eq!(build("false", vec![]).to_string(), "<Empty>");
    }

    #[test]
    fn test_optional() {
        let trigger = build("exists(a) && optional(exists(b))", vec![]);
        assert_eq!(rendered(&trigger), vec!["(exists(a))", "*(exists(a) && exists(b))"]);
    }

    #[test]
    fn test_duplicate_predicates_removed() {
        let trigger = build("a == 1 && b == 2 && a == 1", vec![]);
        assert_eq!(rendered(&trigger), vec!["(a == 1 && b == 2)"]);
    }

    #[test]
    fn test_subsumption_and_equal_clauses() {
        let trigger = build("exists(a) && exists(b) || exists(a) || exists(a)", vec![]);
        assert_eq!(rendered(&trigger), vec!["*(exists(a) && exists(b))", "(exists(a))"]);
    }

    #[test]
    fn test_ignores_are_split() {
        let trigger = build("exists(a) && ignore(b == 1)", vec![]);
        let clause = &trigger.clauses()[0];
        assert_eq!(clause.len(), 1);
        assert!(clause.ignored().is_some());
        assert!(trigger.matches(&clause.node_clause(), &json!({"a": 1, "b": 1})));
        assert!(!trigger.matches(&clause.node_clause(), &json!({"a": 1, "b": 0})));
    }

    #[test]
    fn test_any_quantifier() {
        let trigger = build("item == v", vec![Quantifier::any("v", ["1", "2", "3"])]);
        assert_eq!(
            rendered(&trigger),
            vec!["(item == 1) v->1", "(item == 2) v->2", "(item == 3) v->3"]
        );
    }

    #[test]
    fn test_any_quantifier_without_reference_keeps_one_clause() {
        let trigger = build("exists(a)", vec![Quantifier::any("v", ["1", "2"])]);
        assert_eq!(rendered(&trigger), vec!["(exists(a))"]);
    }

    #[test]
    fn test_any_quantifier_without_bindings() {
        let trigger = build(
            "exists(v) || exists(a)",
            vec![Quantifier::any("v", Vec::<String>::new())],
        );
        assert_eq!(rendered(&trigger), vec!["(exists(a))"]);
    }

    #[test]
    fn test_all_quantifier() {
        let trigger = build(
            "exists(v.name) && x > 1",
            vec![Quantifier::all("v", ["user", "owner"])],
        );
        assert_eq!(
            rendered(&trigger),
            vec!["(exists(user.name) && exists(owner.name) && x > 1)"]
        );
    }

    #[test]
    fn test_all_quantifier_without_bindings() {
        let trigger = build(
            "exists(v) && x > 1",
            vec![Quantifier::all("v", Vec::<String>::new())],
        );
        assert_eq!(rendered(&trigger), vec!["(x > 1)"]);
    }

    #[test]
    fn test_optimizers_run_on_every_clause() {
        let mut optimizer = MockOptimizer::new();
        optimizer
            .expect_optimize()
            .times(2)
            .returning(|clause| clause.retain(|predicate| predicate.kind() != ExpressionType::Exists));
        let optimizers: Vec<Arc<dyn Optimizer>> = vec![Arc::new(optimizer)];

        let trigger = build_with("a == 1 && exists(b) || c == 2", vec![], &optimizers, 16);
        assert_eq!(rendered(&trigger), vec!["(a == 1)", "(c == 2)"]);
    }

    #[test]
    fn test_clause_limit() {
        let comparers = PredicateComparers::new();
        let context = BuildContext {
            optimizers: &[],
            comparers: &comparers,
            max_clauses: 8,
        };
        let expr = parse("(a || b) && (c || d) && (e || f) && (g || h)").unwrap();
        let err = Trigger::new(TriggerId(1), expr, (), vec![], &context).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ValTooManyClauses);

        let expr = parse("exists(a) && x == v").unwrap();
        let quantifier = Quantifier::any("v", (0..9).map(|i| i.to_string()));
        assert!(Trigger::new(TriggerId(2), expr, (), vec![quantifier], &context).is_err());
    }

    #[test]
    fn test_trigger_relationship() {
        let specific = build("exists(blah)", vec![]);
        let general = build("exists(blah) || exists(woof)", vec![]);
        let other = build("exists(blah)", vec![]);
        let unrelated = build("exists(foo)", vec![]);
        assert_eq!(specific.relationship(&general), RelationshipType::Specializes);
        assert_eq!(general.relationship(&specific), RelationshipType::Generalizes);
        assert_eq!(specific.relationship(&other), RelationshipType::Equal);
        assert_eq!(specific.relationship(&unrelated), RelationshipType::Incomparable);
    }

    #[test]
    fn test_display() {
        let trigger = build("exists(a) || b == 1", vec![]);
        assert_eq!(trigger.to_string(), "(exists(a))\n|| (b == 1)");
    }
}
