/*!

Aggregate and choice rewriting. An aggregate literal `L` with global variables `G` is replaced by a placeholder
`α_k(G)`; an *epsilon* rule derives `εα_k(G)` whenever the aggregate would already be satisfiable over the empty
element set (its guards compared against the function's base value), and one *eta* rule per element derives
`ηα_k,i(locals, G)` whenever that element is instantiated. Choice heads follow the same scheme with prefix `χ`
and base value 0, the rewritten statement becoming a normal χ-rule. The propagator later consumes the ground
ε/η instances and reassembles the original expressions.

Rewriting is keyed by dense reference ids: the record for placeholder `k` sits at index `k` of the map.

*/

use crate::{
  api::{
    aggregate::AggrLiteral,
    choice::Choice,
    literal::{BuiltinLiteral, Literal, LiteralCollection},
    placeholder::{AuxPrefix, BaseLiteral, ElementLiteral, PlaceholderLiteral},
    statement::Statement,
    term::{Term, TermTuple, Variable, VariableSet},
  },
};

/// Bookkeeping for one rewritten aggregate literal.
#[derive(Clone, Debug)]
pub struct AggrRecord {
  /// The original aggregate literal that was replaced.
  pub literal: AggrLiteral,
  /// The placeholder that replaced it.
  pub placeholder: PlaceholderLiteral,
  /// The epsilon rule deriving satisfiability over the empty element set.
  pub base_rule: Statement,
  /// One eta rule per aggregate element.
  pub element_rules: Vec<Statement>,
}

pub type AggrMap = Vec<AggrRecord>;

/// Bookkeeping for one rewritten choice expression.
#[derive(Clone, Debug)]
pub struct ChoiceRecord {
  pub choice: Choice,
  pub placeholder: PlaceholderLiteral,
  pub base_rule: Statement,
  pub element_rules: Vec<Statement>,
}

pub type ChoiceMap = Vec<ChoiceRecord>;

/// Lays a variable set out as a tuple with a deterministic (sorted) order. The order is arbitrary but fixed:
/// placeholder, base, and element literals must agree on it.
fn sorted_var_tuple(vars: &VariableSet) -> (Vec<Variable>, TermTuple) {
  let mut sorted: Vec<Variable> = vars.iter().cloned().collect();
  sorted.sort();
  let tuple = sorted.iter().cloned().map(Term::Variable).collect();
  (sorted, tuple)
}

/// The guard literals of an epsilon rule: each guard compared against the expression's base value, on the
/// correct side.
fn base_guard_literals(
  lguard: Option<&crate::api::literal::Guard>,
  rguard: Option<&crate::api::literal::Guard>,
  base: &Term,
) -> Vec<Literal> {
  let mut literals = Vec::new();

  if let Some(guard) = lguard {
    literals.push(Literal::Builtin(BuiltinLiteral::new(guard.op, guard.bound.clone(), base.clone())));
  }
  if let Some(guard) = rguard {
    literals.push(Literal::Builtin(BuiltinLiteral::new(guard.op, base.clone(), guard.bound.clone())));
  }

  literals
}

/// Rewrites one aggregate literal occurring in a rule with global variables `glob_vars` and non-aggregate body
/// `body_literals`. Returns the placeholder, the epsilon rule, and the eta rules.
pub fn rewrite_aggregate(
  literal: &AggrLiteral,
  ref_id: usize,
  glob_vars: &VariableSet,
  body_literals: &[Literal],
) -> (PlaceholderLiteral, Statement, Vec<Statement>) {
  // the aggregate's own global variables
  let aggr_globals: VariableSet = glob_vars.intersection(&literal.vars()).cloned().collect();
  let (sorted_globals, var_tuple) = sorted_var_tuple(&aggr_globals);

  let placeholder =
      PlaceholderLiteral::new(AuxPrefix::Alpha, ref_id, var_tuple.clone(), var_tuple.clone(), literal.naf);

  // epsilon rule: guards against the base value, then the non-aggregate body
  let base_head = BaseLiteral::new(AuxPrefix::Alpha, ref_id, var_tuple.clone(), var_tuple.clone());
  let mut base_body = base_guard_literals(literal.lguard.as_ref(), literal.rguard.as_ref(), &literal.kind.base());
  base_body.extend(body_literals.iter().cloned());
  let base_rule = Statement::normal(Literal::Base(base_head), LiteralCollection::new(base_body));

  // eta rules: one per element, binding the element's local variables
  let mut element_rules = Vec::with_capacity(literal.elements.len());

  for (element_id, element) in literal.elements.iter().enumerate() {
    let local_set: VariableSet = element
        .vars()
        .into_iter()
        .filter(|var| !sorted_globals.contains(var))
        .collect();
    let (_, locals_tuple) = sorted_var_tuple(&local_set);

    let element_head = ElementLiteral::new(
      AuxPrefix::Alpha,
      ref_id,
      element_id,
      locals_tuple.clone(),
      var_tuple.clone(),
      locals_tuple.concat(&var_tuple),
    );

    let mut element_body: Vec<Literal> = element.literals.iter().cloned().collect();
    element_body.extend(body_literals.iter().cloned());

    element_rules.push(Statement::normal(
      Literal::Element(element_head),
      LiteralCollection::new(element_body),
    ));
  }

  (placeholder, base_rule, element_rules)
}

/// Rewrites a choice expression appearing as the head of a rule with global variables `glob_vars` and body
/// `body_literals`. The base value of a choice is 0 (it counts the selected atoms).
pub fn rewrite_choice(
  choice: &Choice,
  ref_id: usize,
  glob_vars: &VariableSet,
  body_literals: &[Literal],
) -> (PlaceholderLiteral, Statement, Vec<Statement>) {
  let choice_globals: VariableSet = glob_vars.intersection(&choice.vars()).cloned().collect();
  let (sorted_globals, var_tuple) = sorted_var_tuple(&choice_globals);

  let placeholder =
      PlaceholderLiteral::new(AuxPrefix::Chi, ref_id, var_tuple.clone(), var_tuple.clone(), false);

  let base_head = BaseLiteral::new(AuxPrefix::Chi, ref_id, var_tuple.clone(), var_tuple.clone());
  let mut base_body =
      base_guard_literals(choice.lguard.as_ref(), choice.rguard.as_ref(), &Term::Number(0));
  base_body.extend(body_literals.iter().cloned());
  let base_rule = Statement::normal(Literal::Base(base_head), LiteralCollection::new(base_body));

  let mut element_rules = Vec::with_capacity(choice.elements.len());

  for (element_id, element) in choice.elements.iter().enumerate() {
    let local_set: VariableSet = element
        .vars()
        .into_iter()
        .filter(|var| !sorted_globals.contains(var))
        .collect();
    let (_, locals_tuple) = sorted_var_tuple(&local_set);

    let element_head = ElementLiteral::new(
      AuxPrefix::Chi,
      ref_id,
      element_id,
      locals_tuple.clone(),
      var_tuple.clone(),
      locals_tuple.concat(&var_tuple),
    );

    let mut element_body: Vec<Literal> = element.literals.iter().cloned().collect();
    element_body.extend(body_literals.iter().cloned());

    element_rules.push(Statement::normal(
      Literal::Element(element_head),
      LiteralCollection::new(element_body),
    ));
  }

  (placeholder, base_rule, element_rules)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{
    aggregate::{AggrKind, AggregateElement},
    choice::ChoiceElement,
    literal::{Guard, PredicateLiteral, RelOp},
  };

  fn pred(name: &str, terms: Vec<Term>) -> Literal {
    Literal::Predicate(PredicateLiteral::new(name, terms))
  }

  #[test]
  fn aggregate_rewriting_shapes() {
    // ok :- 2 <= #count{X : p(X)}, q(Y).   (Y global, X local to the aggregate)
    let aggregate = AggrLiteral::new(
      AggrKind::Count,
      vec![AggregateElement::new(
        TermTuple::new(vec![Term::variable("X")]),
        LiteralCollection::new(vec![pred("p", vec![Term::variable("X")])]),
      )],
      Some(Guard::new(RelOp::LessOrEq, Term::Number(2), false)),
      None,
      false,
    );
    let body = vec![pred("q", vec![Term::variable("Y")])];
    let glob_vars: VariableSet = body[0].vars();

    let (placeholder, base_rule, element_rules) = rewrite_aggregate(&aggregate, 0, &glob_vars, &body);

    // no aggregate-global variables: Y does not occur inside the aggregate
    assert!(placeholder.glob_vars.is_empty());

    // the epsilon rule guards 2 <= 0 and keeps the non-aggregate body
    assert_eq!(base_rule.to_string(), "\u{03b5}\u{03b1}0 :- 2<=0,q(Y).");

    // one eta rule binding the local variable X
    assert_eq!(element_rules.len(), 1);
    assert_eq!(element_rules[0].to_string(), "\u{03b7}\u{03b1}0_0(X) :- p(X),q(Y).");
    assert!(element_rules[0].is_safe());
  }

  #[test]
  fn aggregate_global_variables_carry_into_placeholder() {
    // 1 <= #count{X : p(X, Y)} with Y global in the rule
    let aggregate = AggrLiteral::new(
      AggrKind::Count,
      vec![AggregateElement::new(
        TermTuple::new(vec![Term::variable("X")]),
        LiteralCollection::new(vec![pred("p", vec![Term::variable("X"), Term::variable("Y")])]),
      )],
      Some(Guard::new(RelOp::LessOrEq, Term::Number(1), false)),
      None,
      false,
    );
    let body = vec![pred("q", vec![Term::variable("Y")])];
    let glob_vars: VariableSet = body[0].vars();

    let (placeholder, _, element_rules) = rewrite_aggregate(&aggregate, 0, &glob_vars, &body);

    assert_eq!(placeholder.glob_vars.len(), 1);
    assert_eq!(placeholder.to_string(), "\u{03b1}0(Y)");
    // eta head carries local X followed by global Y
    assert_eq!(element_rules[0].to_string(), "\u{03b7}\u{03b1}0_0(X,Y) :- p(X,Y),q(Y).");
  }

  #[test]
  fn choice_rewriting_base_value_is_zero() {
    // {a;b;c} = 2.
    let choice = Choice::new(
      ["a", "b", "c"]
          .into_iter()
          .map(|name| ChoiceElement::unconditional(PredicateLiteral::new(name, Vec::new())))
          .collect(),
      None,
      Some(Guard::new(RelOp::Equal, Term::Number(2), true)),
    );

    let (placeholder, base_rule, element_rules) =
        rewrite_choice(&choice, 0, &VariableSet::new(), &[]);

    assert_eq!(placeholder.to_string(), "\u{03C7}0");
    // guard compared against the empty-selection count 0
    assert_eq!(base_rule.to_string(), "\u{03b5}\u{03C7}0 :- 0=2.");
    assert_eq!(element_rules.len(), 3);
  }
}
