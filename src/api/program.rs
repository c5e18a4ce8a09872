/*!

A `Program` is an ordered collection of statements plus an optional query. The grounder consumes a pre-built
program (the surface-syntax parser is an external collaborator) and produces another: the grounder is a pure
function from input program to ground program, with no persisted state.

*/

use std::fmt::{Display, Formatter};

use crate::{
  abstractions::Set,
  api::{
    literal::{PredicateLiteral, PredicateSignature},
    statement::Statement,
  },
  core::{
    error::GroundingError,
    rewrite::{AggrMap, ChoiceMap},
  },
};

/// A query literal, carried through grounding untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
  pub literal: PredicateLiteral,
}

impl Display for Query {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}?", self.literal)
  }
}

#[derive(Clone, Debug, Default)]
pub struct Program {
  pub statements: Vec<Statement>,
  pub query: Option<Query>,
}

impl Program {
  pub fn new(statements: impl IntoIterator<Item = Statement>, query: Option<Query>) -> Program {
    Program { statements: statements.into_iter().collect(), query }
  }

  pub fn is_safe(&self) -> bool {
    self.statements.iter().all(Statement::is_safe)
  }

  pub fn is_ground(&self) -> bool {
    self.statements.iter().all(Statement::is_ground)
  }

  /// The reduct with respect to a set of (still open) predicate signatures: drops every statement whose body
  /// negatively depends on one of them.
  pub fn reduct(&self, preds: &Set<PredicateSignature>) -> Program {
    let statements = self
        .statements
        .iter()
        .filter(|statement| {
          !statement
              .body()
              .neg_occ()
              .iter()
              .any(|literal| literal.pred().map_or(false, |pred| preds.contains(&pred)))
        })
        .cloned()
        .collect();

    Program { statements, query: self.query.clone() }
  }

  /// Replaces arithmetic subterms in every statement; see `Statement::replace_arith`.
  pub fn replace_arith(&self) -> Result<Program, GroundingError> {
    let statements: Result<Vec<Statement>, GroundingError> =
        self.statements.iter().map(Statement::replace_arith).collect();
    Ok(Program { statements: statements?, query: self.query.clone() })
  }

  /// Rewrites every aggregate literal in the program. Returns the α-program (aggregates replaced by
  /// placeholders), the ε-program, the η-program, and the aggregate map keyed by reference id.
  pub fn rewrite_aggregates(&self) -> (Program, Program, Program, AggrMap) {
    let mut map = AggrMap::new();

    let alpha_statements: Vec<Statement> = self
        .statements
        .iter()
        .map(|statement| statement.rewrite_aggregates(&mut map))
        .collect();

    let base_statements: Vec<Statement> = map.iter().map(|record| record.base_rule.clone()).collect();
    let element_statements: Vec<Statement> =
        map.iter().flat_map(|record| record.element_rules.iter().cloned()).collect();

    (
      Program { statements: alpha_statements, query: self.query.clone() },
      Program::new(base_statements, None),
      Program::new(element_statements, None),
      map,
    )
  }

  /// Rewrites every choice (and NPP) head in the program, analogously to `rewrite_aggregates`.
  pub fn rewrite_choices(&self) -> (Program, Program, Program, ChoiceMap) {
    let mut map = ChoiceMap::new();

    let chi_statements: Vec<Statement> = self
        .statements
        .iter()
        .map(|statement| statement.rewrite_choices(&mut map))
        .collect();

    let base_statements: Vec<Statement> = map.iter().map(|record| record.base_rule.clone()).collect();
    let element_statements: Vec<Statement> =
        map.iter().flat_map(|record| record.element_rules.iter().cloned()).collect();

    (
      Program { statements: chi_statements, query: self.query.clone() },
      Program::new(base_statements, None),
      Program::new(element_statements, None),
      map,
    )
  }
}

impl Display for Program {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for statement in &self.statements {
      writeln!(f, "{}", statement)?;
    }
    if let Some(query) = &self.query {
      writeln!(f, "{}", query)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{
    literal::{Literal, LiteralCollection},
    term::Term,
  };

  fn pred(name: &str, terms: Vec<Term>) -> Literal {
    Literal::Predicate(PredicateLiteral::new(name, terms))
  }

  #[test]
  fn reduct_drops_negative_dependencies() {
    // x :- not p(1).   y :- q(1).
    let negative = Statement::normal(
      pred("x", vec![]),
      LiteralCollection::new(vec![Literal::Predicate(
        PredicateLiteral::new("p", vec![Term::Number(1)]).with_naf(),
      )]),
    );
    let positive = Statement::normal(
      pred("y", vec![]),
      LiteralCollection::new(vec![pred("q", vec![Term::Number(1)])]),
    );
    let program = Program::new([negative, positive.clone()], None);

    let open: Set<PredicateSignature> =
        [PredicateSignature(crate::abstractions::IString::from("p"), 1)].into_iter().collect();
    let reduct = program.reduct(&open);

    assert_eq!(reduct.statements, vec![positive]);

    // after reducing by `p`, no remaining rule negatively depends on `p`
    for statement in &reduct.statements {
      assert!(statement
          .body()
          .neg_occ()
          .iter()
          .all(|literal| !open.contains(&literal.pred().unwrap())));
    }
  }
}
