/*!

The statement algebra. A `Statement` pairs a `StatementKind` (normal rule, disjunctive rule, choice rule,
constraint, or NPP rule) with the statement's `VariableTable` and a cached safety verdict. Statements are
value-like: substitution, arithmetic replacement, and rewriting all produce new statements.

A statement is safe iff the closure of its body safety triplets is exactly the triplet marking the statement's
global variables safe (with per-element refinements for choice rules). Safety is checked lazily and cached.

*/

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

use once_cell::unsync::OnceCell;

use crate::{
  abstractions::{join_string, IString},
  api::{
    choice::{Choice, ChoiceElement},
    literal::{Guard, Literal, LiteralCollection, PredicateLiteral, RelOp},
    term::{Term, TermTuple, VariableSet},
  },
  core::{
    error::GroundingError,
    rewrite::{rewrite_aggregate, rewrite_choice, AggrMap, AggrRecord, ChoiceMap, ChoiceRecord},
    substitution::Substitution,
    variable_table::VariableTable,
  },
};

// region NPP expressions

/// A neural-probabilistic predicate declaration `#npp(id(args), [outcomes])`: a family of atoms
/// `id(args, outcome)` of which exactly one is selected. Desugars to a choice guarded by `= 1`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Npp {
  pub name: IString,
  pub terms: TermTuple,
  pub outcomes: TermTuple,
}

impl Npp {
  pub fn new(name: &str, terms: Vec<Term>, outcomes: Vec<Term>) -> Npp {
    Npp {
      name: IString::from(name),
      terms: TermTuple::new(terms),
      outcomes: TermTuple::new(outcomes),
    }
  }

  /// The atom family represented by the declaration. The order of atoms matches the order of outcomes.
  pub fn atoms(&self) -> Vec<PredicateLiteral> {
    self
        .outcomes
        .iter()
        .map(|outcome| {
          let terms = self.terms.concat(&TermTuple::new(vec![outcome.clone()]));
          PredicateLiteral {
            name: self.name.clone(),
            terms,
            attributes: Default::default(),
          }
        })
        .collect()
  }

  pub fn ground(&self) -> bool {
    self.terms.ground() && self.outcomes.ground()
  }

  pub fn vars(&self) -> VariableSet {
    let mut vars = self.terms.vars();
    vars.extend(self.outcomes.vars());
    vars
  }

  /// The choice encoding: exactly one of the atoms, via a `1 =` guard.
  pub fn as_choice(&self) -> Choice {
    Choice::new(
      self.atoms().into_iter().map(ChoiceElement::unconditional).collect(),
      Some(Guard::new(RelOp::Equal, Term::Number(1), false)),
      None,
    )
  }

  pub fn substitute(&self, subst: &Substitution) -> Npp {
    Npp {
      name: self.name.clone(),
      terms: self.terms.substitute(subst),
      outcomes: self.outcomes.substitute(subst),
    }
  }

  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<Npp, GroundingError> {
    Ok(Npp {
      name: self.name.clone(),
      terms: self.terms.replace_arith(table)?,
      outcomes: self.outcomes.replace_arith(table)?,
    })
  }
}

impl Display for Npp {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "#npp({}({}),[{}])", self.name, self.terms, self.outcomes)
  }
}

// endregion

/// The statement variants. Normal, disjunctive, constraint, and NPP rules are deterministic in their head
/// shape; choice rules are non-deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum StatementKind {
  Normal {
    /// A predicate literal or (after rewriting) an auxiliary literal; never negated.
    head: Literal,
    body: LiteralCollection,
  },

  Disjunctive {
    heads: LiteralCollection,
    body: LiteralCollection,
  },

  Choice {
    choice: Choice,
    body: LiteralCollection,
  },

  Constraint {
    body: LiteralCollection,
  },

  Npp {
    npp: Npp,
    body: LiteralCollection,
  },
}

#[derive(Clone, Debug)]
pub struct Statement {
  pub kind: StatementKind,
  pub var_table: VariableTable,
  safe: OnceCell<bool>,
}

impl Statement {
  pub fn new(kind: StatementKind) -> Statement {
    let mut statement = Statement { kind, var_table: VariableTable::default(), safe: OnceCell::new() };

    let global_vars = statement.compute_global_vars();
    let table_entries: Vec<(crate::api::term::Variable, bool)> = statement
        .vars()
        .into_iter()
        .map(|var| {
          let is_global = global_vars.contains(&var);
          (var, is_global)
        })
        .collect();
    statement.var_table.update(table_entries);

    statement
  }

  pub fn normal(head: Literal, body: LiteralCollection) -> Statement {
    Statement::new(StatementKind::Normal { head, body })
  }

  pub fn disjunctive(heads: LiteralCollection, body: LiteralCollection) -> Statement {
    Statement::new(StatementKind::Disjunctive { heads, body })
  }

  pub fn choice(choice: Choice, body: LiteralCollection) -> Statement {
    Statement::new(StatementKind::Choice { choice, body })
  }

  pub fn constraint(body: LiteralCollection) -> Statement {
    Statement::new(StatementKind::Constraint { body })
  }

  pub fn npp(npp: Npp, body: LiteralCollection) -> Statement {
    Statement::new(StatementKind::Npp { npp, body })
  }

  // region Accessors

  pub fn body(&self) -> &LiteralCollection {
    match &self.kind {
      StatementKind::Normal { body, .. }
      | StatementKind::Disjunctive { body, .. }
      | StatementKind::Choice { body, .. }
      | StatementKind::Constraint { body }
      | StatementKind::Npp { body, .. } => body,
    }
  }

  /// The head literals the statement can derive.
  pub fn consequents(&self) -> Vec<Literal> {
    match &self.kind {
      StatementKind::Normal { head, .. } => vec![head.clone()],
      StatementKind::Disjunctive { heads, .. } => heads.iter().cloned().collect(),
      StatementKind::Choice { choice, .. } => {
        choice.head().into_iter().map(Literal::Predicate).collect()
      }
      StatementKind::Constraint { .. } => Vec::new(),
      StatementKind::Npp { npp, .. } => npp.atoms().into_iter().map(Literal::Predicate).collect(),
    }
  }

  /// The literals the statement depends on: the body, plus element conditions for choice rules.
  pub fn antecedents(&self) -> LiteralCollection {
    match &self.kind {
      StatementKind::Choice { choice, body } => {
        let mut literals: Vec<Literal> = body.iter().cloned().collect();
        for element in &choice.elements {
          literals.extend(element.literals.iter().cloned());
        }
        LiteralCollection::new(literals)
      }
      _ => self.body().clone(),
    }
  }

  /// `false` exactly for choice rules, whose consequents are selected rather than derived.
  pub fn deterministic(&self) -> bool {
    !matches!(self.kind, StatementKind::Choice { .. })
  }

  pub fn is_fact(&self) -> bool {
    self.body().is_empty()
  }

  pub fn contains_aggregates(&self) -> bool {
    self.body().iter().any(|literal| matches!(literal, Literal::Aggregate(_)))
  }

  pub fn vars(&self) -> VariableSet {
    let mut vars = VariableSet::new();
    match &self.kind {
      StatementKind::Normal { head, body } => {
        vars.extend(head.vars());
        vars.extend(body.vars());
      }
      StatementKind::Disjunctive { heads, body } => {
        vars.extend(heads.vars());
        vars.extend(body.vars());
      }
      StatementKind::Choice { choice, body } => {
        vars.extend(choice.vars());
        vars.extend(body.vars());
      }
      StatementKind::Constraint { body } => {
        vars.extend(body.vars());
      }
      StatementKind::Npp { npp, body } => {
        vars.extend(npp.vars());
        vars.extend(body.vars());
      }
    }
    vars
  }

  fn compute_global_vars(&self) -> VariableSet {
    match &self.kind {
      StatementKind::Normal { head, body } => {
        let mut vars = head.vars();
        vars.extend(body.global_vars());
        vars
      }
      StatementKind::Disjunctive { heads, body } => {
        let mut vars = heads.vars();
        vars.extend(body.global_vars());
        vars
      }
      StatementKind::Choice { choice, body } => {
        let body_globals = body.global_vars();
        let mut vars = choice.global_vars(&body_globals);
        vars.extend(body_globals);
        vars
      }
      StatementKind::Constraint { body } => body.global_vars(),
      StatementKind::Npp { npp, body } => {
        let mut vars = npp.vars();
        vars.extend(body.global_vars());
        vars
      }
    }
  }

  pub fn global_vars(&self) -> VariableSet {
    self.compute_global_vars()
  }

  pub fn is_ground(&self) -> bool {
    match &self.kind {
      StatementKind::Normal { head, body } => head.ground() && body.ground(),
      StatementKind::Disjunctive { heads, body } => heads.ground() && body.ground(),
      StatementKind::Choice { choice, body } => choice.ground() && body.ground(),
      StatementKind::Constraint { body } => body.ground(),
      StatementKind::Npp { npp, body } => npp.ground() && body.ground(),
    }
  }

  // endregion

  // region Safety

  /// Whether the statement is safe. Cached after the first computation.
  pub fn is_safe(&self) -> bool {
    *self.safe.get_or_init(|| self.compute_safe())
  }

  /// Safety contributions of the statement's arithmetic placeholder variables: a placeholder becomes safe once
  /// all variables of its original subtree are (the grounder then binds it by evaluation).
  fn arith_safety(&self) -> Vec<crate::core::safety::SafetyTriplet> {
    use crate::core::safety::{SafetyRule, SafetyTriplet};

    self
        .vars()
        .into_iter()
        .filter_map(|var| {
          let dependees = var.original()?.vars();
          Some(SafetyTriplet::new(
            VariableSet::new(),
            VariableSet::new(),
            vec![SafetyRule { depender: var, dependees }],
          ))
        })
        .collect()
  }

  fn body_safety(&self, literals: &LiteralCollection, global_vars: &VariableSet)
                 -> crate::core::safety::SafetyTriplet
  {
    let mut parts = vec![literals.safety(global_vars)];
    parts.extend(self.arith_safety());
    crate::core::safety::SafetyTriplet::closure(parts)
  }

  fn compute_safe(&self) -> bool {
    match &self.kind {
      StatementKind::Choice { choice, body } => {
        let mut outside_globals = body.global_vars();
        outside_globals.extend(choice.outvars());

        for element in &choice.elements {
          let mut global_vars = outside_globals.clone();
          global_vars.extend(element.atom.vars());

          let literals = body.concat(&element.literals);
          if self.body_safety(&literals, &global_vars)
              != crate::core::safety::SafetyTriplet::from_safe(global_vars)
          {
            return false;
          }
        }
        true
      }
      _ => {
        let global_vars = self.global_vars();
        self.body_safety(self.body(), &global_vars)
            == crate::core::safety::SafetyTriplet::from_safe(global_vars)
      }
    }
  }

  /// The global variables the body fails to bind, for error reporting.
  pub fn unsafe_vars(&self) -> VariableSet {
    let global_vars = self.global_vars();
    let safety = self.body_safety(self.body(), &global_vars);
    global_vars.into_iter().filter(|var| !safety.safe.contains(var)).collect()
  }

  // endregion

  // region Transformation

  pub fn substitute(&self, subst: &Substitution) -> Statement {
    let kind = match &self.kind {
      StatementKind::Normal { head, body } => StatementKind::Normal {
        head: head.substitute(subst),
        body: body.substitute(subst),
      },
      StatementKind::Disjunctive { heads, body } => StatementKind::Disjunctive {
        heads: heads.substitute(subst),
        body: body.substitute(subst),
      },
      StatementKind::Choice { choice, body } => StatementKind::Choice {
        choice: choice.substitute(subst),
        body: body.substitute(subst),
      },
      StatementKind::Constraint { body } => StatementKind::Constraint { body: body.substitute(subst) },
      StatementKind::Npp { npp, body } => StatementKind::Npp {
        npp: npp.substitute(subst),
        body: body.substitute(subst),
      },
    };
    Statement::new(kind)
  }

  /// Replaces arithmetic subterms throughout the statement: ground arithmetic is evaluated immediately,
  /// non-ground arithmetic becomes a fresh placeholder variable in the statement's table.
  pub fn replace_arith(&self) -> Result<Statement, GroundingError> {
    let mut table = self.var_table.clone();

    let kind = match &self.kind {
      StatementKind::Normal { head, body } => StatementKind::Normal {
        head: head.replace_arith(&mut table)?,
        body: body.replace_arith(&mut table)?,
      },
      StatementKind::Disjunctive { heads, body } => StatementKind::Disjunctive {
        heads: heads.replace_arith(&mut table)?,
        body: body.replace_arith(&mut table)?,
      },
      StatementKind::Choice { choice, body } => StatementKind::Choice {
        choice: choice.replace_arith(&mut table)?,
        body: body.replace_arith(&mut table)?,
      },
      StatementKind::Constraint { body } => {
        StatementKind::Constraint { body: body.replace_arith(&mut table)? }
      }
      StatementKind::Npp { npp, body } => StatementKind::Npp {
        npp: npp.replace_arith(&mut table)?,
        body: body.replace_arith(&mut table)?,
      },
    };

    Ok(Statement::new(kind))
  }

  /// Rewrites every aggregate literal in the body into a placeholder, recording the epsilon and eta rules in
  /// `map`. The returned statement has an aggregate-free body with the original literal order preserved.
  pub fn rewrite_aggregates(&self, map: &mut AggrMap) -> Statement {
    if !self.contains_aggregates() {
      return self.clone();
    }

    let global_vars = self.global_vars();
    let body = self.body();

    let non_aggr_literals: Vec<Literal> = body
        .iter()
        .filter(|literal| !matches!(literal, Literal::Aggregate(_)))
        .cloned()
        .collect();

    let mut rewritten_body: Vec<Literal> = Vec::with_capacity(body.len());

    for literal in body {
      match literal {
        Literal::Aggregate(aggregate) => {
          let ref_id = map.len();
          let (placeholder, base_rule, element_rules) =
              rewrite_aggregate(aggregate, ref_id, &global_vars, &non_aggr_literals);

          rewritten_body.push(Literal::Placeholder(placeholder.clone()));
          map.push(AggrRecord {
            literal: aggregate.clone(),
            placeholder,
            base_rule,
            element_rules,
          });
        }
        other => rewritten_body.push(other.clone()),
      }
    }

    self.with_body(LiteralCollection::new(rewritten_body))
  }

  /// Replaces placeholder literals in the body according to `assembling`, restoring aggregate literals after
  /// grounding.
  pub fn assemble_aggregates(&self, assembling: &crate::abstractions::HashMap<Literal, Literal>) -> Statement {
    let body: Vec<Literal> = self
        .body()
        .iter()
        .map(|literal| assembling.get(literal).cloned().unwrap_or_else(|| literal.clone()))
        .collect();
    self.with_body(LiteralCollection::new(body))
  }

  /// Rewrites a choice (or NPP, via its choice encoding) head into a normal χ-rule, recording the epsilon and
  /// eta rules in `map`. Statements without a choice head are returned unchanged.
  pub fn rewrite_choices(&self, map: &mut ChoiceMap) -> Statement {
    let (choice, body) = match &self.kind {
      StatementKind::Choice { choice, body } => (choice.clone(), body),
      StatementKind::Npp { npp, body } => (npp.as_choice(), body),
      _ => return self.clone(),
    };

    let global_vars = self.global_vars();
    let ref_id = map.len();
    let (placeholder, base_rule, element_rules) =
        rewrite_choice(&choice, ref_id, &global_vars, body.as_slice());

    map.push(ChoiceRecord { choice, placeholder: placeholder.clone(), base_rule, element_rules });

    Statement::normal(Literal::Placeholder(placeholder), body.clone())
  }

  /// The same statement with a different body.
  fn with_body(&self, body: LiteralCollection) -> Statement {
    let kind = match &self.kind {
      StatementKind::Normal { head, .. } => StatementKind::Normal { head: head.clone(), body },
      StatementKind::Disjunctive { heads, .. } => {
        StatementKind::Disjunctive { heads: heads.clone(), body }
      }
      StatementKind::Choice { choice, .. } => StatementKind::Choice { choice: choice.clone(), body },
      StatementKind::Constraint { .. } => StatementKind::Constraint { body },
      StatementKind::Npp { npp, .. } => StatementKind::Npp { npp: npp.clone(), body },
    };
    Statement::new(kind)
  }

  // endregion
}

impl PartialEq for Statement {
  fn eq(&self, other: &Self) -> bool {
    self.kind == other.kind
  }
}

impl Eq for Statement {}

impl Hash for Statement {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.kind.hash(state);
  }
}

impl Display for Statement {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match &self.kind {
      StatementKind::Normal { head, body } => {
        if body.is_empty() {
          write!(f, "{}.", head)
        } else {
          write!(f, "{} :- {}.", head, body)
        }
      }
      StatementKind::Disjunctive { heads, body } => {
        let heads_str = join_string(heads.iter(), "|");
        if body.is_empty() {
          write!(f, "{}.", heads_str)
        } else {
          write!(f, "{} :- {}.", heads_str, body)
        }
      }
      StatementKind::Choice { choice, body } => {
        if body.is_empty() {
          write!(f, "{}.", choice)
        } else {
          write!(f, "{} :- {}.", choice, body)
        }
      }
      StatementKind::Constraint { body } => write!(f, ":- {}.", body),
      StatementKind::Npp { npp, body } => {
        if body.is_empty() {
          write!(f, "{}.", npp)
        } else {
          write!(f, "{} :- {}.", npp, body)
        }
      }
    }
  }
}
