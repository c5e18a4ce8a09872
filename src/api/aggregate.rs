/*!

Aggregate expressions: `#count`, `#sum`, `#max`, `#min` over sets of aggregate elements, compared against one or
two guards. Besides the algebraic operations, each aggregate function carries its *satisfiability oracle*: the
sound over-approximation the propagator consults to decide whether a ground aggregate may hold under the current
certain/possible domains. The oracle is an approximation, never exact. It must be monotone in the possible
domain and must never remove an answer set, but it may report satisfiable for aggregates that turn out false
during solving.

*/

use std::fmt::{Display, Formatter};

use crate::{
  abstractions::Set,
  api::{
    literal::{Guard, Literal, LiteralCollection, RelOp},
    term::{Term, TermTuple, VariableSet},
  },
  core::{
    error::GroundingError,
    safety::{SafetyRule, SafetyTriplet},
    substitution::Substitution,
    variable_table::VariableTable,
  },
};

use super::literal::term_safety;

/// One element of an aggregate: a head term tuple and a condition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AggregateElement {
  pub terms: TermTuple,
  pub literals: LiteralCollection,
}

impl AggregateElement {
  pub fn new(terms: TermTuple, literals: LiteralCollection) -> AggregateElement {
    AggregateElement { terms, literals }
  }

  /// The element's weight: its first head term if numeric, otherwise 0.
  pub fn weight(&self) -> i64 {
    match self.terms.first() {
      Some(Term::Number(value)) => *value,
      _ => 0,
    }
  }

  /// The element's first head term, the value `#min`/`#max` range over.
  pub fn first_term(&self) -> Option<&Term> {
    self.terms.first()
  }

  pub fn ground(&self) -> bool {
    self.terms.ground() && self.literals.ground()
  }

  pub fn vars(&self) -> VariableSet {
    let mut vars = self.terms.vars();
    vars.extend(self.literals.vars());
    vars
  }

  pub fn pos_occ(&self) -> Vec<Literal> {
    self.literals.pos_occ()
  }

  pub fn neg_occ(&self) -> Vec<Literal> {
    self.literals.neg_occ()
  }

  /// Whether the element's condition holds within the given set of literals.
  pub fn satisfied(&self, literals: &Set<Literal>) -> bool {
    self.literals.iter().all(|literal| literals.contains(literal))
  }

  pub fn substitute(&self, subst: &Substitution) -> AggregateElement {
    AggregateElement {
      terms: self.terms.substitute(subst),
      literals: self.literals.substitute(subst),
    }
  }

  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<AggregateElement, GroundingError> {
    Ok(AggregateElement {
      terms: self.terms.replace_arith(table)?,
      literals: self.literals.replace_arith(table)?,
    })
  }
}

impl Display for AggregateElement {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if self.literals.is_empty() {
      write!(f, "{}", self.terms)
    } else {
      write!(f, "{}:{}", self.terms, self.literals)
    }
  }
}

/// The aggregate functions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AggrKind {
  Count,
  Sum,
  Max,
  Min,
}

/// Distinct head tuples among the given elements; aggregates are set-wise over tuples, not occurrences.
fn distinct_heads<'e>(elements: impl Iterator<Item = &'e AggregateElement>) -> Vec<&'e TermTuple> {
  let mut heads: Vec<&TermTuple> = Vec::new();
  for element in elements {
    if !heads.contains(&&element.terms) {
      heads.push(&element.terms);
    }
  }
  heads
}

impl AggrKind {
  /// The aggregate's value over the empty element set: 0 for `#count`/`#sum`, `#sup` for `#min`, `#inf` for
  /// `#max`.
  pub fn base(&self) -> Term {
    match self {
      AggrKind::Count | AggrKind::Sum => Term::Number(0),
      AggrKind::Min => Term::Supremum,
      AggrKind::Max => Term::Infimum,
    }
  }

  /// The satisfiability oracle: may the aggregate with the given ground guards and ground element instances
  /// hold under the certain domain `literals_i` and the possible domain `literals_j` (`I ⊆ J`)?
  pub fn propagate(
    &self,
    guards: (Option<&Guard>, Option<&Guard>),
    elements: &Set<AggregateElement>,
    literals_i: &Set<Literal>,
    literals_j: &Set<Literal>,
  ) -> Result<bool, GroundingError> {
    let elements_i: Vec<&AggregateElement> =
        elements.iter().filter(|e| e.satisfied(literals_i)).collect();
    let elements_j: Vec<&AggregateElement> =
        elements.iter().filter(|e| e.satisfied(literals_j)).collect();

    let mut result = true;

    for guard in [guards.0, guards.1].into_iter().flatten() {
      if !result {
        break;
      }

      // canonical form: aggregate-value `op` bound
      let op = guard.as_right_op();
      let bound = &guard.bound;

      let holds = match self {
        AggrKind::Count => Self::propagate_count(op, bound, &elements_j)?,
        AggrKind::Sum => Self::propagate_sum(op, bound, &elements_j)?,
        AggrKind::Min => Self::propagate_extremum(op, bound, &elements_i, &elements_j, true)?,
        AggrKind::Max => Self::propagate_extremum(op, bound, &elements_i, &elements_j, false)?,
      };
      result &= holds;
    }

    Ok(result)
  }

  /// `#count`: upper-bound checks use the number of distinct heads satisfied in `J`, lower-bound checks the
  /// empty set.
  fn propagate_count(op: RelOp, bound: &Term, elements_j: &[&AggregateElement])
                     -> Result<bool, GroundingError>
  {
    let count_j = distinct_heads(elements_j.iter().copied()).len() as i64;

    match op {
      RelOp::Greater | RelOp::GreaterOrEq => op.eval(&Term::Number(count_j), bound),
      RelOp::Less | RelOp::LessOrEq => op.eval(&Term::Number(0), bound),
      RelOp::Equal => RelOp::GreaterOrEq.eval(&Term::Number(count_j), bound),
      RelOp::Unequal => {
        // any subset of the satisfied heads may be chosen; only its size matters
        for chosen in 0..=count_j {
          if RelOp::Unequal.eval(&Term::Number(chosen), bound)? {
            return Ok(true);
          }
        }
        Ok(false)
      }
    }
  }

  /// `#sum`: the achievable sums over subsets of the `J`-satisfied heads lie between the sum of negative
  /// weights and the sum of positive weights.
  fn propagate_sum(op: RelOp, bound: &Term, elements_j: &[&AggregateElement])
                   -> Result<bool, GroundingError>
  {
    let mut max_sum = 0i64;
    let mut min_sum = 0i64;

    for head in distinct_heads(elements_j.iter().copied()) {
      let weight = match head.first() {
        Some(Term::Number(value)) => *value,
        _ => 0,
      };
      if weight > 0 {
        max_sum += weight;
      } else {
        min_sum += weight;
      }
    }

    match op {
      RelOp::Greater | RelOp::GreaterOrEq => op.eval(&Term::Number(max_sum), bound),
      RelOp::Less | RelOp::LessOrEq => op.eval(&Term::Number(min_sum), bound),
      RelOp::Equal => {
        Ok(
          RelOp::GreaterOrEq.eval(&Term::Number(max_sum), bound)?
              && RelOp::LessOrEq.eval(&Term::Number(min_sum), bound)?,
        )
      }
      RelOp::Unequal => {
        // unsatisfiable only when the single achievable sum equals the bound
        Ok(!(min_sum == max_sum && RelOp::Equal.eval(&Term::Number(min_sum), bound)?))
      }
    }
  }

  /// `#min`/`#max` admit a cheap exact test: elements certain in `I` force the extremum past their own values,
  /// while any single `J`-satisfied element on the open side of that bound is achievable, as is the base value
  /// when nothing is forced.
  fn propagate_extremum(
    op: RelOp,
    bound: &Term,
    elements_i: &[&AggregateElement],
    elements_j: &[&AggregateElement],
    minimum: bool,
  ) -> Result<bool, GroundingError> {
    let values_i: Vec<&Term> = elements_i.iter().filter_map(|e| e.first_term()).collect();
    let values_j: Vec<&Term> = elements_j.iter().filter_map(|e| e.first_term()).collect();

    // the extremum over the certain elements, which every choice of elements must respect
    let mut forced: Option<&Term> = None;
    for value in values_i {
      forced = match forced {
        None => Some(value),
        Some(extremum) => {
          let passes =
              if minimum { value.precedes(extremum)? } else { extremum.precedes(value)? };
          if passes { Some(value) } else { Some(extremum) }
        }
      };
    }

    let mut candidates: Vec<Term> = Vec::new();
    match forced {
      None => {
        // the empty selection is achievable
        candidates.push(if minimum { Term::Supremum } else { Term::Infimum });
        candidates.extend(values_j.iter().map(|v| (*v).clone()));
      }
      Some(extremum) => {
        candidates.push(extremum.clone());
        for value in values_j {
          let achievable =
              if minimum { value.precedes(extremum)? } else { extremum.precedes(value)? };
          if achievable {
            candidates.push(value.clone());
          }
        }
      }
    }

    for candidate in candidates {
      if op.eval(&candidate, bound)? {
        return Ok(true);
      }
    }
    Ok(false)
  }
}

impl Display for AggrKind {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      AggrKind::Count => write!(f, "#count"),
      AggrKind::Sum => write!(f, "#sum"),
      AggrKind::Max => write!(f, "#max"),
      AggrKind::Min => write!(f, "#min"),
    }
  }
}

/// An aggregate literal: an aggregate function applied to elements, constrained by at least one guard,
/// optionally default-negated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AggrLiteral {
  pub kind: AggrKind,
  pub elements: Vec<AggregateElement>,
  pub lguard: Option<Guard>,
  pub rguard: Option<Guard>,
  pub naf: bool,
}

impl AggrLiteral {
  pub fn new(
    kind: AggrKind,
    elements: Vec<AggregateElement>,
    lguard: Option<Guard>,
    rguard: Option<Guard>,
    naf: bool,
  ) -> AggrLiteral {
    assert!(
      lguard.is_some() || rguard.is_some(),
      "an aggregate literal requires at least one guard"
    );
    if let Some(guard) = &lguard {
      assert!(!guard.right, "left guard of an aggregate literal must be a left guard");
    }
    if let Some(guard) = &rguard {
      assert!(guard.right, "right guard of an aggregate literal must be a right guard");
    }

    AggrLiteral { kind, elements, lguard, rguard, naf }
  }

  pub fn guards(&self) -> (Option<&Guard>, Option<&Guard>) {
    (self.lguard.as_ref(), self.rguard.as_ref())
  }

  /// Variables occurring inside the elements.
  pub fn invars(&self) -> VariableSet {
    let mut vars = VariableSet::new();
    for element in &self.elements {
      vars.extend(element.vars());
    }
    vars
  }

  /// Variables occurring in the guard terms.
  pub fn outvars(&self) -> VariableSet {
    let mut vars = VariableSet::new();
    for guard in [&self.lguard, &self.rguard].into_iter().flatten() {
      vars.extend(guard.vars());
    }
    vars
  }

  pub fn vars(&self) -> VariableSet {
    let mut vars = self.invars();
    vars.extend(self.outvars());
    vars
  }

  pub fn ground(&self) -> bool {
    self.elements.iter().all(AggregateElement::ground)
        && [&self.lguard, &self.rguard]
            .into_iter()
            .flatten()
            .all(|guard| guard.bound.ground())
  }

  pub fn pos_occ(&self) -> Vec<Literal> {
    let mut occurrences = Vec::new();
    for element in &self.elements {
      for occurrence in element.pos_occ() {
        if !occurrences.contains(&occurrence) {
          occurrences.push(occurrence);
        }
      }
    }
    occurrences
  }

  pub fn neg_occ(&self) -> Vec<Literal> {
    let mut occurrences = Vec::new();
    for element in &self.elements {
      for occurrence in element.neg_occ() {
        if !occurrences.contains(&occurrence) {
          occurrences.push(occurrence);
        }
      }
    }
    occurrences
  }

  /// Safety characterization with respect to the enclosing statement's global variables. An `=` guard binds its
  /// own safe variables once all global inner variables are bound; any other guard leaves its variables unsafe.
  pub fn safety(&self, global_vars: &VariableSet) -> SafetyTriplet {
    let global_invars: VariableSet =
        self.invars().intersection(global_vars).cloned().collect();

    let mut guard_safeties: Vec<SafetyTriplet> = Vec::new();

    for guard in [&self.lguard, &self.rguard].into_iter().flatten() {
      if guard.op == RelOp::Equal {
        let mut unsafe_vars = global_invars.clone();
        unsafe_vars.extend(guard.vars());

        let rules: Vec<SafetyRule> = term_safety(&guard.bound)
            .safe
            .into_iter()
            .map(|var| SafetyRule { depender: var, dependees: global_invars.clone() })
            .collect();

        guard_safeties.push(SafetyTriplet::new(VariableSet::new(), unsafe_vars, rules).normalize());
      } else {
        let mut unsafe_vars = global_invars.clone();
        unsafe_vars.extend(guard.vars());
        guard_safeties.push(SafetyTriplet::from_unsafe(unsafe_vars));
      }
    }

    if guard_safeties.is_empty() {
      SafetyTriplet::from_unsafe(global_invars)
    } else {
      SafetyTriplet::closure(guard_safeties)
    }
  }

  /// Substitutes guard terms and element terms recursively.
  pub fn substitute(&self, subst: &Substitution) -> AggrLiteral {
    AggrLiteral {
      kind: self.kind,
      elements: self.elements.iter().map(|e| e.substitute(subst)).collect(),
      lguard: self.lguard.as_ref().map(|guard| guard.substitute(subst)),
      rguard: self.rguard.as_ref().map(|guard| guard.substitute(subst)),
      naf: self.naf,
    }
  }

  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<AggrLiteral, GroundingError> {
    let elements: Result<Vec<AggregateElement>, GroundingError> =
        self.elements.iter().map(|e| e.replace_arith(table)).collect();

    Ok(AggrLiteral {
      kind: self.kind,
      elements: elements?,
      lguard: match &self.lguard {
        Some(guard) => Some(guard.replace_arith(table)?),
        None => None,
      },
      rguard: match &self.rguard {
        Some(guard) => Some(guard.replace_arith(table)?),
        None => None,
      },
      naf: self.naf,
    })
  }
}

impl Display for AggrLiteral {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if self.naf {
      write!(f, "not ")?;
    }
    if let Some(guard) = &self.lguard {
      write!(f, "{} ", guard)?;
    }
    write!(f, "{}{{", self.kind)?;
    let mut first = true;
    for element in &self.elements {
      if !first {
        write!(f, ";")?;
      }
      write!(f, "{}", element)?;
      first = false;
    }
    write!(f, "}}")?;
    if let Some(guard) = &self.rguard {
      write!(f, " {}", guard)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::literal::PredicateLiteral;

  fn atom(name: &str, value: i64) -> Literal {
    Literal::Predicate(PredicateLiteral::new(name, vec![Term::Number(value)]))
  }

  fn element(value: i64, condition: Literal) -> AggregateElement {
    AggregateElement::new(
      TermTuple::new(vec![Term::Number(value)]),
      LiteralCollection::new(vec![condition]),
    )
  }

  #[test]
  fn base_values() {
    assert_eq!(AggrKind::Count.base(), Term::Number(0));
    assert_eq!(AggrKind::Sum.base(), Term::Number(0));
    assert_eq!(AggrKind::Min.base(), Term::Supremum);
    assert_eq!(AggrKind::Max.base(), Term::Infimum);
  }

  #[test]
  fn count_lower_bound_against_possible_domain() {
    // 2 <= #count{X : p(X)} with p(1), p(2) possible
    let elements: Set<AggregateElement> =
        [element(1, atom("p", 1)), element(2, atom("p", 2))].into_iter().collect();
    let guard = Guard::new(RelOp::LessOrEq, Term::Number(2), false);

    let literals_j: Set<Literal> = [atom("p", 1), atom("p", 2)].into_iter().collect();
    let literals_i: Set<Literal> = Set::new();

    let satisfiable = AggrKind::Count
        .propagate((Some(&guard), None), &elements, &literals_i, &literals_j)
        .unwrap();
    assert!(satisfiable);

    // with only p(1) possible the bound is out of reach
    let literals_j: Set<Literal> = [atom("p", 1)].into_iter().collect();
    let satisfiable = AggrKind::Count
        .propagate((Some(&guard), None), &elements, &literals_i, &literals_j)
        .unwrap();
    assert!(!satisfiable);
  }

  #[test]
  fn count_upper_bound_holds_via_empty_selection() {
    // #count{...} <= 0 is always satisfiable by selecting nothing
    let elements: Set<AggregateElement> = [element(1, atom("p", 1))].into_iter().collect();
    let guard = Guard::new(RelOp::LessOrEq, Term::Number(0), true);
    let literals_j: Set<Literal> = [atom("p", 1)].into_iter().collect();

    let satisfiable = AggrKind::Count
        .propagate((None, Some(&guard)), &elements, &Set::new(), &literals_j)
        .unwrap();
    assert!(satisfiable);
  }

  #[test]
  fn sum_bounds() {
    // achievable sums over weights {3, -2} span [-2, 3]
    let elements: Set<AggregateElement> =
        [element(3, atom("p", 1)), element(-2, atom("p", 2))].into_iter().collect();
    let literals_j: Set<Literal> = [atom("p", 1), atom("p", 2)].into_iter().collect();
    let empty = Set::new();

    let reachable = Guard::new(RelOp::GreaterOrEq, Term::Number(2), true);
    assert!(AggrKind::Sum
        .propagate((None, Some(&reachable)), &elements, &empty, &literals_j)
        .unwrap());

    let unreachable = Guard::new(RelOp::GreaterOrEq, Term::Number(4), true);
    assert!(!AggrKind::Sum
        .propagate((None, Some(&unreachable)), &elements, &empty, &literals_j)
        .unwrap());
  }

  #[test]
  fn min_respects_certain_elements() {
    // an element certain in I caps the achievable minimum
    let elements: Set<AggregateElement> =
        [element(1, atom("p", 1)), element(5, atom("p", 5))].into_iter().collect();
    let literals_i: Set<Literal> = [atom("p", 1)].into_iter().collect();
    let literals_j: Set<Literal> = [atom("p", 1), atom("p", 5)].into_iter().collect();

    // #min{...} = 5 cannot hold: p(1) is certain, so the minimum is at most 1
    let guard = Guard::new(RelOp::Equal, Term::Number(5), true);
    assert!(!AggrKind::Min
        .propagate((None, Some(&guard)), &elements, &literals_i, &literals_j)
        .unwrap());

    // without the certain element it can
    assert!(AggrKind::Min
        .propagate((None, Some(&guard)), &elements, &Set::new(), &literals_j)
        .unwrap());
  }

  #[test]
  fn max_base_value_is_infimum() {
    // #max{...} < 0 is satisfiable through the empty selection (value #inf)
    let elements: Set<AggregateElement> = [element(7, atom("p", 7))].into_iter().collect();
    let literals_j: Set<Literal> = [atom("p", 7)].into_iter().collect();
    let guard = Guard::new(RelOp::Less, Term::Number(0), true);

    assert!(AggrKind::Max
        .propagate((None, Some(&guard)), &elements, &Set::new(), &literals_j)
        .unwrap());
  }

  #[test]
  #[should_panic]
  fn aggregate_requires_a_guard() {
    AggrLiteral::new(AggrKind::Count, Vec::new(), None, None, false);
  }
}
