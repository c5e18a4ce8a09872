/*!

Choice expressions: a head construct `t₁ ≺₁ { e₁; …; eₘ } ≺₂ t₂` selecting any guard-conforming subset of
eligible atoms. Each element pairs an atom with a condition; an element is eligible once its condition holds.
The grounder never unfolds the subsets (enumerating them is the solver's job), but it does approximate
satisfiability of the guards during propagation, counting eligible atoms the same way the aggregate oracles
count satisfied elements.

*/

use std::fmt::{Display, Formatter};

use crate::{
  abstractions::Set,
  api::{
    literal::{Guard, Literal, LiteralCollection, PredicateLiteral, RelOp},
    term::{Term, VariableSet},
  },
  core::{
    error::GroundingError,
    substitution::Substitution,
    variable_table::VariableTable,
  },
};

/// One element of a choice: an atom and the condition under which it is eligible.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChoiceElement {
  pub atom: PredicateLiteral,
  pub literals: LiteralCollection,
}

impl ChoiceElement {
  pub fn new(atom: PredicateLiteral, literals: LiteralCollection) -> ChoiceElement {
    ChoiceElement { atom, literals }
  }

  /// An element with an empty condition.
  pub fn unconditional(atom: PredicateLiteral) -> ChoiceElement {
    ChoiceElement { atom, literals: LiteralCollection::default() }
  }

  pub fn ground(&self) -> bool {
    self.atom.ground() && self.literals.ground()
  }

  pub fn vars(&self) -> VariableSet {
    let mut vars = self.atom.vars();
    vars.extend(self.literals.vars());
    vars
  }

  pub fn pos_occ(&self) -> Vec<Literal> {
    let mut occurrences = vec![Literal::Predicate(self.atom.clone())];
    for occurrence in self.literals.pos_occ() {
      if !occurrences.contains(&occurrence) {
        occurrences.push(occurrence);
      }
    }
    occurrences
  }

  pub fn neg_occ(&self) -> Vec<Literal> {
    self.literals.neg_occ()
  }

  /// Whether the element's condition holds within the given set of literals.
  pub fn satisfied(&self, literals: &Set<Literal>) -> bool {
    self.literals.iter().all(|literal| literals.contains(literal))
  }

  pub fn substitute(&self, subst: &Substitution) -> ChoiceElement {
    ChoiceElement {
      atom: self.atom.substitute(subst),
      literals: self.literals.substitute(subst),
    }
  }

  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<ChoiceElement, GroundingError> {
    Ok(ChoiceElement {
      atom: self.atom.replace_arith(table)?,
      literals: self.literals.replace_arith(table)?,
    })
  }
}

impl Display for ChoiceElement {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if self.literals.is_empty() {
      write!(f, "{}", self.atom)
    } else {
      write!(f, "{}:{}", self.atom, self.literals)
    }
  }
}

/// A choice expression with up to two guards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Choice {
  pub elements: Vec<ChoiceElement>,
  pub lguard: Option<Guard>,
  pub rguard: Option<Guard>,
}

impl Choice {
  pub fn new(elements: Vec<ChoiceElement>, lguard: Option<Guard>, rguard: Option<Guard>) -> Choice {
    if let Some(guard) = &lguard {
      assert!(!guard.right, "left guard of a choice must be a left guard");
    }
    if let Some(guard) = &rguard {
      assert!(guard.right, "right guard of a choice must be a right guard");
    }
    Choice { elements, lguard, rguard }
  }

  pub fn guards(&self) -> (Option<&Guard>, Option<&Guard>) {
    (self.lguard.as_ref(), self.rguard.as_ref())
  }

  /// The atoms eligible for selection.
  pub fn head(&self) -> Vec<PredicateLiteral> {
    self.elements.iter().map(|element| element.atom.clone()).collect()
  }

  pub fn ground(&self) -> bool {
    self.elements.iter().all(ChoiceElement::ground)
        && [&self.lguard, &self.rguard]
            .into_iter()
            .flatten()
            .all(|guard| guard.bound.ground())
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

  /// Global variables of the choice within a statement: the guard variables plus the inner variables that are
  /// global in the statement's body.
  pub fn global_vars(&self, body_global_vars: &VariableSet) -> VariableSet {
    let mut vars = self.outvars();
    vars.extend(self.invars().intersection(body_global_vars).cloned());
    vars
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

  /// Whether the guards are satisfiable for a ground choice over the given atoms: some subset size within
  /// `0..=n` must conform to every guard.
  pub fn eval(atoms: &Set<PredicateLiteral>, guards: (Option<&Guard>, Option<&Guard>))
              -> Result<bool, GroundingError>
  {
    let atom_count = Term::Number(atoms.len() as i64);
    let mut result = true;

    for guard in [guards.0, guards.1].into_iter().flatten() {
      let op = guard.as_right_op();
      let bound = &guard.bound;

      let holds = match op {
        RelOp::Greater | RelOp::GreaterOrEq => op.eval(&atom_count, bound)?,
        RelOp::Equal => {
          RelOp::GreaterOrEq.eval(&atom_count, bound)?
              && RelOp::GreaterOrEq.eval(bound, &Term::Number(0))?
        }
        RelOp::Unequal => {
          RelOp::Unequal.eval(bound, &Term::Number(0))? || !atoms.is_empty()
        }
        // a lower subset size of zero is always available
        RelOp::Less | RelOp::LessOrEq => op.eval(&Term::Number(0), bound)?,
      };
      result &= holds;
    }

    Ok(result)
  }

  /// The satisfiability oracle used during propagation: may a guard-conforming subset of the eligible atoms
  /// exist under the certain domain `literals_i` and the possible domain `literals_j`?
  pub fn propagate(
    guards: (Option<&Guard>, Option<&Guard>),
    elements: &Set<ChoiceElement>,
    literals_i: &Set<Literal>,
    literals_j: &Set<Literal>,
  ) -> Result<bool, GroundingError> {
    let atoms_of = |domain: &Set<Literal>| -> Vec<PredicateLiteral> {
      let mut atoms = Vec::new();
      for element in elements.iter().filter(|e| e.satisfied(domain)) {
        if !atoms.contains(&element.atom) {
          atoms.push(element.atom.clone());
        }
      }
      atoms
    };

    let atoms_j = atoms_of(literals_j);

    let mut result = true;

    for guard in [guards.0, guards.1].into_iter().flatten() {
      if !result {
        break;
      }

      let op = guard.as_right_op();
      let bound = &guard.bound;

      let holds = match op {
        RelOp::Greater | RelOp::GreaterOrEq => {
          op.eval(&Term::Number(atoms_j.len() as i64), bound)?
        }
        RelOp::Less | RelOp::LessOrEq => op.eval(&Term::Number(0), bound)?,
        RelOp::Equal => RelOp::GreaterOrEq.eval(&Term::Number(atoms_j.len() as i64), bound)?,
        RelOp::Unequal => {
          // any subset of the eligible atoms may be selected; only its size matters
          let mut atoms = atoms_of(literals_i);
          for atom in &atoms_j {
            if !atoms.contains(atom) {
              atoms.push(atom.clone());
            }
          }

          let mut found = false;
          for chosen in 0..=(atoms.len() as i64) {
            if RelOp::Unequal.eval(&Term::Number(chosen), bound)? {
              found = true;
              break;
            }
          }
          found
        }
      };
      result &= holds;
    }

    Ok(result)
  }

  pub fn substitute(&self, subst: &Substitution) -> Choice {
    Choice {
      elements: self.elements.iter().map(|e| e.substitute(subst)).collect(),
      lguard: self.lguard.as_ref().map(|guard| guard.substitute(subst)),
      rguard: self.rguard.as_ref().map(|guard| guard.substitute(subst)),
    }
  }

  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<Choice, GroundingError> {
    let elements: Result<Vec<ChoiceElement>, GroundingError> =
        self.elements.iter().map(|e| e.replace_arith(table)).collect();

    Ok(Choice {
      elements: elements?,
      lguard: match &self.lguard {
        Some(guard) => Some(guard.replace_arith(table)?),
        None => None,
      },
      rguard: match &self.rguard {
        Some(guard) => Some(guard.replace_arith(table)?),
        None => None,
      },
    })
  }
}

impl Display for Choice {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if let Some(guard) = &self.lguard {
      write!(f, "{} ", guard)?;
    }
    write!(f, "{{")?;
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

  fn atom(name: &str) -> PredicateLiteral {
    PredicateLiteral::new(name, Vec::new())
  }

  #[test]
  fn unconditional_elements_are_always_eligible() {
    let element = ChoiceElement::unconditional(atom("a"));
    assert!(element.satisfied(&Set::new()));
  }

  #[test]
  fn guard_feasibility_counts_eligible_atoms() {
    // {a;b;c} = 2 is satisfiable once all three atoms are eligible
    let elements: Set<ChoiceElement> = ["a", "b", "c"]
        .into_iter()
        .map(|name| ChoiceElement::unconditional(atom(name)))
        .collect();
    let guard = Guard::new(RelOp::Equal, Term::Number(2), true);

    let satisfiable =
        Choice::propagate((None, Some(&guard)), &elements, &Set::new(), &Set::new()).unwrap();
    assert!(satisfiable);

    // ... but {a} = 2 is not
    let single: Set<ChoiceElement> =
        [ChoiceElement::unconditional(atom("a"))].into_iter().collect();
    let satisfiable =
        Choice::propagate((None, Some(&guard)), &single, &Set::new(), &Set::new()).unwrap();
    assert!(!satisfiable);
  }

  #[test]
  fn conditional_elements_follow_the_domain() {
    // {x : p} >= 1 requires p to be possible
    let p = Literal::Predicate(atom("p"));
    let elements: Set<ChoiceElement> =
        [ChoiceElement::new(atom("x"), LiteralCollection::new(vec![p.clone()]))]
            .into_iter()
            .collect();
    let guard = Guard::new(RelOp::GreaterOrEq, Term::Number(1), true);

    let empty = Set::new();
    assert!(!Choice::propagate((None, Some(&guard)), &elements, &empty, &empty).unwrap());

    let possible: Set<Literal> = [p].into_iter().collect();
    assert!(Choice::propagate((None, Some(&guard)), &elements, &empty, &possible).unwrap());
  }

  #[test]
  fn ground_eval_handles_edge_guards() {
    let atoms: Set<PredicateLiteral> = [atom("a"), atom("b")].into_iter().collect();

    // = -1 can never hold
    let negative = Guard::new(RelOp::Equal, Term::Number(-1), true);
    assert!(!Choice::eval(&atoms, (None, Some(&negative))).unwrap());

    // != 0 needs at least one atom
    let nonzero = Guard::new(RelOp::Unequal, Term::Number(0), true);
    assert!(Choice::eval(&atoms, (None, Some(&nonzero))).unwrap());
    assert!(!Choice::eval(&Set::new(), (None, Some(&nonzero))).unwrap());
  }
}
