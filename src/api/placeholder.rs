/*!

Auxiliary literals for aggregate and choice propagation. Rewriting replaces each aggregate (prefix `α`) or
choice (prefix `χ`) by a *placeholder* literal keyed by a reference id and the assignment of the expression's
global variables; satisfiability with an empty element set is encoded by a *base* literal (`εα`/`εχ`), and each
element instantiation by an *element* literal (`ηα`/`ηχ`). These prefixes (together with `τ` for arithmetic
placeholder variables) are reserved; user-level identifiers must not begin with them.

Placeholder literals cannot be classically negated; base and element literals cannot be negated at all. Every
auxiliary literal carries exactly one assignment term per variable it tracks.

*/

use std::fmt::{Display, Formatter};

use crate::{
  abstractions::IString,
  api::{
    literal::PredicateSignature,
    term::{Term, TermTuple},
  },
  core::substitution::Substitution,
};

/// The reserved prefix family an auxiliary literal belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AuxPrefix {
  /// Aggregates: `α`.
  Alpha,
  /// Choices: `χ`.
  Chi,
}

impl Display for AuxPrefix {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      AuxPrefix::Alpha => write!(f, "\u{03b1}"),
      AuxPrefix::Chi => write!(f, "\u{03C7}"),
    }
  }
}

/// Extracts the variable→term assignment from a pair of (variable tuple, assignment tuple), skipping entries
/// that map a variable to itself.
fn gather_assignment(vars: &TermTuple, terms: &TermTuple) -> Substitution {
  let mut subst = Substitution::identity();

  for (var_term, target) in vars.iter().zip(terms.iter()) {
    if let Term::Variable(var) = var_term {
      if var_term != target {
        subst.insert(var.clone(), target.clone());
      }
    }
  }

  subst
}

// region Placeholder (α/χ) literals

/// Stand-in for a rewritten aggregate or choice expression, keyed by the assignment of the expression's global
/// variables. Preserves the replaced literal's default negation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlaceholderLiteral {
  pub prefix: AuxPrefix,
  pub ref_id: usize,
  /// The global variables of the replaced expression, in a fixed order.
  pub glob_vars: TermTuple,
  /// The assignment terms, positionally matching `glob_vars`.
  pub terms: TermTuple,
  pub naf: bool,
}

impl PlaceholderLiteral {
  pub fn new(prefix: AuxPrefix, ref_id: usize, glob_vars: TermTuple, terms: TermTuple, naf: bool)
             -> PlaceholderLiteral
  {
    assert_eq!(
      glob_vars.len(),
      terms.len(),
      "placeholder literal requires one assignment term per global variable"
    );
    PlaceholderLiteral { prefix, ref_id, glob_vars, terms, naf }
  }

  pub fn name(&self) -> IString {
    IString::from(format!("{}{}", self.prefix, self.ref_id).as_str())
  }

  pub fn pred(&self) -> PredicateSignature {
    PredicateSignature(self.name(), self.terms.len())
  }

  pub fn positive(&self) -> PlaceholderLiteral {
    let mut literal = self.clone();
    literal.naf = false;
    literal
  }

  pub fn substitute(&self, subst: &Substitution) -> PlaceholderLiteral {
    PlaceholderLiteral {
      prefix: self.prefix,
      ref_id: self.ref_id,
      glob_vars: self.glob_vars.clone(),
      terms: self.terms.substitute(subst),
      naf: self.naf,
    }
  }

  pub fn match_with(&self, other: &PlaceholderLiteral) -> Option<Substitution> {
    if self.prefix != other.prefix || self.ref_id != other.ref_id || self.naf != other.naf {
      return None;
    }
    self.terms.match_with(&other.terms)
  }

  /// The assignment of global variables recorded in this (ground) literal's terms.
  pub fn gather_assignment(&self) -> Substitution {
    gather_assignment(&self.glob_vars, &self.terms)
  }
}

impl Display for PlaceholderLiteral {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let naf = if self.naf { "not " } else { "" };
    if self.terms.is_empty() {
      write!(f, "{}{}{}", naf, self.prefix, self.ref_id)
    } else {
      write!(f, "{}{}{}({})", naf, self.prefix, self.ref_id, self.terms)
    }
  }
}

// endregion

// region Base (ε) literals

/// Head literal of an epsilon rule: records that the rewritten expression is satisfiable with an empty element
/// set under the given global-variable assignment. Always positive.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BaseLiteral {
  pub prefix: AuxPrefix,
  pub ref_id: usize,
  pub glob_vars: TermTuple,
  pub terms: TermTuple,
}

impl BaseLiteral {
  pub fn new(prefix: AuxPrefix, ref_id: usize, glob_vars: TermTuple, terms: TermTuple) -> BaseLiteral {
    assert_eq!(
      glob_vars.len(),
      terms.len(),
      "base literal requires one assignment term per global variable"
    );
    BaseLiteral { prefix, ref_id, glob_vars, terms }
  }

  pub fn name(&self) -> IString {
    IString::from(format!("\u{03b5}{}{}", self.prefix, self.ref_id).as_str())
  }

  pub fn pred(&self) -> PredicateSignature {
    PredicateSignature(self.name(), self.terms.len())
  }

  pub fn substitute(&self, subst: &Substitution) -> BaseLiteral {
    BaseLiteral {
      prefix: self.prefix,
      ref_id: self.ref_id,
      glob_vars: self.glob_vars.clone(),
      terms: self.terms.substitute(subst),
    }
  }

  pub fn gather_assignment(&self) -> Substitution {
    gather_assignment(&self.glob_vars, &self.terms)
  }
}

impl Display for BaseLiteral {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if self.terms.is_empty() {
      write!(f, "\u{03b5}{}{}", self.prefix, self.ref_id)
    } else {
      write!(f, "\u{03b5}{}{}({})", self.prefix, self.ref_id, self.terms)
    }
  }
}

// endregion

// region Element (η) literals

/// Head literal of an eta rule: records the instantiation of one element of the rewritten expression. The
/// assignment terms cover the element's local variables followed by the expression's global variables. Always
/// positive.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementLiteral {
  pub prefix: AuxPrefix,
  pub ref_id: usize,
  pub element_id: usize,
  pub local_vars: TermTuple,
  pub glob_vars: TermTuple,
  pub terms: TermTuple,
}

impl ElementLiteral {
  pub fn new(
    prefix: AuxPrefix,
    ref_id: usize,
    element_id: usize,
    local_vars: TermTuple,
    glob_vars: TermTuple,
    terms: TermTuple,
  ) -> ElementLiteral {
    assert_eq!(
      local_vars.len() + glob_vars.len(),
      terms.len(),
      "element literal requires one assignment term per local and global variable"
    );
    ElementLiteral { prefix, ref_id, element_id, local_vars, glob_vars, terms }
  }

  pub fn name(&self) -> IString {
    IString::from(format!("\u{03b7}{}{}_{}", self.prefix, self.ref_id, self.element_id).as_str())
  }

  pub fn pred(&self) -> PredicateSignature {
    PredicateSignature(self.name(), self.terms.len())
  }

  pub fn substitute(&self, subst: &Substitution) -> ElementLiteral {
    ElementLiteral {
      prefix: self.prefix,
      ref_id: self.ref_id,
      element_id: self.element_id,
      local_vars: self.local_vars.clone(),
      glob_vars: self.glob_vars.clone(),
      terms: self.terms.substitute(subst),
    }
  }

  /// The assignment of local and global variables recorded in this (ground) literal's terms.
  pub fn gather_assignment(&self) -> Substitution {
    gather_assignment(&self.local_vars.concat(&self.glob_vars), &self.terms)
  }
}

impl Display for ElementLiteral {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if self.terms.is_empty() {
      write!(f, "\u{03b7}{}{}_{}", self.prefix, self.ref_id, self.element_id)
    } else {
      write!(f, "\u{03b7}{}{}_{}({})", self.prefix, self.ref_id, self.element_id, self.terms)
    }
  }
}

// endregion
