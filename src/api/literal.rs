/*!

The literal algebra. A `Literal` is a tagged sum over predicate literals (optionally classically and/or default
negated), built-in relational literals (always positive), aggregate literals, and the auxiliary
placeholder/base/element literals the propagator works with. Bodies and other literal sequences are
`LiteralCollection`s.

*/

use std::fmt::{Display, Formatter};

use enumflags2::{bitflags, BitFlags};

use crate::{
  abstractions::{join_string, IString},
  api::{
    aggregate::AggrLiteral,
    placeholder::{BaseLiteral, ElementLiteral, PlaceholderLiteral},
    term::{Term, TermTuple, VariableSet},
  },
  core::{
    error::GroundingError,
    safety::{SafetyRule, SafetyTriplet},
    substitution::Substitution,
    variable_table::VariableTable,
  },
};

/// A predicate signature: name and arity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PredicateSignature(pub IString, pub usize);

impl Display for PredicateSignature {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}/{}", self.0, self.1)
  }
}

#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum LiteralAttribute {
  /// Classical (strong) negation: `-p(..)`.
  ClassicallyNegated,
  /// Default negation (negation as failure): `not p(..)`.
  DefaultNegated,
}

pub type LiteralAttributes = BitFlags<LiteralAttribute, u8>;

// region Relational operators and guards

/// Relational operators of built-in literals and guards.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelOp {
  Equal,
  Unequal,
  Less,
  Greater,
  LessOrEq,
  GreaterOrEq,
}

impl RelOp {
  /// The equivalent operator after swapping the operands: `a < b` iff `b > a`.
  pub fn flip(self) -> RelOp {
    match self {
      RelOp::Equal => RelOp::Equal,
      RelOp::Unequal => RelOp::Unequal,
      RelOp::Less => RelOp::Greater,
      RelOp::Greater => RelOp::Less,
      RelOp::LessOrEq => RelOp::GreaterOrEq,
      RelOp::GreaterOrEq => RelOp::LessOrEq,
    }
  }

  /// Evaluates the relation over the ground-term total order. Fails loudly on non-ground operands.
  pub fn eval(self, lhs: &Term, rhs: &Term) -> Result<bool, GroundingError> {
    use std::cmp::Ordering;
    let ordering = lhs.compare(rhs)?;

    Ok(match self {
      RelOp::Equal => ordering == Ordering::Equal,
      RelOp::Unequal => ordering != Ordering::Equal,
      RelOp::Less => ordering == Ordering::Less,
      RelOp::Greater => ordering == Ordering::Greater,
      RelOp::LessOrEq => ordering != Ordering::Greater,
      RelOp::GreaterOrEq => ordering != Ordering::Less,
    })
  }
}

impl Display for RelOp {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      RelOp::Equal => write!(f, "="),
      RelOp::Unequal => write!(f, "!="),
      RelOp::Less => write!(f, "<"),
      RelOp::Greater => write!(f, ">"),
      RelOp::LessOrEq => write!(f, "<="),
      RelOp::GreaterOrEq => write!(f, ">="),
    }
  }
}

/// One side of an aggregate or choice comparison: a bound term with its relational operator and the side it
/// appears on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Guard {
  pub op: RelOp,
  pub bound: Term,
  /// `true` if the guard appears to the right of the aggregate/choice.
  pub right: bool,
}

impl Guard {
  pub fn new(op: RelOp, bound: Term, right: bool) -> Guard {
    Guard { op, bound, right }
  }

  /// The equivalent left-side guard.
  pub fn to_left(&self) -> Guard {
    if self.right {
      Guard { op: self.op.flip(), bound: self.bound.clone(), right: false }
    } else {
      self.clone()
    }
  }

  /// The operator positioned as `aggregate-value op bound` (canonical right-hand form).
  pub fn as_right_op(&self) -> RelOp {
    if self.right {
      self.op
    } else {
      self.op.flip()
    }
  }

  pub fn vars(&self) -> VariableSet {
    self.bound.vars()
  }

  pub fn substitute(&self, subst: &Substitution) -> Guard {
    Guard { op: self.op, bound: self.bound.substitute(subst), right: self.right }
  }

  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<Guard, GroundingError> {
    Ok(Guard { op: self.op, bound: self.bound.replace_arith(table)?, right: self.right })
  }
}

impl Display for Guard {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if self.right {
      write!(f, "{} {}", self.op, self.bound)
    } else {
      write!(f, "{} {}", self.bound, self.op)
    }
  }
}

// endregion

/// Per-term safety contribution: a variable is safe on its own, arithmetic makes its variables unsafe, and
/// functional terms combine the contributions of their arguments.
pub(crate) fn term_safety(term: &Term) -> SafetyTriplet {
  match term {
    Term::Variable(var) => {
      let mut safe = VariableSet::new();
      safe.insert(var.clone());
      SafetyTriplet::from_safe(safe)
    }
    Term::Functional(_, terms) => SafetyTriplet::closure(terms.iter().map(term_safety)),
    Term::Arith(arith) => SafetyTriplet::from_unsafe(arith.vars()),
    _ => SafetyTriplet::default(),
  }
}

// region Predicate literals

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PredicateLiteral {
  pub name: IString,
  pub terms: TermTuple,
  pub attributes: LiteralAttributes,
}

impl PredicateLiteral {
  /// A positive literal.
  pub fn new(name: &str, terms: Vec<Term>) -> PredicateLiteral {
    PredicateLiteral {
      name: IString::from(name),
      terms: TermTuple::new(terms),
      attributes: LiteralAttributes::default(),
    }
  }

  #[inline(always)]
  pub fn naf(&self) -> bool {
    self.attributes.contains(LiteralAttribute::DefaultNegated)
  }

  #[inline(always)]
  pub fn neg(&self) -> bool {
    self.attributes.contains(LiteralAttribute::ClassicallyNegated)
  }

  pub fn set_naf(&mut self, value: bool) {
    if value {
      self.attributes.insert(LiteralAttribute::DefaultNegated);
    } else {
      self.attributes.remove(LiteralAttribute::DefaultNegated);
    }
  }

  pub fn set_neg(&mut self, value: bool) {
    if value {
      self.attributes.insert(LiteralAttribute::ClassicallyNegated);
    } else {
      self.attributes.remove(LiteralAttribute::ClassicallyNegated);
    }
  }

  /// Builder-style default negation, convenient when constructing programs.
  pub fn with_naf(mut self) -> PredicateLiteral {
    self.set_naf(true);
    self
  }

  /// Builder-style classical negation.
  pub fn with_neg(mut self) -> PredicateLiteral {
    self.set_neg(true);
    self
  }

  #[inline(always)]
  pub fn arity(&self) -> usize {
    self.terms.len()
  }

  pub fn pred(&self) -> PredicateSignature {
    PredicateSignature(self.name.clone(), self.arity())
  }

  pub fn ground(&self) -> bool {
    self.terms.ground()
  }

  pub fn vars(&self) -> VariableSet {
    self.terms.vars()
  }

  /// The positive (naf-stripped) version of this literal.
  pub fn positive(&self) -> PredicateLiteral {
    let mut literal = self.clone();
    literal.set_naf(false);
    literal
  }

  pub fn safety(&self) -> SafetyTriplet {
    if self.naf() {
      SafetyTriplet::from_unsafe(self.vars())
    } else {
      SafetyTriplet::closure(self.terms.iter().map(term_safety))
    }
  }

  pub fn substitute(&self, subst: &Substitution) -> PredicateLiteral {
    PredicateLiteral {
      name: self.name.clone(),
      terms: self.terms.substitute(subst),
      attributes: self.attributes,
    }
  }

  /// Matches against another predicate literal with the same signature and sign.
  pub fn match_with(&self, other: &PredicateLiteral) -> Option<Substitution> {
    if self.name != other.name
        || self.arity() != other.arity()
        || self.neg() != other.neg()
        || self.naf() != other.naf()
    {
      return None;
    }
    self.terms.match_with(&other.terms)
  }

  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<PredicateLiteral, GroundingError> {
    Ok(PredicateLiteral {
      name: self.name.clone(),
      terms: self.terms.replace_arith(table)?,
      attributes: self.attributes,
    })
  }
}

impl Display for PredicateLiteral {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let naf = if self.naf() { "not " } else { "" };
    let neg = if self.neg() { "-" } else { "" };
    if self.terms.is_empty() {
      write!(f, "{}{}{}", naf, neg, self.name)
    } else {
      write!(f, "{}{}{}({})", naf, neg, self.name, self.terms)
    }
  }
}

// endregion

// region Built-in literals

/// A relational comparison between two terms. Built-in literals are always positive; default negation is
/// expressed by complementing the operator in the front-end.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BuiltinLiteral {
  pub op: RelOp,
  pub lhs: Term,
  pub rhs: Term,
}

impl BuiltinLiteral {
  pub fn new(op: RelOp, lhs: Term, rhs: Term) -> BuiltinLiteral {
    BuiltinLiteral { op, lhs, rhs }
  }

  pub fn ground(&self) -> bool {
    self.lhs.ground() && self.rhs.ground()
  }

  pub fn vars(&self) -> VariableSet {
    let mut vars = self.lhs.vars();
    vars.extend(self.rhs.vars());
    vars
  }

  /// Whether the relation holds. Requires ground operands.
  pub fn eval(&self) -> Result<bool, GroundingError> {
    self.op.eval(&self.lhs, &self.rhs)
  }

  /// Equality propagates safety: each variable made safe by one side becomes a depender on the other side's
  /// variables. Every other operator leaves all of its variables unsafe.
  pub fn safety(&self) -> SafetyTriplet {
    let lvars = self.lhs.vars();
    let rvars = self.rhs.vars();

    if self.op != RelOp::Equal {
      let mut vars = lvars;
      vars.extend(rvars);
      return SafetyTriplet::from_unsafe(vars);
    }

    let lsafety = term_safety(&self.lhs);
    let rsafety = term_safety(&self.rhs);

    let mut rules: Vec<SafetyRule> = Vec::new();
    for var in rsafety.safe {
      rules.push(SafetyRule { depender: var, dependees: lvars.clone() });
    }
    for var in lsafety.safe {
      rules.push(SafetyRule { depender: var, dependees: rvars.clone() });
    }

    let mut unsafe_vars = lvars;
    unsafe_vars.extend(rvars);
    SafetyTriplet::new(VariableSet::new(), unsafe_vars, rules).normalize()
  }

  pub fn substitute(&self, subst: &Substitution) -> BuiltinLiteral {
    BuiltinLiteral {
      op: self.op,
      lhs: self.lhs.substitute(subst),
      rhs: self.rhs.substitute(subst),
    }
  }

  pub fn match_with(&self, other: &BuiltinLiteral) -> Option<Substitution> {
    if self.op != other.op {
      return None;
    }
    let lhs = self.lhs.match_with(&other.lhs)?;
    let rhs = self.rhs.match_with(&other.rhs)?;
    lhs.merge(&rhs).ok()
  }

  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<BuiltinLiteral, GroundingError> {
    Ok(BuiltinLiteral {
      op: self.op,
      lhs: self.lhs.replace_arith(table)?,
      rhs: self.rhs.replace_arith(table)?,
    })
  }
}

impl Display for BuiltinLiteral {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}{}{}", self.lhs, self.op, self.rhs)
  }
}

// endregion

// region The literal sum type

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
  Predicate(PredicateLiteral),
  Builtin(BuiltinLiteral),
  Aggregate(AggrLiteral),
  /// α/χ placeholder standing in for a rewritten aggregate or choice.
  Placeholder(PlaceholderLiteral),
  /// ε literal: satisfiability of the rewritten expression with no elements.
  Base(BaseLiteral),
  /// η literal: instantiation of one element of the rewritten expression.
  Element(ElementLiteral),
}

impl Literal {
  pub fn naf(&self) -> bool {
    match self {
      Literal::Predicate(literal) => literal.naf(),
      Literal::Aggregate(literal) => literal.naf,
      Literal::Placeholder(literal) => literal.naf,
      Literal::Builtin(_) | Literal::Base(_) | Literal::Element(_) => false,
    }
  }

  /// Sets default negation. Base and element literals forbid it.
  pub fn set_naf(&mut self, value: bool) -> Result<(), GroundingError> {
    match self {
      Literal::Predicate(literal) => {
        literal.set_naf(value);
        Ok(())
      }
      Literal::Aggregate(literal) => {
        literal.naf = value;
        Ok(())
      }
      Literal::Placeholder(literal) => {
        literal.naf = value;
        Ok(())
      }
      Literal::Builtin(_) | Literal::Base(_) | Literal::Element(_) => {
        Err(GroundingError::InvalidAuxLiteral { literal: self.to_string() })
      }
    }
  }

  /// Sets classical negation. Only ordinary predicate literals support it.
  pub fn set_neg(&mut self, value: bool) -> Result<(), GroundingError> {
    match self {
      Literal::Predicate(literal) => {
        literal.set_neg(value);
        Ok(())
      }
      _ => Err(GroundingError::InvalidAuxLiteral { literal: self.to_string() }),
    }
  }

  pub fn ground(&self) -> bool {
    match self {
      Literal::Predicate(literal) => literal.ground(),
      Literal::Builtin(literal) => literal.ground(),
      Literal::Aggregate(literal) => literal.ground(),
      Literal::Placeholder(literal) => literal.terms.ground(),
      Literal::Base(literal) => literal.terms.ground(),
      Literal::Element(literal) => literal.terms.ground(),
    }
  }

  pub fn vars(&self) -> VariableSet {
    match self {
      Literal::Predicate(literal) => literal.vars(),
      Literal::Builtin(literal) => literal.vars(),
      Literal::Aggregate(literal) => literal.vars(),
      Literal::Placeholder(literal) => literal.terms.vars(),
      Literal::Base(literal) => literal.terms.vars(),
      Literal::Element(literal) => literal.terms.vars(),
    }
  }

  /// Variables that are global when the literal occurs in a rule body. For aggregate literals only the guard
  /// (outer) variables are global; element-local variables are not.
  pub fn global_vars(&self) -> VariableSet {
    match self {
      Literal::Aggregate(literal) => literal.outvars(),
      _ => self.vars(),
    }
  }

  /// The predicate signature, for literals that have one. Auxiliary literals report their synthesized
  /// predicate names.
  pub fn pred(&self) -> Option<PredicateSignature> {
    match self {
      Literal::Predicate(literal) => Some(literal.pred()),
      Literal::Placeholder(literal) => Some(literal.pred()),
      Literal::Base(literal) => Some(literal.pred()),
      Literal::Element(literal) => Some(literal.pred()),
      Literal::Builtin(_) | Literal::Aggregate(_) => None,
    }
  }

  /// Positive occurrences: the positive literals this literal asserts. A default-negated literal has none; an
  /// aggregate contributes the positive occurrences of its element conditions.
  pub fn pos_occ(&self) -> Vec<Literal> {
    match self {
      Literal::Predicate(literal) => {
        if literal.naf() {
          Vec::new()
        } else {
          vec![Literal::Predicate(literal.clone())]
        }
      }
      Literal::Builtin(_) => Vec::new(),
      Literal::Aggregate(literal) => literal.pos_occ(),
      Literal::Placeholder(literal) => {
        if literal.naf {
          Vec::new()
        } else {
          vec![Literal::Placeholder(literal.clone())]
        }
      }
      Literal::Base(literal) => vec![Literal::Base(literal.clone())],
      Literal::Element(literal) => vec![Literal::Element(literal.clone())],
    }
  }

  /// Negative occurrences. The naf flag is dropped from the reported literals.
  pub fn neg_occ(&self) -> Vec<Literal> {
    match self {
      Literal::Predicate(literal) => {
        if literal.naf() {
          vec![Literal::Predicate(literal.positive())]
        } else {
          Vec::new()
        }
      }
      Literal::Builtin(_) => Vec::new(),
      Literal::Aggregate(literal) => literal.neg_occ(),
      Literal::Placeholder(literal) => {
        if literal.naf {
          vec![Literal::Placeholder(literal.positive())]
        } else {
          Vec::new()
        }
      }
      Literal::Base(_) | Literal::Element(_) => Vec::new(),
    }
  }

  /// The literal's safety contribution. `global_vars` are the enclosing statement's global variables, needed
  /// only by aggregate literals (passed as a parameter so that literals never hold a back-pointer to their
  /// statement).
  pub fn safety(&self, global_vars: &VariableSet) -> SafetyTriplet {
    match self {
      Literal::Predicate(literal) => literal.safety(),
      Literal::Builtin(literal) => literal.safety(),
      Literal::Aggregate(literal) => literal.safety(global_vars),
      Literal::Placeholder(literal) => {
        if literal.naf {
          SafetyTriplet::from_unsafe(literal.terms.vars())
        } else {
          SafetyTriplet::closure(literal.terms.iter().map(term_safety))
        }
      }
      Literal::Base(literal) => SafetyTriplet::closure(literal.terms.iter().map(term_safety)),
      Literal::Element(literal) => SafetyTriplet::closure(literal.terms.iter().map(term_safety)),
    }
  }

  pub fn substitute(&self, subst: &Substitution) -> Literal {
    match self {
      Literal::Predicate(literal) => Literal::Predicate(literal.substitute(subst)),
      Literal::Builtin(literal) => Literal::Builtin(literal.substitute(subst)),
      Literal::Aggregate(literal) => Literal::Aggregate(literal.substitute(subst)),
      Literal::Placeholder(literal) => Literal::Placeholder(literal.substitute(subst)),
      Literal::Base(literal) => Literal::Base(literal.substitute(subst)),
      Literal::Element(literal) => Literal::Element(literal.substitute(subst)),
    }
  }

  /// Matching: produces a substitution making `self` equal to `other`, or nothing. Matching is undefined for
  /// aggregate literals (they are rewritten away before the instantiation loop runs).
  pub fn match_with(&self, other: &Literal) -> Option<Substitution> {
    match (self, other) {
      (Literal::Predicate(literal), Literal::Predicate(target)) => literal.match_with(target),
      (Literal::Builtin(literal), Literal::Builtin(target)) => literal.match_with(target),
      (Literal::Placeholder(literal), Literal::Placeholder(target)) => literal.match_with(target),
      _ => None,
    }
  }

  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<Literal, GroundingError> {
    match self {
      Literal::Predicate(literal) => Ok(Literal::Predicate(literal.replace_arith(table)?)),
      Literal::Builtin(literal) => Ok(Literal::Builtin(literal.replace_arith(table)?)),
      Literal::Aggregate(literal) => Ok(Literal::Aggregate(literal.replace_arith(table)?)),
      // auxiliary literal terms are variable tuples; nothing to replace
      Literal::Placeholder(_) | Literal::Base(_) | Literal::Element(_) => Ok(self.clone()),
    }
  }
}

impl Display for Literal {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Literal::Predicate(literal) => write!(f, "{}", literal),
      Literal::Builtin(literal) => write!(f, "{}", literal),
      Literal::Aggregate(literal) => write!(f, "{}", literal),
      Literal::Placeholder(literal) => write!(f, "{}", literal),
      Literal::Base(literal) => write!(f, "{}", literal),
      Literal::Element(literal) => write!(f, "{}", literal),
    }
  }
}

// endregion

// region Literal collections

/// An ordered sequence of literals (a rule body, an element condition).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct LiteralCollection {
  literals: Vec<Literal>,
}

impl LiteralCollection {
  pub fn new(literals: Vec<Literal>) -> LiteralCollection {
    LiteralCollection { literals }
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.literals.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.literals.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Literal> {
    self.literals.iter()
  }

  pub fn as_slice(&self) -> &[Literal] {
    &self.literals
  }

  pub fn contains(&self, literal: &Literal) -> bool {
    self.literals.contains(literal)
  }

  pub fn concat(&self, other: &LiteralCollection) -> LiteralCollection {
    let mut literals = self.literals.clone();
    literals.extend(other.literals.iter().cloned());
    LiteralCollection { literals }
  }

  /// The collection with the first occurrence of `literal` removed.
  pub fn without(&self, literal: &Literal) -> LiteralCollection {
    let mut literals = self.literals.clone();
    if let Some(position) = literals.iter().position(|l| l == literal) {
      literals.remove(position);
    }
    LiteralCollection { literals }
  }

  pub fn ground(&self) -> bool {
    self.literals.iter().all(Literal::ground)
  }

  pub fn vars(&self) -> VariableSet {
    let mut vars = VariableSet::new();
    for literal in &self.literals {
      vars.extend(literal.vars());
    }
    vars
  }

  pub fn global_vars(&self) -> VariableSet {
    let mut vars = VariableSet::new();
    for literal in &self.literals {
      vars.extend(literal.global_vars());
    }
    vars
  }

  pub fn pos_occ(&self) -> Vec<Literal> {
    let mut occurrences = Vec::new();
    for literal in &self.literals {
      for occurrence in literal.pos_occ() {
        if !occurrences.contains(&occurrence) {
          occurrences.push(occurrence);
        }
      }
    }
    occurrences
  }

  pub fn neg_occ(&self) -> Vec<Literal> {
    let mut occurrences = Vec::new();
    for literal in &self.literals {
      for occurrence in literal.neg_occ() {
        if !occurrences.contains(&occurrence) {
          occurrences.push(occurrence);
        }
      }
    }
    occurrences
  }

  pub fn safety(&self, global_vars: &VariableSet) -> SafetyTriplet {
    SafetyTriplet::closure(self.literals.iter().map(|literal| literal.safety(global_vars)))
  }

  pub fn substitute(&self, subst: &Substitution) -> LiteralCollection {
    LiteralCollection { literals: self.literals.iter().map(|l| l.substitute(subst)).collect() }
  }

  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<LiteralCollection, GroundingError> {
    let literals: Result<Vec<Literal>, GroundingError> =
        self.literals.iter().map(|l| l.replace_arith(table)).collect();
    Ok(LiteralCollection { literals: literals? })
  }
}

impl FromIterator<Literal> for LiteralCollection {
  fn from_iter<I: IntoIterator<Item = Literal>>(iter: I) -> LiteralCollection {
    LiteralCollection { literals: iter.into_iter().collect() }
  }
}

impl<'c> IntoIterator for &'c LiteralCollection {
  type Item = &'c Literal;
  type IntoIter = std::slice::Iter<'c, Literal>;

  fn into_iter(self) -> Self::IntoIter {
    self.literals.iter()
  }
}

impl Display for LiteralCollection {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", join_string(self.literals.iter(), ","))
  }
}

// endregion

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_is_always_positive() {
    let mut literal = Literal::Builtin(BuiltinLiteral::new(RelOp::Less, Term::Number(1), Term::Number(2)));
    assert!(!literal.naf());
    assert!(literal.set_naf(true).is_err());
  }

  #[test]
  fn relop_eval() {
    let one = Term::Number(1);
    let two = Term::Number(2);

    assert!(RelOp::Less.eval(&one, &two).unwrap());
    assert!(RelOp::Unequal.eval(&one, &two).unwrap());
    assert!(!RelOp::GreaterOrEq.eval(&one, &two).unwrap());
    assert!(RelOp::Equal.eval(&one, &Term::Number(1)).unwrap());

    // order is undefined on non-ground terms
    assert!(RelOp::Less.eval(&Term::variable("X"), &two).is_err());
  }

  #[test]
  fn equality_propagates_safety() {
    // Y = X: Y is a depender on {X} and vice versa
    let literal = BuiltinLiteral::new(RelOp::Equal, Term::variable("Y"), Term::variable("X"));
    let safety = literal.safety();
    assert_eq!(safety.rules.len(), 2);

    // X < Y marks everything unsafe
    let literal = BuiltinLiteral::new(RelOp::Less, Term::variable("X"), Term::variable("Y"));
    let safety = literal.safety();
    assert!(safety.rules.is_empty());
    assert_eq!(safety.unsafe_vars.len(), 2);
  }

  #[test]
  fn naf_flips_occurrences() {
    let positive = Literal::Predicate(PredicateLiteral::new("p", vec![Term::Number(1)]));
    assert_eq!(positive.pos_occ().len(), 1);
    assert!(positive.neg_occ().is_empty());

    let negated = Literal::Predicate(PredicateLiteral::new("p", vec![Term::Number(1)]).with_naf());
    assert!(negated.pos_occ().is_empty());
    let neg_occ = negated.neg_occ();
    assert_eq!(neg_occ, vec![positive]);
  }

  #[test]
  fn literal_matching() {
    let pattern = Literal::Predicate(PredicateLiteral::new("p", vec![Term::variable("X")]));
    let target = Literal::Predicate(PredicateLiteral::new("p", vec![Term::Number(3)]));
    let mismatched = Literal::Predicate(PredicateLiteral::new("q", vec![Term::Number(3)]));

    let subst = pattern.match_with(&target).unwrap();
    assert_eq!(pattern.substitute(&subst), target);
    assert!(pattern.match_with(&mismatched).is_none());
  }

  #[test]
  fn guard_canonicalization() {
    // "2 <= …" (left guard) is "… >= 2" in canonical right-hand form
    let guard = Guard::new(RelOp::LessOrEq, Term::Number(2), false);
    assert_eq!(guard.as_right_op(), RelOp::GreaterOrEq);

    let right = Guard::new(RelOp::Less, Term::Number(5), true);
    assert_eq!(right.as_right_op(), RelOp::Less);
    assert_eq!(right.to_left().op, RelOp::Greater);
  }
}
