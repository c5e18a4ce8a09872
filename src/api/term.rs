/*!

The term algebra: the recursive tree language over which programs are built. A `Term` is a tagged sum over
constants (numbers, symbolic constants, strings, `#inf`/`#sup`), variables (ordinary, anonymous, arithmetic
placeholder), functional terms, and arithmetic trees. Terms are value-like: substitution and replacement always
produce new terms, and terms are freely shared by cloning.

The total order ≺ on ground terms follows ASP-Core-2:

```text
#inf ≺ numbers ≺ symbolic constants ≺ strings ≺ functional terms ≺ #sup
```

with numbers ordered by integer value, symbolic constants and strings lexicographically, and functional terms
first by arity, then by name, then lexicographically by argument tuples. The order is *undefined* on non-ground
terms; asking for it is a hard error, never a silent default.

*/

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use crate::{
  abstractions::{join_string, IString, Set},
  core::{
    error::GroundingError,
    substitution::Substitution,
    variable_table::VariableTable,
  },
};

pub type VariableSet = Set<Variable>;

/// A variable occurring in a statement. Anonymous variables and arithmetic placeholder variables are numbered
/// by the statement's `VariableTable`; an arithmetic placeholder additionally remembers the (simplified)
/// arithmetic subtree it replaced so the grounder can validate its binding at match commitment time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Variable {
  Named(IString),
  Anonymous(usize),
  ArithPlaceholder(usize, Box<ArithTerm>),
}

impl Variable {
  #[inline(always)]
  pub fn is_arith_placeholder(&self) -> bool {
    matches!(self, Variable::ArithPlaceholder(..))
  }

  /// The replaced arithmetic subtree, if this is an arithmetic placeholder.
  pub fn original(&self) -> Option<&ArithTerm> {
    match self {
      Variable::ArithPlaceholder(_, original) => Some(original),
      _ => None,
    }
  }
}

impl Display for Variable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Variable::Named(name) => write!(f, "{}", name),
      Variable::Anonymous(id) => write!(f, "_{}", id),
      Variable::ArithPlaceholder(id, _) => write!(f, "\u{03C4}{}", id),
    }
  }
}

// Variables get a (purely syntactic) order of their own so that sets of global variables can be laid out in
// tuples deterministically. This is unrelated to the ASP-Core-2 term order.
impl PartialOrd for Variable {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Variable {
  fn cmp(&self, other: &Self) -> Ordering {
    use Variable::*;
    match (self, other) {
      (Named(a), Named(b)) => a.as_ref().cmp(b.as_ref()),
      (Named(_), _) => Ordering::Less,
      (_, Named(_)) => Ordering::Greater,
      (Anonymous(a), Anonymous(b)) => a.cmp(b),
      (Anonymous(_), _) => Ordering::Less,
      (_, Anonymous(_)) => Ordering::Greater,
      (ArithPlaceholder(a, _), ArithPlaceholder(b, _)) => a.cmp(b),
    }
  }
}

/// An arithmetic tree. Operands are full terms so that variables and nested arithmetic can appear anywhere;
/// evaluation requires groundness.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArithTerm {
  Neg(Box<Term>),
  Add(Box<Term>, Box<Term>),
  Sub(Box<Term>, Box<Term>),
  Mul(Box<Term>, Box<Term>),
  Div(Box<Term>, Box<Term>),
}

/// ASP-Core-2 requires *floor* integer division, which differs from Rust's truncating `/` for mixed signs.
fn floor_div(lhs: i64, rhs: i64) -> i64 {
  let quotient = lhs / rhs;
  if lhs % rhs != 0 && (lhs < 0) != (rhs < 0) {
    quotient - 1
  } else {
    quotient
  }
}

impl ArithTerm {
  pub fn ground(&self) -> bool {
    match self {
      ArithTerm::Neg(operand) => operand.ground(),
      ArithTerm::Add(lhs, rhs)
      | ArithTerm::Sub(lhs, rhs)
      | ArithTerm::Mul(lhs, rhs)
      | ArithTerm::Div(lhs, rhs) => lhs.ground() && rhs.ground(),
    }
  }

  pub fn vars(&self) -> VariableSet {
    match self {
      ArithTerm::Neg(operand) => operand.vars(),
      ArithTerm::Add(lhs, rhs)
      | ArithTerm::Sub(lhs, rhs)
      | ArithTerm::Mul(lhs, rhs)
      | ArithTerm::Div(lhs, rhs) => {
        let mut vars = lhs.vars();
        vars.extend(rhs.vars());
        vars
      }
    }
  }

  /// Evaluates the tree to an integer. Requires groundness; division by zero is a hard error.
  pub fn eval(&self) -> Result<i64, GroundingError> {
    match self {
      ArithTerm::Neg(operand) => Ok(-operand.eval()?),
      ArithTerm::Add(lhs, rhs) => Ok(lhs.eval()? + rhs.eval()?),
      ArithTerm::Sub(lhs, rhs) => Ok(lhs.eval()? - rhs.eval()?),
      ArithTerm::Mul(lhs, rhs) => Ok(lhs.eval()? * rhs.eval()?),
      ArithTerm::Div(lhs, rhs) => {
        let divisor = rhs.eval()?;
        if divisor == 0 {
          return Err(GroundingError::DivisionByZero);
        }
        Ok(floor_div(lhs.eval()?, divisor))
      }
    }
  }

  /// Simplifies the tree, folding constants and applying identities. Ground trees collapse to a `Number`;
  /// simplification of a variable subtree may collapse to the variable itself.
  pub fn simplify(&self) -> Result<Term, GroundingError> {
    match self {

      ArithTerm::Neg(operand) => {
        match operand.simplify()? {
          Term::Number(value) => Ok(Term::Number(-value)),
          // two negations cancel each other out
          Term::Arith(ArithTerm::Neg(inner)) => Ok(*inner),
          simplified => Ok(Term::Arith(ArithTerm::Neg(Box::new(simplified)))),
        }
      }

      ArithTerm::Add(lhs, rhs) => {
        match (lhs.simplify()?, rhs.simplify()?) {
          (Term::Number(a), Term::Number(b)) => Ok(Term::Number(a + b)),
          (Term::Number(0), rhs) => Ok(rhs),
          (lhs, Term::Number(0)) => Ok(lhs),
          (lhs, rhs) => Ok(Term::Arith(ArithTerm::Add(Box::new(lhs), Box::new(rhs)))),
        }
      }

      ArithTerm::Sub(lhs, rhs) => {
        match (lhs.simplify()?, rhs.simplify()?) {
          (Term::Number(a), Term::Number(b)) => Ok(Term::Number(a - b)),
          (Term::Number(0), rhs) => ArithTerm::Neg(Box::new(rhs)).simplify(),
          (lhs, Term::Number(0)) => Ok(lhs),
          (lhs, rhs) => Ok(Term::Arith(ArithTerm::Sub(Box::new(lhs), Box::new(rhs)))),
        }
      }

      ArithTerm::Mul(lhs, rhs) => {
        match (lhs.simplify()?, rhs.simplify()?) {
          (Term::Number(a), Term::Number(b)) => Ok(Term::Number(a * b)),
          // multiplication by zero collapses only if the other operand is ground
          (Term::Number(0), rhs) if rhs.ground() => Ok(Term::Number(0)),
          (lhs, Term::Number(0)) if lhs.ground() => Ok(Term::Number(0)),
          (Term::Number(1), rhs) => Ok(rhs),
          (lhs, Term::Number(1)) => Ok(lhs),
          (Term::Number(-1), rhs) => ArithTerm::Neg(Box::new(rhs)).simplify(),
          (lhs, Term::Number(-1)) => ArithTerm::Neg(Box::new(lhs)).simplify(),
          (lhs, rhs) => Ok(Term::Arith(ArithTerm::Mul(Box::new(lhs), Box::new(rhs)))),
        }
      }

      ArithTerm::Div(lhs, rhs) => {
        match (lhs.simplify()?, rhs.simplify()?) {
          (_, Term::Number(0)) => Err(GroundingError::DivisionByZero),
          (Term::Number(a), Term::Number(b)) => Ok(Term::Number(floor_div(a, b))),
          (Term::Number(0), rhs) if rhs.ground() => Ok(Term::Number(0)),
          (lhs, Term::Number(1)) => Ok(lhs),
          (lhs, Term::Number(-1)) => ArithTerm::Neg(Box::new(lhs)).simplify(),
          (lhs, rhs) => Ok(Term::Arith(ArithTerm::Div(Box::new(lhs), Box::new(rhs)))),
        }
      }

    }
  }

  pub fn substitute(&self, subst: &Substitution) -> ArithTerm {
    match self {
      ArithTerm::Neg(operand) => ArithTerm::Neg(Box::new(operand.substitute(subst))),
      ArithTerm::Add(lhs, rhs) => {
        ArithTerm::Add(Box::new(lhs.substitute(subst)), Box::new(rhs.substitute(subst)))
      }
      ArithTerm::Sub(lhs, rhs) => {
        ArithTerm::Sub(Box::new(lhs.substitute(subst)), Box::new(rhs.substitute(subst)))
      }
      ArithTerm::Mul(lhs, rhs) => {
        ArithTerm::Mul(Box::new(lhs.substitute(subst)), Box::new(rhs.substitute(subst)))
      }
      ArithTerm::Div(lhs, rhs) => {
        ArithTerm::Div(Box::new(lhs.substitute(subst)), Box::new(rhs.substitute(subst)))
      }
    }
  }
}

/// Parenthesizes nested arithmetic operands for display.
fn operand_str(term: &Term) -> String {
  match term {
    Term::Arith(_) => format!("({})", term),
    _ => term.to_string(),
  }
}

impl Display for ArithTerm {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      ArithTerm::Neg(operand) => write!(f, "-{}", operand_str(operand)),
      ArithTerm::Add(lhs, rhs) => write!(f, "{}+{}", operand_str(lhs), operand_str(rhs)),
      ArithTerm::Sub(lhs, rhs) => write!(f, "{}-{}", operand_str(lhs), operand_str(rhs)),
      ArithTerm::Mul(lhs, rhs) => write!(f, "{}*{}", operand_str(lhs), operand_str(rhs)),
      ArithTerm::Div(lhs, rhs) => write!(f, "{}/{}", operand_str(lhs), operand_str(rhs)),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
  /// Least element in the total ordering for terms (`#inf`).
  Infimum,
  Number(i64),
  SymbolicConstant(IString),
  Str(IString),
  Functional(IString, TermTuple),
  /// Greatest element in the total ordering for terms (`#sup`).
  Supremum,
  Variable(Variable),
  Arith(ArithTerm),
}

impl Term {
  /// Convenience constructor for a named variable.
  pub fn variable(name: &str) -> Term {
    Term::Variable(Variable::Named(IString::from(name)))
  }

  pub fn symbolic(name: &str) -> Term {
    Term::SymbolicConstant(IString::from(name))
  }

  /// A term is ground iff no variable of any kind occurs in it.
  pub fn ground(&self) -> bool {
    match self {
      Term::Variable(_) => false,
      Term::Functional(_, terms) => terms.ground(),
      Term::Arith(arith) => arith.ground(),
      _ => true,
    }
  }

  pub fn vars(&self) -> VariableSet {
    match self {
      Term::Variable(var) => {
        let mut vars = VariableSet::new();
        vars.insert(var.clone());
        vars
      }
      Term::Functional(_, terms) => terms.vars(),
      Term::Arith(arith) => arith.vars(),
      _ => VariableSet::new(),
    }
  }

  /// Rank of the term's variant in the ASP-Core-2 total order.
  fn order_rank(&self) -> u8 {
    match self {
      Term::Infimum => 0,
      Term::Number(_) => 1,
      Term::SymbolicConstant(_) => 2,
      Term::Str(_) => 3,
      Term::Functional(..) => 4,
      Term::Supremum => 5,
      // unreachable after `canonical`
      Term::Variable(_) | Term::Arith(_) => u8::MAX,
    }
  }

  /// Normalizes a ground term for comparison: arithmetic trees are evaluated to numbers. Fails loudly on
  /// variables and non-ground arithmetic.
  fn canonical(&self) -> Result<Term, GroundingError> {
    match self {
      Term::Variable(_) => {
        Err(GroundingError::Arith { term: self.to_string() })
      }
      Term::Arith(arith) => {
        if !arith.ground() {
          return Err(GroundingError::Arith { term: self.to_string() });
        }
        Ok(Term::Number(arith.eval()?))
      }
      Term::Functional(name, terms) => {
        let canonical_terms: Result<Vec<Term>, GroundingError> =
            terms.iter().map(|t| t.canonical()).collect();
        Ok(Term::Functional(name.clone(), TermTuple::new(canonical_terms?)))
      }
      _ => Ok(self.clone()),
    }
  }

  /// The ASP-Core-2 total order on ground terms. Undefined (an error) for non-ground terms.
  pub fn compare(&self, other: &Term) -> Result<Ordering, GroundingError> {
    let lhs = self.canonical()?;
    let rhs = other.canonical()?;

    match (&lhs, &rhs) {
      (Term::Number(a), Term::Number(b)) => Ok(a.cmp(b)),
      (Term::SymbolicConstant(a), Term::SymbolicConstant(b)) => Ok(a.as_ref().cmp(b.as_ref())),
      (Term::Str(a), Term::Str(b)) => Ok(a.as_ref().cmp(b.as_ref())),

      (Term::Functional(f, ts), Term::Functional(g, us)) => {
        // first arity, then name, then lexicographically by arguments
        let ordering = ts.len().cmp(&us.len()).then(f.as_ref().cmp(g.as_ref()));
        if ordering != Ordering::Equal {
          return Ok(ordering);
        }
        for (t, u) in ts.iter().zip(us.iter()) {
          let arg_ordering = t.compare(u)?;
          if arg_ordering != Ordering::Equal {
            return Ok(arg_ordering);
          }
        }
        Ok(Ordering::Equal)
      }

      _ => Ok(lhs.order_rank().cmp(&rhs.order_rank())),
    }
  }

  /// `self` ≼ `other` in the total ordering (used by `#min`/`#max` and the relational operators).
  pub fn precedes(&self, other: &Term) -> Result<bool, GroundingError> {
    Ok(self.compare(other)? != Ordering::Greater)
  }

  /// Evaluates the term to an integer. Only numbers and ground arithmetic trees are integer terms.
  pub fn eval(&self) -> Result<i64, GroundingError> {
    match self {
      Term::Number(value) => Ok(*value),
      Term::Arith(arith) if arith.ground() => arith.eval(),
      _ => Err(GroundingError::Arith { term: self.to_string() }),
    }
  }

  /// Simplifies any arithmetic inside the term. Non-arithmetic structure is preserved.
  pub fn simplify(&self) -> Result<Term, GroundingError> {
    match self {
      Term::Arith(arith) => arith.simplify(),
      Term::Functional(name, terms) => {
        Ok(Term::Functional(name.clone(), terms.simplify()?))
      }
      _ => Ok(self.clone()),
    }
  }

  /// Applies a substitution, producing a new term. Variables not covered by the substitution map to themselves.
  pub fn substitute(&self, subst: &Substitution) -> Term {
    match self {
      Term::Variable(var) => subst.substitute_to(var),
      Term::Functional(name, terms) => Term::Functional(name.clone(), terms.substitute(subst)),
      Term::Arith(arith) => Term::Arith(arith.substitute(subst)),
      _ => self.clone(),
    }
  }

  /// Tries to match the term against another one, producing a substitution `σ` with `self.substitute(σ) == other`.
  ///
  /// A variable matches anything; a ground term matches only its own equal; functional terms match element-wise
  /// with conflict-checked merging. Matching is undefined for non-ground arithmetic (such subtrees are replaced
  /// by placeholder variables before grounding).
  pub fn match_with(&self, other: &Term) -> Option<Substitution> {
    match self {
      Term::Variable(var) => Some(Substitution::singleton(var.clone(), other.clone())),
      Term::Functional(name, terms) => {
        match other {
          Term::Functional(other_name, other_terms)
              if name == other_name && terms.len() == other_terms.len() => {
            terms.match_with(other_terms)
          }
          _ => None,
        }
      }
      _ if self.ground() => {
        if self == other {
          Some(Substitution::identity())
        } else {
          None
        }
      }
      _ => None,
    }
  }

  /// Replaces arithmetic subtrees. Ground arithmetic is evaluated to its number immediately; non-ground
  /// arithmetic is simplified and replaced by a fresh arithmetic placeholder variable registered in `table`.
  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<Term, GroundingError> {
    match self {
      Term::Functional(name, terms) => {
        Ok(Term::Functional(name.clone(), terms.replace_arith(table)?))
      }
      Term::Arith(_) => {
        match self.simplify()? {
          // simplification can collapse the whole subtree, in which case no placeholder is needed
          Term::Arith(arith) => Ok(Term::Variable(table.create_arith(arith))),
          simplified => Ok(simplified),
        }
      }
      _ => Ok(self.clone()),
    }
  }
}

impl Display for Term {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Term::Infimum => write!(f, "#inf"),
      Term::Number(value) => write!(f, "{}", value),
      Term::SymbolicConstant(name) => write!(f, "{}", name),
      Term::Str(value) => write!(f, "\"{}\"", value),
      Term::Functional(name, terms) => {
        if terms.is_empty() {
          write!(f, "{}", name)
        } else {
          write!(f, "{}({})", name, terms)
        }
      }
      Term::Supremum => write!(f, "#sup"),
      Term::Variable(var) => write!(f, "{}", var),
      Term::Arith(arith) => write!(f, "{}", arith),
    }
  }
}

/// An ordered collection of terms: predicate arguments, aggregate element heads, assignment tuples.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct TermTuple {
  terms: Vec<Term>,
}

impl TermTuple {
  pub fn new(terms: Vec<Term>) -> TermTuple {
    TermTuple { terms }
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.terms.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.terms.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Term> {
    self.terms.iter()
  }

  pub fn first(&self) -> Option<&Term> {
    self.terms.first()
  }

  /// Concatenation of two tuples.
  pub fn concat(&self, other: &TermTuple) -> TermTuple {
    let mut terms = self.terms.clone();
    terms.extend(other.terms.iter().cloned());
    TermTuple { terms }
  }

  pub fn ground(&self) -> bool {
    self.terms.iter().all(Term::ground)
  }

  pub fn vars(&self) -> VariableSet {
    let mut vars = VariableSet::new();
    for term in &self.terms {
      vars.extend(term.vars());
    }
    vars
  }

  pub fn substitute(&self, subst: &Substitution) -> TermTuple {
    TermTuple { terms: self.terms.iter().map(|t| t.substitute(subst)).collect() }
  }

  pub fn simplify(&self) -> Result<TermTuple, GroundingError> {
    let terms: Result<Vec<Term>, GroundingError> = self.terms.iter().map(Term::simplify).collect();
    Ok(TermTuple { terms: terms? })
  }

  /// Matches two tuples element-wise, merging the resulting substitutions and failing on conflict.
  pub fn match_with(&self, other: &TermTuple) -> Option<Substitution> {
    if self.len() != other.len() {
      return None;
    }

    let mut subst = Substitution::identity();
    for (term, target) in self.terms.iter().zip(other.terms.iter()) {
      let matched = term.match_with(target)?;
      subst = subst.merge(&matched).ok()?;
    }
    Some(subst)
  }

  pub fn replace_arith(&self, table: &mut VariableTable) -> Result<TermTuple, GroundingError> {
    let terms: Result<Vec<Term>, GroundingError> =
        self.terms.iter().map(|t| t.replace_arith(table)).collect();
    Ok(TermTuple { terms: terms? })
  }
}

impl FromIterator<Term> for TermTuple {
  fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> TermTuple {
    TermTuple { terms: iter.into_iter().collect() }
  }
}

impl<'t> IntoIterator for &'t TermTuple {
  type Item = &'t Term;
  type IntoIter = std::slice::Iter<'t, Term>;

  fn into_iter(self) -> Self::IntoIter {
    self.terms.iter()
  }
}

impl Display for TermTuple {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", join_string(self.terms.iter(), ","))
  }
}
