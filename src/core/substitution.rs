/*!

A substitution is a finite map from variables to terms. A variable absent from the map maps to itself; that
fallback lives in the lookup operation (`substitute_to`) rather than in any hidden state.

*/

use std::fmt::{Display, Formatter};

use crate::{
  abstractions::{join_string, HashMap},
  api::term::{Term, Variable},
  core::error::GroundingError,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Substitution {
  map: HashMap<Variable, Term>,
}

impl Substitution {
  /// The empty (identity) substitution.
  pub fn identity() -> Substitution {
    Substitution { map: HashMap::new() }
  }

  pub fn singleton(var: Variable, target: Term) -> Substitution {
    let mut map = HashMap::new();
    map.insert(var, target);
    Substitution { map }
  }

  /// The target of `var` under this substitution. Variables without an explicit entry map to themselves.
  pub fn substitute_to(&self, var: &Variable) -> Term {
    match self.map.get(var) {
      Some(target) => target.clone(),
      None => Term::Variable(var.clone()),
    }
  }

  pub fn get(&self, var: &Variable) -> Option<&Term> {
    self.map.get(var)
  }

  pub fn insert(&mut self, var: Variable, target: Term) {
    self.map.insert(var, target);
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
    self.map.iter()
  }

  pub fn is_identity(&self) -> bool {
    self.map.iter().all(|(var, target)| matches!(target, Term::Variable(v) if v == var))
  }

  /// Composition `self ∘ other`: applies `other` to each of `self`'s targets, then adds the entries of `other`
  /// for variables `self` does not cover.
  pub fn compose(&self, other: &Substitution) -> Substitution {
    let mut map: HashMap<Variable, Term> = self
        .map
        .iter()
        .map(|(var, target)| (var.clone(), target.substitute(other)))
        .collect();

    for (var, target) in other.map.iter() {
      map.entry(var.clone()).or_insert_with(|| target.clone());
    }

    Substitution { map }
  }

  /// Composition of a sequence of substitutions, applied left to right.
  pub fn composition<'s>(substitutions: impl IntoIterator<Item = &'s Substitution>) -> Substitution {
    substitutions
        .into_iter()
        .fold(Substitution::identity(), |composed, subst| composed.compose(subst))
  }

  /// Union of two substitutions. Fails with an assignment conflict when both map the same variable to unequal
  /// terms.
  pub fn merge(&self, other: &Substitution) -> Result<Substitution, GroundingError> {
    let mut map = self.map.clone();

    for (var, target) in other.map.iter() {
      match map.get(var) {
        Some(existing) if existing != target => {
          return Err(GroundingError::Assignment {
            variable: var.to_string(),
            existing: existing.to_string(),
            incoming: target.to_string(),
          });
        }
        Some(_) => {}
        None => {
          map.insert(var.clone(), target.clone());
        }
      }
    }

    Ok(Substitution { map })
  }
}

impl Display for Substitution {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut entries: Vec<String> =
        self.map.iter().map(|(var, target)| format!("{}:{}", var, target)).collect();
    entries.sort();
    write!(f, "{{{}}}", join_string(entries.iter(), ","))
  }
}

#[cfg(test)]
mod tests {
  use rand::{rngs::StdRng, Rng, SeedableRng};

  use super::*;
  use crate::abstractions::IString;
  use crate::api::term::TermTuple;

  fn var(name: &str) -> Variable {
    Variable::Named(IString::from(name))
  }

  #[test]
  fn identity_fallback() {
    let subst = Substitution::singleton(var("X"), Term::Number(1));
    assert_eq!(subst.substitute_to(&var("X")), Term::Number(1));
    assert_eq!(subst.substitute_to(&var("Y")), Term::variable("Y"));

    assert!(Substitution::identity().is_identity());
    assert!(Substitution::singleton(var("X"), Term::variable("X")).is_identity());
    assert!(!subst.is_identity());
  }

  #[test]
  fn merge_detects_conflicts() {
    let left = Substitution::singleton(var("X"), Term::Number(1));
    let right = Substitution::singleton(var("X"), Term::Number(2));
    let agreeing = Substitution::singleton(var("X"), Term::Number(1));

    assert!(left.merge(&right).is_err());
    assert!(left.merge(&agreeing).is_ok());
  }

  #[test]
  fn compose_applies_right_to_targets() {
    // {X -> f(Y)} ∘ {Y -> 1} == {X -> f(1), Y -> 1}
    let left = Substitution::singleton(
      var("X"),
      Term::Functional(IString::from("f"), TermTuple::new(vec![Term::variable("Y")])),
    );
    let right = Substitution::singleton(var("Y"), Term::Number(1));

    let composed = left.compose(&right);
    assert_eq!(
      composed.substitute_to(&var("X")),
      Term::Functional(IString::from("f"), TermTuple::new(vec![Term::Number(1)]))
    );
    assert_eq!(composed.substitute_to(&var("Y")), Term::Number(1));
  }

  /// Random term over a small pool of variables and constants.
  fn random_term(rng: &mut StdRng, depth: usize) -> Term {
    let variables = ["X", "Y", "Z"];
    match rng.random_range(0..4u8) {
      0 => Term::Number(rng.random_range(-5i64..5)),
      1 => Term::variable(variables[rng.random_range(0..variables.len())]),
      2 => Term::symbolic("c"),
      _ if depth > 0 => {
        let arity = rng.random_range(1..3usize);
        let args = (0..arity).map(|_| random_term(rng, depth - 1)).collect();
        Term::Functional(IString::from("f"), TermTuple::new(args))
      }
      _ => Term::Number(0),
    }
  }

  fn random_subst(rng: &mut StdRng) -> Substitution {
    let mut subst = Substitution::identity();
    for name in ["X", "Y", "Z"] {
      if rng.random_range(0..2u8) == 0 {
        let target = random_term(rng, 2);
        subst.insert(var(name), target);
      }
    }
    subst
  }

  #[test]
  fn n_ary_composition() {
    let first = Substitution::singleton(var("X"), Term::variable("Y"));
    let second = Substitution::singleton(var("Y"), Term::variable("Z"));
    let third = Substitution::singleton(var("Z"), Term::Number(7));

    let composed = Substitution::composition([&first, &second, &third]);
    assert_eq!(composed.substitute_to(&var("X")), Term::Number(7));
    assert_eq!(composed.substitute_to(&var("Y")), Term::Number(7));
    assert_eq!(composed.substitute_to(&var("Z")), Term::Number(7));
  }

  #[test]
  fn composition_law() {
    // (σ ∘ τ)(x) == τ applied to σ(x), for arbitrary σ, τ, x
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _ in 0..200 {
      let sigma = random_subst(&mut rng);
      let tau = random_subst(&mut rng);
      let term = random_term(&mut rng, 3);

      let composed = sigma.compose(&tau);
      assert_eq!(term.substitute(&composed), term.substitute(&sigma).substitute(&tau));
    }
  }
}
