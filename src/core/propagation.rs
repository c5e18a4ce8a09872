/*!

Aggregate and choice propagation. The propagator consumes the ground ε/η rule instances produced during the
component fixpoint and materializes, per ground placeholder literal, the replaced expression's function, its
ground element instances, and its ground guards. Against the current certain/possible domains it asks the
function's satisfiability oracle which placeholders may hold, and after the fixpoint converges it reassembles
the placeholder literals back into fully instantiated aggregate or choice literals.

Satisfiability is monotone across iterations: once a placeholder is deemed possible it stays possible, which
keeps the fixpoint's termination test insensitive to iteration order.

*/

use crate::{
  abstractions::{HashMap, Set},
  api::{
    aggregate::{AggrKind, AggregateElement, AggrLiteral},
    choice::{Choice, ChoiceElement},
    literal::{Guard, Literal},
    placeholder::AuxPrefix,
    statement::{Statement, StatementKind},
  },
  core::{
    error::GroundingError,
    rewrite::{AggrMap, ChoiceMap},
    substitution::Substitution,
  },
};

/// Ground instance data for one aggregate placeholder.
struct AggrInstance {
  kind: AggrKind,
  elements: Set<AggregateElement>,
  lguard: Option<Guard>,
  rguard: Option<Guard>,
}

/// Extracts the head literal of an ε/η rule instance.
fn instance_head(statement: &Statement) -> &Literal {
  match &statement.kind {
    StatementKind::Normal { head, .. } => head,
    _ => panic!("epsilon/eta instances are normal rules"),
  }
}

/// Sorts element instances into a deterministic order for reassembly.
fn sorted_elements<E: Clone + ToString>(elements: &Set<E>) -> Vec<E> {
  let mut sorted: Vec<E> = elements.iter().cloned().collect();
  sorted.sort_by_key(|element| element.to_string());
  sorted
}

pub struct AggrPropagator {
  map: AggrMap,
  instances: HashMap<Literal, AggrInstance>,
}

impl AggrPropagator {
  pub fn new(map: AggrMap) -> AggrPropagator {
    AggrPropagator { map, instances: HashMap::new() }
  }

  /// Registers the placeholder instance a ground ε/η head gives rise to, returning its key.
  fn register(&mut self, ref_id: usize, assignment: &Substitution) -> Literal {
    let record = &self.map[ref_id];
    let key = Literal::Placeholder(record.placeholder.substitute(assignment));

    self.instances.entry(key.clone()).or_insert_with(|| AggrInstance {
      kind: record.literal.kind,
      elements: Set::new(),
      lguard: record.literal.lguard.as_ref().map(|guard| guard.substitute(assignment)),
      rguard: record.literal.rguard.as_ref().map(|guard| guard.substitute(assignment)),
    });

    key
  }

  /// Walks the ground ε/η instances, updates the instance map, and returns the set of placeholder literals
  /// that may hold under `(I, J)`. The previously possible placeholders `j_alpha` stay possible.
  pub fn propagate(
    &mut self,
    base_instances: &Set<Statement>,
    element_instances: &Set<Statement>,
    literals_i: &Set<Literal>,
    literals_j: &Set<Literal>,
    j_alpha: &Set<Literal>,
  ) -> Result<Set<Literal>, GroundingError> {
    for statement in base_instances {
      if let Literal::Base(base) = instance_head(statement) {
        self.register(base.ref_id, &base.gather_assignment());
      }
    }

    for statement in element_instances {
      if let Literal::Element(element) = instance_head(statement) {
        let assignment = element.gather_assignment();
        let key = self.register(element.ref_id, &assignment);

        let ground_element =
            self.map[element.ref_id].literal.elements[element.element_id].substitute(&assignment);
        self
            .instances
            .get_mut(&key)
            .expect("instance was registered above")
            .elements
            .insert(ground_element);
      }
    }

    let mut possible = j_alpha.clone();

    for (key, instance) in &self.instances {
      if possible.contains(key) {
        continue;
      }

      let satisfiable = instance.kind.propagate(
        (instance.lguard.as_ref(), instance.rguard.as_ref()),
        &instance.elements,
        literals_i,
        literals_j,
      )?;

      if satisfiable {
        possible.insert(key.clone());
      }
    }

    Ok(possible)
  }

  /// Replaces placeholder literals inside the grounded rules with the corresponding fully instantiated
  /// aggregate literals.
  pub fn assemble(&self, statements: Set<Statement>) -> Set<Statement> {
    let mut assembling: HashMap<Literal, Literal> = HashMap::new();

    for (key, instance) in &self.instances {
      let naf = match key {
        Literal::Placeholder(placeholder) => placeholder.naf,
        _ => false,
      };
      let literal = AggrLiteral::new(
        instance.kind,
        sorted_elements(&instance.elements),
        instance.lguard.clone(),
        instance.rguard.clone(),
        naf,
      );
      assembling.insert(key.clone(), Literal::Aggregate(literal));
    }

    // a placeholder without any epsilon/eta instance (possible for default-negated aggregates, whose rules
    // ground regardless of propagation) reassembles over the empty element set
    for statement in &statements {
      for literal in statement.body() {
        if let Literal::Placeholder(placeholder) = literal {
          if placeholder.prefix == AuxPrefix::Alpha && !assembling.contains_key(literal) {
            let record = &self.map[placeholder.ref_id];
            let assignment = placeholder.gather_assignment();

            let reconstructed = AggrLiteral::new(
              record.literal.kind,
              Vec::new(),
              record.literal.lguard.as_ref().map(|guard| guard.substitute(&assignment)),
              record.literal.rguard.as_ref().map(|guard| guard.substitute(&assignment)),
              placeholder.naf,
            );
            assembling.insert(literal.clone(), Literal::Aggregate(reconstructed));
          }
        }
      }
    }

    statements
        .into_iter()
        .map(|statement| statement.assemble_aggregates(&assembling))
        .collect()
  }
}

/// Ground instance data for one choice placeholder.
struct ChoiceInstance {
  elements: Set<ChoiceElement>,
  lguard: Option<Guard>,
  rguard: Option<Guard>,
}

pub struct ChoicePropagator {
  map: ChoiceMap,
  instances: HashMap<Literal, ChoiceInstance>,
}

impl ChoicePropagator {
  pub fn new(map: ChoiceMap) -> ChoicePropagator {
    ChoicePropagator { map, instances: HashMap::new() }
  }

  fn register(&mut self, ref_id: usize, assignment: &Substitution) -> Literal {
    let record = &self.map[ref_id];
    let key = Literal::Placeholder(record.placeholder.substitute(assignment));

    self.instances.entry(key.clone()).or_insert_with(|| ChoiceInstance {
      elements: Set::new(),
      lguard: record.choice.lguard.as_ref().map(|guard| guard.substitute(assignment)),
      rguard: record.choice.rguard.as_ref().map(|guard| guard.substitute(assignment)),
    });

    key
  }

  /// The choice analogue of `AggrPropagator::propagate`.
  pub fn propagate(
    &mut self,
    base_instances: &Set<Statement>,
    element_instances: &Set<Statement>,
    literals_i: &Set<Literal>,
    literals_j: &Set<Literal>,
    j_chi: &Set<Literal>,
  ) -> Result<Set<Literal>, GroundingError> {
    for statement in base_instances {
      if let Literal::Base(base) = instance_head(statement) {
        self.register(base.ref_id, &base.gather_assignment());
      }
    }

    for statement in element_instances {
      if let Literal::Element(element) = instance_head(statement) {
        let assignment = element.gather_assignment();
        let key = self.register(element.ref_id, &assignment);

        let ground_element =
            self.map[element.ref_id].choice.elements[element.element_id].substitute(&assignment);
        self
            .instances
            .get_mut(&key)
            .expect("instance was registered above")
            .elements
            .insert(ground_element);
      }
    }

    let mut possible = j_chi.clone();

    for (key, instance) in &self.instances {
      if possible.contains(key) {
        continue;
      }

      let satisfiable = Choice::propagate(
        (instance.lguard.as_ref(), instance.rguard.as_ref()),
        &instance.elements,
        literals_i,
        literals_j,
      )?;

      if satisfiable {
        possible.insert(key.clone());
      }
    }

    Ok(possible)
  }

  /// Turns grounded χ-rules back into choice rules. A χ-head whose placeholder was deemed satisfiable becomes
  /// a choice rule over the instantiated elements; a placeholder with no satisfiable instance leaves behind an
  /// unsatisfiable constraint with the same body.
  pub fn assemble(&self, statements: Set<Statement>, j_chi: &Set<Literal>) -> Set<Statement> {
    statements
        .into_iter()
        .map(|statement| {
          let (placeholder, body) = match &statement.kind {
            StatementKind::Normal { head: Literal::Placeholder(placeholder), body }
                if placeholder.prefix == AuxPrefix::Chi =>
            {
              (Literal::Placeholder(placeholder.clone()), body.clone())
            }
            _ => return statement,
          };

          match self.instances.get(&placeholder) {
            Some(instance) if j_chi.contains(&placeholder) => {
              let choice = Choice::new(
                sorted_elements(&instance.elements),
                instance.lguard.clone(),
                instance.rguard.clone(),
              );
              Statement::choice(choice, body)
            }
            _ => Statement::constraint(body),
          }
        })
        .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{
    aggregate::AggrKind,
    literal::{Guard, LiteralCollection, PredicateLiteral, RelOp},
    program::Program,
    term::{Term, TermTuple},
  };

  fn pred(name: &str, terms: Vec<Term>) -> Literal {
    Literal::Predicate(PredicateLiteral::new(name, terms))
  }

  /// ok :- 2 <= #count{X : p(X)}.
  fn count_rule() -> Statement {
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
    Statement::normal(pred("ok", vec![]), LiteralCollection::new(vec![Literal::Aggregate(aggregate)]))
  }

  #[test]
  fn rewriting_round_trips_through_assemble() {
    // with no grounding in between, assemble(rewrite(r)) restores r modulo placeholder bookkeeping
    let rule = count_rule();
    let program = Program::new([rule.clone()], None);
    let (alpha, _, _, map) = program.rewrite_aggregates();

    let mut propagator = AggrPropagator::new(map);

    // register the (fully global, hence already ground) placeholder by propagating its rules unground
    let record_base: Set<Statement> =
        [propagator.map[0].base_rule.clone()].into_iter().collect();
    let record_elements: Set<Statement> =
        propagator.map[0].element_rules.iter().cloned().collect();
    propagator
        .propagate(&record_base, &record_elements, &Set::new(), &Set::new(), &Set::new())
        .unwrap();

    let assembled =
        propagator.assemble(alpha.statements.into_iter().collect::<Set<Statement>>());

    assert_eq!(assembled.len(), 1);
    assert_eq!(assembled.into_iter().next().unwrap(), rule);
  }

  #[test]
  fn placeholders_stay_possible_once_derived() {
    let rule = count_rule();
    let program = Program::new([rule], None);
    let (_, _, _, map) = program.rewrite_aggregates();
    let placeholder = Literal::Placeholder(map[0].placeholder.clone());

    let mut propagator = AggrPropagator::new(map);
    let previous: Set<Literal> = [placeholder.clone()].into_iter().collect();

    let possible = propagator
        .propagate(&Set::new(), &Set::new(), &Set::new(), &Set::new(), &previous)
        .unwrap();
    assert!(possible.contains(&placeholder));
  }

  #[test]
  fn unsatisfiable_choice_becomes_constraint() {
    use crate::api::choice::{Choice, ChoiceElement};

    // {a} = 2 :- b.   can never select two atoms from one element
    let choice = Choice::new(
      vec![ChoiceElement::unconditional(PredicateLiteral::new("a", Vec::new()))],
      None,
      Some(Guard::new(RelOp::Equal, Term::Number(2), true)),
    );
    let rule = Statement::choice(choice, LiteralCollection::new(vec![pred("b", vec![])]));

    let mut map = ChoiceMap::new();
    let chi_rule = rule.rewrite_choices(&mut map);

    let mut propagator = ChoicePropagator::new(map);
    let base: Set<Statement> = [propagator.map[0].base_rule.clone()].into_iter().collect();
    let elements: Set<Statement> = propagator.map[0].element_rules.iter().cloned().collect();

    // even with b possible, no subset of {a} has size 2
    let possible: Set<Literal> = [pred("b", vec![])].into_iter().collect();
    let j_chi = propagator
        .propagate(&base, &elements, &Set::new(), &possible, &Set::new())
        .unwrap();
    assert!(j_chi.is_empty());

    let assembled = propagator.assemble([chi_rule].into_iter().collect(), &j_chi);
    let statement = assembled.into_iter().next().unwrap();
    assert!(matches!(statement.kind, StatementKind::Constraint { .. }));
  }

  #[test]
  fn satisfiable_choice_is_reassembled() {
    use crate::api::choice::{Choice, ChoiceElement};

    // {a;b;c} = 2.
    let choice = Choice::new(
      ["a", "b", "c"]
          .into_iter()
          .map(|name| ChoiceElement::unconditional(PredicateLiteral::new(name, Vec::new())))
          .collect(),
      None,
      Some(Guard::new(RelOp::Equal, Term::Number(2), true)),
    );
    let rule = Statement::choice(choice.clone(), LiteralCollection::default());

    let mut map = ChoiceMap::new();
    let chi_rule = rule.rewrite_choices(&mut map);

    let mut propagator = ChoicePropagator::new(map);
    let base: Set<Statement> = [propagator.map[0].base_rule.clone()].into_iter().collect();
    let elements: Set<Statement> = propagator.map[0].element_rules.iter().cloned().collect();

    let j_chi = propagator
        .propagate(&base, &elements, &Set::new(), &Set::new(), &Set::new())
        .unwrap();
    assert_eq!(j_chi.len(), 1);

    let assembled = propagator.assemble([chi_rule].into_iter().collect(), &j_chi);
    let statement = assembled.into_iter().next().unwrap();
    match statement.kind {
      StatementKind::Choice { choice: assembled_choice, .. } => {
        assert_eq!(assembled_choice.elements.len(), 3);
        assert_eq!(assembled_choice.rguard, choice.rguard);
      }
      other => panic!("expected a choice rule, got {:?}", other),
    }
  }
}
