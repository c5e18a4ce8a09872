/*!

The grounder: owner of the main instantiation loop. Grounding proceeds component by component over the
dependency structure of the program; within a component, epsilon/eta rules, propagation, and the rewritten
α-rules are iterated to a fixpoint over the growing possible set, and the certain/possible split is maintained
across components through the reduct by still-open predicates.

The algorithm follows Kaminski & Schaub (2022), "On the Foundations of Grounding in Answer Set Programming".

*/

use crate::{
  abstractions::{HashMap, Set},
  api::{
    literal::{BuiltinLiteral, Literal, LiteralCollection, PredicateSignature, RelOp},
    program::Program,
    statement::{Statement, StatementKind},
    term::Term,
  },
  core::{
    error::GroundingError,
    graphs::ComponentGraph,
    propagation::{AggrPropagator, ChoicePropagator},
    substitution::Substitution,
  },
  debug,
  trace,
  warning,
};

pub struct Grounder {
  program: Program,
}

impl Grounder {
  /// Checks safety of the input program and prepares it for grounding (arithmetic replacement). An unsafe
  /// program is rejected here, naming the offending statement and variables.
  pub fn new(program: Program) -> Result<Grounder, GroundingError> {
    for statement in &program.statements {
      if !statement.is_safe() {
        let mut variables: Vec<String> =
            statement.unsafe_vars().iter().map(|var| var.to_string()).collect();
        variables.sort();

        return Err(GroundingError::Safety { statement: statement.to_string(), variables });
      }
    }

    let program = program.replace_arith()?;
    Ok(Grounder { program })
  }

  // region Statement instantiation

  /// Selects the next body literal to process: the first literal that either has a positive predicate
  /// occurrence or is evaluable under the substitution so far.
  fn select(literals: &LiteralCollection, subst: &Substitution) -> Option<usize> {
    literals.iter().position(|literal| {
      if matches!(literal, Literal::Aggregate(_)) {
        // aggregates are rewritten away before instantiation
        return false;
      }
      if !literal.pos_occ().is_empty() {
        return true;
      }
      match literal {
        Literal::Builtin(builtin) => Self::builtin_selectable(builtin, subst),
        _ => literal.vars().iter().all(|var| subst.substitute_to(var).ground()),
      }
    })
  }

  /// Resolves arithmetic placeholder variables whose original subtree is ground under the substitution,
  /// binding each to its evaluated number. Returns the resolved literal and the resolving bindings.
  fn resolve_arith(builtin: &BuiltinLiteral, subst: &Substitution)
                   -> Result<(BuiltinLiteral, Substitution), GroundingError>
  {
    let mut resolution = Substitution::identity();

    for var in builtin.vars() {
      if let Some(original) = var.original() {
        let substituted = original.substitute(subst);
        if substituted.ground() {
          resolution.insert(var.clone(), Term::Number(substituted.eval()?));
        }
      }
    }

    Ok((builtin.substitute(&resolution), resolution))
  }

  /// A built-in literal can be processed once it is ground after placeholder resolution, or once it is an
  /// equality with one ground side binding a sole variable on the other (safety propagates through `=`).
  fn builtin_selectable(builtin: &BuiltinLiteral, subst: &Substitution) -> bool {
    let substituted = builtin.substitute(subst);
    match Self::resolve_arith(&substituted, subst) {
      Ok((resolved, _)) => {
        resolved.ground()
            || (resolved.op == RelOp::Equal
                && ((matches!(resolved.lhs, Term::Variable(_)) && resolved.rhs.ground())
                    || (matches!(resolved.rhs, Term::Variable(_)) && resolved.lhs.ground())))
      }
      // let `matches` surface the evaluation error
      Err(_) => true,
    }
  }

  /// Computes the match substitutions for the selected literal against the certain/possible domains. An empty
  /// result discards the current candidate.
  fn matches(
    literal: &Literal,
    certain: &Set<Literal>,
    possible: &Set<Literal>,
    subst: &Substitution,
  ) -> Result<Vec<Substitution>, GroundingError> {
    let substituted = literal.substitute(subst);

    match &substituted {

      Literal::Predicate(predicate) => {
        if !predicate.naf() {
          if predicate.ground() {
            if possible.contains(&substituted) {
              Ok(vec![subst.clone()])
            } else {
              Ok(Vec::new())
            }
          } else {
            let mut result = Vec::new();
            for target in possible {
              if let Some(matched) = substituted.match_with(target) {
                result.push(subst.compose(&matched));
              }
            }
            Ok(result)
          }
        } else {
          // selection only picks default-negated literals once they are ground
          debug_assert!(predicate.ground());

          // the positive counterpart must not be certain
          let positive = Literal::Predicate(predicate.positive());
          if certain.contains(&positive) {
            Ok(Vec::new())
          } else {
            Ok(vec![subst.clone()])
          }
        }
      }

      Literal::Placeholder(placeholder) => {
        if !placeholder.naf {
          if substituted.ground() {
            if possible.contains(&substituted) {
              Ok(vec![subst.clone()])
            } else {
              Ok(Vec::new())
            }
          } else {
            let mut result = Vec::new();
            for target in possible {
              if let Some(matched) = substituted.match_with(target) {
                result.push(subst.compose(&matched));
              }
            }
            Ok(result)
          }
        } else {
          debug_assert!(substituted.ground());

          let positive = Literal::Placeholder(placeholder.positive());
          if certain.contains(&positive) {
            Ok(Vec::new())
          } else {
            Ok(vec![subst.clone()])
          }
        }
      }

      Literal::Builtin(builtin) => {
        let (resolved, resolution) = Self::resolve_arith(builtin, subst)?;
        let composed = subst.compose(&resolution);

        if resolved.ground() {
          if resolved.eval()? {
            Ok(vec![composed])
          } else {
            Ok(Vec::new())
          }
        } else if resolved.op == RelOp::Equal {
          // bind the sole variable on one side from the ground other side
          let binding = match (&resolved.lhs, &resolved.rhs) {
            (Term::Variable(var), value) if value.ground() => Some((var.clone(), value.clone())),
            (value, Term::Variable(var)) if value.ground() => Some((var.clone(), value.clone())),
            _ => None,
          };

          match binding {
            Some((var, value)) => {
              let value = if matches!(value, Term::Arith(_)) {
                Term::Number(value.eval()?)
              } else {
                value
              };
              Ok(vec![composed.compose(&Substitution::singleton(var, value))])
            }
            None => Ok(Vec::new()),
          }
        } else {
          Ok(Vec::new())
        }
      }

      Literal::Aggregate(_) | Literal::Base(_) | Literal::Element(_) => {
        unreachable!("selection never picks aggregate or auxiliary head literals")
      }

    }
  }

  /// Instantiates a single (safe, aggregate-free) statement against the certain set `certain` and the possible
  /// set `possible`. With `duplicate` set, instantiations whose positive body occurrences were already fully
  /// contained in `prev_possible` are discarded; this is what makes the surrounding fixpoint terminate.
  fn ground_statement(
    statement: &Statement,
    literals: &LiteralCollection,
    certain: &Set<Literal>,
    possible: &Set<Literal>,
    prev_possible: &Set<Literal>,
    subst: Substitution,
    duplicate: bool,
  ) -> Result<Set<Statement>, GroundingError> {
    debug_assert!(!statement.contains_aggregates());

    if !literals.is_empty() {
      let index = match Self::select(literals, &subst) {
        Some(index) => index,
        None => {
          let mut variables: Vec<String> =
              literals.vars().iter().map(|var| var.to_string()).collect();
          variables.sort();
          return Err(GroundingError::Safety { statement: statement.to_string(), variables });
        }
      };

      let literal = &literals.as_slice()[index];
      let remaining = literals.without(literal);

      let mut instances = Set::new();
      for matched in Self::matches(literal, certain, possible, &subst)? {
        instances.extend(Self::ground_statement(
          statement,
          &remaining,
          certain,
          possible,
          prev_possible,
          matched,
          duplicate,
        )?);
      }
      return Ok(instances);
    }

    // commitment: bind still-open arithmetic placeholders by evaluation, validate the ones matching bound
    let mut subst = subst;
    for var in statement.var_table.arith_vars() {
      let original = var.original().expect("arithmetic placeholders carry their original subtree");
      let original = Term::Arith(original.substitute(&subst));

      match subst.get(&var).cloned() {
        Some(target) => {
          match RelOp::Equal.eval(&target, &original) {
            Ok(true) => {}
            Ok(false) => return Ok(Set::new()),
            Err(GroundingError::DivisionByZero) => return Err(GroundingError::DivisionByZero),
            Err(_) => return Ok(Set::new()),
          }
        }
        None => {
          match original.eval() {
            Ok(value) => subst.insert(var.clone(), Term::Number(value)),
            Err(GroundingError::DivisionByZero) => return Err(GroundingError::DivisionByZero),
            Err(_) => return Ok(Set::new()),
          }
        }
      }
    }

    let instance = statement.substitute(&subst);

    if duplicate && instance.body().pos_occ().iter().all(|literal| prev_possible.contains(literal)) {
      return Ok(Set::new());
    }

    Ok([instance].into_iter().collect())
  }

  // endregion

  // region Component fixpoint

  /// Grounds one (refined) component to a fixpoint against the domains `literals_i`/`literals_j`, returning
  /// the assembled instances.
  fn ground_component(
    component: &Program,
    literals_i: &Set<Literal>,
    literals_j: &Set<Literal>,
  ) -> Result<Set<Statement>, GroundingError> {
    if component.statements.is_empty() {
      return Ok(Set::new());
    }

    let mut alpha_instances: Set<Statement> = Set::new();
    let mut aggr_base_instances: Set<Statement> = Set::new();
    let mut aggr_element_instances: Set<Statement> = Set::new();
    let mut choice_base_instances: Set<Statement> = Set::new();
    let mut choice_element_instances: Set<Statement> = Set::new();

    // epsilon/eta rules ground against K = I ∪ J rather than J alone
    let mut literals_k: Set<Literal> = literals_i.union(literals_j).cloned().collect();
    let mut prev_literals_k: Set<Literal> = Set::new();

    let mut literals_j: Set<Literal> = literals_j.clone();
    let mut prev_literals_j: Set<Literal> = Set::new();

    let mut j_alpha: Set<Literal> = Set::new();
    let mut prev_j_alpha: Set<Literal> = Set::new();
    let mut j_chi: Set<Literal> = Set::new();

    let mut duplicate = false;

    let (prog_alpha, prog_aggr_base, prog_aggr_element, aggr_map) = component.rewrite_aggregates();
    let (prog_alpha, prog_choice_base, prog_choice_element, choice_map) =
        prog_alpha.rewrite_choices();

    let mut aggr_propagator = AggrPropagator::new(aggr_map);
    let mut choice_propagator = ChoicePropagator::new(choice_map);

    let mut iteration = 0usize;

    loop {
      iteration += 1;
      trace!(2, "component fixpoint iteration {}: |J| = {}", iteration, literals_j.len());

      // ground the aggregate epsilon and eta rules
      for rule in &prog_aggr_base.statements {
        aggr_base_instances.extend(Self::ground_statement(
          rule,
          rule.body(),
          literals_i,
          &literals_k,
          &prev_literals_k,
          Substitution::identity(),
          duplicate,
        )?);
      }
      for rule in &prog_aggr_element.statements {
        aggr_element_instances.extend(Self::ground_statement(
          rule,
          rule.body(),
          literals_i,
          &literals_k,
          &prev_literals_k,
          Substitution::identity(),
          duplicate,
        )?);
      }

      // which aggregate placeholders may hold
      j_alpha = aggr_propagator.propagate(
        &aggr_base_instances,
        &aggr_element_instances,
        literals_i,
        &literals_j,
        &j_alpha,
      )?;

      // ground the remaining rules (placeholders included) against J ∪ J_α
      let possible: Set<Literal> = literals_j.union(&j_alpha).cloned().collect();
      let prev_possible: Set<Literal> = prev_literals_j.union(&prev_j_alpha).cloned().collect();

      for rule in &prog_alpha.statements {
        alpha_instances.extend(Self::ground_statement(
          rule,
          rule.body(),
          literals_i,
          &possible,
          &prev_possible,
          Substitution::identity(),
          duplicate,
        )?);
      }
      for rule in &prog_choice_base.statements {
        choice_base_instances.extend(Self::ground_statement(
          rule,
          rule.body(),
          literals_i,
          &possible,
          &prev_possible,
          Substitution::identity(),
          duplicate,
        )?);
      }
      for rule in &prog_choice_element.statements {
        choice_element_instances.extend(Self::ground_statement(
          rule,
          rule.body(),
          literals_i,
          &possible,
          &prev_possible,
          Substitution::identity(),
          duplicate,
        )?);
      }

      // which choice placeholders may hold
      j_chi = choice_propagator.propagate(
        &choice_base_instances,
        &choice_element_instances,
        literals_i,
        &literals_j,
        &j_chi,
      )?;

      duplicate = true;
      prev_j_alpha = j_alpha.clone();
      prev_literals_j = literals_j.clone();
      prev_literals_k = literals_k.clone();

      let head_literals: Set<Literal> = alpha_instances
          .iter()
          .flat_map(|instance| instance.consequents())
          .flat_map(|literal| literal.pos_occ())
          .collect();

      literals_j.extend(head_literals.iter().cloned());
      literals_k.extend(head_literals);

      // |J| is monotone; comparing sizes suffices for the termination test
      if literals_j.len() == prev_literals_j.len() {
        break;
      }
    }

    // reassemble aggregates, then choices
    let assembled = aggr_propagator.assemble(alpha_instances);
    Ok(choice_propagator.assemble(assembled, &j_chi))
  }

  // endregion

  // region Program loop

  /// Grounds the program: builds the component graph, instantiates the components in dependency order with a
  /// certain and a possible pass each, and returns the program of possible instances.
  pub fn ground(&self) -> Result<Program, GroundingError> {
    let statements = &self.program.statements;
    let component_graph = ComponentGraph::new(statements);
    let sequence = component_graph.sequence()?;

    debug!(1, "grounding {} statements in {} components", statements.len(), sequence.len());

    let mut certain_inst: Set<Statement> = Set::new();
    let mut possible_inst: Set<Statement> = Set::new();
    let mut certain_literals: Set<Literal> = Set::new();
    let mut possible_literals: Set<Literal>;

    for component_index in sequence {
      let component = &component_graph.components[component_index];

      // count the occurrences of each consequent predicate; a predicate is open until every statement that can
      // derive it has been processed
      let mut pred_counter: HashMap<PredicateSignature, isize> = HashMap::new();
      for &node in &component.nodes {
        for literal in statements[node].consequents() {
          if let Some(pred) = literal.pred() {
            *pred_counter.entry(pred).or_insert(0) += 1;
          }
        }
      }

      for group in component.sequence()? {
        let group_program =
            Program::new(group.iter().map(|&node| statements[node].clone()), None);

        let open_preds: Set<PredicateSignature> = pred_counter
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(pred, _)| pred.clone())
            .collect();

        possible_literals = possible_inst
            .iter()
            .flat_map(|instance| instance.consequents())
            .collect();

        // certain pass: the reduct drops rules that negatively depend on a still-open predicate
        let instances = Self::ground_component(
          &group_program.reduct(&open_preds),
          &possible_literals,
          &certain_literals,
        )?;

        for instance in &instances {
          if matches!(instance.kind, StatementKind::Constraint { .. }) {
            warning!(0, "derived the certain constraint \"{}\"; the program is unsatisfiable", instance);
          }
        }
        certain_inst.extend(instances);

        certain_literals = certain_inst
            .iter()
            .filter(|instance| instance.deterministic())
            .flat_map(|instance| instance.consequents())
            .collect();

        // possible pass
        possible_inst.extend(Self::ground_component(
          &group_program,
          &certain_literals,
          &possible_literals,
        )?);

        for &node in &group {
          for literal in statements[node].consequents() {
            if let Some(pred) = literal.pred() {
              *pred_counter.get_mut(&pred).expect("counter was initialized above") -= 1;
            }
          }
        }
      }
    }

    debug!(1, "grounded to {} possible instances", possible_inst.len());

    // the possible instances include the certain ones
    Ok(Program::new(possible_inst, self.program.query.clone()))
  }

  // endregion
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{
    aggregate::{AggrKind, AggregateElement, AggrLiteral},
    choice::{Choice, ChoiceElement},
    literal::{Guard, PredicateLiteral},
    statement::Npp,
    term::{ArithTerm, TermTuple},
  };

  fn pred(name: &str, terms: Vec<Term>) -> Literal {
    Literal::Predicate(PredicateLiteral::new(name, terms))
  }

  fn naf(name: &str, terms: Vec<Term>) -> Literal {
    Literal::Predicate(PredicateLiteral::new(name, terms).with_naf())
  }

  fn fact(name: &str, value: i64) -> Statement {
    Statement::normal(pred(name, vec![Term::Number(value)]), LiteralCollection::default())
  }

  fn ground(program: Program) -> Program {
    Grounder::new(program).unwrap().ground().unwrap()
  }

  /// The heads derivable from the ground program.
  fn consequent_strings(program: &Program) -> Set<String> {
    program
        .statements
        .iter()
        .flat_map(|statement| statement.consequents())
        .map(|literal| literal.to_string())
        .collect()
  }

  fn statement_strings(program: &Program) -> Set<String> {
    program.statements.iter().map(|statement| statement.to_string()).collect()
  }

  #[test]
  fn minimal_stratified_program() {
    // u(1). u(2). v(2). v(3).
    // p(X) :- not q(X), u(X).   q(X) :- not p(X), v(X).
    // x :- not p(1).            y :- not q(3).
    let program = Program::new(
      [
        fact("u", 1),
        fact("u", 2),
        fact("v", 2),
        fact("v", 3),
        Statement::normal(
          pred("p", vec![Term::variable("X")]),
          LiteralCollection::new(vec![
            naf("q", vec![Term::variable("X")]),
            pred("u", vec![Term::variable("X")]),
          ]),
        ),
        Statement::normal(
          pred("q", vec![Term::variable("X")]),
          LiteralCollection::new(vec![
            naf("p", vec![Term::variable("X")]),
            pred("v", vec![Term::variable("X")]),
          ]),
        ),
        Statement::normal(
          pred("x", vec![]),
          LiteralCollection::new(vec![naf("p", vec![Term::Number(1)])]),
        ),
        Statement::normal(
          pred("y", vec![]),
          LiteralCollection::new(vec![naf("q", vec![Term::Number(3)])]),
        ),
      ],
      None,
    );

    let grounded = ground(program);
    let consequents = consequent_strings(&grounded);

    // all four facts appear, and the unstratified component yields p(1), p(2), q(2), q(3)
    for atom in ["u(1)", "u(2)", "v(2)", "v(3)", "p(1)", "p(2)", "q(2)", "q(3)"] {
      assert!(consequents.contains(atom), "missing {}", atom);
    }
    assert!(!consequents.contains("p(3)"));
    assert!(!consequents.contains("q(1)"));

    // whichever of p(1)/q(3) the refined sequence resolves first becomes certain and blocks its
    // default-negated consumer; the other consumer stays possible
    let x = consequents.contains("x");
    let y = consequents.contains("y");
    assert!(x != y, "exactly one of x/y must survive, got x={} y={}", x, y);
  }

  #[test]
  fn certain_atoms_block_default_negation() {
    // a. b :- not c, a. d :- not b. e :- not f.
    // c and f have no rules, so b is certain and blocks d; e stays derivable.
    let program = Program::new(
      [
        Statement::normal(pred("a", vec![]), LiteralCollection::default()),
        Statement::normal(
          pred("b", vec![]),
          LiteralCollection::new(vec![naf("c", vec![]), pred("a", vec![])]),
        ),
        Statement::normal(pred("d", vec![]), LiteralCollection::new(vec![naf("b", vec![])])),
        Statement::normal(pred("e", vec![]), LiteralCollection::new(vec![naf("f", vec![])])),
      ],
      None,
    );

    let grounded = ground(program);
    let consequents = consequent_strings(&grounded);

    assert!(consequents.contains("b"));
    assert!(!consequents.contains("d"));
    assert!(consequents.contains("e"));
  }

  #[test]
  fn arithmetic_guard_filters_candidates() {
    // p(1). p(2). p(3). q(X) :- p(X), X*2 = 4.
    let program = Program::new(
      [
        fact("p", 1),
        fact("p", 2),
        fact("p", 3),
        Statement::normal(
          pred("q", vec![Term::variable("X")]),
          LiteralCollection::new(vec![
            pred("p", vec![Term::variable("X")]),
            Literal::Builtin(BuiltinLiteral::new(
              RelOp::Equal,
              Term::Arith(ArithTerm::Mul(
                Box::new(Term::variable("X")),
                Box::new(Term::Number(2)),
              )),
              Term::Number(4),
            )),
          ]),
        ),
      ],
      None,
    );

    let grounded = ground(program);
    let consequents = consequent_strings(&grounded);

    assert!(consequents.contains("q(2)"));
    assert!(!consequents.contains("q(1)"));
    assert!(!consequents.contains("q(3)"));
  }

  #[test]
  fn head_arithmetic_is_evaluated() {
    // p(1). p(2). q(X+1) :- p(X).
    let program = Program::new(
      [
        fact("p", 1),
        fact("p", 2),
        Statement::normal(
          pred(
            "q",
            vec![Term::Arith(ArithTerm::Add(
              Box::new(Term::variable("X")),
              Box::new(Term::Number(1)),
            ))],
          ),
          LiteralCollection::new(vec![pred("p", vec![Term::variable("X")])]),
        ),
      ],
      None,
    );

    let grounded = ground(program);
    assert!(grounded.is_ground());

    let consequents = consequent_strings(&grounded);
    assert!(consequents.contains("q(2)"));
    assert!(consequents.contains("q(3)"));
  }

  #[test]
  fn equality_binds_head_variables() {
    // p(1). q(Y) :- p(X), Y = X+1.
    let program = Program::new(
      [
        fact("p", 1),
        Statement::normal(
          pred("q", vec![Term::variable("Y")]),
          LiteralCollection::new(vec![
            pred("p", vec![Term::variable("X")]),
            Literal::Builtin(BuiltinLiteral::new(
              RelOp::Equal,
              Term::variable("Y"),
              Term::Arith(ArithTerm::Add(
                Box::new(Term::variable("X")),
                Box::new(Term::Number(1)),
              )),
            )),
          ]),
        ),
      ],
      None,
    );

    let grounded = ground(program);
    assert!(grounded.is_ground());
    assert!(consequent_strings(&grounded).contains("q(2)"));
  }

  #[test]
  fn count_aggregate_is_propagated_and_reassembled() {
    // a. b. p(1). p(2). ok :- 2 <= #count{X : p(X)}.
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
    let program = Program::new(
      [
        Statement::normal(pred("a", vec![]), LiteralCollection::default()),
        Statement::normal(pred("b", vec![]), LiteralCollection::default()),
        fact("p", 1),
        fact("p", 2),
        Statement::normal(
          pred("ok", vec![]),
          LiteralCollection::new(vec![Literal::Aggregate(aggregate)]),
        ),
      ],
      None,
    );

    let grounded = ground(program);
    let consequents = consequent_strings(&grounded);
    assert!(consequents.contains("ok"));

    // the aggregate is reassembled with its instantiated elements
    let statements = statement_strings(&grounded);
    assert!(
      statements.contains("ok :- 2 <= #count{1:p(1);2:p(2)}."),
      "unexpected statements: {:?}",
      statements
    );
  }

  #[test]
  fn unreachable_count_bound_is_not_derived() {
    // p(1). ok :- 2 <= #count{X : p(X)}.
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
    let program = Program::new(
      [
        fact("p", 1),
        Statement::normal(
          pred("ok", vec![]),
          LiteralCollection::new(vec![Literal::Aggregate(aggregate)]),
        ),
      ],
      None,
    );

    let grounded = ground(program);
    assert!(!consequent_strings(&grounded).contains("ok"));
  }

  #[test]
  fn negated_aggregate_over_empty_domain() {
    // ok :- not 3 <= #count{X : p(X)}.   with no p atoms anywhere
    let aggregate = AggrLiteral::new(
      AggrKind::Count,
      vec![AggregateElement::new(
        TermTuple::new(vec![Term::variable("X")]),
        LiteralCollection::new(vec![pred("p", vec![Term::variable("X")])]),
      )],
      Some(Guard::new(RelOp::LessOrEq, Term::Number(3), false)),
      None,
      true,
    );
    let program = Program::new(
      [Statement::normal(
        pred("ok", vec![]),
        LiteralCollection::new(vec![Literal::Aggregate(aggregate)]),
      )],
      None,
    );

    let grounded = ground(program);

    // the aggregate cannot hold, so its negation does; the aggregate reassembles over the empty element set
    assert!(consequent_strings(&grounded).contains("ok"));
    let statements = statement_strings(&grounded);
    assert!(
      statements.contains("ok :- not 3 <= #count{}."),
      "unexpected statements: {:?}",
      statements
    );
  }

  #[test]
  fn choice_with_guard_is_not_unfolded() {
    // {a;b;c} = 2.
    let choice = Choice::new(
      ["a", "b", "c"]
          .into_iter()
          .map(|name| ChoiceElement::unconditional(PredicateLiteral::new(name, Vec::new())))
          .collect(),
      None,
      Some(Guard::new(RelOp::Equal, Term::Number(2), true)),
    );
    let program = Program::new([Statement::choice(choice, LiteralCollection::default())], None);

    let grounded = ground(program);

    // one choice rule with all three elements and the guard; subsets are the solver's business
    assert_eq!(grounded.statements.len(), 1);
    let statement = &grounded.statements[0];
    match &statement.kind {
      StatementKind::Choice { choice, body } => {
        assert_eq!(choice.elements.len(), 3);
        assert_eq!(choice.rguard.as_ref().unwrap().bound, Term::Number(2));
        assert!(body.is_empty());
      }
      other => panic!("expected a choice rule, got {:?}", other),
    }
  }

  #[test]
  fn unsafe_program_is_rejected() {
    // p(X).
    let program = Program::new(
      [Statement::normal(pred("p", vec![Term::variable("X")]), LiteralCollection::default())],
      None,
    );

    match Grounder::new(program) {
      Err(GroundingError::Safety { variables, .. }) => {
        assert_eq!(variables, vec!["X".to_string()]);
      }
      other => panic!("expected a safety error, got {:?}", other.err()),
    }
  }

  #[test]
  fn disjunctive_heads_are_instantiated() {
    // p(X) | q(X) :- r(X). r(1). r(2).
    let program = Program::new(
      [
        Statement::disjunctive(
          LiteralCollection::new(vec![
            pred("p", vec![Term::variable("X")]),
            pred("q", vec![Term::variable("X")]),
          ]),
          LiteralCollection::new(vec![pred("r", vec![Term::variable("X")])]),
        ),
        fact("r", 1),
        fact("r", 2),
      ],
      None,
    );

    let grounded = ground(program);
    let statements = statement_strings(&grounded);

    assert!(statements.contains("r(1)."));
    assert!(statements.contains("r(2)."));
    assert!(statements.contains("p(1)|q(1) :- r(1)."));
    assert!(statements.contains("p(2)|q(2) :- r(2)."));
  }

  #[test]
  fn npp_grounds_to_exactly_one_choice() {
    // img(1). #npp(digit(X), [0,1]) :- img(X).
    let program = Program::new(
      [
        fact("img", 1),
        Statement::npp(
          Npp::new("digit", vec![Term::variable("X")], vec![Term::Number(0), Term::Number(1)]),
          LiteralCollection::new(vec![pred("img", vec![Term::variable("X")])]),
        ),
      ],
      None,
    );

    let grounded = ground(program);

    let choice_rule = grounded
        .statements
        .iter()
        .find_map(|statement| match &statement.kind {
          StatementKind::Choice { choice, body } => Some((choice.clone(), body.clone())),
          _ => None,
        })
        .expect("the NPP rule grounds to a choice rule");

    let (choice, body) = choice_rule;
    assert_eq!(choice.elements.len(), 2);
    let guard = choice.lguard.as_ref().unwrap();
    assert_eq!(guard.op, RelOp::Equal);
    assert_eq!(guard.bound, Term::Number(1));

    let atoms: Set<String> =
        choice.elements.iter().map(|element| element.atom.to_string()).collect();
    assert!(atoms.contains("digit(1,0)"));
    assert!(atoms.contains("digit(1,1)"));
    assert_eq!(body.to_string(), "img(1)");
  }

  #[test]
  fn certain_constraint_still_produces_the_ground_program() {
    // a. :- a.
    let program = Program::new(
      [
        Statement::normal(pred("a", vec![]), LiteralCollection::default()),
        Statement::constraint(LiteralCollection::new(vec![pred("a", vec![])])),
      ],
      None,
    );

    // the unsatisfiable program is reported by warning only; grounding still succeeds
    let grounded = ground(program);
    let statements = statement_strings(&grounded);
    assert!(statements.contains("a."));
    assert!(statements.contains(":- a."));
  }

  #[test]
  fn output_is_ground_and_grounding_is_idempotent() {
    let program = Program::new(
      [
        fact("p", 1),
        fact("p", 2),
        Statement::normal(
          pred("q", vec![Term::variable("X")]),
          LiteralCollection::new(vec![pred("p", vec![Term::variable("X")])]),
        ),
      ],
      None,
    );

    let grounded = ground(program);
    assert!(grounded.is_ground());

    let reground = ground(grounded.clone());
    assert_eq!(statement_strings(&grounded), statement_strings(&reground));
  }

  #[test]
  fn positive_recursion_reaches_the_fixpoint() {
    // edge(1,2). edge(2,3). reach(1). reach(Y) :- reach(X), edge(X,Y).
    let edge = |a: i64, b: i64| {
      Statement::normal(
        pred("edge", vec![Term::Number(a), Term::Number(b)]),
        LiteralCollection::default(),
      )
    };
    let program = Program::new(
      [
        edge(1, 2),
        edge(2, 3),
        fact("reach", 1),
        Statement::normal(
          pred("reach", vec![Term::variable("Y")]),
          LiteralCollection::new(vec![
            pred("reach", vec![Term::variable("X")]),
            pred("edge", vec![Term::variable("X"), Term::variable("Y")]),
          ]),
        ),
      ],
      None,
    );

    let grounded = ground(program);
    let consequents = consequent_strings(&grounded);

    assert!(consequents.contains("reach(2)"));
    assert!(consequents.contains("reach(3)"));
  }
}
