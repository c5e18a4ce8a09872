/*!

The rule dependency graph. Nodes are statements (represented by their indices into the program's statement
list); an edge `(depender, dependee)` exists iff some consequent predicate of `dependee` occurs positively
(resp. negatively) in `depender`'s antecedents. Self-edges are suppressed.

*/

use crate::{
  abstractions::Set,
  api::{literal::PredicateSignature, statement::Statement},
};

pub struct DependencyGraph {
  pub node_count: usize,
  pub pos_edges: Set<(usize, usize)>,
  pub neg_edges: Set<(usize, usize)>,
}

impl DependencyGraph {
  pub fn new(statements: &[Statement]) -> DependencyGraph {
    let mut pos_edges = Set::new();
    let mut neg_edges = Set::new();

    let head_preds: Vec<Set<PredicateSignature>> = statements
        .iter()
        .map(|statement| {
          statement.consequents().iter().filter_map(|literal| literal.pred()).collect()
        })
        .collect();

    for (depender, statement) in statements.iter().enumerate() {
      let antecedents = statement.antecedents();
      let pos_preds: Set<PredicateSignature> =
          antecedents.pos_occ().iter().filter_map(|literal| literal.pred()).collect();
      let neg_preds: Set<PredicateSignature> =
          antecedents.neg_occ().iter().filter_map(|literal| literal.pred()).collect();

      for (dependee, heads) in head_preds.iter().enumerate() {
        if depender == dependee {
          continue;
        }

        if heads.iter().any(|pred| pos_preds.contains(pred)) {
          pos_edges.insert((depender, dependee));
        }
        if heads.iter().any(|pred| neg_preds.contains(pred)) {
          neg_edges.insert((depender, dependee));
        }
      }
    }

    DependencyGraph { node_count: statements.len(), pos_edges, neg_edges }
  }

  pub fn edges(&self) -> Set<(usize, usize)> {
    self.pos_edges.union(&self.neg_edges).copied().collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{
    literal::{Literal, LiteralCollection, PredicateLiteral},
    term::Term,
  };

  fn fact(name: &str) -> Statement {
    Statement::normal(
      Literal::Predicate(PredicateLiteral::new(name, vec![Term::Number(1)])),
      LiteralCollection::default(),
    )
  }

  fn rule(head: &str, pos_dep: Option<&str>, neg_dep: Option<&str>) -> Statement {
    let mut body = Vec::new();
    if let Some(name) = pos_dep {
      body.push(Literal::Predicate(PredicateLiteral::new(name, vec![Term::Number(1)])));
    }
    if let Some(name) = neg_dep {
      body.push(Literal::Predicate(
        PredicateLiteral::new(name, vec![Term::Number(1)]).with_naf(),
      ));
    }
    Statement::normal(
      Literal::Predicate(PredicateLiteral::new(head, vec![Term::Number(1)])),
      LiteralCollection::new(body),
    )
  }

  #[test]
  fn edges_follow_predicate_overlap() {
    // 0: u(1).   1: p(1) :- u(1), not q(1).   2: q(1) :- not p(1).
    let statements =
        vec![fact("u"), rule("p", Some("u"), Some("q")), rule("q", None, Some("p"))];
    let graph = DependencyGraph::new(&statements);

    assert!(graph.pos_edges.contains(&(1, 0)));
    assert!(graph.neg_edges.contains(&(1, 2)));
    assert!(graph.neg_edges.contains(&(2, 1)));
    assert!(!graph.pos_edges.contains(&(0, 1)));

    // self-edges are suppressed even for self-recursive predicates
    let recursive = vec![rule("p", Some("p"), None)];
    let graph = DependencyGraph::new(&recursive);
    assert!(graph.edges().is_empty());
  }
}
