/*!

The component graph: the rule dependency graph contracted along its strongly connected components. Each
component keeps its intra-SCC positive and negative edges; inter-SCC edges connect components. A component is
*stratified* iff it has no intra-SCC negative edge and does not (transitively) depend on an unstratified
component.

Two sequencing operations drive instantiation:

  - the *outer* sequence orders the components so that dependees come first;
  - the *inner* (refined) sequence orders the statements within one component, restricted to positive
    intra-SCC edges, again dependees first. Negative intra-SCC edges are broken by the restriction; positive
    cycles collapse into one group and are resolved by the grounder's fixpoint.

*/

use crate::{
  abstractions::{HashMap, Set},
  api::statement::Statement,
  core::{
    error::GroundingError,
    graphs::{
      dependency::DependencyGraph,
      scc::strongly_connected_components,
      topological::topological_sort,
    },
  },
};

/// One strongly connected component of the dependency graph. Nodes are statement indices.
pub struct Component {
  pub nodes: Vec<usize>,
  /// Positive edges between statements of this component.
  pub pos_edges: Set<(usize, usize)>,
  /// Negative edges between statements of this component.
  pub neg_edges: Set<(usize, usize)>,
  pub stratified: bool,
}

impl Component {
  /// The refined instantiation sequence: the component's statements grouped by positive-edge SCCs, dependees
  /// first.
  pub fn sequence(&self) -> Result<Vec<Vec<usize>>, GroundingError> {
    let index_of: HashMap<usize, usize> =
        self.nodes.iter().enumerate().map(|(local, &node)| (node, local)).collect();

    let local_pos_edges: Set<(usize, usize)> =
        self.pos_edges.iter().map(|&(src, dst)| (index_of[&src], index_of[&dst])).collect();

    let sccs = strongly_connected_components(self.nodes.len(), &local_pos_edges);

    let mut scc_of = vec![0usize; self.nodes.len()];
    for (scc_index, scc) in sccs.iter().enumerate() {
      for &node in scc {
        scc_of[node] = scc_index;
      }
    }

    // inter-group positive edges
    let group_edges: Set<(usize, usize)> = local_pos_edges
        .iter()
        .filter(|(src, dst)| scc_of[*src] != scc_of[*dst])
        .map(|&(src, dst)| (scc_of[src], scc_of[dst]))
        .collect();

    let mut order = topological_sort(sccs.len(), &group_edges)?;
    order.reverse();

    Ok(
      order
          .into_iter()
          .map(|scc_index| sccs[scc_index].iter().map(|&local| self.nodes[local]).collect())
          .collect(),
    )
  }
}

pub struct ComponentGraph {
  pub components: Vec<Component>,
  /// Inter-component positive edges, as component indices.
  pub pos_edges: Set<(usize, usize)>,
  /// Inter-component negative edges, as component indices.
  pub neg_edges: Set<(usize, usize)>,
}

impl ComponentGraph {
  pub fn new(statements: &[Statement]) -> ComponentGraph {
    ComponentGraph::from_dependency_graph(&DependencyGraph::new(statements))
  }

  pub fn from_dependency_graph(graph: &DependencyGraph) -> ComponentGraph {
    let sccs = strongly_connected_components(graph.node_count, &graph.edges());

    let mut scc_of = vec![0usize; graph.node_count];
    for (scc_index, scc) in sccs.iter().enumerate() {
      for &node in scc {
        scc_of[node] = scc_index;
      }
    }

    // group statement-level edges into intra-component and inter-component ones
    let mut intra_pos: Vec<Set<(usize, usize)>> = (0..sccs.len()).map(|_| Set::new()).collect();
    let mut intra_neg: Vec<Set<(usize, usize)>> = (0..sccs.len()).map(|_| Set::new()).collect();
    let mut pos_edges = Set::new();
    let mut neg_edges = Set::new();

    for &(src, dst) in &graph.pos_edges {
      if scc_of[src] == scc_of[dst] {
        intra_pos[scc_of[src]].insert((src, dst));
      } else {
        pos_edges.insert((scc_of[src], scc_of[dst]));
      }
    }
    for &(src, dst) in &graph.neg_edges {
      if scc_of[src] == scc_of[dst] {
        intra_neg[scc_of[src]].insert((src, dst));
      } else {
        neg_edges.insert((scc_of[src], scc_of[dst]));
      }
    }

    let mut components: Vec<Component> = sccs
        .into_iter()
        .enumerate()
        .map(|(scc_index, nodes)| {
          let stratified = intra_neg[scc_index].is_empty();
          Component {
            nodes,
            pos_edges: std::mem::take(&mut intra_pos[scc_index]),
            neg_edges: std::mem::take(&mut intra_neg[scc_index]),
            stratified,
          }
        })
        .collect();

    // a component transitively depending on an unstratified component is itself unstratified
    let all_edges: Vec<(usize, usize)> = pos_edges.union(&neg_edges).copied().collect();
    loop {
      let mut changed = false;
      for &(src, dst) in &all_edges {
        if components[src].stratified && !components[dst].stratified {
          components[src].stratified = false;
          changed = true;
        }
      }
      if !changed {
        break;
      }
    }

    ComponentGraph { components, pos_edges, neg_edges }
  }

  pub fn edges(&self) -> Set<(usize, usize)> {
    self.pos_edges.union(&self.neg_edges).copied().collect()
  }

  /// The outer instantiation sequence: component indices, dependees first.
  pub fn sequence(&self) -> Result<Vec<usize>, GroundingError> {
    let mut order = topological_sort(self.components.len(), &self.edges())?;
    order.reverse();
    Ok(order)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{
    literal::{Literal, LiteralCollection, PredicateLiteral},
    term::Term,
  };

  fn atom(name: &str) -> Literal {
    Literal::Predicate(PredicateLiteral::new(name, vec![Term::Number(1)]))
  }

  fn naf_atom(name: &str) -> Literal {
    Literal::Predicate(PredicateLiteral::new(name, vec![Term::Number(1)]).with_naf())
  }

  /// u(1).  p(1) :- u(1), not q(1).  q(1) :- not p(1).  x(1) :- p(1).
  fn sample_statements() -> Vec<Statement> {
    vec![
      Statement::normal(atom("u"), LiteralCollection::default()),
      Statement::normal(atom("p"), LiteralCollection::new(vec![atom("u"), naf_atom("q")])),
      Statement::normal(atom("q"), LiteralCollection::new(vec![naf_atom("p")])),
      Statement::normal(atom("x"), LiteralCollection::new(vec![atom("p")])),
    ]
  }

  #[test]
  fn negative_cycle_is_one_unstratified_component() {
    let statements = sample_statements();
    let graph = ComponentGraph::new(&statements);

    let pq = graph
        .components
        .iter()
        .find(|component| component.nodes.contains(&1))
        .expect("component for p/q");
    assert!(pq.nodes.contains(&2));
    assert!(!pq.stratified);

    // the fact is stratified; x depends on the unstratified cycle and inherits the mark
    let fact = graph.components.iter().find(|c| c.nodes == vec![0]).unwrap();
    assert!(fact.stratified);
    let x = graph.components.iter().find(|c| c.nodes == vec![3]).unwrap();
    assert!(!x.stratified);
  }

  #[test]
  fn outer_sequence_puts_dependees_first() {
    let statements = sample_statements();
    let graph = ComponentGraph::new(&statements);
    let sequence = graph.sequence().unwrap();

    let position = |node: usize| {
      sequence
          .iter()
          .position(|&component| graph.components[component].nodes.contains(&node))
          .unwrap()
    };

    // the fact before the p/q cycle, the cycle before x
    assert!(position(0) < position(1));
    assert!(position(1) < position(3));
  }

  #[test]
  fn inner_sequence_breaks_negative_edges() {
    let statements = sample_statements();
    let graph = ComponentGraph::new(&statements);

    let pq = graph
        .components
        .iter()
        .find(|component| component.nodes.contains(&1))
        .unwrap();

    // only negative edges connect p and q, so the refined sequence has two singleton groups
    let groups = pq.sequence().unwrap();
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|group| group.len() == 1));
  }
}
