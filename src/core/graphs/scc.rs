/*!

Tarjan's algorithm for strongly connected components, over nodes `0..node_count` with an explicit edge set.
See Tarjan (1972): "Depth-First Search and Linear Graph Algorithms".

Adjacency lists are sorted and roots are visited in index order, so the component list is deterministic for a
given edge set.

*/

use bit_set::BitSet;

use crate::abstractions::Set;

const UNEXPLORED: usize = usize::MAX;

struct TarjanState<'g> {
  adjacency: &'g [Vec<usize>],
  /// Exploration id per node (`UNEXPLORED` if not yet visited).
  ids: Vec<usize>,
  /// Lowest id of a stack node reachable from the node (including itself).
  low_ids: Vec<usize>,
  on_stack: BitSet,
  stack: Vec<usize>,
  counter: usize,
  components: Vec<Vec<usize>>,
}

impl<'g> TarjanState<'g> {
  fn visit(&mut self, node: usize) {
    self.ids[node] = self.counter;
    self.low_ids[node] = self.counter;
    self.counter += 1;

    self.stack.push(node);
    self.on_stack.insert(node);

    for &target in &self.adjacency[node] {
      if self.ids[target] == UNEXPLORED {
        self.visit(target);
        self.low_ids[node] = self.low_ids[node].min(self.low_ids[target]);
      } else if self.on_stack.contains(target) {
        self.low_ids[node] = self.low_ids[node].min(self.ids[target]);
      }
    }

    // node is the root of the component being built
    if self.low_ids[node] == self.ids[node] {
      let mut component = Vec::new();
      loop {
        let member = self.stack.pop().expect("Tarjan stack must contain the component root");
        self.on_stack.remove(member);
        component.push(member);
        if member == node {
          break;
        }
      }
      self.components.push(component);
    }
  }
}

/// Computes the strongly connected components of the graph. Every pair of nodes within a returned component
/// lies on a common cycle; no pair across components does.
pub fn strongly_connected_components(node_count: usize, edges: &Set<(usize, usize)>) -> Vec<Vec<usize>> {
  let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); node_count];
  for &(src, dst) in edges {
    adjacency[src].push(dst);
  }
  for targets in &mut adjacency {
    targets.sort_unstable();
  }

  let mut state = TarjanState {
    adjacency: &adjacency,
    ids: vec![UNEXPLORED; node_count],
    low_ids: vec![UNEXPLORED; node_count],
    on_stack: BitSet::with_capacity(node_count),
    stack: Vec::new(),
    counter: 0,
    components: Vec::new(),
  };

  for node in 0..node_count {
    if state.ids[node] == UNEXPLORED {
      state.visit(node);
    }
  }

  state.components
}

#[cfg(test)]
mod tests {
  use super::*;

  fn edge_set(edges: &[(usize, usize)]) -> Set<(usize, usize)> {
    edges.iter().copied().collect()
  }

  fn sorted(mut components: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
    for component in &mut components {
      component.sort_unstable();
    }
    components.sort();
    components
  }

  #[test]
  fn cycle_forms_one_component() {
    // 0 -> 1 -> 2 -> 0, plus 3 hanging off
    let components =
        strongly_connected_components(4, &edge_set(&[(0, 1), (1, 2), (2, 0), (3, 0)]));
    assert_eq!(sorted(components), vec![vec![0, 1, 2], vec![3]]);
  }

  #[test]
  fn dag_nodes_are_singletons() {
    let components = strongly_connected_components(3, &edge_set(&[(0, 1), (1, 2)]));
    assert_eq!(sorted(components), vec![vec![0], vec![1], vec![2]]);
  }

  #[test]
  fn two_cycles() {
    let components = strongly_connected_components(
      5,
      &edge_set(&[(0, 1), (1, 0), (2, 3), (3, 4), (4, 2), (1, 2)]),
    );
    assert_eq!(sorted(components), vec![vec![0, 1], vec![2, 3, 4]]);
  }
}
