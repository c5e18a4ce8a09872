/*!

Kahn's algorithm for topological sorting, over nodes `0..node_count` with an explicit edge set. See Kahn
(1962): "Topological sorting of large networks". A graph that cannot be linearized is a cycle error.

*/

use crate::{abstractions::Set, core::error::GroundingError};

/// Topologically sorts the graph: every edge `(src, dst)` places `src` before `dst` in the returned sequence.
pub fn topological_sort(node_count: usize, edges: &Set<(usize, usize)>)
                        -> Result<Vec<usize>, GroundingError>
{
  let mut in_degrees = vec![0usize; node_count];
  let mut children: Vec<Vec<usize>> = vec![Vec::new(); node_count];

  for &(src, dst) in edges {
    in_degrees[dst] += 1;
    children[src].push(dst);
  }
  for targets in &mut children {
    targets.sort_unstable();
  }

  // start with the root nodes (no incoming edges)
  let mut queue: Vec<usize> =
      (0..node_count).filter(|&node| in_degrees[node] == 0).collect();
  let mut sequence = Vec::with_capacity(node_count);

  while let Some(node) = queue.pop() {
    sequence.push(node);

    for &child in &children[node] {
      in_degrees[child] -= 1;
      if in_degrees[child] == 0 {
        queue.push(child);
      }
    }
  }

  if sequence.len() != node_count {
    return Err(GroundingError::Cycle);
  }

  Ok(sequence)
}
