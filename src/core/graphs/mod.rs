/*!

Graph machinery for the grounder: the statement dependency graph, Tarjan's strongly-connected-component
decomposition, Kahn's topological sort, and the contracted component graph with its two sequencing operations.

*/

pub mod component;
pub mod dependency;
pub mod scc;
pub mod topological;

pub use component::{Component, ComponentGraph};
pub use dependency::DependencyGraph;
pub use scc::strongly_connected_components;
pub use topological::topological_sort;
