/*!

A grounder for Answer Set Programming in the style of ASP-Core-2, extended with choice rules, aggregates, and
neural-probabilistic predicates. Given a non-ground program, it produces a semantically equivalent program
containing no variables, suitable for downstream solvers:

```ignore
use groundhog::{Grounder, Program};

let program = Program::new(statements, None);
let ground_program = Grounder::new(program)?.ground()?;
println!("{}", ground_program);
```

The design follows Kaminski & Schaub (2022), "On the Foundations of Grounding in Answer Set Programming".
Parsing the surface syntax, driving the CLI, and solving the ground program are external concerns; this crate
begins at the AST and ends at the ground program.

*/

pub mod abstractions;
pub mod api;
pub mod core;

// We re-export abstractions that are meant to be used publicly.
pub use abstractions::{log, IString};

pub use api::{Program, Query};
pub use core::{Grounder, GroundingError, Substitution};
