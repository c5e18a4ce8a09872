/*!

The public object algebra of the library: terms, literals, aggregates, choices, statements, and programs. The
external parser builds these values; the grounder in `core` consumes and produces them.

*/

pub mod aggregate;
pub mod choice;
pub mod literal;
pub mod placeholder;
pub mod program;
pub mod statement;
pub mod term;

pub use aggregate::{AggrKind, AggrLiteral, AggregateElement};
pub use choice::{Choice, ChoiceElement};
pub use literal::{
  BuiltinLiteral,
  Guard,
  Literal,
  LiteralCollection,
  PredicateLiteral,
  PredicateSignature,
  RelOp,
};
pub use placeholder::{AuxPrefix, BaseLiteral, ElementLiteral, PlaceholderLiteral};
pub use program::{Program, Query};
pub use statement::{Npp, Statement, StatementKind};
pub use term::{ArithTerm, Term, TermTuple, Variable, VariableSet};
