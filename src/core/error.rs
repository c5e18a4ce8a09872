/*!

Error conditions surfaced by the grounding pipeline. Everything here is fatal to the current grounding invocation;
recoverable conditions (a failed arithmetic-placeholder validity check, a positive literal outside the current
domain) are handled locally by discarding the candidate instantiation and never reach these types.

*/

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

pub enum GroundingError {
  /// The input program is not safe. Carries the offending statement and the variables that could not be bound.
  Safety {
    statement: String,
    variables: Vec<String>,
  },

  /// Total-order comparison or arithmetic evaluation over a non-ground or non-integer term.
  Arith {
    term: String,
  },

  /// Integer division by zero during simplification or evaluation.
  DivisionByZero,

  /// The refined component graph still contains a cycle after restricting to positive edges.
  Cycle,

  /// A substitution merge conflict that escaped every candidate-discard site.
  Assignment {
    variable: String,
    existing: String,
    incoming: String,
  },

  /// Attempt to classically negate or default-negate an auxiliary literal that forbids it.
  InvalidAuxLiteral {
    literal: String,
  },
}

impl Display for GroundingError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      GroundingError::Safety { statement, variables } => {
        write!(
          f,
          "the statement \"{}\" is not safe: the variable(s) {} cannot be bound by any positive body literal.",
          statement,
          variables.join(", ")
        )
      } // end `GroundingError::Safety` branch

      GroundingError::Arith { term } => {
        write!(
          f,
          "the term \"{}\" is not a ground integer term; total ordering and arithmetic are undefined for it.",
          term
        )
      }

      GroundingError::DivisionByZero => {
        write!(f, "division by zero while evaluating an arithmetic term.")
      }

      GroundingError::Cycle => {
        write!(
          f,
          "the refined component graph contains a cycle that cannot be broken by restricting to positive edges."
        )
      }

      GroundingError::Assignment { variable, existing, incoming } => {
        write!(
          f,
          "conflicting assignments for variable {}: {} vs. {}.",
          variable, existing, incoming
        )
      }

      GroundingError::InvalidAuxLiteral { literal } => {
        write!(f, "the auxiliary literal \"{}\" cannot be negated.", literal)
      }

    } // end match on `GroundingError`
  }
}

impl Debug for GroundingError {
  fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
    Display::fmt(self, f)
  }
}

impl Error for GroundingError {}
