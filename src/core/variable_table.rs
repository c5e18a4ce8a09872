/*!

Per-statement variable bookkeeping. Each statement owns one `VariableTable` mapping its variables to a flag
indicating whether the variable is global, together with the fresh-name counters for anonymous and
arithmetic-placeholder variables. The counters are scoped to the table (and therefore to a single statement),
never process-wide.

*/

use std::fmt::{Display, Formatter};

use crate::{
  abstractions::{join_string, HashMap},
  api::term::{ArithTerm, Variable, VariableSet},
};

#[derive(Clone, Debug, Default)]
pub struct VariableTable {
  /// Maps known variables to whether the variable is global in the owning statement.
  variables: HashMap<Variable, bool>,
  anon_counter: usize,
  arith_counter: usize,
}

impl VariableTable {
  pub fn new(variables: impl IntoIterator<Item = (Variable, bool)>) -> VariableTable {
    let mut table = VariableTable::default();
    table.update(variables);
    table
  }

  #[inline(always)]
  pub fn contains(&self, var: &Variable) -> bool {
    self.variables.contains_key(var)
  }

  /// Registers a variable (or updates its global flag), adjusting the fresh-name counters so that newly created
  /// variables never collide with registered ones.
  pub fn register(&mut self, var: Variable, is_global: bool) {
    match &var {
      Variable::Anonymous(id) => {
        self.anon_counter = self.anon_counter.max(id + 1);
      }
      Variable::ArithPlaceholder(id, _) => {
        self.arith_counter = self.arith_counter.max(id + 1);
      }
      Variable::Named(_) => {}
    }

    self.variables.insert(var, is_global);
  }

  pub fn update(&mut self, variables: impl IntoIterator<Item = (Variable, bool)>) {
    for (var, is_global) in variables {
      self.register(var, is_global);
    }
  }

  /// Creates and registers a fresh anonymous variable.
  pub fn create_anon(&mut self) -> Variable {
    let var = Variable::Anonymous(self.anon_counter);
    self.anon_counter += 1;
    self.variables.insert(var.clone(), false);
    var
  }

  /// Creates and registers a fresh arithmetic placeholder variable for the given (already simplified) subtree.
  pub fn create_arith(&mut self, original: ArithTerm) -> Variable {
    let var = Variable::ArithPlaceholder(self.arith_counter, Box::new(original));
    self.arith_counter += 1;
    self.variables.insert(var.clone(), false);
    var
  }

  pub fn vars(&self) -> VariableSet {
    self.variables.keys().cloned().collect()
  }

  pub fn global_vars(&self) -> VariableSet {
    self
        .variables
        .iter()
        .filter(|(_, &is_global)| is_global)
        .map(|(var, _)| var.clone())
        .collect()
  }

  pub fn arith_vars(&self) -> VariableSet {
    self.variables.keys().filter(|var| var.is_arith_placeholder()).cloned().collect()
  }
}

impl Display for VariableTable {
  /// Renders the table as `{X*,Y}`, global variables marked with a `*` suffix.
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut entries: Vec<String> = self
        .variables
        .iter()
        .map(|(var, &is_global)| if is_global { format!("{}*", var) } else { var.to_string() })
        .collect();
    entries.sort();
    write!(f, "{{{}}}", join_string(entries.iter(), ","))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::abstractions::IString;
  use crate::api::term::Term;

  #[test]
  fn counters_are_per_table() {
    let mut first = VariableTable::default();
    let mut second = VariableTable::default();

    assert_eq!(first.create_anon(), Variable::Anonymous(0));
    assert_eq!(first.create_anon(), Variable::Anonymous(1));
    // a different table starts over
    assert_eq!(second.create_anon(), Variable::Anonymous(0));
  }

  #[test]
  fn registering_adjusts_counters() {
    let mut table = VariableTable::default();
    table.register(Variable::Anonymous(4), false);
    assert_eq!(table.create_anon(), Variable::Anonymous(5));

    let original = ArithTerm::Add(Box::new(Term::variable("X")), Box::new(Term::Number(1)));
    let placeholder = table.create_arith(original);
    assert!(matches!(placeholder, Variable::ArithPlaceholder(0, _)));
  }

  #[test]
  fn global_flags() {
    let x = Variable::Named(IString::from("X"));
    let y = Variable::Named(IString::from("Y"));
    let table = VariableTable::new([(x.clone(), true), (y.clone(), false)]);

    assert!(table.global_vars().contains(&x));
    assert!(!table.global_vars().contains(&y));
    assert_eq!(table.vars().len(), 2);
  }
}
