/*!

The safety calculus. A `SafetyTriplet` characterizes which variables of an expression are already bound (`safe`),
which can never be bound (`unsafe`), and which are bound conditionally (`rules`: a depender becomes safe once all
of its dependees are). Closure combines triplets by set union and then normalizes; normalization is Algorithm 1
of Bicheler (2015), "Optimizing Non-Ground Answer Set Programs via Rule Decomposition", and converges in
O(V·R).

A statement is safe iff the closure of its body safety triplets equals the triplet whose safe set is exactly the
statement's global variables with empty unsafe and rule sets.

*/

use crate::api::term::{Variable, VariableSet};

/// A conditional binding: `depender` becomes safe once every variable in `dependees` is safe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafetyRule {
  pub depender: Variable,
  pub dependees: VariableSet,
}

#[derive(Clone, Debug, Default)]
pub struct SafetyTriplet {
  pub safe: VariableSet,
  pub unsafe_vars: VariableSet,
  pub rules: Vec<SafetyRule>,
}

impl SafetyTriplet {
  pub fn new(safe: VariableSet, unsafe_vars: VariableSet, rules: Vec<SafetyRule>) -> SafetyTriplet {
    SafetyTriplet { safe, unsafe_vars, rules }
  }

  /// A triplet marking the given variables as safe.
  pub fn from_safe(safe: VariableSet) -> SafetyTriplet {
    SafetyTriplet { safe, ..Default::default() }
  }

  /// A triplet marking the given variables as unsafe.
  pub fn from_unsafe(unsafe_vars: VariableSet) -> SafetyTriplet {
    SafetyTriplet { unsafe_vars, ..Default::default() }
  }

  /// Normalizes the triplet:
  ///  (a) rules whose depender depends on itself are dropped;
  ///  (b) iterate: a rule with a safe depender is dropped; safe variables are removed from dependees; a rule
  ///      whose dependees become empty promotes its depender to safe and is dropped;
  ///  (c) the variables of residual rules are unsafe;
  ///  (d) safe variables are removed from the unsafe set.
  pub fn normalize(&self) -> SafetyTriplet {
    let mut safe = self.safe.clone();
    let mut rules: Vec<SafetyRule> = self
        .rules
        .iter()
        .filter(|rule| !rule.dependees.contains(&rule.depender))
        .cloned()
        .collect();

    loop {
      let mut changed = false;
      let mut remaining = Vec::with_capacity(rules.len());

      for mut rule in rules.drain(..) {
        if safe.contains(&rule.depender) {
          changed = true;
          continue;
        }

        let dependee_count = rule.dependees.len();
        rule.dependees.retain(|var| !safe.contains(var));
        if rule.dependees.len() != dependee_count {
          changed = true;
        }

        if rule.dependees.is_empty() {
          safe.insert(rule.depender);
          changed = true;
        } else {
          remaining.push(rule);
        }
      }

      rules = remaining;
      if !changed {
        break;
      }
    }

    let mut unsafe_vars = self.unsafe_vars.clone();
    for rule in &rules {
      unsafe_vars.insert(rule.depender.clone());
      unsafe_vars.extend(rule.dependees.iter().cloned());
    }
    unsafe_vars.retain(|var| !safe.contains(var));

    SafetyTriplet { safe, unsafe_vars, rules }
  }

  /// The unique normalized triplet whose components are the set unions of the inputs' components.
  pub fn closure(safeties: impl IntoIterator<Item = SafetyTriplet>) -> SafetyTriplet {
    let mut safe = VariableSet::new();
    let mut unsafe_vars = VariableSet::new();
    let mut rules = Vec::new();

    for safety in safeties {
      safe.extend(safety.safe);
      unsafe_vars.extend(safety.unsafe_vars);
      for rule in safety.rules {
        if !rules.contains(&rule) {
          rules.push(rule);
        }
      }
    }

    SafetyTriplet { safe, unsafe_vars, rules }.normalize()
  }
}

impl PartialEq for SafetyTriplet {
  /// Rule sets are compared order-insensitively.
  fn eq(&self, other: &Self) -> bool {
    self.safe == other.safe
        && self.unsafe_vars == other.unsafe_vars
        && self.rules.len() == other.rules.len()
        && self.rules.iter().all(|rule| other.rules.contains(rule))
  }
}

impl Eq for SafetyTriplet {}
