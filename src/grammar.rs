use std::collections::HashMap;
use std::fmt;

use crate::closure::UnaryClosure;
use crate::error::Error;
use crate::rules::{Label, Rule, RuleId};

/// A weighted, binarized context-free grammar.
///
/// Labels are interned to dense ids fixed for the grammar's lifetime; rules
/// are grouped by parent label, which the dynamic program depends on to
/// enumerate only the rules that can build a given cell. The unary closure is
/// precomputed here, so construction is where a cyclic unary graph fails.
///
/// A grammar is immutable once built and freely shareable across threads.
#[derive(Debug)]
pub struct Grammar {
  labels: Vec<String>,
  ids: HashMap<String, Label>,
  root: Label,
  rules: Vec<Rule>,
  by_parent: Vec<Vec<RuleId>>,
  closure: UnaryClosure,
}

impl Grammar {
  pub fn new(labels: Vec<String>, root: Label, rules: Vec<Rule>) -> Result<Self, Error> {
    if rules.is_empty() {
      return Err(Error::EmptyRuleset);
    }

    let ids = labels
      .iter()
      .enumerate()
      .map(|(id, name)| (name.clone(), id))
      .collect::<HashMap<_, _>>();

    let mut by_parent = vec![Vec::new(); labels.len()];
    for (rid, rule) in rules.iter().enumerate() {
      by_parent[rule.parent()].push(rid);
    }

    let closure = UnaryClosure::build(labels.len(), &rules, &labels)?;

    Ok(Self {
      labels,
      ids,
      root,
      rules,
      by_parent,
      closure,
    })
  }

  pub fn num_labels(&self) -> usize {
    self.labels.len()
  }

  pub fn num_rules(&self) -> usize {
    self.rules.len()
  }

  pub fn root(&self) -> Label {
    self.root
  }

  pub fn label(&self, id: Label) -> &str {
    &self.labels[id]
  }

  pub fn label_id(&self, name: &str) -> Option<Label> {
    self.ids.get(name).copied()
  }

  pub fn rule(&self, id: RuleId) -> &Rule {
    &self.rules[id]
  }

  pub fn rules_with_parent(&self, parent: Label) -> &[RuleId] {
    &self.by_parent[parent]
  }

  pub fn closure(&self) -> &UnaryClosure {
    &self.closure
  }

  /// A zero vector sized to the rule count, for accumulating per-rule
  /// statistics.
  pub fn zero_rule_vector(&self) -> Vec<f64> {
    vec![0.0; self.rules.len()]
  }

  /// Renders a rule with label names instead of ids.
  pub fn rule_display(&self, id: RuleId) -> String {
    match self.rules[id] {
      Rule::Binary {
        parent,
        left,
        right,
        score,
      } => format!(
        "{} -> {} {} [{:.4}]",
        self.labels[parent], self.labels[left], self.labels[right], score
      ),
      Rule::Unary {
        parent,
        child,
        score,
      } => format!(
        "{} -> {} [{:.4}]",
        self.labels[parent], self.labels[child], score
      ),
    }
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "//** root: {}", self.labels[self.root])?;
    write!(f, "//** labels:")?;
    for name in self.labels.iter() {
      write!(f, " {}", name)?;
    }
    writeln!(f)?;

    for rid in 0..self.rules.len() {
      writeln!(f, "{}", self.rule_display(rid))?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn two_parent_grammar() -> Grammar {
    let labels = vec!["S".to_string(), "A".to_string(), "B".to_string()];
    let rules = vec![
      Rule::Binary {
        parent: 0,
        left: 1,
        right: 2,
        score: 0.0,
      },
      Rule::Unary {
        parent: 1,
        child: 2,
        score: 0.5f64.ln(),
      },
      Rule::Binary {
        parent: 0,
        left: 2,
        right: 1,
        score: 0.5f64.ln(),
      },
    ];
    Grammar::new(labels, 0, rules).unwrap()
  }

  #[test]
  fn test_rules_grouped_by_parent() {
    let g = two_parent_grammar();
    assert_eq!(g.rules_with_parent(0), &[0, 2]);
    assert_eq!(g.rules_with_parent(1), &[1]);
    assert_eq!(g.rules_with_parent(2), &[] as &[RuleId]);
  }

  #[test]
  fn test_label_interning_round_trips() {
    let g = two_parent_grammar();
    for id in 0..g.num_labels() {
      assert_eq!(g.label_id(g.label(id)), Some(id));
    }
    assert_eq!(g.label_id("missing"), None);
  }

  #[test]
  fn test_zero_rule_vector() {
    let g = two_parent_grammar();
    let v = g.zero_rule_vector();
    assert_eq!(v.len(), g.num_rules());
    assert!(v.iter().all(|&x| x == 0.0));
  }

  #[test]
  fn test_empty_ruleset_rejected() {
    assert!(matches!(
      Grammar::new(vec!["S".to_string()], 0, vec![]),
      Err(Error::EmptyRuleset)
    ));
  }
}
