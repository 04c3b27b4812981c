use std::collections::HashMap;
use std::ops::{AddAssign, SubAssign};

use crate::error::Error;
use crate::rules::{Label, RuleId};

/// Expected sufficient statistics extracted from one sentence's charts, and
/// the algebraic value they aggregate into across a corpus.
///
/// `rule_counts` is dense over rule ids; `word_counts` is sparse by
/// construction, label -> word -> accumulated weight, with missing entries
/// meaning zero and inserted on first touch. `log_prob` is the sentence's
/// total log-probability, summed under `+=` into a corpus log-likelihood.
///
/// For a single sentence every entry is an expected count in `[0, inf)`
/// (each term is a probability, but a rule can occur at many points of the
/// span lattice). After `-=` -- "observed minus model-expectation" for
/// discriminative gradients -- entries may legitimately be negative.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedCounts {
  pub rule_counts: Vec<f64>,
  pub word_counts: HashMap<Label, HashMap<String, f64>>,
  pub log_prob: f64,
}

impl ExpectedCounts {
  pub fn new(num_rules: usize) -> Self {
    Self {
      rule_counts: vec![0.0; num_rules],
      word_counts: HashMap::new(),
      log_prob: 0.0,
    }
  }

  pub fn add_rule(&mut self, rule: RuleId, count: f64) {
    self.rule_counts[rule] += count;
  }

  pub fn add_word(&mut self, tag: Label, word: &str, count: f64) {
    *self
      .word_counts
      .entry(tag)
      .or_default()
      .entry(word.to_string())
      .or_insert(0.0) += count;
  }

  pub fn word_count(&self, tag: Label, word: &str) -> f64 {
    self
      .word_counts
      .get(&tag)
      .and_then(|words| words.get(word))
      .copied()
      .unwrap_or(0.0)
  }

  /// Scans for NaN or infinity. Aggregated counts feed gradient updates, so
  /// a degenerate value here has to stop the training iteration rather than
  /// leak into the next one's parameters.
  pub fn check_finite(&self) -> Result<(), Error> {
    for (rule, &count) in self.rule_counts.iter().enumerate() {
      if !count.is_finite() {
        return Err(Error::Degenerate {
          context: format!("rule {} count {}", rule, count),
        });
      }
    }
    for (&tag, words) in self.word_counts.iter() {
      for (word, &count) in words.iter() {
        if !count.is_finite() {
          return Err(Error::Degenerate {
            context: format!("tag {} word {:?} count {}", tag, word, count),
          });
        }
      }
    }
    if self.log_prob.is_nan() || self.log_prob == f64::INFINITY {
      return Err(Error::Degenerate {
        context: format!("log prob {}", self.log_prob),
      });
    }
    Ok(())
  }
}

impl AddAssign<&ExpectedCounts> for ExpectedCounts {
  fn add_assign(&mut self, rhs: &ExpectedCounts) {
    assert_eq!(self.rule_counts.len(), rhs.rule_counts.len());
    for (mine, theirs) in self.rule_counts.iter_mut().zip(rhs.rule_counts.iter()) {
      *mine += theirs;
    }
    for (&tag, words) in rhs.word_counts.iter() {
      for (word, &count) in words.iter() {
        self.add_word(tag, word, count);
      }
    }
    self.log_prob += rhs.log_prob;
  }
}

impl SubAssign<&ExpectedCounts> for ExpectedCounts {
  fn sub_assign(&mut self, rhs: &ExpectedCounts) {
    assert_eq!(self.rule_counts.len(), rhs.rule_counts.len());
    for (mine, theirs) in self.rule_counts.iter_mut().zip(rhs.rule_counts.iter()) {
      *mine -= theirs;
    }
    for (&tag, words) in rhs.word_counts.iter() {
      for (word, &count) in words.iter() {
        self.add_word(tag, word, -count);
      }
    }
    self.log_prob -= rhs.log_prob;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> ExpectedCounts {
    let mut c = ExpectedCounts::new(3);
    c.add_rule(0, 1.5);
    c.add_rule(2, 0.25);
    c.add_word(1, "dogs", 1.0);
    c.add_word(4, "run", 0.5);
    c.log_prob = -2.0;
    c
  }

  #[test]
  fn test_add_then_sub_round_trips() {
    let x = sample();
    let mut y = ExpectedCounts::new(3);
    y.add_rule(0, 0.5);
    y.add_rule(1, 2.0);
    y.add_word(1, "dogs", 0.25);
    y.add_word(7, "cats", 1.0);
    y.log_prob = -1.0;

    let mut z = x.clone();
    z += &y;
    z -= &y;

    for rule in 0..3 {
      assert!((z.rule_counts[rule] - x.rule_counts[rule]).abs() < 1e-12);
    }
    assert!((z.word_count(1, "dogs") - 1.0).abs() < 1e-12);
    assert!((z.word_count(4, "run") - 0.5).abs() < 1e-12);
    assert!(z.word_count(7, "cats").abs() < 1e-12);
    assert!((z.log_prob - x.log_prob).abs() < 1e-12);
  }

  #[test]
  fn test_add_is_commutative() {
    let x = sample();
    let mut y = ExpectedCounts::new(3);
    y.add_rule(1, 1.0);
    y.add_word(1, "dogs", 2.0);
    y.log_prob = -0.5;

    let mut xy = x.clone();
    xy += &y;
    let mut yx = y.clone();
    yx += &x;

    assert_eq!(xy.rule_counts, yx.rule_counts);
    assert!((xy.word_count(1, "dogs") - yx.word_count(1, "dogs")).abs() < 1e-12);
    assert!((xy.log_prob - yx.log_prob).abs() < 1e-12);
  }

  #[test]
  fn test_subtraction_may_go_negative() {
    let mut x = ExpectedCounts::new(1);
    let mut y = ExpectedCounts::new(1);
    y.add_rule(0, 1.0);
    y.add_word(0, "w", 1.0);
    x -= &y;
    assert_eq!(x.rule_counts[0], -1.0);
    assert_eq!(x.word_count(0, "w"), -1.0);
  }

  #[test]
  fn test_check_finite_catches_nan() {
    let mut x = sample();
    assert!(x.check_finite().is_ok());
    x.add_rule(1, f64::NAN);
    assert!(matches!(x.check_finite(), Err(Error::Degenerate { .. })));
  }
}
