use std::fmt;

/// Dense id of a grammar label, `0..Grammar::num_labels()`.
pub type Label = usize;

/// Dense id of a grammar rule, `0..Grammar::num_rules()`.
pub type RuleId = usize;

/// A binarized grammar rule. Scores are log-probabilities.
///
/// The engine only ever sees these two shapes; anything wider is rejected at
/// grammar-construction time, so every consumer can match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
  Binary {
    parent: Label,
    left: Label,
    right: Label,
    score: f64,
  },
  Unary {
    parent: Label,
    child: Label,
    score: f64,
  },
}

impl Rule {
  pub fn parent(&self) -> Label {
    match self {
      Self::Binary { parent, .. } => *parent,
      Self::Unary { parent, .. } => *parent,
    }
  }

  pub fn score(&self) -> f64 {
    match self {
      Self::Binary { score, .. } => *score,
      Self::Unary { score, .. } => *score,
    }
  }

  pub fn is_binary(&self) -> bool {
    match self {
      Self::Binary { .. } => true,
      Self::Unary { .. } => false,
    }
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Binary {
        parent,
        left,
        right,
        score,
      } => write!(f, "#{} -> #{} #{} [{:.4}]", parent, left, right, score),
      Self::Unary {
        parent,
        child,
        score,
      } => write!(f, "#{} -> #{} [{:.4}]", parent, child, score),
    }
  }
}
