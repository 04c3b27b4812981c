use thiserror::Error;

/// Errors for grammar construction, grammar-text parsing, and per-sentence
/// parsing.
///
/// `UnaryCycle` is a fatal configuration error: a cycle of finite-score unary
/// rules assigns unboundedly many derivations to a single span, so no closure
/// can be computed and no chart can be built. `Unparsable` is an ordinary,
/// expected outcome during training, surfaced as its own variant so callers
/// can skip or substitute instead of aborting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
  #[error("grammar syntax error: {0}")]
  GrammarSyntax(String),

  #[error("empty ruleset")]
  EmptyRuleset,

  #[error("rule for {parent} has {arity} children, expected 1 or 2")]
  RuleArity { parent: String, arity: usize },

  #[error("unary rule cycle with finite score: {}", .labels.join(" -> "))]
  UnaryCycle { labels: Vec<String> },

  #[error("no parse for sentence: {}", .sentence.join(" "))]
  Unparsable { sentence: Vec<String> },

  #[error("non-finite value in aggregated counts: {context}")]
  Degenerate { context: String },
}
