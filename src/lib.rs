#[macro_use]
extern crate lazy_static;

pub mod chart;
pub mod closure;
pub mod corpus;
pub mod counts;
pub mod error;
pub mod grammar;
pub mod inside;
pub mod insideout;
pub mod lexicon;
pub mod outside;
pub mod parse_grammar;
pub mod rules;
pub mod scorer;
pub mod semiring;
pub mod syntree;
pub mod viterbi;

pub use crate::chart::Chart;
pub use crate::corpus::{CorpusCounts, corpus_counts, sentence_counts};
pub use crate::counts::ExpectedCounts;
pub use crate::error::Error;
pub use crate::grammar::Grammar;
pub use crate::inside::build_inside;
pub use crate::insideout::expected_counts;
pub use crate::lexicon::Lexicon;
pub use crate::outside::build_outside;
pub use crate::parse_grammar::parse_grammar;
pub use crate::rules::{Label, Rule, RuleId};
pub use crate::scorer::{NoopScorer, NoopVisitor, SpanScorer, SpanVisitor};
pub use crate::semiring::{LogProb, Semiring, Viterbi};
pub use crate::syntree::SynTree;
pub use crate::viterbi::best_parse;

#[test]
fn test_train_and_decode_end_to_end() {
  let (grammar, lexicon) = parse_grammar(
    r#"
      1.0 S -> NP VP;
      0.5 VP -> V NP;
      0.5 VP -> V;
      0.5 NP -> dogs;
      0.5 NP -> cats;
      0.5 V -> chase;
      0.5 V -> run;
    "#,
  )
  .unwrap();

  let sentences: Vec<Vec<String>> = ["dogs run", "dogs chase cats", "cats run"]
    .iter()
    .map(|s| s.split(' ').map(str::to_string).collect())
    .collect();

  let result = corpus_counts(&grammar, &lexicon, &sentences, &NoopScorer).unwrap();
  assert_eq!(result.parsed, 3);
  assert!(result.failures.is_empty());

  // every sentence uses S -> NP VP exactly once
  let s = grammar.label_id("S").unwrap();
  let s_rule = grammar.rules_with_parent(s)[0];
  assert!((result.counts.rule_counts[s_rule] - 3.0).abs() < 1e-9);

  // "chase" appears once, as a V
  let v = grammar.label_id("V").unwrap();
  assert!((result.counts.word_count(v, "chase") - 1.0).abs() < 1e-9);

  let words = ["dogs", "chase", "cats"];
  let (tree, score) = best_parse(&grammar, &lexicon, &words, &NoopScorer).unwrap();
  assert_eq!(tree.symbol(), "S");
  assert!((score - (0.5f64.powi(4)).ln()).abs() < 1e-9);
}
