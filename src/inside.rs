use tracing::debug;

use crate::chart::Chart;
use crate::grammar::Grammar;
use crate::lexicon::Lexicon;
use crate::rules::Rule;
use crate::scorer::{SpanScorer, sanitize};
use crate::semiring::{NEG_INF, Semiring};

/// Fills an inside chart bottom-up: unit spans from the lexicon, longer
/// spans by combining binary rules over every feasible split, unary closure
/// on top of every span.
///
/// Under `LogProb` each top cell holds the log of the summed probability of
/// all derivations of that label over that span; under `Viterbi` the log of
/// the single best one. `inside.top(0, n, root)` is the sentence's total
/// score, -inf when the grammar and lexicon can't generate the sentence.
pub fn build_inside<S: Semiring, SC: SpanScorer + ?Sized>(
  grammar: &Grammar,
  lexicon: &Lexicon,
  words: &[&str],
  scorer: &SC,
) -> Chart {
  let n = words.len();
  let mut chart = Chart::new(n, grammar.num_labels());
  debug!(n, "building inside chart");

  for (i, word) in words.iter().enumerate() {
    for &(tag, emit) in lexicon.emissions(word) {
      let score = emit + sanitize(scorer.span_bonus(i, i + 1, tag));
      if score != NEG_INF {
        chart.set_bot(i, i + 1, tag, score);
      }
    }
    apply_closure::<S>(grammar, &mut chart, i, i + 1);
  }

  for length in 2..=n {
    for begin in 0..=n - length {
      let end = begin + length;
      for parent in 0..grammar.num_labels() {
        let mut acc = S::ZERO;
        for &rid in grammar.rules_with_parent(parent) {
          match *grammar.rule(rid) {
            Rule::Binary {
              left, right, score, ..
            } => {
              for split in chart.split_range(begin, end, left, right) {
                let l = chart.top(begin, split, left);
                let r = chart.top(split, end, right);
                if l == NEG_INF || r == NEG_INF {
                  continue;
                }
                let bonus = sanitize(scorer.binary_bonus(begin, split, end, rid));
                acc = S::plus(acc, l + r + score + bonus);
              }
            }
            Rule::Unary { .. } => {}
          }
        }
        if acc != NEG_INF {
          let score = acc + sanitize(scorer.span_bonus(begin, end, parent));
          if score != NEG_INF {
            chart.set_bot(begin, end, parent, score);
          }
        }
      }
      apply_closure::<S>(grammar, &mut chart, begin, end);
    }
  }

  chart
}

/// Lifts a span's bottom entries to its top layer through the precomputed
/// unary closure.
fn apply_closure<S: Semiring>(grammar: &Grammar, chart: &mut Chart, begin: usize, end: usize) {
  for parent in 0..grammar.num_labels() {
    let mut acc = S::ZERO;
    for entry in grammar.closure().down(parent) {
      let bot = chart.bot(begin, end, entry.child);
      if bot != NEG_INF {
        acc = S::plus(acc, S::closure_score(entry) + bot);
      }
    }
    if acc != NEG_INF {
      chart.set_top(begin, end, parent, acc);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_grammar::parse_grammar;
  use crate::rules::{Label, RuleId};
  use crate::scorer::NoopScorer;
  use crate::semiring::{LogProb, Viterbi};

  #[test]
  fn test_unit_span_normalization() {
    // C -> A covers A's mass again at C, so the three length-1 parses are
    // A (0.4), B (0.6), and C over A (0.4)
    let (g, lex) = parse_grammar(
      r#"
        1.0 C -> A;
        0.4 A -> w;
        0.6 B -> w;
      "#,
    )
    .unwrap();

    let chart = build_inside::<LogProb, _>(&g, &lex, &["w"], &NoopScorer);
    let mass: f64 = (0..g.num_labels())
      .map(|l| chart.top(0, 1, l))
      .filter(|&s| s != NEG_INF)
      .map(f64::exp)
      .sum();
    assert!((mass - 1.4).abs() < 1e-12);
  }

  #[test]
  fn test_top_dominates_bot() {
    let (g, lex) = parse_grammar(
      r#"
        1.0 S -> NP VP;
        1.0 VP -> V;
        1.0 V -> run;
        1.0 NP -> dogs;
      "#,
    )
    .unwrap();
    let chart = build_inside::<LogProb, _>(&g, &lex, &["dogs", "run"], &NoopScorer);

    for begin in 0..2 {
      for end in begin + 1..=2 {
        for l in 0..g.num_labels() {
          assert!(chart.top(begin, end, l) >= chart.bot(begin, end, l));
        }
      }
    }
  }

  #[test]
  fn test_total_matches_hand_computed_sum() {
    // "x x x" has two binary bracketings; each derivation uses S -> S S
    // twice (0.5^2) and S -> x three times (0.5^3), so the total is
    // 2 * 0.5^5 = 0.0625
    let (g, lex) = parse_grammar(
      r#"
        0.5 S -> S S;
        0.5 S -> x;
      "#,
    )
    .unwrap();

    let chart = build_inside::<LogProb, _>(&g, &lex, &["x", "x", "x"], &NoopScorer);
    let total = chart.top(0, 3, g.root());
    assert!((total.exp() - 0.0625).abs() < 1e-9);

    // under Viterbi the same cell holds one derivation's score
    let chart = build_inside::<Viterbi, _>(&g, &lex, &["x", "x", "x"], &NoopScorer);
    let best = chart.top(0, 3, g.root());
    assert!((best.exp() - 0.03125).abs() < 1e-9);
  }

  #[test]
  fn test_unparsable_sentence_has_empty_root() {
    let (g, lex) = parse_grammar(
      r#"
        1.0 S -> NP VP;
        1.0 VP -> V;
        1.0 V -> run;
        1.0 NP -> dogs;
      "#,
    )
    .unwrap();
    let chart = build_inside::<LogProb, _>(&g, &lex, &["dogs", "bark"], &NoopScorer);
    assert_eq!(chart.top(0, 2, g.root()), NEG_INF);
  }

  struct VetoSpan {
    begin: usize,
    end: usize,
    label: Label,
  }

  impl SpanScorer for VetoSpan {
    fn span_bonus(&self, begin: usize, end: usize, label: Label) -> f64 {
      if (begin, end, label) == (self.begin, self.end, self.label) {
        NEG_INF
      } else {
        0.0
      }
    }
  }

  #[test]
  fn test_span_veto_blocks_parse() {
    let (g, lex) = parse_grammar(
      r#"
        1.0 S -> NP VP;
        1.0 VP -> V;
        1.0 V -> run;
        1.0 NP -> dogs;
      "#,
    )
    .unwrap();
    let veto = VetoSpan {
      begin: 0,
      end: 1,
      label: g.label_id("NP").unwrap(),
    };
    let chart = build_inside::<LogProb, _>(&g, &lex, &["dogs", "run"], &veto);
    assert_eq!(chart.top(0, 2, g.root()), NEG_INF);
  }

  struct NanScorer;

  impl SpanScorer for NanScorer {
    fn binary_bonus(&self, _begin: usize, _split: usize, _end: usize, _rule: RuleId) -> f64 {
      f64::NAN
    }
  }

  #[test]
  fn test_nan_bonus_is_a_veto_not_a_poison() {
    let (g, lex) = parse_grammar(
      r#"
        1.0 S -> NP VP;
        1.0 VP -> V;
        1.0 V -> run;
        1.0 NP -> dogs;
      "#,
    )
    .unwrap();
    let chart = build_inside::<LogProb, _>(&g, &lex, &["dogs", "run"], &NanScorer);
    // the binary rule is vetoed, and nothing in the chart is NaN
    assert_eq!(chart.top(0, 2, g.root()), NEG_INF);
    for begin in 0..2 {
      for end in begin + 1..=2 {
        for l in 0..g.num_labels() {
          assert!(!chart.top(begin, end, l).is_nan());
          assert!(!chart.bot(begin, end, l).is_nan());
        }
      }
    }
  }
}
