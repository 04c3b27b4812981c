use crate::chart::Chart;
use crate::counts::ExpectedCounts;
use crate::grammar::Grammar;
use crate::lexicon::Lexicon;
use crate::rules::Rule;
use crate::scorer::{SpanScorer, SpanVisitor, sanitize};
use crate::semiring::NEG_INF;

/// Combines a completed inside chart and outside chart into expected counts:
/// for every way a rule or lexical emission can be used over the span
/// lattice, the probability of the derivations using it there, normalized by
/// the sentence's total probability.
///
/// Chart arithmetic stays in log space; each occurrence is converted to
/// linear space only at its final `exp(.. - total)`, and exact zeros are
/// filtered there instead of being folded into the accumulators as -inf.
///
/// The caller is responsible for only passing a finite `total`; an
/// unparsable sentence has no expected counts.
pub fn expected_counts<SC, V>(
  grammar: &Grammar,
  lexicon: &Lexicon,
  words: &[&str],
  inside: &Chart,
  outside: &Chart,
  total: f64,
  scorer: &SC,
  visitor: &mut V,
) -> ExpectedCounts
where
  SC: SpanScorer + ?Sized,
  V: SpanVisitor + ?Sized,
{
  debug_assert!(total != NEG_INF);
  let n = words.len();
  let mut counts = ExpectedCounts {
    rule_counts: grammar.zero_rule_vector(),
    word_counts: Default::default(),
    log_prob: total,
  };

  // lexical emissions: bottom layers of the unit spans, tag labels only
  for (i, word) in words.iter().enumerate() {
    for label in 0..grammar.num_labels() {
      if !lexicon.tag_set().contains(label) {
        continue;
      }
      let ib = inside.bot(i, i + 1, label);
      let ob = outside.bot(i, i + 1, label);
      if ib == NEG_INF || ob == NEG_INF {
        continue;
      }
      let count = (ib + ob - total).exp();
      if count != 0.0 {
        counts.add_word(label, word, count);
      }
    }
  }

  // binary rules: every span of length >= 2, every parent with a bottom
  // entry, every feasible split
  for length in 2..=n {
    for begin in 0..=n - length {
      let end = begin + length;
      for parent in 0..grammar.num_labels() {
        let parent_out = outside.bot(begin, end, parent);
        if parent_out == NEG_INF {
          continue;
        }
        let span_bonus = sanitize(scorer.span_bonus(begin, end, parent));
        let mut span_mass = 0.0;

        for &rid in grammar.rules_with_parent(parent) {
          match *grammar.rule(rid) {
            Rule::Binary {
              left, right, score, ..
            } => {
              let mut rule_total = 0.0;
              for split in inside.split_range(begin, end, left, right) {
                let l = inside.top(begin, split, left);
                let r = inside.top(split, end, right);
                if l == NEG_INF || r == NEG_INF {
                  continue;
                }
                let bonus = sanitize(scorer.binary_bonus(begin, split, end, rid));
                let prob = (l + r + parent_out + score + bonus + span_bonus - total).exp();
                if prob == 0.0 {
                  continue;
                }
                visitor.visit_binary(begin, split, end, rid, prob);
                rule_total += prob;
              }
              if rule_total != 0.0 {
                counts.add_rule(rid, rule_total);
                span_mass += rule_total;
              }
            }
            Rule::Unary { .. } => {}
          }
        }

        if span_mass != 0.0 {
          visitor.visit_span(begin, end, parent, span_mass);
        }
      }
    }
  }

  // unary rules: every span, every parent with outside mass at the top
  // layer
  for length in 1..=n {
    for begin in 0..=n - length {
      let end = begin + length;
      for parent in 0..grammar.num_labels() {
        let parent_out = outside.top(begin, end, parent);
        if parent_out == NEG_INF {
          continue;
        }
        for &rid in grammar.rules_with_parent(parent) {
          match *grammar.rule(rid) {
            Rule::Unary { child, score, .. } => {
              let ib = inside.bot(begin, end, child);
              if ib == NEG_INF {
                continue;
              }
              let bonus = sanitize(scorer.unary_bonus(begin, end, rid));
              let prob = (ib + parent_out + score + bonus - total).exp();
              if prob != 0.0 {
                counts.add_rule(rid, prob);
              }
            }
            Rule::Binary { .. } => {}
          }
        }
      }
    }
  }

  counts
}
