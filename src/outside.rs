use tracing::debug;

use crate::chart::Chart;
use crate::grammar::Grammar;
use crate::rules::Rule;
use crate::scorer::{SpanScorer, sanitize};
use crate::semiring::{NEG_INF, Semiring};

/// Fills an outside chart top-down against a completed inside chart.
///
/// `outside.top(begin, end, a)` is the mass of everything outside the span
/// when `a` covers it at the post-closure layer; `outside.bot` the same at
/// the pre-closure layer. The root's whole-sentence top cell starts at the
/// log-identity, and every span's mass flows down through the reverse unary
/// closure and then out to binary children, enumerating exactly the splits
/// the inside pass enumerated so that every inside contribution has a
/// matching outside contribution.
pub fn build_outside<S: Semiring, SC: SpanScorer + ?Sized>(
  grammar: &Grammar,
  inside: &Chart,
  scorer: &SC,
) -> Chart {
  let n = inside.len();
  let mut outside = Chart::new(n, grammar.num_labels());
  debug!(n, "building outside chart");
  outside.set_top(0, n, grammar.root(), S::ONE);

  for length in (1..=n).rev() {
    for begin in 0..=n - length {
      let end = begin + length;

      // reverse unary closure: a bottom label's outside mass is everything
      // outside the span via any ancestor in the same span
      for child in 0..grammar.num_labels() {
        if inside.bot(begin, end, child) == NEG_INF {
          continue;
        }
        let mut acc = S::ZERO;
        for (ancestor, entry) in grammar.closure().ancestors(child) {
          let top = outside.top(begin, end, ancestor);
          if top != NEG_INF {
            acc = S::plus(acc, S::closure_score(entry) + top);
          }
        }
        if acc != NEG_INF {
          outside.set_bot(begin, end, child, acc);
        }
      }

      if length == 1 {
        continue;
      }

      // distribute each parent's outside-bottom mass to its binary
      // children, weighted by the sibling's inside mass
      for parent in 0..grammar.num_labels() {
        let parent_out = outside.bot(begin, end, parent);
        if parent_out == NEG_INF || inside.bot(begin, end, parent) == NEG_INF {
          continue;
        }
        let span_bonus = sanitize(scorer.span_bonus(begin, end, parent));
        if span_bonus == NEG_INF {
          continue;
        }
        let parent_out = parent_out + span_bonus;

        for &rid in grammar.rules_with_parent(parent) {
          match *grammar.rule(rid) {
            Rule::Binary {
              left, right, score, ..
            } => {
              for split in inside.split_range(begin, end, left, right) {
                let l = inside.top(begin, split, left);
                let r = inside.top(split, end, right);
                if l == NEG_INF || r == NEG_INF {
                  continue;
                }
                let bonus = sanitize(scorer.binary_bonus(begin, split, end, rid));
                if bonus == NEG_INF {
                  continue;
                }
                let base = parent_out + score + bonus;

                let cur = outside.top(begin, split, left);
                outside.set_top(begin, split, left, S::plus(cur, base + r));
                let cur = outside.top(split, end, right);
                outside.set_top(split, end, right, S::plus(cur, base + l));
              }
            }
            Rule::Unary { .. } => {}
          }
        }
      }
    }
  }

  outside
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::inside::build_inside;
  use crate::parse_grammar::parse_grammar;
  use crate::scorer::NoopScorer;
  use crate::semiring::LogProb;

  const TOY: &str = r#"
    1.0 S -> NP VP;
    1.0 VP -> V;
    1.0 V -> run;
    1.0 NP -> dogs;
  "#;

  #[test]
  fn test_root_outside_is_identity() {
    let (g, lex) = parse_grammar(TOY).unwrap();
    let inside = build_inside::<LogProb, _>(&g, &lex, &["dogs", "run"], &NoopScorer);
    let outside = build_outside::<LogProb, _>(&g, &inside, &NoopScorer);
    assert_eq!(outside.top(0, 2, g.root()), 0.0);
  }

  #[test]
  fn test_inside_outside_duality() {
    // for every span and label, exp(inside.top + outside.top - total) is the
    // probability that some derivation puts the label over exactly that
    // span, which must be a probability
    let (g, lex) = parse_grammar(
      r#"
        0.5 S -> S S;
        0.5 S -> x;
      "#,
    )
    .unwrap();
    let words = ["x", "x", "x"];
    let inside = build_inside::<LogProb, _>(&g, &lex, &words, &NoopScorer);
    let outside = build_outside::<LogProb, _>(&g, &inside, &NoopScorer);
    let total = inside.top(0, 3, g.root());
    assert!(total != NEG_INF);

    for begin in 0..3 {
      for end in begin + 1..=3 {
        for l in 0..g.num_labels() {
          let it = inside.top(begin, end, l);
          let ot = outside.top(begin, end, l);
          if it == NEG_INF || ot == NEG_INF {
            continue;
          }
          let marginal = (it + ot - total).exp();
          assert!(
            (-1e-9..=1.0 + 1e-9).contains(&marginal),
            "marginal {} out of range at {}..{} #{}",
            marginal,
            begin,
            end,
            l
          );
        }
      }
    }

    // the root over the whole sentence is certain
    let root_marginal = (inside.top(0, 3, g.root()) + outside.top(0, 3, g.root()) - total).exp();
    assert!((root_marginal - 1.0).abs() < 1e-9);
  }

  #[test]
  fn test_outside_mirrors_inside_through_unaries() {
    let (g, lex) = parse_grammar(TOY).unwrap();
    let inside = build_inside::<LogProb, _>(&g, &lex, &["dogs", "run"], &NoopScorer);
    let outside = build_outside::<LogProb, _>(&g, &inside, &NoopScorer);
    let total = inside.top(0, 2, g.root());

    let v = g.label_id("V").unwrap();
    let np = g.label_id("NP").unwrap();

    // "run" is V in the only derivation: unit-span marginal at the bottom
    // layer must be exactly 1
    let m = (inside.bot(1, 2, v) + outside.bot(1, 2, v) - total).exp();
    assert!((m - 1.0).abs() < 1e-9);
    let m = (inside.bot(0, 1, np) + outside.bot(0, 1, np) - total).exp();
    assert!((m - 1.0).abs() < 1e-9);

    // V never gets outside mass at the top layer: nothing above it but the
    // unary to VP, which feeds its bottom layer instead
    assert_eq!(outside.top(1, 2, v), NEG_INF);
  }
}
