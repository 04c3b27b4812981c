use crate::chart::Chart;
use crate::error::Error;
use crate::grammar::Grammar;
use crate::inside::build_inside;
use crate::lexicon::Lexicon;
use crate::rules::{Label, Rule};
use crate::scorer::{SpanScorer, sanitize};
use crate::semiring::{NEG_INF, Semiring, Viterbi};
use crate::syntree::{Constituent, SynTree, Word};

/// Parses a sentence under the max semiring and extracts the single best
/// derivation as a tree, along with its log score.
///
/// The chart only stores each cell's best score, so the derivation is
/// rebuilt by re-finding the argmax at each cell on the way down: best
/// closure path at the top layer (using the closure's precomputed best-path
/// rule sequences), best rule and split at the bottom layer, the word at
/// unit spans.
pub fn best_parse<SC: SpanScorer + ?Sized>(
  grammar: &Grammar,
  lexicon: &Lexicon,
  words: &[&str],
  scorer: &SC,
) -> Result<(SynTree, f64), Error> {
  let n = words.len();
  if n == 0 {
    return Err(unparsable(words));
  }
  let chart = build_inside::<Viterbi, _>(grammar, lexicon, words, scorer);
  let best = chart.top(0, n, grammar.root());
  if best == NEG_INF {
    return Err(unparsable(words));
  }

  let tree = rebuild_top(grammar, &chart, words, scorer, 0, n, grammar.root());
  Ok((tree, best))
}

fn unparsable(words: &[&str]) -> Error {
  Error::Unparsable {
    sentence: words.iter().map(|w| w.to_string()).collect(),
  }
}

/// Finds the closure path that produced `top(begin, end, label)` and wraps
/// the bottom-layer subtree in its unary chain.
fn rebuild_top<SC: SpanScorer + ?Sized>(
  grammar: &Grammar,
  chart: &Chart,
  words: &[&str],
  scorer: &SC,
  begin: usize,
  end: usize,
  label: Label,
) -> SynTree {
  let mut best = NEG_INF;
  let mut best_entry = None;
  for entry in grammar.closure().down(label) {
    let bot = chart.bot(begin, end, entry.child);
    if bot == NEG_INF {
      continue;
    }
    let score = Viterbi::closure_score(entry) + bot;
    if score > best {
      best = score;
      best_entry = Some(entry);
    }
  }
  let entry = best_entry.expect("finite top cell without a bottom derivation");

  let mut tree = rebuild_bot(grammar, chart, words, scorer, begin, end, entry.child);
  // wrap the unary chain back up, innermost rule first
  for &rid in entry.path.iter().rev() {
    tree = SynTree::Branch(
      Constituent {
        label: grammar.label(grammar.rule(rid).parent()).to_string(),
        span: (begin, end),
      },
      vec![tree],
    );
  }
  tree
}

/// Finds the lexical entry or binary rule and split that produced
/// `bot(begin, end, label)`.
fn rebuild_bot<SC: SpanScorer + ?Sized>(
  grammar: &Grammar,
  chart: &Chart,
  words: &[&str],
  scorer: &SC,
  begin: usize,
  end: usize,
  label: Label,
) -> SynTree {
  let cons = Constituent {
    label: grammar.label(label).to_string(),
    span: (begin, end),
  };

  if end - begin == 1 {
    return SynTree::Branch(
      cons,
      vec![SynTree::Leaf(Word {
        value: words[begin].to_string(),
        span: (begin, end),
      })],
    );
  }

  let mut best = NEG_INF;
  let mut found = None;
  for &rid in grammar.rules_with_parent(label) {
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
          let candidate = l + r + score + bonus;
          if candidate > best {
            best = candidate;
            found = Some((split, left, right));
          }
        }
      }
      Rule::Unary { .. } => {}
    }
  }

  let (split, left, right) = found.expect("finite bottom cell without a binary derivation");
  SynTree::Branch(
    cons,
    vec![
      rebuild_top(grammar, chart, words, scorer, begin, split, left),
      rebuild_top(grammar, chart, words, scorer, split, end, right),
    ],
  )
}
