use rayon::prelude::*;
use tracing::warn;

use crate::counts::ExpectedCounts;
use crate::error::Error;
use crate::grammar::Grammar;
use crate::inside::build_inside;
use crate::insideout::expected_counts;
use crate::lexicon::Lexicon;
use crate::outside::build_outside;
use crate::scorer::{NoopVisitor, SpanScorer};
use crate::semiring::{LogProb, NEG_INF};

/// Builds both charts for one sentence and extracts its expected counts.
///
/// An unparsable sentence (total probability -inf, including the empty
/// sentence) comes back as `Error::Unparsable` so callers can tell it apart
/// from configuration errors and decide to skip, log, or substitute.
pub fn sentence_counts<SC: SpanScorer + ?Sized>(
  grammar: &Grammar,
  lexicon: &Lexicon,
  words: &[&str],
  scorer: &SC,
) -> Result<ExpectedCounts, Error> {
  if words.is_empty() {
    return Err(Error::Unparsable { sentence: vec![] });
  }

  let inside = build_inside::<LogProb, _>(grammar, lexicon, words, scorer);
  let total = inside.top(0, words.len(), grammar.root());
  if total == NEG_INF {
    return Err(Error::Unparsable {
      sentence: words.iter().map(|w| w.to_string()).collect(),
    });
  }

  let outside = build_outside::<LogProb, _>(grammar, &inside, scorer);
  Ok(expected_counts(
    grammar,
    lexicon,
    words,
    &inside,
    &outside,
    total,
    scorer,
    &mut NoopVisitor,
  ))
}

/// Aggregate of a corpus pass: the summed counts of every sentence that
/// parsed, plus which ones didn't.
#[derive(Debug)]
pub struct CorpusCounts {
  pub counts: ExpectedCounts,
  /// sentences that parsed and contributed to `counts`
  pub parsed: usize,
  /// indices of sentences with no derivation, in input order
  pub failures: Vec<usize>,
}

/// Parses every sentence and sums their expected counts.
///
/// Sentences are independent given the read-only grammar and lexicon, so the
/// fan-out is a plain parallel map; each task owns its charts and local
/// counts, and the merge is the algebra's associative `+=` in a parallel
/// reduction. Unparsable sentences are counted, warned about, and excluded
/// from the sum. A degenerate aggregate (NaN or infinity) fails the whole
/// pass, since it would otherwise poison the consuming training iteration.
pub fn corpus_counts<SC: SpanScorer + Sync + ?Sized>(
  grammar: &Grammar,
  lexicon: &Lexicon,
  sentences: &[Vec<String>],
  scorer: &SC,
) -> Result<CorpusCounts, Error> {
  let zero = || {
    (
      ExpectedCounts::new(grammar.num_rules()),
      0usize,
      Vec::new(),
    )
  };

  let (counts, parsed, mut failures) = sentences
    .par_iter()
    .enumerate()
    .map(|(idx, sentence)| {
      let words: Vec<&str> = sentence.iter().map(String::as_str).collect();
      match sentence_counts(grammar, lexicon, &words, scorer) {
        Ok(counts) => (counts, 1, Vec::new()),
        Err(err) => {
          warn!(idx, %err, "skipping sentence");
          (ExpectedCounts::new(grammar.num_rules()), 0, vec![idx])
        }
      }
    })
    .reduce(zero, |mut acc, item| {
      acc.0 += &item.0;
      acc.1 += item.1;
      acc.2.extend(item.2);
      acc
    });

  failures.sort_unstable();
  counts.check_finite()?;

  Ok(CorpusCounts {
    counts,
    parsed,
    failures,
  })
}
