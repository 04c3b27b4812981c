use std::collections::HashMap;

use crate::rules::Label;
use crate::semiring::NEG_INF;

/// The set of labels that can tag words, as a bit-set over label ids.
///
/// The engine consults this on every unit span of every sentence, so
/// membership has to be a single load and mask rather than a hash probe.
#[derive(Debug, Clone)]
pub struct TagSet {
  bits: Vec<u64>,
}

impl TagSet {
  pub fn new(num_labels: usize) -> Self {
    Self {
      bits: vec![0; num_labels.div_ceil(64)],
    }
  }

  pub fn insert(&mut self, label: Label) {
    self.bits[label / 64] |= 1 << (label % 64);
  }

  pub fn contains(&self, label: Label) -> bool {
    self.bits[label / 64] & (1 << (label % 64)) != 0
  }
}

/// Word-emission scores for tag labels, sparse by construction: most labels
/// never tag most words, so entries exist only where the lexicon saw one.
#[derive(Debug, Clone)]
pub struct Lexicon {
  tags: TagSet,
  emissions: HashMap<String, Vec<(Label, f64)>>,
}

impl Lexicon {
  pub fn new(num_labels: usize) -> Self {
    Self {
      tags: TagSet::new(num_labels),
      emissions: HashMap::new(),
    }
  }

  pub fn add(&mut self, tag: Label, word: &str, score: f64) {
    self.tags.insert(tag);
    self
      .emissions
      .entry(word.to_string())
      .or_default()
      .push((tag, score));
  }

  pub fn tag_set(&self) -> &TagSet {
    &self.tags
  }

  /// Every `(tag, score)` pair the lexicon has for `word`. Empty for unknown
  /// words.
  pub fn emissions(&self, word: &str) -> &[(Label, f64)] {
    self.emissions.get(word).map(Vec::as_slice).unwrap_or(&[])
  }

  /// The emission score of `tag -> word`, or -inf if `tag` can't tag it.
  pub fn emission_score(&self, tag: Label, word: &str) -> f64 {
    self
      .emissions(word)
      .iter()
      .find(|&&(t, _)| t == tag)
      .map(|&(_, s)| s)
      .unwrap_or(NEG_INF)
  }
}
