use crate::error::Error;
use crate::rules::{Label, Rule, RuleId};
use crate::semiring::{NEG_INF, log_add_exp};

/// One label reachable from a parent in the unary closure.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureEntry {
  pub child: Label,
  /// Log-sum over every unary path from the parent down to `child`.
  pub mass: f64,
  /// Score of the single best path.
  pub best: f64,
  /// Rule ids of the best path, topmost rule first. Empty for the identity
  /// path (`child` is the parent itself).
  pub path: Vec<RuleId>,
}

/// The reflexive-transitive closure of the grammar's unary rules,
/// precomputed once per grammar.
///
/// `down(a)` lists every label reachable from `a` by zero or more unary
/// rules, so a bottom label's mass reaches any ancestor in one lookup;
/// `ancestors(b)` walks the same entries in the opposite direction for the
/// outside pass. Construction fails if the finite-score unary edges contain
/// a cycle, since closure mass would diverge.
#[derive(Debug, Clone)]
pub struct UnaryClosure {
  down: Vec<Vec<ClosureEntry>>,
  /// `(ancestor, index into down[ancestor])` pairs, keyed by child label.
  up: Vec<Vec<(Label, usize)>>,
}

impl UnaryClosure {
  pub fn build(num_labels: usize, rules: &[Rule], names: &[String]) -> Result<Self, Error> {
    // adjacency of finite-score unary edges: parent -> (child, score, rule)
    let mut edges: Vec<Vec<(Label, f64, RuleId)>> = vec![Vec::new(); num_labels];
    for (rid, rule) in rules.iter().enumerate() {
      if let Rule::Unary {
        parent,
        child,
        score,
      } = *rule
      {
        if score != NEG_INF {
          edges[parent].push((child, score, rid));
        }
      }
    }

    let order = toposort(num_labels, &edges, names)?;

    // children come before parents in `order`, so each parent can extend its
    // children's finished closures
    let mut down: Vec<Vec<ClosureEntry>> = vec![Vec::new(); num_labels];
    for &a in order.iter() {
      let mut entries = vec![ClosureEntry {
        child: a,
        mass: 0.0,
        best: 0.0,
        path: Vec::new(),
      }];
      for &(b, score, rid) in edges[a].iter() {
        for e in down[b].iter() {
          let mass = score + e.mass;
          let best = score + e.best;
          match entries.iter_mut().find(|x| x.child == e.child) {
            Some(existing) => {
              existing.mass = log_add_exp(existing.mass, mass);
              if best > existing.best {
                existing.best = best;
                existing.path = std::iter::once(rid).chain(e.path.iter().copied()).collect();
              }
            }
            None => entries.push(ClosureEntry {
              child: e.child,
              mass,
              best,
              path: std::iter::once(rid).chain(e.path.iter().copied()).collect(),
            }),
          }
        }
      }
      down[a] = entries;
    }

    let mut up: Vec<Vec<(Label, usize)>> = vec![Vec::new(); num_labels];
    for a in 0..num_labels {
      for (idx, e) in down[a].iter().enumerate() {
        up[e.child].push((a, idx));
      }
    }

    Ok(Self { down, up })
  }

  /// Labels reachable from `parent` by zero or more unary rules.
  pub fn down(&self, parent: Label) -> &[ClosureEntry] {
    &self.down[parent]
  }

  /// Labels that reach `child` by zero or more unary rules, with the
  /// corresponding closure entries.
  pub fn ancestors(&self, child: Label) -> impl Iterator<Item = (Label, &ClosureEntry)> {
    self.up[child]
      .iter()
      .map(|&(a, idx)| (a, &self.down[a][idx]))
  }
}

/// Orders labels so that every unary child precedes its parents, or reports
/// the offending cycle.
fn toposort(
  num_labels: usize,
  edges: &[Vec<(Label, f64, RuleId)>],
  names: &[String],
) -> Result<Vec<Label>, Error> {
  const WHITE: u8 = 0;
  const GRAY: u8 = 1;
  const BLACK: u8 = 2;

  let mut color = vec![WHITE; num_labels];
  let mut order = Vec::with_capacity(num_labels);

  fn visit(
    a: Label,
    edges: &[Vec<(Label, f64, RuleId)>],
    color: &mut [u8],
    order: &mut Vec<Label>,
    trail: &mut Vec<Label>,
    names: &[String],
  ) -> Result<(), Error> {
    color[a] = GRAY;
    trail.push(a);
    for &(b, _, _) in edges[a].iter() {
      match color[b] {
        BLACK => {}
        WHITE => visit(b, edges, color, order, trail, names)?,
        _ => {
          // gray: `b` is on the current trail, so we found a cycle
          let start = trail.iter().position(|&l| l == b).unwrap();
          let mut labels: Vec<String> = trail[start..].iter().map(|&l| names[l].clone()).collect();
          labels.push(names[b].clone());
          return Err(Error::UnaryCycle { labels });
        }
      }
    }
    trail.pop();
    color[a] = BLACK;
    order.push(a);
    Ok(())
  }

  for a in 0..num_labels {
    if color[a] == WHITE {
      let mut trail = Vec::new();
      visit(a, edges, &mut color, &mut order, &mut trail, names)?;
    }
  }

  Ok(order)
}

#[cfg(test)]
fn names(n: usize) -> Vec<String> {
  (0..n).map(|i| format!("L{}", i)).collect()
}

#[test]
fn test_identity_entries() {
  let closure = UnaryClosure::build(2, &[], &names(2)).unwrap();
  for a in 0..2 {
    assert_eq!(closure.down(a).len(), 1);
    assert_eq!(closure.down(a)[0].child, a);
    assert_eq!(closure.down(a)[0].mass, 0.0);
    assert!(closure.down(a)[0].path.is_empty());
  }
}

#[test]
fn test_chain_closure() {
  // 0 -> 1 (0.5), 1 -> 2 (0.5): closure 0 ~> 2 has mass ln(0.25)
  let rules = vec![
    Rule::Unary {
      parent: 0,
      child: 1,
      score: 0.5f64.ln(),
    },
    Rule::Unary {
      parent: 1,
      child: 2,
      score: 0.5f64.ln(),
    },
  ];
  let closure = UnaryClosure::build(3, &rules, &names(3)).unwrap();

  let e = closure.down(0).iter().find(|e| e.child == 2).unwrap();
  assert!((e.mass - 0.25f64.ln()).abs() < 1e-12);
  assert!((e.best - 0.25f64.ln()).abs() < 1e-12);
  assert_eq!(e.path, vec![0, 1]);

  let ancestors: Vec<Label> = closure.ancestors(2).map(|(a, _)| a).collect();
  assert!(ancestors.contains(&0) && ancestors.contains(&1) && ancestors.contains(&2));
}

#[test]
fn test_parallel_paths_sum() {
  // two paths 0 ~> 2: direct (0.08) and through 1 (0.2 * 0.5)
  let rules = vec![
    Rule::Unary {
      parent: 0,
      child: 2,
      score: 0.08f64.ln(),
    },
    Rule::Unary {
      parent: 0,
      child: 1,
      score: 0.2f64.ln(),
    },
    Rule::Unary {
      parent: 1,
      child: 2,
      score: 0.5f64.ln(),
    },
  ];
  let closure = UnaryClosure::build(3, &rules, &names(3)).unwrap();
  let e = closure.down(0).iter().find(|e| e.child == 2).unwrap();
  assert!((e.mass - 0.18f64.ln()).abs() < 1e-12);
  // the best single path is the through-1 one
  assert!((e.best - 0.1f64.ln()).abs() < 1e-9);
  assert_eq!(e.path, vec![1, 2]);
}

#[test]
fn test_cycle_is_rejected() {
  let rules = vec![
    Rule::Unary {
      parent: 0,
      child: 1,
      score: 0.5f64.ln(),
    },
    Rule::Unary {
      parent: 1,
      child: 0,
      score: 0.5f64.ln(),
    },
  ];
  match UnaryClosure::build(2, &rules, &names(2)) {
    Err(Error::UnaryCycle { labels }) => assert!(labels.len() >= 2),
    other => panic!("expected cycle error, got {:?}", other),
  }
}

#[test]
fn test_zero_weight_cycle_is_fine() {
  // a -inf edge can't carry mass, so it doesn't count as a cycle
  let rules = vec![
    Rule::Unary {
      parent: 0,
      child: 1,
      score: 0.5f64.ln(),
    },
    Rule::Unary {
      parent: 1,
      child: 0,
      score: NEG_INF,
    },
  ];
  assert!(UnaryClosure::build(2, &rules, &names(2)).is_ok());
}
