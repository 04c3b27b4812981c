use std::fmt;

/// A labeled constituent over a span.
#[derive(Debug, PartialEq, Clone)]
pub struct Constituent {
  pub label: String,
  pub span: (usize, usize),
}

impl fmt::Display for Constituent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.label)
  }
}

/// A word at a position.
#[derive(Debug, PartialEq, Clone)]
pub struct Word {
  pub value: String,
  pub span: (usize, usize),
}

impl fmt::Display for Word {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}: {}", self.span.0, self.span.1, self.value)
  }
}

/// A syntax tree over a sentence: branches are grammar labels, leaves are
/// the words themselves.
#[derive(Debug, PartialEq, Clone)]
pub enum SynTree {
  Branch(Constituent, Vec<SynTree>),
  Leaf(Word),
}

impl SynTree {
  pub fn is_leaf(&self) -> bool {
    match self {
      Self::Leaf(_) => true,
      _ => false,
    }
  }

  pub fn get_leaf(&self) -> Option<&Word> {
    match self {
      Self::Leaf(w) => Some(w),
      _ => None,
    }
  }

  pub fn get_branch(&self) -> Option<(&Constituent, &Vec<SynTree>)> {
    match self {
      Self::Branch(c, cs) => Some((c, cs)),
      _ => None,
    }
  }

  /// The constituent label or word at the root of this subtree.
  pub fn symbol(&self) -> &str {
    match self {
      Self::Branch(c, _) => &c.label,
      Self::Leaf(w) => &w.value,
    }
  }
}

impl fmt::Display for SynTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(w) => write!(f, "{}", w),
      Self::Branch(c, children) => {
        write!(f, "({}", c)?;
        if children.len() == 1 && children[0].is_leaf() {
          write!(f, " ({}))", children[0])
        } else {
          for child in children.iter() {
            let fmt = format!("{}", child);
            for line in fmt.lines() {
              write!(f, "\n  {}", line)?;
            }
          }
          write!(f, ")")
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn leaf(value: &str, at: usize) -> SynTree {
    SynTree::Leaf(Word {
      value: value.to_string(),
      span: (at, at + 1),
    })
  }

  #[test]
  fn test_accessors() {
    let tree = SynTree::Branch(
      Constituent {
        label: "NP".to_string(),
        span: (0, 1),
      },
      vec![leaf("dogs", 0)],
    );

    assert!(!tree.is_leaf());
    assert_eq!(tree.symbol(), "NP");
    let (cons, children) = tree.get_branch().unwrap();
    assert_eq!(cons.span, (0, 1));
    assert_eq!(children[0].get_leaf().unwrap().value, "dogs");
  }

  #[test]
  fn test_display_nests() {
    let tree = SynTree::Branch(
      Constituent {
        label: "S".to_string(),
        span: (0, 2),
      },
      vec![
        SynTree::Branch(
          Constituent {
            label: "NP".to_string(),
            span: (0, 1),
          },
          vec![leaf("dogs", 0)],
        ),
        SynTree::Branch(
          Constituent {
            label: "VP".to_string(),
            span: (1, 2),
          },
          vec![leaf("run", 1)],
        ),
      ],
    );
    let s = format!("{}", tree);
    assert!(s.contains("0..2: S"));
    assert!(s.contains("0..1: dogs"));
  }
}
