/// Simple recursive-descent parsing of weighted grammar files
use regex::Regex;
use std::collections::HashMap;

use crate::error::Error;
use crate::grammar::Grammar;
use crate::lexicon::Lexicon;
use crate::rules::{Label, Rule};

/// Parses a grammar text into a grammar and its lexicon.
///
/// The format is one weighted rule per line-ish unit, `;`-terminated, with
/// `//` comments:
///
/// ```text
/// // the first rule's parent is the root
/// 1.0 S -> NP VP;
/// 0.5 VP -> V;
/// 0.5 V -> run;   // lower-case sole symbol = lexical entry
/// ```
///
/// Weights are probabilities and are stored as their natural log. A rule may
/// have one or two children; a terminal must be the only symbol on the
/// right-hand side.
pub fn parse_grammar(s: &str) -> Result<(Grammar, Lexicon), Error> {
  let (raw, rest) = parse_rules(s)?;
  assert!(rest.is_empty());
  build(raw)
}

#[derive(Debug)]
enum RawSymbol {
  Terminal(String),
  Nonterminal(String),
}

#[derive(Debug)]
struct RawRule {
  weight: f64,
  parent: String,
  rhs: Vec<RawSymbol>,
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), Error>;

fn syntax(msg: String) -> Error {
  Error::GrammarSyntax(msg)
}

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  if let Some(caps) = re.captures(s) {
    let m = caps.get(0).unwrap();
    if m.start() > 0 {
      return (None, s);
    }
    let (_, rest) = s.split_at(m.end());
    (Some(m.as_str()), rest)
  } else {
    (None, s)
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(syntax(format!("couldn't match {} at {:?}", re, s)))
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  let mut iter = s.char_indices().peekable();
  if let Some((_, c1)) = iter.next() {
    if c == c1 {
      let rest = if let Some((idx, _)) = iter.peek() {
        s.split_at(*idx).1
      } else {
        ""
      };
      return (Some(c), rest);
    }
  }
  (None, s)
}

/// Tries to skip 1 or more \s characters and comments
fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE_OR_COMMENT, r"(\s|//.*?(\n|$))+");
  optional_re(&*WHITESPACE_OR_COMMENT, s).1
}

/// Tries to parse a rule weight: a non-negative decimal number
fn parse_weight(s: &str) -> ParseResult<'_, f64> {
  regex_static!(WEIGHT, r"[0-9]+(\.[0-9]+)?([eE]-?[0-9]+)?");
  let (w, s) = needed_re(&*WEIGHT, s).map_err(|e| syntax(format!("rule weight: {}", e)))?;
  let w = w
    .parse::<f64>()
    .map_err(|e| syntax(format!("rule weight: {}", e)))?;
  Ok((w, s))
}

/// Tries to parse a name made of letters, numbers, - and _
fn parse_name(s: &str) -> ParseResult<'_, &str> {
  regex_static!(NAME, r"[a-zA-Z0-9\-_]+");
  needed_re(&*NAME, s).map_err(|e| syntax(format!("name: {}", e)))
}

/// A lower-case first letter marks a terminal
fn parse_symbol(s: &str) -> ParseResult<'_, RawSymbol> {
  let (name, s) = parse_name(s)?;
  let symbol = if name.chars().next().unwrap().is_lowercase() {
    RawSymbol::Terminal(name.to_string())
  } else {
    RawSymbol::Nonterminal(name.to_string())
  };
  Ok((symbol, s))
}

/// Weight, parent, arrow, symbols, terminated by `;`
fn parse_rule(s: &str) -> ParseResult<'_, RawRule> {
  regex_static!(ARROW, "->");

  let (weight, s) = parse_weight(s)?;
  let s = skip_whitespace(s);
  let (parent, s) = parse_symbol(s).map_err(|e| syntax(format!("rule parent: {}", e)))?;
  let parent = match parent {
    RawSymbol::Nonterminal(name) => name,
    RawSymbol::Terminal(w) => {
      return Err(syntax(format!("rule parent must be a nonterminal: {}", w)));
    }
  };
  let s = skip_whitespace(s);
  let (_, s) = needed_re(&*ARROW, s).map_err(|e| syntax(format!("rule arrow: {}", e)))?;

  let mut rhs = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if let (Some(_), s) = optional_char(';', rem) {
      rem = s;
      break;
    }
    let (symbol, s) = parse_symbol(rem).map_err(|e| syntax(format!("rule symbol: {}", e)))?;
    rhs.push(symbol);
    rem = s;
  }

  Ok((
    RawRule {
      weight,
      parent,
      rhs,
    },
    rem,
  ))
}

fn parse_rules(s: &str) -> ParseResult<'_, Vec<RawRule>> {
  let mut rules = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() {
      return Ok((rules, rem));
    }
    let (rule, s) = parse_rule(rem)?;
    rules.push(rule);
    rem = s;
  }
}

/// Interns labels and splits the raw rules into grammar rules and lexical
/// entries. The first rule's parent becomes the root.
fn build(raw: Vec<RawRule>) -> Result<(Grammar, Lexicon), Error> {
  if raw.is_empty() {
    return Err(Error::EmptyRuleset);
  }

  let mut labels: Vec<String> = Vec::new();
  let mut ids: HashMap<String, Label> = HashMap::new();
  let mut intern = |name: &str, labels: &mut Vec<String>| -> Label {
    if let Some(&id) = ids.get(name) {
      id
    } else {
      let id = labels.len();
      labels.push(name.to_string());
      ids.insert(name.to_string(), id);
      id
    }
  };

  for rule in raw.iter() {
    intern(&rule.parent, &mut labels);
    for symbol in rule.rhs.iter() {
      if let RawSymbol::Nonterminal(name) = symbol {
        intern(name, &mut labels);
      }
    }
  }

  let mut rules = Vec::new();
  let mut lexical: Vec<(Label, String, f64)> = Vec::new();
  for rule in raw.iter() {
    let parent = ids[&rule.parent];
    let score = rule.weight.ln();
    match rule.rhs.as_slice() {
      [] => {
        return Err(syntax(format!("rule for {} has no children", rule.parent)));
      }
      [RawSymbol::Terminal(word)] => lexical.push((parent, word.clone(), score)),
      [RawSymbol::Nonterminal(child)] => rules.push(Rule::Unary {
        parent,
        child: ids[child],
        score,
      }),
      [RawSymbol::Nonterminal(left), RawSymbol::Nonterminal(right)] => rules.push(Rule::Binary {
        parent,
        left: ids[left],
        right: ids[right],
        score,
      }),
      rhs if rhs.len() > 2 => {
        return Err(Error::RuleArity {
          parent: rule.parent.clone(),
          arity: rhs.len(),
        });
      }
      _ => {
        return Err(syntax(format!(
          "terminal must be the only right-hand side symbol in rule for {}",
          rule.parent
        )));
      }
    }
  }

  if rules.is_empty() {
    // a lexicon alone can't derive anything above the words
    return Err(Error::EmptyRuleset);
  }

  let root = ids[&raw[0].parent];
  let grammar = Grammar::new(labels, root, rules)?;
  let mut lexicon = Lexicon::new(grammar.num_labels());
  for (tag, word, score) in lexical {
    lexicon.add(tag, &word, score);
  }

  Ok((grammar, lexicon))
}
