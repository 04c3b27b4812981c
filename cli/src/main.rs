use std::env;
use std::fs;
use std::io::{self, BufRead};

use tracing::info;
use tracing_subscriber::EnvFilter;

use treeweight::{NoopScorer, best_parse, corpus_counts, parse_grammar};

type Err = Box<dyn std::error::Error + 'static>;

/// Loads a grammar file, parses one sentence per stdin line, and prints the
/// best tree for each plus the corpus-level expected counts at the end.
fn main() -> Result<(), Err> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = env::args().nth(1).ok_or("usage: cli <grammar-file>")?;
    let src = fs::read_to_string(&path)?;
    let (grammar, lexicon) = parse_grammar(&src)?;
    info!(
        labels = grammar.num_labels(),
        rules = grammar.num_rules(),
        "loaded grammar"
    );

    let mut sentences = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let words = line.split_whitespace().map(str::to_string).collect::<Vec<_>>();
        if words.is_empty() {
            continue;
        }

        let refs = words.iter().map(String::as_str).collect::<Vec<_>>();
        match best_parse(&grammar, &lexicon, &refs, &NoopScorer) {
            Ok((tree, score)) => println!("{:.4}\n{}", score, tree),
            Err(e) => eprintln!("{}", e),
        }
        sentences.push(words);
    }

    let result = corpus_counts(&grammar, &lexicon, &sentences, &NoopScorer)?;
    println!(
        "\nparsed {}/{} sentences, log-likelihood {:.4}",
        result.parsed,
        sentences.len(),
        result.counts.log_prob
    );
    println!("expected rule counts:");
    for rule in 0..grammar.num_rules() {
        if result.counts.rule_counts[rule] > 0.0 {
            println!(
                "  {:8.4}  {}",
                result.counts.rule_counts[rule],
                grammar.rule_display(rule)
            );
        }
    }

    Ok(())
}
