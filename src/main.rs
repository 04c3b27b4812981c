use treeweight::{NoopScorer, best_parse, parse_grammar, sentence_counts};

pub type Err = Box<dyn std::error::Error + 'static>;

const GRAMMAR: &str = r#"
    // a tiny PP-attachment grammar
    1.0 S -> NP VP;
    0.6 VP -> V NP;
    0.4 VP -> VP PP;
    1.0 PP -> P NP;
    0.5 NP -> D N;
    0.2 NP -> NP PP;
    0.3 NP -> alice;

    0.5 D -> the;
    0.5 D -> a;
    0.4 N -> dog;
    0.4 N -> telescope;
    0.2 N -> man;
    1.0 V -> saw;
    1.0 P -> with;
"#;

fn main() -> Result<(), Err> {
    let (grammar, lexicon) = parse_grammar(GRAMMAR)?;

    let sentence = "alice saw the man with a telescope";
    let words = sentence.split(' ').collect::<Vec<_>>();

    let (tree, score) = best_parse(&grammar, &lexicon, &words, &NoopScorer)?;
    println!("best parse ({:.4}):\n{}\n", score, tree);

    let counts = sentence_counts(&grammar, &lexicon, &words, &NoopScorer)?;
    println!("total log probability: {:.4}", counts.log_prob);
    println!("expected rule counts:");
    for rule in 0..grammar.num_rules() {
        if counts.rule_counts[rule] > 0.0 {
            println!("  {:6.4}  {}", counts.rule_counts[rule], grammar.rule_display(rule));
        }
    }

    Ok(())
}
