use cfg_derive::{Config, Derivation, Deriver, Generator, Grammar, RandomWalk};
use clap::Parser;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sample strings from a context-free grammar and search for derivations
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the grammar definition file
    #[arg(help = "Path to the grammar definition file")]
    grammar_file: PathBuf,

    /// Find and print a derivation of this string
    #[arg(short, long, value_name = "STRING")]
    derive: Option<String>,

    /// Only report whether this string is derivable
    #[arg(short, long, value_name = "STRING")]
    recognize: Option<String>,

    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with generator and search limits
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the derivation depth limit
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Disable memoization of failed forms
    #[arg(long)]
    no_memo: bool,

    /// Print a single JSON report instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct DeriveReport<'a> {
    target: &'a str,
    derivable: bool,
    derivation: Option<&'a Derivation>,
}

#[derive(Serialize)]
struct RecognizeReport<'a> {
    target: &'a str,
    recognized: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    generated: &'a [String],
    derive: Option<DeriveReport<'a>>,
    recognize: Option<RecognizeReport<'a>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if let Some(max_depth) = cli.max_depth {
        config.search.max_depth = max_depth;
    }
    if cli.no_memo {
        config.search.memoize = false;
    }

    let grammar = Grammar::from_file(&cli.grammar_file)?;
    if !cli.json {
        println!("{}", grammar);
    }

    let source = match cli.seed {
        Some(seed) => RandomWalk::from_seed(seed),
        None => RandomWalk::new(),
    };
    let generated = Generator::with_source(&grammar, config.generator.clone(), source).generate();
    if !cli.json {
        println!("Generated strings:");
        for s in &generated {
            println!("{}", if s.is_empty() { "ε" } else { s.as_str() });
        }
    }

    let (derive_target, recognize_target) = match (cli.derive, cli.recognize) {
        (None, None) => (
            Some(prompt("Enter a target string to derive: ")?),
            Some(prompt("Enter a target string to recognize: ")?),
        ),
        targets => targets,
    };

    let deriver = Deriver::with_config(&grammar, config.search.clone());

    let derivation = derive_target.as_deref().map(|t| (t, deriver.derive(t)));
    if let (Some((target, result)), false) = (&derivation, cli.json) {
        print_derivation(target, result.as_ref(), config.search.max_depth);
    }

    let recognized = recognize_target
        .as_deref()
        .map(|t| (t, deriver.recognize(t)));
    if let (Some((target, recognized)), false) = (&recognized, cli.json) {
        if *recognized {
            println!("The string \"{}\" is recognized by the grammar.", target);
        } else {
            println!("The string \"{}\" is not recognized by the grammar.", target);
        }
    }

    if cli.json {
        let report = Report {
            generated: &generated,
            derive: derivation.as_ref().map(|(target, result)| DeriveReport {
                target: *target,
                derivable: result.is_some(),
                derivation: result.as_ref(),
            }),
            recognize: recognized.map(|(target, recognized)| RecognizeReport {
                target,
                recognized,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn print_derivation(target: &str, result: Option<&Derivation>, max_depth: usize) {
    match result {
        Some(derivation) => {
            println!("The string \"{}\" can be derived from the grammar.", target);
            println!("Derivation steps:");
            println!("{}", derivation);
        }
        None => {
            println!("Target \"{}\" cannot be derived within depth {}.", target, max_depth);
            println!("The string \"{}\" cannot be derived from the grammar.", target);
        }
    }
}

/// Read one line from stdin, without its line ending
fn prompt(message: &str) -> io::Result<String> {
    eprint!("{}", message);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
