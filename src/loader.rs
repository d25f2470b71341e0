//! Reader for the line-oriented grammar definition format.
//!
//! ```text
//! 1
//! S
//! 2
//! a
//! b
//! 1
//! S -> aSb | ε
//! 1
//! S
//! ```
//!
//! Counts precede each section: non-terminals, terminals, productions, and
//! finally the start symbol. Every symbol is a single character.

use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

use crate::grammar::Grammar;
use crate::utils::{GrammarError, Result};

static PRODUCTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)->(.*)$").expect("production pattern is valid"));

struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Lines {
            inner: text.lines().enumerate(),
            last: 0,
        }
    }

    /// Next line with its 1-based number
    fn next(&mut self, expected: &str) -> Result<(usize, &'a str)> {
        match self.inner.next() {
            Some((i, line)) => {
                self.last = i + 1;
                Ok((i + 1, line))
            }
            None => Err(GrammarError::parse(
                self.last + 1,
                format!("unexpected end of input, expected {}", expected),
            )),
        }
    }

    fn count(&mut self, section: &str) -> Result<usize> {
        let (number, line) = self.next(section)?;
        line.trim().parse::<usize>().map_err(|_| {
            GrammarError::parse(number, format!("expected {}, found '{}'", section, line.trim()))
        })
    }

    fn symbol(&mut self, what: &str) -> Result<char> {
        let (number, line) = self.next(what)?;
        single_symbol(number, line, what)
    }
}

fn single_symbol(number: usize, text: &str, what: &str) -> Result<char> {
    let mut chars = text.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(GrammarError::parse(
            number,
            format!("{} must be a single character, found '{}'", what, text.trim()),
        )),
    }
}

fn production(number: usize, line: &str) -> Result<(char, Vec<String>)> {
    let line = line.trim();
    let captures = PRODUCTION_LINE.captures(line).ok_or_else(|| {
        GrammarError::parse(
            number,
            format!("expected 'LHS -> alternatives', found '{}'", line),
        )
    })?;
    let lhs = single_symbol(number, &captures[1], "production LHS")?;
    let alternatives = captures[2]
        .trim()
        .split('|')
        .map(|alt| alt.trim().to_string())
        .collect();
    Ok((lhs, alternatives))
}

/// Parse and validate a grammar definition
pub fn parse_grammar(text: &str) -> Result<Grammar> {
    let mut lines = Lines::new(text);

    let n = lines.count("non-terminal count")?;
    let nonterminals = (0..n)
        .map(|_| lines.symbol("non-terminal"))
        .collect::<Result<Vec<_>>>()?;

    let m = lines.count("terminal count")?;
    let terminals = (0..m)
        .map(|_| lines.symbol("terminal"))
        .collect::<Result<Vec<_>>>()?;

    let p = lines.count("production count")?;
    let mut productions = Vec::with_capacity(p);
    for _ in 0..p {
        let (number, line) = lines.next("production")?;
        productions.push(production(number, line)?);
    }

    // the start symbol count is read for format compatibility only
    let _k = lines.count("start symbol count")?;
    let start_symbol = lines.symbol("start symbol")?;

    debug!(
        nonterminals = nonterminals.len(),
        terminals = terminals.len(),
        productions = productions.len(),
        "parsed grammar definition"
    );

    Grammar::new(&nonterminals, &terminals, &productions, start_symbol)
}

impl FromStr for Grammar {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self> {
        parse_grammar(s)
    }
}

impl Grammar {
    /// Load a grammar definition from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(GrammarError::Io)?;
        parse_grammar(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Symbol;

    const ANBN: &str = "1\nS\n2\na\nb\n1\nS -> aSb | ε\n1\nS\n";

    #[test]
    fn test_parse_definition() {
        let grammar: Grammar = ANBN.parse().unwrap();
        assert_eq!(grammar.nonterminals(), &['S']);
        assert_eq!(grammar.terminals(), &['a', 'b']);
        assert_eq!(grammar.start_symbol(), 'S');
        let alternatives = grammar.alternatives('S');
        assert_eq!(alternatives.len(), 2);
        assert_eq!(alternatives[0].symbols()[1], Symbol::NonTerminal('S'));
        assert!(alternatives[1].is_epsilon());
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let text = " 2 \n S\nA \n1\n x\n2\n  S->Ax|  ε \nA -> x\n1\nS  ";
        let grammar: Grammar = text.parse().unwrap();
        assert_eq!(grammar.nonterminals(), &['S', 'A']);
        assert_eq!(grammar.productions().len(), 2);
        assert_eq!(grammar.productions()[0].to_string(), "S -> Ax | ε");
    }

    #[test]
    fn test_empty_alternative_is_epsilon() {
        let text = "1\nS\n1\na\n1\nS -> a |\n1\nS";
        let grammar: Grammar = text.parse().unwrap();
        assert!(grammar.alternatives('S')[1].is_epsilon());
    }

    #[test]
    fn test_bad_count() {
        let err = "x\nS".parse::<Grammar>().unwrap_err();
        match err {
            GrammarError::Parse { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains("non-terminal count"));
            }
            other => panic!("Expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_multi_character_symbol() {
        let err = "1\nSS\n0\n0\n1\nSS".parse::<Grammar>().unwrap_err();
        assert!(matches!(err, GrammarError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_truncated_input() {
        let err = "1\nS\n1\na\n1\nS -> a\n".parse::<Grammar>().unwrap_err();
        assert!(matches!(err, GrammarError::Parse { line: 7, .. }));
    }

    #[test]
    fn test_missing_arrow() {
        let err = "1\nS\n1\na\n1\nS a\n1\nS".parse::<Grammar>().unwrap_err();
        assert!(matches!(err, GrammarError::Parse { line: 6, .. }));
    }

    #[test]
    fn test_validation_errors_surface() {
        let err = "1\nS\n1\nS\n0\n1\nS".parse::<Grammar>().unwrap_err();
        assert!(matches!(err, GrammarError::Overlap(_)));

        let err = "1\nS\n1\na\n1\nS -> ab\n1\nS".parse::<Grammar>().unwrap_err();
        assert!(matches!(err, GrammarError::UnknownSymbol { symbol: 'b', .. }));
    }
}
