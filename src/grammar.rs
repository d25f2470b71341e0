use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::warn;

use crate::utils::{render_symbols, GrammarError, Result};

/// Token used in grammar definitions for the empty expansion
pub const EPSILON: &str = "ε";

/// An element of a grammar, classified once at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A symbol from E that is never rewritten
    Terminal(char),
    /// A symbol from V that productions rewrite
    NonTerminal(char),
}

impl Symbol {
    /// The character this symbol is written as
    pub fn as_char(&self) -> char {
        match self {
            Symbol::Terminal(c) | Symbol::NonTerminal(c) => *c,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One right-hand side of a production; empty means ε
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Alternative(Vec<Symbol>);

impl Alternative {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Alternative(symbols)
    }

    /// The empty expansion
    pub fn epsilon() -> Self {
        Alternative(Vec::new())
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    pub fn is_epsilon(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "{}", EPSILON);
        }
        for symbol in &self.0 {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

/// A non-terminal together with its alternatives in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: char,
    pub alternatives: Vec<Alternative>,
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alternatives = self
            .alternatives
            .iter()
            .map(|alt| alt.to_string())
            .collect::<Vec<_>>()
            .join(" | ");
        write!(f, "{} -> {}", self.lhs, alternatives)
    }
}

/// An intermediate rewrite state reachable from the start symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SententialForm(Vec<Symbol>);

impl SententialForm {
    /// The one-symbol form holding the start symbol
    pub fn start(start_symbol: char) -> Self {
        SententialForm(vec![Symbol::NonTerminal(start_symbol)])
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of terminals already fixed in this form
    pub fn terminal_count(&self) -> usize {
        self.0.iter().filter(|s| s.is_terminal()).count()
    }

    pub fn has_non_terminal(&self) -> bool {
        self.0.iter().any(|s| s.is_non_terminal())
    }

    /// Positions holding a non-terminal, left to right, with that non-terminal
    pub fn non_terminal_positions(&self) -> impl Iterator<Item = (usize, char)> + '_ {
        self.0.iter().enumerate().filter_map(|(i, s)| match s {
            Symbol::NonTerminal(c) => Some((i, *c)),
            Symbol::Terminal(_) => None,
        })
    }

    /// Replace the symbol at `position` with the expansion of `alternative`
    pub fn rewrite(&self, position: usize, alternative: &Alternative) -> SententialForm {
        let mut symbols = Vec::with_capacity(self.0.len() + alternative.symbols().len());
        symbols.extend_from_slice(&self.0[..position]);
        symbols.extend_from_slice(alternative.symbols());
        symbols.extend_from_slice(&self.0[position + 1..]);
        SententialForm(symbols)
    }

    /// Concatenation of all symbols; the empty form concatenates to ""
    pub fn concat(&self) -> String {
        self.0.iter().map(Symbol::as_char).collect()
    }
}

impl fmt::Display for SententialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "{}", EPSILON)
        } else {
            write!(f, "{}", self.concat())
        }
    }
}

impl Serialize for SententialForm {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A validated context-free grammar (V, E, R, S)
///
/// Every check happens in [`Grammar::new`]; the generator and the derivation
/// engine rely on the grammar being well-formed and never re-check it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    nonterminals: Vec<char>,
    terminals: Vec<char>,
    productions: Vec<Production>,
    index: HashMap<char, usize>,
    start_symbol: char,
}

impl Grammar {
    /// Validate raw (V, E, R, S) and build a grammar
    ///
    /// Each production is a LHS and its alternatives as written; the literal
    /// `ε` (or an empty string) stands for the empty expansion. A repeated
    /// LHS replaces the alternatives declared before it.
    pub fn new<A: AsRef<str>>(
        nonterminals: &[char],
        terminals: &[char],
        productions: &[(char, Vec<A>)],
        start_symbol: char,
    ) -> Result<Self> {
        let nonterminals = dedup(nonterminals);
        let terminals = dedup(terminals);
        let v: HashSet<char> = nonterminals.iter().copied().collect();
        let e: HashSet<char> = terminals.iter().copied().collect();

        let mut overlap: Vec<char> = v.intersection(&e).copied().collect();
        if !overlap.is_empty() {
            overlap.sort_unstable();
            return Err(GrammarError::Overlap(overlap));
        }
        if !v.contains(&start_symbol) {
            return Err(GrammarError::UndefinedStartSymbol(start_symbol));
        }

        let classify = |c: char| {
            if v.contains(&c) {
                Some(Symbol::NonTerminal(c))
            } else if e.contains(&c) {
                Some(Symbol::Terminal(c))
            } else {
                None
            }
        };

        let mut grammar = Grammar {
            nonterminals,
            terminals,
            productions: Vec::new(),
            index: HashMap::new(),
            start_symbol,
        };

        for (lhs, raw_alternatives) in productions {
            if !v.contains(lhs) {
                return Err(GrammarError::UnknownLhs(*lhs));
            }
            let mut alternatives = Vec::with_capacity(raw_alternatives.len());
            for raw in raw_alternatives {
                let raw = raw.as_ref();
                if raw == EPSILON {
                    alternatives.push(Alternative::epsilon());
                    continue;
                }
                let symbols = raw
                    .chars()
                    .map(|c| {
                        classify(c).ok_or_else(|| GrammarError::UnknownSymbol {
                            symbol: c,
                            lhs: *lhs,
                            alternative: raw.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                alternatives.push(Alternative::new(symbols));
            }
            grammar.insert(Production {
                lhs: *lhs,
                alternatives,
            });
        }

        Ok(grammar)
    }

    fn insert(&mut self, production: Production) {
        match self.index.get(&production.lhs) {
            Some(&i) => {
                warn!(lhs = %production.lhs, "duplicate production replaces earlier alternatives");
                self.productions[i] = production;
            }
            None => {
                self.index.insert(production.lhs, self.productions.len());
                self.productions.push(production);
            }
        }
    }

    /// Non-terminals V in declaration order
    pub fn nonterminals(&self) -> &[char] {
        &self.nonterminals
    }

    /// Terminals E in declaration order
    pub fn terminals(&self) -> &[char] {
        &self.terminals
    }

    /// Productions R in declaration order
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn start_symbol(&self) -> char {
        self.start_symbol
    }

    /// Alternatives of a non-terminal; empty when it has no production
    pub fn alternatives(&self, non_terminal: char) -> &[Alternative] {
        self.index
            .get(&non_terminal)
            .map(|&i| self.productions[i].alternatives.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_terminal(&self, c: char) -> bool {
        self.terminals.contains(&c)
    }

    pub fn is_non_terminal(&self, c: char) -> bool {
        self.nonterminals.contains(&c)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "V = {}", render_symbols(&self.nonterminals))?;
        writeln!(f, "E = {}", render_symbols(&self.terminals))?;
        writeln!(f, "R =")?;
        for production in &self.productions {
            writeln!(f, "{}", production)?;
        }
        write!(f, "S = {}", self.start_symbol)
    }
}

fn dedup(symbols: &[char]) -> Vec<char> {
    let mut seen = HashSet::new();
    symbols.iter().copied().filter(|c| seen.insert(*c)).collect()
}

/// Builder for constructing Grammar instances
pub struct GrammarBuilder {
    nonterminals: Vec<char>,
    terminals: Vec<char>,
    productions: Vec<(char, Vec<String>)>,
    start_symbol: char,
}

impl GrammarBuilder {
    /// Create a new grammar builder with the given start symbol
    pub fn new(start_symbol: char) -> Self {
        GrammarBuilder {
            nonterminals: Vec::new(),
            terminals: Vec::new(),
            productions: Vec::new(),
            start_symbol,
        }
    }

    /// Declare non-terminals, one per character
    pub fn nonterminals(mut self, symbols: &str) -> Self {
        self.nonterminals.extend(symbols.chars());
        self
    }

    /// Declare terminals, one per character
    pub fn terminals(mut self, symbols: &str) -> Self {
        self.terminals.extend(symbols.chars());
        self
    }

    /// Add a production with its alternatives
    pub fn rule(mut self, lhs: char, alternatives: &[&str]) -> Self {
        self.productions
            .push((lhs, alternatives.iter().map(|s| s.to_string()).collect()));
        self
    }

    /// Validate and build the grammar
    pub fn build(self) -> Result<Grammar> {
        Grammar::new(
            &self.nonterminals,
            &self.terminals,
            &self.productions,
            self.start_symbol,
        )
    }
}
