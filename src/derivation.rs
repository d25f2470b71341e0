//! Bounded derivation search.
//!
//! The engine rewrites the start symbol depth-first: non-terminal positions
//! left to right, alternatives in declaration order. The first branch whose
//! form is terminal-only and spells the target wins, which is not necessarily
//! the shortest derivation. Three rules cut the search:
//!
//! * a branch fails once it reaches `max_depth` rewrites;
//! * a branch fails once it holds more terminals than the target has
//!   characters, since terminals are never removed;
//! * a form that already failed is not expanded again.
//!
//! Failures are remembered by the form's text only, not by the depth it was
//! reached at. A form that failed deep in the tree because it ran out of
//! depth is then also treated as failed when met again closer to the root,
//! so some derivations near the depth limit can be missed.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, debug_span};

use crate::grammar::{Alternative, Grammar, SententialForm};

/// Limits applied while searching for a derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Rewrites allowed on any branch
    pub max_depth: usize,
    /// Remember forms that failed to expand
    pub memoize: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_depth: 15,
            memoize: true,
        }
    }
}

/// A production alternative as applied to one non-terminal occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedProduction {
    pub lhs: char,
    pub alternative: Alternative,
}

impl fmt::Display for AppliedProduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.lhs, self.alternative)
    }
}

impl Serialize for AppliedProduction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A form in a derivation and the production that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivationStep {
    pub form: SententialForm,
    /// `None` for the starting form
    #[serde(rename = "production")]
    pub applied: Option<AppliedProduction>,
}

impl fmt::Display for DerivationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.applied {
            Some(applied) => write!(f, "{}   ({})", self.form, applied),
            None => write!(f, "{}", self.form),
        }
    }
}

/// Witness that a target is derivable: every form from the start symbol on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Derivation {
    steps: Vec<DerivationStep>,
}

impl Derivation {
    pub fn steps(&self) -> &[DerivationStep] {
        &self.steps
    }

    /// Number of steps, counting the starting form
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The final, terminal-only form
    pub fn result(&self) -> Option<&SententialForm> {
        self.steps.last().map(|step| &step.form)
    }
}

impl fmt::Display for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// Counters collected during one search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Forms examined
    pub visited: usize,
    /// Deepest depth any form was examined at
    pub max_depth_reached: usize,
    pub depth_cutoffs: usize,
    pub length_prunes: usize,
    pub memo_hits: usize,
}

/// Derivation engine over one grammar
#[derive(Debug, Clone)]
pub struct Deriver<'g> {
    grammar: &'g Grammar,
    config: SearchConfig,
}

impl<'g> Deriver<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_config(grammar, SearchConfig::default())
    }

    pub fn with_config(grammar: &'g Grammar, config: SearchConfig) -> Self {
        Deriver { grammar, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Find a derivation of `target`, or `None` if none exists within bounds
    pub fn derive(&self, target: &str) -> Option<Derivation> {
        self.derive_with_stats(target).0
    }

    /// Whether `target` is derivable within bounds
    pub fn recognize(&self, target: &str) -> bool {
        self.derive(target).is_some()
    }

    /// Like [`Deriver::derive`], also returning search counters
    pub fn derive_with_stats(&self, target: &str) -> (Option<Derivation>, SearchStats) {
        let _span = debug_span!("derive", input = target).entered();

        // a target outside E* can never be spelled by a terminal-only form
        if let Some(c) = target.chars().find(|c| !self.grammar.is_terminal(*c)) {
            debug!(symbol = %c, "target contains a symbol that is not a terminal");
            return (None, SearchStats::default());
        }

        let mut search = Search {
            grammar: self.grammar,
            config: &self.config,
            target,
            target_len: target.chars().count(),
            failed: HashSet::new(),
            path: Vec::new(),
            stats: SearchStats::default(),
        };

        let start = SententialForm::start(self.grammar.start_symbol());
        let found = search.expand(&start, 0);
        let stats = search.stats;
        debug!(
            found,
            visited = stats.visited,
            max_depth = stats.max_depth_reached,
            depth_cutoffs = stats.depth_cutoffs,
            length_prunes = stats.length_prunes,
            memo_hits = stats.memo_hits,
            "derivation search finished"
        );

        if !found {
            return (None, stats);
        }

        let mut steps = search.path;
        steps.push(DerivationStep {
            form: start,
            applied: None,
        });
        steps.reverse();
        (Some(Derivation { steps }), stats)
    }
}

/// State owned by a single derivation attempt
struct Search<'a> {
    grammar: &'a Grammar,
    config: &'a SearchConfig,
    target: &'a str,
    target_len: usize,
    failed: HashSet<String>,
    /// Steps below the root, collected leaf first while unwinding
    path: Vec<DerivationStep>,
    stats: SearchStats,
}

impl Search<'_> {
    fn expand(&mut self, form: &SententialForm, depth: usize) -> bool {
        self.stats.visited += 1;
        self.stats.max_depth_reached = self.stats.max_depth_reached.max(depth);

        let key = form.concat();
        if !form.has_non_terminal() && key == self.target {
            return true;
        }
        if depth >= self.config.max_depth {
            self.stats.depth_cutoffs += 1;
            return false;
        }
        if form.terminal_count() > self.target_len {
            self.stats.length_prunes += 1;
            return false;
        }
        if self.config.memoize && self.failed.contains(&key) {
            self.stats.memo_hits += 1;
            return false;
        }

        let grammar = self.grammar;
        for (position, non_terminal) in form.non_terminal_positions() {
            for alternative in grammar.alternatives(non_terminal) {
                let next = form.rewrite(position, alternative);
                if self.expand(&next, depth + 1) {
                    self.path.push(DerivationStep {
                        form: next,
                        applied: Some(AppliedProduction {
                            lhs: non_terminal,
                            alternative: alternative.clone(),
                        }),
                    });
                    return true;
                }
            }
        }

        if self.config.memoize {
            self.failed.insert(key);
        }
        false
    }
}

/// Find a derivation of `target` with default limits
pub fn derive(grammar: &Grammar, target: &str) -> Option<Derivation> {
    Deriver::new(grammar).derive(target)
}

/// Whether `target` is derivable with default limits
pub fn recognize(grammar: &Grammar, target: &str) -> bool {
    Deriver::new(grammar).recognize(target)
}

impl Grammar {
    /// Find a derivation of `target` with default limits
    pub fn derive(&self, target: &str) -> Option<Derivation> {
        derive(self, target)
    }

    /// Whether `target` is derivable with default limits
    pub fn recognize(&self, target: &str) -> bool {
        recognize(self, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    fn anbn() -> Grammar {
        GrammarBuilder::new('S')
            .nonterminals("S")
            .terminals("ab")
            .rule('S', &["aSb", "ε"])
            .build()
            .unwrap()
    }

    fn forms(derivation: &Derivation) -> Vec<String> {
        derivation.steps().iter().map(|s| s.form.to_string()).collect()
    }

    fn productions(derivation: &Derivation) -> Vec<Option<String>> {
        derivation
            .steps()
            .iter()
            .map(|s| s.applied.as_ref().map(|p| p.to_string()))
            .collect()
    }

    #[test]
    fn test_derive_ab() {
        let grammar = anbn();
        let derivation = grammar.derive("ab").unwrap();
        assert_eq!(derivation.len(), 3);
        assert_eq!(forms(&derivation), vec!["S", "aSb", "ab"]);
        assert_eq!(
            productions(&derivation),
            vec![None, Some("S->aSb".to_string()), Some("S->ε".to_string())]
        );
    }

    #[test]
    fn test_derive_aabb() {
        let grammar = anbn();
        let derivation = grammar.derive("aabb").unwrap();
        assert_eq!(forms(&derivation), vec!["S", "aSb", "aaSbb", "aabb"]);
    }

    #[test]
    fn test_underivable_target() {
        let grammar = anbn();
        assert!(grammar.derive("abc").is_none());
        assert!(!grammar.recognize("abc"));
        assert!(!grammar.recognize("ba"));
        assert!(!grammar.recognize("aab"));
    }

    #[test]
    fn test_non_terminal_text_is_not_a_match() {
        let grammar = anbn();
        assert!(!grammar.recognize("S"));
        assert!(!grammar.recognize("aSb"));
    }

    #[test]
    fn test_empty_target() {
        let grammar = GrammarBuilder::new('S')
            .nonterminals("S")
            .rule('S', &["ε"])
            .build()
            .unwrap();
        let derivation = grammar.derive("").unwrap();
        assert_eq!(forms(&derivation), vec!["S", "ε"]);
        let result = derivation.result().unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_first_branch_wins() {
        // both alternatives spell "a"; declaration order picks A
        let grammar = GrammarBuilder::new('S')
            .nonterminals("SAB")
            .terminals("a")
            .rule('S', &["A", "B"])
            .rule('A', &["a"])
            .rule('B', &["a"])
            .build()
            .unwrap();
        let derivation = grammar.derive("a").unwrap();
        assert_eq!(forms(&derivation), vec!["S", "A", "a"]);
    }

    #[test]
    fn test_leftmost_position_first() {
        let grammar = GrammarBuilder::new('S')
            .nonterminals("SAB")
            .terminals("ab")
            .rule('S', &["AB"])
            .rule('A', &["a"])
            .rule('B', &["b"])
            .build()
            .unwrap();
        let derivation = grammar.derive("ab").unwrap();
        assert_eq!(forms(&derivation), vec!["S", "AB", "aB", "ab"]);
    }

    #[test]
    fn test_depth_limit_boundary() {
        let grammar = GrammarBuilder::new('A')
            .nonterminals("A")
            .terminals("a")
            .rule('A', &["aA", "a"])
            .build()
            .unwrap();
        // fifteen rewrites reach a^15 exactly at the depth limit
        assert!(grammar.recognize(&"a".repeat(15)));
        assert!(!grammar.recognize(&"a".repeat(16)));

        let deriver = Deriver::new(&grammar);
        let (found, stats) = deriver.derive_with_stats(&"a".repeat(20));
        assert!(found.is_none());
        assert_eq!(stats.max_depth_reached, 15);
        assert!(stats.depth_cutoffs > 0);
    }

    #[test]
    fn test_custom_depth() {
        let grammar = anbn();
        let shallow = Deriver::with_config(
            &grammar,
            SearchConfig {
                max_depth: 2,
                ..SearchConfig::default()
            },
        );
        assert!(shallow.recognize("ab"));
        assert!(!shallow.recognize("aabb"));
    }

    #[test]
    fn test_length_pruning_counted() {
        let grammar = anbn();
        let (_, stats) = Deriver::new(&grammar).derive_with_stats("ab");
        assert!(stats.length_prunes > 0);
    }

    #[test]
    fn test_memo_matches_plain_search() {
        let grammar = GrammarBuilder::new('S')
            .nonterminals("SABC")
            .terminals("xyz")
            .rule('S', &["AB", "BA", "C"])
            .rule('A', &["x", "xy", "ε"])
            .rule('B', &["y", "AC"])
            .rule('C', &["z", "xz"])
            .build()
            .unwrap();
        let memo = Deriver::new(&grammar);
        let plain = Deriver::with_config(
            &grammar,
            SearchConfig {
                memoize: false,
                ..SearchConfig::default()
            },
        );
        for target in ["", "x", "y", "z", "xy", "yx", "xz", "xxz", "xyz", "xzx", "yxy", "zz"] {
            assert_eq!(memo.derive(target), plain.derive(target), "target {:?}", target);
        }
    }

    #[test]
    fn test_memo_hits_on_shared_forms() {
        // "aa" is reached from both "aA" and "Aa"
        let grammar = GrammarBuilder::new('S')
            .nonterminals("SA")
            .terminals("ab")
            .rule('S', &["AA"])
            .rule('A', &["a", "b"])
            .build()
            .unwrap();
        let (found, stats) = Deriver::new(&grammar).derive_with_stats("ac");
        assert!(found.is_none());
        assert_eq!(stats.visited, 0);

        let (found, stats) = Deriver::new(&grammar).derive_with_stats("aaa");
        assert!(found.is_none());
        assert!(stats.memo_hits > 0);

        let plain = Deriver::with_config(
            &grammar,
            SearchConfig {
                memoize: false,
                ..SearchConfig::default()
            },
        );
        let (found, stats) = plain.derive_with_stats("aaa");
        assert!(found.is_none());
        assert_eq!(stats.memo_hits, 0);
    }

    #[test]
    fn test_derivation_display() {
        let grammar = anbn();
        let derivation = grammar.derive("ab").unwrap();
        assert_eq!(derivation.to_string(), "S\naSb   (S->aSb)\nab   (S->ε)");
    }

    #[test]
    fn test_derivation_json() {
        let grammar = anbn();
        let derivation = grammar.derive("ab").unwrap();
        let json = serde_json::to_string(&derivation).unwrap();
        assert_eq!(
            json,
            r#"{"steps":[{"form":"S","production":null},{"form":"aSb","production":"S->aSb"},{"form":"ab","production":"S->ε"}]}"#
        );
    }
}
