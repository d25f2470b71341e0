//! CFG-Derive samples strings from small context-free grammars and searches
//! for derivations of a given string.
//!
//! Grammars use single-character symbols. A grammar is validated once when it
//! is built; sampling and derivation assume it is well-formed. Derivation is a
//! bounded depth-first search, so a `false` answer means "not found within the
//! limits", not "not in the language".
//!
//! # Example
//!
//! ```rust
//! use cfg_derive::GrammarBuilder;
//!
//! let grammar = GrammarBuilder::new('S')
//!     .nonterminals("S")
//!     .terminals("ab")
//!     .rule('S', &["aSb", "ε"])
//!     .build()
//!     .unwrap();
//!
//! let derivation = grammar.derive("aabb").unwrap();
//! assert_eq!(derivation.len(), 4);
//! assert!(!grammar.recognize("abc"));
//!
//! for sample in grammar.generate() {
//!     assert!(grammar.recognize(&sample));
//! }
//! ```

pub mod config;
pub mod derivation;
pub mod generator;
pub mod grammar;
pub mod loader;
pub mod utils;

pub use config::Config;
pub use derivation::{
    derive, recognize, AppliedProduction, Derivation, DerivationStep, Deriver, SearchConfig,
    SearchStats,
};
pub use generator::{generate, Generator, GeneratorConfig, RandomSource, RandomWalk};
pub use grammar::{Alternative, Grammar, GrammarBuilder, Production, SententialForm, Symbol};
pub use loader::parse_grammar;
pub use utils::{GrammarError, Result};
