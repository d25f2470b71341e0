use std::io;
use thiserror::Error;

/// Custom error types for grammar construction and loading
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Non-terminals and terminals overlap: {}", render_symbols(.0))]
    Overlap(Vec<char>),

    #[error("Start symbol '{0}' not found in non-terminals V")]
    UndefinedStartSymbol(char),

    #[error("Production rule LHS '{0}' not in non-terminals V")]
    UnknownLhs(char),

    #[error("Symbol '{symbol}' in production '{lhs}->{alternative}' not in V or E")]
    UnknownSymbol {
        symbol: char,
        lhs: char,
        alternative: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;

impl GrammarError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        GrammarError::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Render a symbol list as `{a, b, c}`
pub fn render_symbols(symbols: &[char]) -> String {
    let joined = symbols
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", joined)
}
