//! Error taxonomy of the symbolic engine.
//!
//! Lexer/disambiguator/parser failures surface as [`ParseError`] values at the
//! parse boundary; the convenience wrappers may turn them into panics for
//! callers that prefer it. Differentiation and solving are total over
//! well-formed trees: they degrade to placeholder nodes or the empty set
//! instead of failing, and the only error they report is an exhausted
//! recursion budget. `InternalInvariant` signals an engine defect, never bad
//! user input.

use thiserror::Error;

/// Failures of the text -> expression pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No token rule matches the character at this position
    #[error("unrecognized character '{character}' at position {position}")]
    Lex { character: char, position: usize },

    /// The token stream is empty
    #[error("empty input: nothing to parse")]
    EmptyInput,

    /// Explicit parsing mode is on and two adjacent tokens would have needed
    /// an implicit operator inserted between them
    #[error("missing operator between '{left}' and '{right}' (explicit parsing only)")]
    MissingOperator { left: String, right: String },

    /// Malformed token stream; carries the set of token kinds the parser
    /// would have accepted, the grammar rule it was inside, and the actual
    /// token text (or "end of input")
    #[error("syntax error in {context}: expected one of {expected:?}, got '{found}'")]
    Syntax {
        expected: Vec<String>,
        context: &'static str,
        found: String,
    },
}

/// Failures of differentiation and solving
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolicError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The recursion/step budget ran out before the operation finished;
    /// raised instead of risking a stack overflow on very deep trees
    #[error("recursion budget of {limit} exceeded")]
    RecursionBudgetExceeded { limit: usize },

    /// A malformed-node condition that should be unreachable
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}
