//! Error types for PipeQL.

use thiserror::Error;

/// Scanner failures. Fatal: the query never reaches the parser.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// A character that no token can start with
    #[error("unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },

    /// A string literal with no closing quote
    #[error("unterminated string literal starting at line {line}")]
    UnterminatedString { line: usize },
}

/// Parser failures. Fatal: the query never reaches planning or execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Scanning failed before parsing started
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A token that does not fit the grammar at its position
    #[error("parse error at line {line}, column {column}: {expected} (found: {found})")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
}

/// Runtime failures. Fatal to the current query only; the context stays
/// usable for subsequent queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Query names a table that was never registered
    #[error("table not found: {0}")]
    UnknownTable(String),

    /// Function call with a name absent from the registry
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// Arithmetic on a value that cannot be coerced to a number
    #[error("cannot convert '{0}' to a number")]
    NotNumeric(String),

    /// Unary minus applied to a non-numeric value
    #[error("cannot negate non-number '{0}'")]
    NegateNonNumber(String),
}

/// The main error type for PipeQL operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Lexical or syntax error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Runtime error during query execution
    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl From<LexError> for Error {
    fn from(err: LexError) -> Self {
        Error::Parse(ParseError::Lex(err))
    }
}

/// A specialized `Result` type for PipeQL operations.
pub type Result<T> = std::result::Result<T, Error>;
