//! Error taxonomy for expression compilation and matching.
//!
//! Compile-time failures are fatal to the whole expression: no partial tree
//! is ever returned. The only match-time failure is [`ResolutionError`], and
//! it aborts just the match call that needed the missing reference.

use std::fmt;

use thiserror::Error;

pub use pointcut_patterns::{PatternError, SyntaxErrorInfo};

/// An unrecognized character in the expression text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize))]
#[error("unexpected character `{character}` at line {line}, column {column}")]
pub struct LexicalError {
    /// The offending character.
    pub character: char,
    /// 1-based source line.
    pub line: u32,
    /// 1-based source column.
    pub column: u32,
}

/// Details of an unexpected token, precise enough to drive editor
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize))]
pub struct UnexpectedTokenInfo {
    /// Description of what was found (`` `foo` `` or `end of input`).
    pub found: String,
    /// Descriptions of the tokens that would have been acceptable here.
    pub expected: Vec<String>,
    /// 1-based source line of the offending token.
    pub line: u32,
    /// 1-based source column of the offending token.
    pub column: u32,
}

impl fmt::Display for UnexpectedTokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unexpected {} at line {}, column {}; expected {}",
            self.found,
            self.line,
            self.column,
            self.expected.join(" or ")
        )
    }
}

/// A grammar violation while building the expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(serde::Serialize))]
pub enum ParseError {
    /// The token stream did not fit the grammar at this point.
    #[error("{0}")]
    UnexpectedToken(UnexpectedTokenInfo),
    /// A constructor pattern named something other than `new`.
    #[error("constructor pattern name must be `new`, found `{name}` at line {line}, column {column}")]
    ConstructorName {
        /// The offending member name.
        name: String,
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        column: u32,
    },
    /// `..` in a parameter or argument list position other than first or
    /// last.
    #[error("`..` may only appear first or last in a parameter list (line {line}, column {column})")]
    MisplacedEagerWildcard {
        /// 1-based source line.
        line: u32,
        /// 1-based source column.
        column: u32,
    },
}

/// Any failure while compiling an expression.
#[derive(Debug, Error)]
pub enum ExpressionError {
    /// The lexer met an unrecognized character.
    #[error(transparent)]
    Lexical(#[from] LexicalError),
    /// The parser met an unexpected token or a grammar-level violation.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A wildcard pattern embedded in the expression is malformed.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// An unresolved pointcut reference met during matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolved pointcut reference `{name}`")]
pub struct ResolutionError {
    /// The reference name no resolver could supply.
    pub name: String,
}

impl ResolutionError {
    /// Create an error for an unresolvable reference name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
