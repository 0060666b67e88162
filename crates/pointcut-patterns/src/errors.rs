//! Error types shared by the pattern compilation modules.

use std::fmt;
use thiserror::Error;

/// Additional context for a malformed wildcard pattern.
///
/// # Examples
/// ```
/// use pointcut_patterns::SyntaxErrorInfo;
/// let info = SyntaxErrorInfo::new("stray '.'", 4, "foo...Bar");
/// assert_eq!(info.position, 4);
/// assert_eq!(info.pattern, "foo...Bar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorInfo {
    /// What was wrong with the pattern text.
    pub message: &'static str,
    /// Zero-based byte offset of the offending character.
    pub position: usize,
    /// The pattern text as supplied by the caller.
    pub pattern: String,
}

impl SyntaxErrorInfo {
    /// Create a new error description for a pattern failure.
    #[must_use]
    pub fn new(message: &'static str, position: usize, pattern: impl Into<String>) -> Self {
        Self {
            message,
            position,
            pattern: pattern.into(),
        }
    }
}

impl fmt::Display for SyntaxErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in pattern `{}` at byte {} (zero-based)",
            self.message, self.pattern, self.position
        )
    }
}

/// Errors surfaced while compiling wildcard patterns.
///
/// # Examples
/// ```
/// use pointcut_patterns::{PatternError, SyntaxErrorInfo};
/// let info = SyntaxErrorInfo::new("empty pattern", 0, "");
/// let err = PatternError::Syntax(info.clone());
/// assert_eq!(err.to_string(), info.to_string());
/// ```
#[derive(Debug, Error)]
pub enum PatternError {
    /// The wildcard text itself is malformed.
    #[error("{0}")]
    Syntax(SyntaxErrorInfo),
    /// The generated matcher source was rejected by the regex engine.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub(crate) fn syntax_error(
    message: &'static str,
    position: usize,
    pattern: impl Into<String>,
) -> PatternError {
    PatternError::Syntax(SyntaxErrorInfo::new(message, position, pattern))
}
