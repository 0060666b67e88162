//! Wildcard pattern compilation for pointcut expressions.
//!
//! Two pattern kinds are compiled here. A [`TypePattern`] covers dotted,
//! fully-qualified type names: `*` matches one segment, `?` one character,
//! `..` zero or more whole segments, and a trailing `+` or `#` selects a
//! [`HierarchyMode`]. A [`NamePattern`] covers a single member name with the
//! same `*`/`?` wildcards but no dots.
//!
//! Compilation translates the wildcard text into one anchored regular
//! expression, so a compiled pattern is immutable and cheap to test
//! repeatedly.
//!
//! ```
//! use pointcut_patterns::{compile_type_pattern, compile_name_pattern};
//!
//! let declaring = compile_type_pattern("foo..*")?;
//! let member = compile_name_pattern("set*")?;
//! assert!(declaring.matches_name("foo.sub.Bar"));
//! assert!(member.matches("setName"));
//! # Ok::<(), pointcut_patterns::PatternError>(())
//! ```

mod errors;
mod name_pattern;
mod type_pattern;
mod wildcard;

pub use errors::{PatternError, SyntaxErrorInfo};
pub use name_pattern::NamePattern;
pub use type_pattern::{HierarchyMode, TypePattern};

/// Compile a dotted type pattern.
///
/// Convenience wrapper for [`TypePattern::compile`].
///
/// # Errors
/// Returns [`PatternError`] when the pattern text is malformed.
pub fn compile_type_pattern(pattern: &str) -> Result<TypePattern, PatternError> {
    TypePattern::compile(pattern)
}

/// Compile a dot-free member-name pattern.
///
/// Convenience wrapper for [`NamePattern::compile`].
///
/// # Errors
/// Returns [`PatternError`] when the pattern text is malformed.
pub fn compile_name_pattern(pattern: &str) -> Result<NamePattern, PatternError> {
    NamePattern::compile(pattern)
}
