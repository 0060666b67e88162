//! Compiled name patterns for members: dot-free wildcards.

use std::fmt;

use regex::Regex;

use crate::errors::PatternError;
use crate::wildcard::{SegmentPart, build_name_regex_source, scan_parts};

#[derive(Debug, Clone)]
enum Matcher {
    /// A lone `*`: any non-empty name.
    Any,
    Wildcard(Regex),
}

/// A compiled, immutable member-name pattern.
///
/// Unlike type patterns, a name pattern covers a single identifier: dots are
/// rejected at compile time, and `*`/`?` match within the one name.
///
/// # Examples
/// ```
/// use pointcut_patterns::NamePattern;
///
/// let pattern = NamePattern::compile("set*")?;
/// assert!(pattern.matches("setName"));
/// assert!(!pattern.matches("getName"));
/// # Ok::<(), pointcut_patterns::PatternError>(())
/// ```
#[derive(Debug, Clone)]
pub struct NamePattern {
    source: String,
    matcher: Matcher,
}

impl NamePattern {
    /// Compile a member-name pattern.
    ///
    /// # Errors
    /// Returns [`PatternError`] when the text is empty, contains a dot, or
    /// uses characters outside the identifier/wildcard alphabet.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let parts = scan_parts(pattern)?;
        let matcher = if let [SegmentPart::AnyRun] = parts.as_slice() {
            Matcher::Any
        } else {
            Matcher::Wildcard(Regex::new(&build_name_regex_source(&parts))?)
        };
        Ok(Self {
            source: pattern.to_owned(),
            matcher,
        })
    }

    /// The pattern matching any member name.
    #[must_use]
    pub fn any() -> Self {
        Self {
            source: "*".to_owned(),
            matcher: Matcher::Any,
        }
    }

    /// Whether this pattern matches every name.
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self.matcher, Matcher::Any)
    }

    /// The pattern text as supplied to [`NamePattern::compile`].
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Test one member name.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        match &self.matcher {
            Matcher::Any => !candidate.is_empty(),
            Matcher::Wildcard(regex) => regex.is_match(candidate),
        }
    }
}

impl PartialEq for NamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for NamePattern {}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
