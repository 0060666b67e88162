//! Compiled type patterns: dotted wildcards with hierarchy awareness.

use std::fmt;

use regex::Regex;

use crate::errors::{PatternError, syntax_error};
use crate::wildcard::{build_regex_source, scan_segments};

/// How a type pattern relates to the candidate's type hierarchy.
///
/// The mode is derived once at compile time from a trailing `+` or `#` on the
/// pattern text and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HierarchyMode {
    /// Match the candidate's own name only.
    NotHierarchical,
    /// `+`: match the candidate or any of its ancestors.
    AllSubtypes,
    /// `#`: match only the type the member is declared on.
    BaseTypeOnly,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// `..` or `*..*`: any type in any package, simple names included.
    Any,
    Wildcard(Regex),
}

/// A compiled, immutable type pattern.
///
/// Matching is hierarchy-agnostic at this level: [`TypePattern::matches_name`]
/// tests a single fully-qualified name, and callers walk the ancestor chain
/// themselves when [`HierarchyMode`] calls for it.
///
/// # Examples
/// ```
/// use pointcut_patterns::{HierarchyMode, TypePattern};
///
/// let pattern = TypePattern::compile("foo..*+")?;
/// assert_eq!(pattern.hierarchy_mode(), HierarchyMode::AllSubtypes);
/// assert!(pattern.matches_name("foo.sub.Bar"));
/// assert!(!pattern.matches_name("other.Bar"));
/// # Ok::<(), pointcut_patterns::PatternError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TypePattern {
    source: String,
    hierarchy: HierarchyMode,
    dimensions: usize,
    matcher: Matcher,
}

fn strip_hierarchy_suffix(pattern: &str) -> Result<(&str, HierarchyMode), PatternError> {
    let (rest, mode) = match (pattern.strip_suffix('+'), pattern.strip_suffix('#')) {
        (Some(rest), _) => (rest, HierarchyMode::AllSubtypes),
        (None, Some(rest)) => (rest, HierarchyMode::BaseTypeOnly),
        (None, None) => return Ok((pattern, HierarchyMode::NotHierarchical)),
    };
    if rest.ends_with('+') || rest.ends_with('#') {
        return Err(syntax_error(
            "'+' and '#' hierarchy suffixes are mutually exclusive",
            rest.len(),
            pattern,
        ));
    }
    Ok((rest, mode))
}

fn strip_dimensions(mut text: &str) -> (&str, usize) {
    let mut dimensions = 0;
    while let Some(rest) = text.strip_suffix("[]") {
        text = rest;
        dimensions += 1;
    }
    (text, dimensions)
}

impl TypePattern {
    /// Compile a type pattern, classifying a trailing `+`/`#` suffix and any
    /// `[]` array dimensions.
    ///
    /// # Errors
    /// Returns [`PatternError`] for malformed wildcard text or a pattern
    /// carrying both hierarchy suffixes.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let (rest, hierarchy) = strip_hierarchy_suffix(pattern)?;
        let (element, dimensions) = strip_dimensions(rest);
        if element == ".." || element == "*..*" {
            return Ok(Self {
                source: element.to_owned(),
                hierarchy,
                dimensions,
                matcher: Matcher::Any,
            });
        }
        let segments = scan_segments(element)?;
        let regex = Regex::new(&build_regex_source(&segments))?;
        Ok(Self {
            source: element.to_owned(),
            hierarchy,
            dimensions,
            matcher: Matcher::Wildcard(regex),
        })
    }

    /// The pattern matching any type in any package.
    #[must_use]
    pub fn any() -> Self {
        Self {
            source: "*..*".to_owned(),
            hierarchy: HierarchyMode::NotHierarchical,
            dimensions: 0,
            matcher: Matcher::Any,
        }
    }

    /// Whether this pattern matches every type name.
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self.matcher, Matcher::Any) && self.dimensions == 0
    }

    /// The wildcard text without hierarchy suffix or array dimensions.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The hierarchy mode derived from the pattern suffix.
    #[must_use]
    pub fn hierarchy_mode(&self) -> HierarchyMode {
        self.hierarchy
    }

    /// Number of `[]` array dimensions the pattern requires.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Test one fully-qualified type name, hierarchy aside.
    ///
    /// Array dimensions are compared structurally: the candidate must carry
    /// exactly as many trailing `[]` pairs as the pattern did.
    #[must_use]
    pub fn matches_name(&self, candidate: &str) -> bool {
        let (element, dimensions) = strip_dimensions(candidate);
        if dimensions != self.dimensions {
            return false;
        }
        match &self.matcher {
            Matcher::Any => !element.is_empty(),
            Matcher::Wildcard(regex) => regex.is_match(element),
        }
    }
}

impl PartialEq for TypePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.hierarchy == other.hierarchy
            && self.dimensions == other.dimensions
    }
}

impl Eq for TypePattern {}

impl fmt::Display for TypePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)?;
        for _ in 0..self.dimensions {
            f.write_str("[]")?;
        }
        match self.hierarchy {
            HierarchyMode::NotHierarchical => Ok(()),
            HierarchyMode::AllSubtypes => f.write_str("+"),
            HierarchyMode::BaseTypeOnly => f.write_str("#"),
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests unwrap pattern compilation")]
mod tests {
    use super::*;

    fn compile(pattern: &str) -> TypePattern {
        TypePattern::compile(pattern).unwrap()
    }

    #[test]
    fn classifies_subtype_suffix() {
        assert_eq!(
            compile("foo.Bar+").hierarchy_mode(),
            HierarchyMode::AllSubtypes
        );
    }

    #[test]
    fn classifies_base_type_suffix() {
        assert_eq!(
            compile("foo.Bar#").hierarchy_mode(),
            HierarchyMode::BaseTypeOnly
        );
    }

    #[test]
    fn defaults_to_non_hierarchical() {
        assert_eq!(
            compile("foo.Bar").hierarchy_mode(),
            HierarchyMode::NotHierarchical
        );
    }

    #[test]
    fn rejects_both_suffixes() {
        let err = TypePattern::compile("foo.Bar+#").unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
        assert!(TypePattern::compile("foo.Bar#+").is_err());
    }

    #[test]
    fn display_round_trips_to_an_equal_pattern() {
        for text in ["foo.Bar", "foo..*+", "*..*", "a.b$C#", "int[][]"] {
            let first = compile(text);
            let second = compile(&first.to_string());
            assert_eq!(first, second, "round trip for `{text}`");
        }
    }

    #[test]
    fn any_pattern_matches_simple_names() {
        assert!(TypePattern::any().matches_name("Foo"));
        assert!(TypePattern::any().matches_name("foo.sub.Bar"));
        assert!(!TypePattern::any().matches_name(""));
        assert!(compile("..").matches_name("Foo"));
    }

    #[test]
    fn array_dimensions_must_match() {
        let pattern = compile("java.lang.String[]");
        assert!(pattern.matches_name("java.lang.String[]"));
        assert!(!pattern.matches_name("java.lang.String"));
        assert!(!pattern.matches_name("java.lang.String[][]"));
    }

    #[test]
    fn suffix_does_not_leak_into_matching() {
        let pattern = compile("foo.Bar+");
        assert!(pattern.matches_name("foo.Bar"));
        assert!(!pattern.matches_name("foo.Bar+"));
    }
}
