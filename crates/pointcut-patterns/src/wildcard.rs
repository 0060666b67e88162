//! Wildcard segmentation and matcher-source construction.
//!
//! A dotted wildcard string is scanned once into [`Segment`]s: a `Name`
//! segment matches exactly one dot-delimited identifier (with in-segment `*`
//! and `?` wildcards), while a `Gap` (written `..`) matches zero or more whole
//! segments. The segments are then translated into an anchored regular
//! expression compiled exactly once, so matching is a single regex test.

use crate::errors::{PatternError, syntax_error};

/// One atom inside a name segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SegmentPart {
    /// A run of literal characters.
    Literal(String),
    /// `*`: any run of characters within the segment, including none.
    AnyRun,
    /// `?`: exactly one character within the segment.
    AnyChar,
}

/// One dot-delimited element of a wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    /// `..`: zero or more whole segments.
    Gap,
    /// A single segment, matched atom by atom.
    Name(Vec<SegmentPart>),
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn flush_literal(literal: &mut String, parts: &mut Vec<SegmentPart>) {
    if !literal.is_empty() {
        parts.push(SegmentPart::Literal(std::mem::take(literal)));
    }
}

/// Scan the atoms of a single (dot-free) name segment.
pub(crate) fn scan_parts(pattern: &str) -> Result<Vec<SegmentPart>, PatternError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    for (pos, c) in pattern.char_indices() {
        match c {
            '*' => {
                flush_literal(&mut literal, &mut parts);
                parts.push(SegmentPart::AnyRun);
            }
            '?' => {
                flush_literal(&mut literal, &mut parts);
                parts.push(SegmentPart::AnyChar);
            }
            c if is_name_char(c) => literal.push(c),
            '.' => return Err(syntax_error("'.' is not allowed here", pos, pattern)),
            _ => return Err(syntax_error("unexpected character", pos, pattern)),
        }
    }
    flush_literal(&mut literal, &mut parts);
    if parts.is_empty() {
        return Err(syntax_error("empty pattern", 0, pattern));
    }
    Ok(parts)
}

/// Scan a dotted wildcard string into segments.
///
/// `..` produces a [`Segment::Gap`]; a single `.` separates two `Name`
/// segments. Three or more consecutive dots, a leading or trailing single
/// dot, and characters outside the identifier/wildcard alphabet are
/// [`PatternError`]s.
pub(crate) fn scan_segments(pattern: &str) -> Result<Vec<Segment>, PatternError> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut parts: Vec<SegmentPart> = Vec::new();
    let mut literal = String::new();
    let mut pending_separator = false;
    let mut chars = pattern.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '.' => {
                flush_literal(&mut literal, &mut parts);
                if parts.is_empty() {
                    // No name directly before this dot: legal only as the
                    // start of a leading gap.
                    if pending_separator || matches!(segments.last(), Some(Segment::Gap)) {
                        return Err(syntax_error("stray '.'", pos, pattern));
                    }
                    if chars.next_if(|&(_, next)| next == '.').is_none() {
                        return Err(syntax_error("pattern may not begin with '.'", pos, pattern));
                    }
                    segments.push(Segment::Gap);
                } else {
                    segments.push(Segment::Name(std::mem::take(&mut parts)));
                    pending_separator = false;
                    if chars.next_if(|&(_, next)| next == '.').is_some() {
                        segments.push(Segment::Gap);
                    } else {
                        pending_separator = true;
                    }
                }
            }
            '*' => {
                flush_literal(&mut literal, &mut parts);
                parts.push(SegmentPart::AnyRun);
            }
            '?' => {
                flush_literal(&mut literal, &mut parts);
                parts.push(SegmentPart::AnyChar);
            }
            c if is_name_char(c) => literal.push(c),
            _ => return Err(syntax_error("unexpected character", pos, pattern)),
        }
    }

    flush_literal(&mut literal, &mut parts);
    if parts.is_empty() {
        if pending_separator {
            return Err(syntax_error(
                "pattern may not end with a single '.'",
                pattern.len(),
                pattern,
            ));
        }
    } else {
        segments.push(Segment::Name(parts));
    }
    if segments.is_empty() {
        return Err(syntax_error("empty pattern", 0, pattern));
    }
    Ok(segments)
}

fn push_name_source(out: &mut String, parts: &[SegmentPart]) {
    if let [SegmentPart::AnyRun] = parts {
        // A lone `*` matches exactly one non-empty segment.
        out.push_str("[^.]+");
        return;
    }
    for part in parts {
        match part {
            SegmentPart::Literal(text) => out.push_str(&regex::escape(text)),
            SegmentPart::AnyRun => out.push_str("[^.]*"),
            SegmentPart::AnyChar => out.push_str("[^.]"),
        }
    }
}

/// Build an anchored regex source matching a single dot-free name.
pub(crate) fn build_name_regex_source(parts: &[SegmentPart]) -> String {
    let mut out = String::from("^");
    push_name_source(&mut out, parts);
    out.push('$');
    out
}

/// Build an anchored regex source matching a whole dotted name.
pub(crate) fn build_regex_source(segments: &[Segment]) -> String {
    let mut out = String::from("^");
    let mut after_name = false;
    let mut segs = segments.iter().peekable();
    while let Some(segment) = segs.next() {
        match segment {
            Segment::Name(parts) => {
                if after_name {
                    out.push_str(r"\.");
                }
                push_name_source(&mut out, parts);
                after_name = true;
            }
            Segment::Gap => {
                if after_name {
                    if segs.peek().is_some() {
                        // Between names: the separator plus any number of
                        // intermediate segments.
                        out.push_str(r"(?:\.[^.]+)*\.");
                    } else {
                        // Trailing gap: any number of deeper segments.
                        out.push_str(r"(?:\.[^.]+)*");
                    }
                    after_name = false;
                } else if segs.peek().is_some() {
                    // Leading gap: any number of package segments.
                    out.push_str(r"(?:[^.]+\.)*");
                } else {
                    // A bare `..` matches any dotted name.
                    out.push_str(r"[^.]+(?:\.[^.]+)*");
                }
            }
        }
    }
    out.push('$');
    out
}
