//! Algebraic pattern data type and its matcher evaluator.
//!
//! `Pattern` is a closed, cycle-free sum type: every variant is constructible
//! at startup and composes into arbitrarily nested matchers. Evaluation
//! (`Pattern::match_at`) is total and leftmost-longest per pattern, with no
//! backtracking across alternatives — it either returns the single maximal
//! length for a position or reports no match.
//!
//! Patterns form a recursive tree via `Box`; an arena-of-indices
//! representation was considered (see the open question about cyclic data in
//! the design notes) but rejected here since patterns are built once and
//! never mutated, so `Box` recursion gives the same movability/no-aliasing
//! properties without a separate arena type.

use crate::charclass::CharClass;

/// The result of attempting to match a [`Pattern`] at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    /// Whether the pattern matched at the given position.
    pub matched: bool,
    /// Length in bytes consumed by the match. Always 0 when `matched` is
    /// false.
    pub length: usize,
}

impl MatchResult {
    const NONE: Self = Self {
        matched: false,
        length: 0,
    };

    #[inline]
    const fn of(length: usize) -> Self {
        Self {
            matched: true,
            length,
        }
    }
}

/// A closed algebraic sum type describing a byte-level matcher.
///
/// Every constructor is cycle-free: nested patterns are held behind `Box`, so
/// a `Pattern` tree is always finite and trivially movable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Exact byte sequence match.
    Literal(Vec<u8>),
    /// A single byte belonging to the given [`CharClass`].
    Class(CharClass),
    /// A single byte `b` with `lo <= b <= hi`.
    Range(u8, u8),
    /// A single byte present in the given set.
    AnyOf(Vec<u8>),
    /// Any single byte, as long as one remains.
    Any,
    /// Concatenation: every sub-pattern must match in order.
    Sequence(Vec<Pattern>),
    /// Greedy repetition, minimum one match.
    OneOrMore(Box<Pattern>),
    /// Greedy repetition, minimum zero matches (always succeeds).
    ZeroOrMore(Box<Pattern>),
    /// Zero-or-one: tries the inner pattern, always succeeds.
    Optional(Box<Pattern>),
    /// Consumes bytes one at a time until the inner (delimiter) pattern would
    /// match at the current position. Matches zero bytes if the delimiter
    /// matches immediately, and matches to end-of-input if the delimiter is
    /// never found. Always succeeds.
    ///
    /// `Until` has no escape-sequence awareness: `until(literal("\""))` will
    /// stop at the first `"`, including one preceded by a backslash. Escaped
    /// delimiters require a custom matcher composed around `Until`, not a
    /// variant of `Until` itself.
    Until(Box<Pattern>),
}

impl Pattern {
    /// Convenience constructor for [`Pattern::Literal`].
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Pattern::Literal(bytes.into())
    }

    /// Convenience constructor for [`Pattern::AnyOf`].
    pub fn any_of(bytes: impl Into<Vec<u8>>) -> Self {
        Pattern::AnyOf(bytes.into())
    }

    /// Convenience constructor for [`Pattern::OneOrMore`].
    pub fn one_or_more(inner: Pattern) -> Self {
        Pattern::OneOrMore(Box::new(inner))
    }

    /// Convenience constructor for [`Pattern::ZeroOrMore`].
    pub fn zero_or_more(inner: Pattern) -> Self {
        Pattern::ZeroOrMore(Box::new(inner))
    }

    /// Convenience constructor for [`Pattern::Optional`].
    pub fn optional(inner: Pattern) -> Self {
        Pattern::Optional(Box::new(inner))
    }

    /// Convenience constructor for [`Pattern::Until`].
    pub fn until(delimiter: Pattern) -> Self {
        Pattern::Until(Box::new(delimiter))
    }

    /// Matches this pattern against `input` starting at `pos`.
    ///
    /// Precondition: `pos <= input.len()`. Postcondition: if matched,
    /// `pos + length <= input.len()`; the evaluator never consumes past the
    /// end of `input` and never modifies it. This function never errors —
    /// "no match" is a value, not an error.
    pub fn match_at(&self, input: &[u8], pos: usize) -> MatchResult {
        debug_assert!(pos <= input.len());
        match self {
            Pattern::Literal(bytes) => match_literal(bytes, input, pos),
            Pattern::Class(class) => match input.get(pos) {
                Some(&b) if CharClass::of(b) == *class => MatchResult::of(1),
                _ => MatchResult::NONE,
            },
            Pattern::Range(lo, hi) => match input.get(pos) {
                Some(&b) if b >= *lo && b <= *hi => MatchResult::of(1),
                _ => MatchResult::NONE,
            },
            Pattern::AnyOf(set) => match input.get(pos) {
                Some(&b) if set.contains(&b) => MatchResult::of(1),
                _ => MatchResult::NONE,
            },
            Pattern::Any => {
                if pos < input.len() {
                    MatchResult::of(1)
                } else {
                    MatchResult::NONE
                }
            }
            Pattern::Sequence(parts) => {
                let mut total = 0usize;
                for part in parts {
                    let r = part.match_at(input, pos + total);
                    if !r.matched {
                        return MatchResult::NONE;
                    }
                    total += r.length;
                }
                MatchResult::of(total)
            }
            Pattern::OneOrMore(inner) => {
                let total = match_repeat(inner, input, pos);
                if total == 0 {
                    MatchResult::NONE
                } else {
                    MatchResult::of(total)
                }
            }
            Pattern::ZeroOrMore(inner) => MatchResult::of(match_repeat(inner, input, pos)),
            Pattern::Optional(inner) => {
                let r = inner.match_at(input, pos);
                if r.matched {
                    r
                } else {
                    MatchResult::of(0)
                }
            }
            Pattern::Until(delimiter) => {
                let mut offset = 0usize;
                while pos + offset < input.len() {
                    if delimiter.match_at(input, pos + offset).matched {
                        break;
                    }
                    offset += 1;
                }
                MatchResult::of(offset)
            }
        }
    }
}

/// Greedy repeats `inner` starting at `pos`, terminating on the first
/// non-match or the first zero-length match (preventing non-termination on
/// nullable inner patterns). Returns the total length consumed.
fn match_repeat(inner: &Pattern, input: &[u8], pos: usize) -> usize {
    let mut total = 0usize;
    loop {
        let r = inner.match_at(input, pos + total);
        if !r.matched || r.length == 0 {
            break;
        }
        total += r.length;
    }
    total
}

/// Word-sized scalar compares for the common short literal lengths; falls
/// back to a byte-slice compare otherwise. The compiler lowers the slice
/// compare to the same code a hand-written loop would, but keeping the
/// explicit length check documents the fast-path contract from the matcher's
/// benchmark suite.
// `candidate`/`bytes` are sliced or matched to exactly 4/8 bytes in the
// corresponding arm below, so the fixed-size conversions here never fail.
#[allow(clippy::unwrap_used)]
#[inline]
fn match_literal(bytes: &[u8], input: &[u8], pos: usize) -> MatchResult {
    let len = bytes.len();
    if pos + len > input.len() {
        return MatchResult::NONE;
    }
    let candidate = &input[pos..pos + len];
    let eq = match len {
        1 => candidate[0] == bytes[0],
        2 => u16::from_ne_bytes([candidate[0], candidate[1]])
            == u16::from_ne_bytes([bytes[0], bytes[1]]),
        4 => u32::from_ne_bytes(candidate.try_into().unwrap())
            == u32::from_ne_bytes(bytes.try_into().unwrap()),
        8 => u64::from_ne_bytes(candidate.try_into().unwrap())
            == u64::from_ne_bytes(bytes.try_into().unwrap()),
        _ => candidate == bytes,
    };
    if eq {
        MatchResult::of(len)
    } else {
        MatchResult::NONE
    }
}
