//! Pattern compilation: turning `/users/:id(\d+)/?:format` into typed segments.
//!
//! Each non-empty `/`-delimited piece of a pattern is classified as one of:
//!
//! | Syntax          | Segment                                   |
//! |-----------------|-------------------------------------------|
//! | `users`         | [`Segment::Literal`] (lower-cased)        |
//! | `*`             | [`Segment::Wildcard`]                     |
//! | `:id`           | [`Segment::Named`] without constraint     |
//! | `:id(\d+)`      | [`Segment::Named`] with a regex constraint|
//! | `?:fmt`         | [`Segment::OptionalNamed`]                |
//! | `?:fmt(json)`   | [`Segment::OptionalNamed`] with constraint|
//! | `(\d+)`         | [`Segment::Regex`] (unnamed capture)      |
//!
//! Literals and capture names are lower-cased because request paths are
//! lower-cased before matching. Regex bodies keep their source text so escapes
//! such as `\D` or `\W` keep their meaning, and compile case-insensitively so
//! `:lang(EN|FR)` still matches the lower-cased `en`.
//!
//! Two compilation modes share one parser. [`compile_pattern`] is strict and
//! reports the first malformed constraint. [`compile_pattern_lenient`] degrades a
//! malformed constraint to "no constraint" and logs a warning instead.

use regex::{Regex, RegexBuilder};
use std::fmt;
use tracing::warn;

/// A compiled regular expression attached to a segment.
///
/// Equality compares the source text, which is what sibling reuse during
/// insertion needs.
#[derive(Debug, Clone)]
pub struct Constraint {
    source: String,
    regex: Regex,
}

impl Constraint {
    fn compile(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: source.to_string(),
            regex: RegexBuilder::new(source).case_insensitive(true).build()?,
        })
    }

    /// The regex source as written in the pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Unanchored test: the segment matches if the regex finds a match anywhere in it.
    #[inline]
    #[must_use]
    pub fn is_match(&self, segment: &str) -> bool {
        self.regex.is_match(segment)
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Constraint {}

/// One compiled unit of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Exact, case-normalized text.
    Literal(String),
    /// `*`: greedy or shrinking multi-segment capture.
    Wildcard,
    /// `:name` or `:name(regex)`.
    Named {
        name: String,
        constraint: Option<Constraint>,
    },
    /// `?:name` or `?:name(regex)`: may be satisfied by absence.
    OptionalNamed {
        name: String,
        constraint: Option<Constraint>,
    },
    /// `(regex)`: captured without a name.
    Regex(Constraint),
}

impl Segment {
    /// Returns true for `?:name` segments.
    #[inline]
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Segment::OptionalNamed { .. })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Wildcard => f.write_str("*"),
            Segment::Named { name, constraint } => {
                write!(f, ":{name}")?;
                if let Some(c) = constraint {
                    write!(f, "({})", c.as_str())?;
                }
                Ok(())
            }
            Segment::OptionalNamed { name, constraint } => {
                write!(f, "?:{name}")?;
                if let Some(c) = constraint {
                    write!(f, "({})", c.as_str())?;
                }
                Ok(())
            }
            Segment::Regex(c) => write!(f, "({})", c.as_str()),
        }
    }
}

/// A malformed constraint found while compiling a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// `:id()` or `()`: parentheses with nothing inside.
    EmptyConstraint {
        /// The offending pattern piece
        segment: String,
    },
    /// `:id(\d+`: an opening parenthesis that never closes.
    UnterminatedConstraint {
        /// The offending pattern piece
        segment: String,
    },
    /// The constraint does not compile as a regular expression.
    InvalidRegex {
        /// The offending pattern piece
        segment: String,
        /// Message from the regex compiler
        message: String,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::EmptyConstraint { segment } => {
                write!(f, "empty regex constraint in segment '{segment}'")
            }
            PatternError::UnterminatedConstraint { segment } => {
                write!(
                    f,
                    "unterminated regex constraint in segment '{segment}': expected a closing ')'"
                )
            }
            PatternError::InvalidRegex { segment, message } => {
                write!(f, "invalid regex constraint in segment '{segment}': {message}")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Compile a pattern, failing on the first malformed constraint.
///
/// # Errors
///
/// Returns a [`PatternError`] describing the first piece whose constraint is
/// empty, unterminated or not a valid regular expression.
pub fn compile_pattern(pattern: &str) -> Result<Vec<Segment>, PatternError> {
    pieces(pattern)
        .map(|piece| match parse_piece(piece) {
            (_, Some(err)) => Err(err),
            (segment, None) => Ok(segment),
        })
        .collect()
}

/// Compile a pattern, degrading malformed constraints to "no constraint".
///
/// Never fails. Every degradation is logged at `warn` with the pattern and reason.
#[must_use]
pub fn compile_pattern_lenient(pattern: &str) -> Vec<Segment> {
    pieces(pattern)
        .map(|piece| {
            let (segment, err) = parse_piece(piece);
            if let Some(err) = err {
                warn!(
                    pattern = %pattern,
                    error = %err,
                    degraded_to = %segment,
                    "Malformed route constraint ignored"
                );
            }
            segment
        })
        .collect()
}

fn pieces(pattern: &str) -> impl Iterator<Item = &str> {
    pattern.split('/').filter(|piece| !piece.is_empty())
}

/// Classify one piece. Always yields a usable segment; the error, if any,
/// describes what was dropped to produce it.
fn parse_piece(piece: &str) -> (Segment, Option<PatternError>) {
    if let Some(body) = piece.strip_prefix("?:") {
        let (name, constraint, err) = parse_capture(piece, body);
        return (Segment::OptionalNamed { name, constraint }, err);
    }
    if let Some(body) = piece.strip_prefix(':') {
        let (name, constraint, err) = parse_capture(piece, body);
        return (Segment::Named { name, constraint }, err);
    }
    if piece == "*" {
        return (Segment::Wildcard, None);
    }
    if piece.len() >= 2 && piece.starts_with('(') && piece.ends_with(')') {
        let source = &piece[1..piece.len() - 1];
        let err = if source.is_empty() {
            PatternError::EmptyConstraint {
                segment: piece.to_string(),
            }
        } else {
            match Constraint::compile(source) {
                Ok(constraint) => return (Segment::Regex(constraint), None),
                Err(e) => PatternError::InvalidRegex {
                    segment: piece.to_string(),
                    message: e.to_string(),
                },
            }
        };
        // An unusable bare regex still captures one segment positionally.
        let degraded = Segment::Named {
            name: String::new(),
            constraint: None,
        };
        return (degraded, Some(err));
    }
    (Segment::Literal(piece.to_lowercase()), None)
}

/// Split `name(regex)` into its parts. `piece` is the full text for error reports.
fn parse_capture(piece: &str, body: &str) -> (String, Option<Constraint>, Option<PatternError>) {
    let Some(open) = body.find('(') else {
        return (body.to_lowercase(), None, None);
    };
    if !body.ends_with(')') {
        let err = PatternError::UnterminatedConstraint {
            segment: piece.to_string(),
        };
        return (body.to_lowercase(), None, Some(err));
    }

    let name = body[..open].to_lowercase();
    let source = &body[open + 1..body.len() - 1];
    if source.is_empty() {
        let err = PatternError::EmptyConstraint {
            segment: piece.to_string(),
        };
        return (name, None, Some(err));
    }
    match Constraint::compile(source) {
        Ok(constraint) => (name, Some(constraint), None),
        Err(e) => {
            let err = PatternError::InvalidRegex {
                segment: piece.to_string(),
                message: e.to_string(),
            };
            (name, None, Some(err))
        }
    }
}
