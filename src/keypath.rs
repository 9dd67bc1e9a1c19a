//! Key path codec.
//!
//! Translates between a path string such as `server.host` and the sequence of
//! segments used to walk a configuration tree:
//! - Splits on every unescaped separator (default `.`, `/` is common too)
//! - `\<sep>` is a literal separator inside a segment, `\\` a literal backslash
//! - Any other backslash is kept as-is
//! - Is pure string manipulation (no tree or filesystem access)

use crate::error::{ConfigError, Result};
use std::fmt;

/// Default segment separator.
pub const DEFAULT_SEPARATOR: char = '.';

/// Escape character for literal separators.
pub const ESCAPE: char = '\\';

/// A parsed key path: a non-empty sequence of non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a path string using the given separator.
    pub fn parse(path: &str, sep: char) -> Result<Self> {
        split(path, sep).map(|segments| Self { segments })
    }

    /// Build a key path from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(ConfigError::invalid_path("", "path has no segments"));
        }
        if segments.iter().any(String::is_empty) {
            return Err(ConfigError::invalid_path(
                &segments.join("."),
                "path contains an empty segment",
            ));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Split into the parent segments and the final segment.
    pub fn split_last(&self) -> (&[String], &str) {
        // Construction guarantees at least one segment.
        let (last, parent) = self
            .segments
            .split_last()
            .map(|(last, parent)| (last.as_str(), parent))
            .unwrap_or(("", &[]));
        (parent, last)
    }

    /// Render with an explicit separator, escaping as needed.
    pub fn render(&self, sep: char) -> String {
        join(&self.segments, sep)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_SEPARATOR))
    }
}

/// Split a path string into segments.
///
/// Fails with `InvalidPath` for an empty path or one containing an empty
/// segment (`a..b`, `.a`, `a.`).
pub fn split(path: &str, sep: char) -> Result<Vec<String>> {
    if sep == ESCAPE {
        return Err(ConfigError::invalid_path(
            path,
            "separator can not be the escape character",
        ));
    }
    if path.is_empty() {
        return Err(ConfigError::invalid_path(path, "path is empty"));
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ESCAPE {
            match chars.peek() {
                Some(&next) if next == sep || next == ESCAPE => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push(c),
            }
        } else if c == sep {
            if current.is_empty() {
                return Err(ConfigError::invalid_path(path, "path contains an empty segment"));
            }
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }

    if current.is_empty() {
        return Err(ConfigError::invalid_path(path, "path contains an empty segment"));
    }
    segments.push(current);
    Ok(segments)
}

/// Join segments into a path string, escaping separators and backslashes.
pub fn join<S: AsRef<str>>(segments: &[S], sep: char) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.push_str(&escape(segment.as_ref(), sep));
    }
    out
}

/// Escape a single segment so it survives a `split` with the same separator.
pub fn escape(segment: &str, sep: char) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if c == sep || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out
}
