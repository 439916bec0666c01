//! # Key Paths
//!
//! A [`KeyPath`] addresses a node in a configuration document or schema:
//! a sequence of [`Segment`]s, each either a name or an integer index.
//!
//! ## Text form
//!
//! Segments are joined with `.`. A segment made only of ASCII digits, with
//! an optional leading `-`, is an index; anything else is a name. So
//! `thermal_solver.bcs.7.attrs` is four segments, the third an index.
//! Empty segments are rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DeckError;

/// Separator between segments in the text form.
pub const SEPARATOR: char = '.';

/// One step in a [`KeyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Integer key, as used by arrays.
    Index(i64),
    /// String key.
    Name(String),
}

impl Segment {
    fn parse(text: &str) -> Self {
        let digits = text.strip_prefix('-').unwrap_or(text);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = text.parse::<i64>() {
                return Self::Index(i);
            }
        }
        Self::Name(text.to_string())
    }

    pub fn as_index(&self) -> Option<i64> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(n) => Some(n),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(n) => f.write_str(n),
        }
    }
}

impl From<i64> for Segment {
    fn from(i: i64) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for Segment {
    fn from(n: &str) -> Self {
        Self::Name(n.to_string())
    }
}

/// Dotted path into a document or schema tree. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct KeyPath(Vec<Segment>);

impl KeyPath {
    /// The root path (no segments).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse the dotted text form. The empty string is the root.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::InvalidPath`] if any segment is empty.
    pub fn parse(text: &str) -> Result<Self, DeckError> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        text.split(SEPARATOR)
            .map(|seg| {
                if seg.is_empty() {
                    Err(DeckError::InvalidPath {
                        path: text.to_string(),
                        reason: "empty segment".to_string(),
                    })
                } else {
                    Ok(Segment::parse(seg))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self(segments.into_iter().collect())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The final segment, or `None` for the root.
    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// This path without its final segment. The root's parent is the root.
    pub fn parent(&self) -> KeyPath {
        let mut segments = self.0.clone();
        segments.pop();
        Self(segments)
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<Segment>) -> KeyPath {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// A new path with every segment of `other` appended.
    pub fn join(&self, other: &KeyPath) -> KeyPath {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Whether `self` is `prefix` or lies underneath it.
    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<KeyPath> for String {
    fn from(p: KeyPath) -> String {
        p.to_string()
    }
}

impl TryFrom<String> for KeyPath {
    type Error = DeckError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}
