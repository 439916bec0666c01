//! Backend configuration.

use serde::{Deserialize, Serialize};

/// How a [`DocumentReader`](crate::DocumentReader) interprets a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Index reported for the first element of a YAML/JSON sequence.
    ///
    /// Mappings with integer keys always keep their own keys; this only
    /// affects plain sequences. Use `1` to match decks written for
    /// 1-based scripting backends.
    pub sequence_base: i64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { sequence_base: 0 }
    }
}
