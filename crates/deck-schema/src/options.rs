//! Deck-wide configuration.

use serde::{Deserialize, Serialize};

/// Options fixed when a [`Deck`](crate::Deck) is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckOptions {
    /// Retain node descriptions and allow [`Deck::write_docs`](crate::Deck::write_docs).
    ///
    /// When disabled, descriptions passed to the `add_*` builders are
    /// dropped and no reference documentation can be produced.
    pub docs_enabled: bool,
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self { docs_enabled: true }
    }
}
