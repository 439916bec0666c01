//! # deck-core — Foundational Types for deck
//!
//! The leaf crate of the deck workspace. It defines what the schema engine
//! and every document backend must agree on:
//!
//! - the closed value-type system ([`ValueType`], [`Value`],
//!   [`FunctionType`], [`CallValue`], [`Vector3D`]),
//! - addressing ([`KeyPath`], [`Segment`]) and backend-ordered arrays
//!   ([`IndexedMap`]),
//! - the [`Reader`] capability backends implement and the [`Mirror`]
//!   capability stores implement,
//! - the error hierarchy ([`DeckError`], [`CallError`], [`BackendError`]).
//!
//! ## Crate Policy
//!
//! - No dependencies on other `deck-*` crates.
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.
//! - A backend's native value representation never appears in this
//!   crate's API.

pub mod error;
pub mod indexed;
pub mod mirror;
pub mod path;
pub mod reader;
pub mod value;
pub mod vector;

pub use error::{BackendError, CallError, DeckError, DeckResult};
pub use indexed::IndexedMap;
pub use mirror::{Mirror, StoreNode, TreeStore};
pub use path::{KeyPath, Segment};
pub use reader::{Arity, Callable, Reader};
pub use value::{CallValue, FromCallValue, FunctionType, Signature, Value, ValueType};
pub use vector::Vector3D;
