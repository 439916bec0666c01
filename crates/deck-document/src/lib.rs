//! # deck-document — YAML/JSON Backend
//!
//! A [`Reader`](deck_core::Reader) implementation over configuration decks
//! written in YAML or JSON, with callables supplied as native closures.
//!
//! ```
//! use deck_core::{Arity, KeyPath, Reader, Value};
//! use deck_document::DocumentReader;
//!
//! let mut reader = DocumentReader::parse_str("solver: {dt: 0.5}").unwrap();
//! reader
//!     .define_function("source", Arity::Fixed(3), |args| {
//!         let sum = args.iter().filter_map(Value::as_double).sum::<f64>();
//!         Ok(vec![Value::Double(sum)])
//!     })
//!     .unwrap();
//!
//! assert_eq!(reader.get_double(&KeyPath::parse("solver.dt").unwrap()), Some(0.5));
//! ```
//!
//! ## Crate Policy
//!
//! - `serde_yaml` types never escape this crate.
//! - Parse failures are [`BackendError::Parse`](deck_core::BackendError),
//!   returned before any schema work happens.

pub mod document;
pub mod function;
pub mod options;

pub use document::DocumentReader;
pub use function::NativeFunction;
pub use options::ReaderOptions;
