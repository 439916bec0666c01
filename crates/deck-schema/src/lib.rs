//! # deck-schema — Schema, Verification, and Extraction
//!
//! Declare the expected shape of a configuration deck, verify a parsed
//! document against it in one non-short-circuiting pass, then extract
//! native values.
//!
//! ```
//! use deck_core::{Arity, FunctionType, Value, Vector3D};
//! use deck_document::DocumentReader;
//! use deck_schema::{Deck, DiagnosticKind};
//!
//! let mut reader = DocumentReader::parse_str("solver: {dt: 0.9}").unwrap();
//! reader
//!     .define_function("source", Arity::Fixed(3), |args| {
//!         Ok(vec![Value::Double(args.iter().filter_map(Value::as_double).sum())])
//!     })
//!     .unwrap();
//!
//! let mut deck = Deck::new(reader);
//! deck.add_double("solver.dt", "time step").unwrap().add_range(0.0, 0.5).unwrap();
//! deck.add_function("source", FunctionType::Double, [FunctionType::Vec3D], "")
//!     .unwrap()
//!     .required(true);
//!
//! let report = deck.verify();
//! assert_eq!(report.len(), 1);
//! assert_eq!(report.diagnostics()[0].kind, DiagnosticKind::RangeViolation);
//!
//! let total: f64 = deck.call("source", Vector3D::new(1.0, 2.0, 3.0)).unwrap();
//! assert_eq!(total, 6.0);
//! ```
//!
//! ## Crate Policy
//!
//! - Data problems are diagnostics in a [`VerificationReport`]; only
//!   programmer errors are returned as [`DeckError`](deck_core::DeckError).
//! - The engine talks to documents only through
//!   [`Reader`](deck_core::Reader).
//! - No `.unwrap()` outside tests.

pub mod deck;
pub mod diagnostic;
pub mod docs;
pub mod export;
pub mod factory;
pub mod field;
pub mod function;
mod marshal;
pub mod options;
pub mod table;
mod verify;
pub mod view;

pub use deck::Deck;
pub use diagnostic::{Diagnostic, DiagnosticKind, VerificationReport};
pub use docs::SchemaDocs;
pub use factory::FactoryRegistry;
pub use field::{Constraint, Field, FieldShape, FieldValue};
pub use function::{BoundFunction, FunctionBinding, FunctionView, IntoArgs};
pub use options::DeckOptions;
pub use table::{Table, TableKind};
pub use view::{Built, FromDeck, NodeRef, View};
