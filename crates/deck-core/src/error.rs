//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types shared by every deck crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Programmer errors (incompatible redeclaration, extraction with the
//!   wrong native type, malformed paths) are returned as [`DeckError`] at
//!   the call site that made the mistake.
//! - Data errors found while verifying a document are *not* errors at all:
//!   they are collected as diagnostics by the verification engine.
//! - Bound-function failures are [`CallError`]; faults raised inside a
//!   backend are [`BackendError`].

use thiserror::Error;

use crate::value::FunctionType;

/// Crate-wide result alias.
pub type DeckResult<T> = Result<T, DeckError>;

/// Top-level error type for schema definition and typed extraction.
#[derive(Error, Debug)]
pub enum DeckError {
    /// A path was redeclared with an incompatible kind, type, or constraint.
    #[error("schema conflict at '{path}': {reason}")]
    SchemaConflict {
        /// Dotted path of the conflicting declaration.
        path: String,
        /// What the existing declaration is and why it cannot be reused.
        reason: String,
    },

    /// A default, constraint bound, or extraction target does not match the
    /// declared type.
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Dotted path of the offending node.
        path: String,
        /// The declared type.
        expected: String,
        /// The type that was supplied or requested.
        found: String,
    },

    /// A constraint was malformed (e.g. an inverted range).
    #[error("invalid constraint at '{path}': {reason}")]
    InvalidConstraint {
        /// Dotted path of the field.
        path: String,
        /// Why the constraint is rejected.
        reason: String,
    },

    /// A path string could not be parsed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The raw path text.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No schema node is declared at the requested path.
    #[error("nothing is declared at '{path}'")]
    NotDeclared {
        /// Dotted path that was looked up.
        path: String,
    },

    /// A non-optional extraction found no value (neither in the document
    /// nor as a default).
    #[error("no value at '{path}'")]
    NoValue {
        /// Dotted path of the absent value.
        path: String,
    },

    /// No factory is registered for the requested native type.
    #[error("no factory registered for '{type_name}' at '{path}'")]
    NoFactory {
        /// Dotted path of the table the factory was requested for.
        path: String,
        /// `std::any::type_name` of the requested type.
        type_name: &'static str,
    },

    /// A bound function failed.
    #[error("call error: {0}")]
    Call(#[from] CallError),

    /// The backend failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl DeckError {
    /// Convenience constructor for [`DeckError::TypeMismatch`].
    pub fn type_mismatch(
        path: impl ToString,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Convenience constructor for [`DeckError::SchemaConflict`].
    pub fn conflict(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::SchemaConflict {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure of a bound function call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallError {
    /// The number of native arguments does not match the declared signature.
    #[error("'{path}' expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        /// Path of the binding.
        path: String,
        /// Declared argument count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// A native argument cannot be marshaled as the declared argument type.
    #[error("argument {position} of '{path}' must be {expected}, got {found}")]
    ArgumentType {
        /// Path of the binding.
        path: String,
        /// Zero-based argument position.
        position: usize,
        /// Declared type.
        expected: FunctionType,
        /// Supplied type.
        found: FunctionType,
    },

    /// The backend return values cannot be marshaled into the declared
    /// return type.
    #[error("'{path}' must return {expected}: {reason}")]
    ReturnType {
        /// Path of the binding.
        path: String,
        /// Declared return type.
        expected: FunctionType,
        /// What was wrong with the returned values.
        reason: String,
    },

    /// The native type requested by the caller does not match the declared
    /// return type.
    #[error("'{path}' returns {declared}, caller requested {requested}")]
    RequestedType {
        /// Path of the binding.
        path: String,
        /// Declared return type.
        declared: FunctionType,
        /// Native type the caller asked for.
        requested: FunctionType,
    },

    /// The backend callable's arity is incompatible with the signature.
    #[error("'{path}' takes {actual} backend argument(s), signature needs {expected}")]
    Arity {
        /// Path of the binding.
        path: String,
        /// Flattened arity of the declared signature.
        expected: usize,
        /// Arity reported by the backend.
        actual: usize,
    },

    /// The backend logic raised a fault while executing.
    #[error("'{path}' failed during execution: {message}")]
    Fault {
        /// Path of the binding.
        path: String,
        /// Fault message reported by the backend.
        message: String,
    },
}

/// Failure inside a document backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The document could not be parsed. Raised before any verification.
    #[error("document parse error: {0}")]
    Parse(String),

    /// Backend-side logic raised a fault.
    #[error("backend fault: {0}")]
    Fault(String),
}
