//! # Diagnostics
//!
//! Verification never stops at the first problem. Every violated rule
//! becomes one [`Diagnostic`] carrying the full concrete path of the node
//! that violated it, and the whole pass produces one
//! [`VerificationReport`].
//!
//! ## Invariant
//!
//! A report is a pass exactly when it holds no diagnostics. There is no
//! separate success flag that could disagree with the list.

use std::fmt;

use deck_core::KeyPath;
use serde::Serialize;

/// What kind of rule a [`Diagnostic`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A required node is absent from the document.
    MissingRequired,
    /// A document value has the wrong type for its declaration.
    TypeMismatch,
    /// A numeric value lies outside its declared range.
    RangeViolation,
    /// A value is not a member of its declared discrete set.
    DiscreteSetViolation,
    /// A callable is missing or its arity does not fit the declared signature.
    SignatureMismatch,
    /// A caller-registered verifier returned `false`.
    VerifierFailed,
    /// A verifier's call into a bound function failed.
    CallError,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequired => "missing required",
            Self::TypeMismatch => "type mismatch",
            Self::RangeViolation => "range violation",
            Self::DiscreteSetViolation => "discrete set violation",
            Self::SignatureMismatch => "signature mismatch",
            Self::VerifierFailed => "verifier failed",
            Self::CallError => "call error",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Concrete path of the offending node (array indices included).
    pub path: KeyPath,
    /// Rule category.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "  (root): {}: {}", self.kind, self.message)
        } else {
            write!(f, "  {}: {}: {}", self.path, self.kind, self.message)
        }
    }
}

/// Outcome of a verification pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationReport {
    diagnostics: Vec<Diagnostic>,
}

impl VerificationReport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, path: &KeyPath, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(path = %path, %kind, "{message}");
        self.diagnostics.push(Diagnostic {
            path: path.clone(),
            kind,
            message,
        });
    }

    /// Whether every rule passed.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// All diagnostics in traversal order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// Diagnostics reported at exactly `path`.
    pub fn at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.path.to_string() == path)
    }

    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return f.write_str("verification passed");
        }
        writeln!(f, "verification failed with {} diagnostic(s):", self.len())?;
        for (i, d) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}
