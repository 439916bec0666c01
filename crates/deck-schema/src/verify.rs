//! # Verification Engine
//!
//! Walks the schema tree depth-first against the document and records one
//! diagnostic per violated rule. The walk never stops early: a failure on
//! one node is recorded and traversal continues with its siblings.
//!
//! ## Per-node rules
//!
//! | Node | Absent | Present |
//! |------|--------|---------|
//! | Table | required → missing; skip subtree | verifiers, then children |
//! | Struct array | required → missing; skip | template body per document index |
//! | Scalar field | default, else required → missing | type, then constraint, then verifiers |
//! | Scalar array | required → missing | type and constraint per entry, then verifiers |
//! | Function | required → missing | callable and arity, then verifiers |
//!
//! Absent optional nodes take their whole subtree with them: a required
//! field inside an absent optional table is not reported.

use deck_core::{KeyPath, Reader};

use crate::diagnostic::{DiagnosticKind, VerificationReport};
use crate::field::{Field, FieldValue};
use crate::function::{BoundFunction, FunctionBinding, FunctionView};
use crate::table::Table;
use crate::view::{Context, NodeRef, View};

pub(crate) fn verify(ctx: Context<'_>, root: &Table) -> VerificationReport {
    let mut walker = Walker {
        ctx,
        report: VerificationReport::new(),
    };
    walker.table(root, &KeyPath::root());
    let report = walker.report;
    tracing::info!(
        passed = report.is_ok(),
        diagnostics = report.len(),
        "verification finished"
    );
    report
}

struct Walker<'a> {
    ctx: Context<'a>,
    report: VerificationReport,
}

impl<'a> Walker<'a> {
    fn reader(&self) -> &'a dyn Reader {
        self.ctx.reader
    }

    fn table(&mut self, table: &'a Table, path: &KeyPath) {
        if !path.is_root() && !self.reader().contains(path) {
            if table.is_required() {
                let what = if table.is_struct_array() { "struct array" } else { "table" };
                self.report.record(
                    path,
                    DiagnosticKind::MissingRequired,
                    format!("required {what} is absent"),
                );
            }
            return;
        }

        if !table.is_struct_array() {
            self.body(table, NodeRef::Table(table), path);
            return;
        }

        let Some(indices) = self.reader().get_indices(path) else {
            self.report.record(
                path,
                DiagnosticKind::TypeMismatch,
                "expected an array of tables",
            );
            return;
        };
        tracing::debug!(path = %path, elements = indices.len(), "verifying struct array");
        for i in indices {
            self.body(table, NodeRef::Element(table), &path.child(i));
        }
    }

    fn body(&mut self, table: &'a Table, node: NodeRef<'a>, path: &KeyPath) {
        let view = View::new(self.ctx, node, path.clone());
        for (n, verifier) in table.verifiers().iter().enumerate() {
            if !verifier(&view) {
                self.report.record(
                    path,
                    DiagnosticKind::VerifierFailed,
                    format!("verifier #{} returned false", n + 1),
                );
            }
        }

        for (segment, child) in table.children() {
            let child_path = path.child(segment.clone());
            match child {
                NodeRef::Table(t) | NodeRef::Element(t) => self.table(t, &child_path),
                NodeRef::Field(f) | NodeRef::Entry(f) if f.is_array() => self.array(f, &child_path),
                NodeRef::Field(f) | NodeRef::Entry(f) => self.scalar(f, &child_path),
                NodeRef::Function(b) => self.function(b, &child_path),
            }
        }
    }

    fn scalar(&mut self, field: &Field, path: &KeyPath) {
        let reader = self.reader();
        let ty = field.value_type();
        let from_document = reader.get_value(path, ty);
        if from_document.is_none() && reader.contains(path) {
            self.report.record(
                path,
                DiagnosticKind::TypeMismatch,
                format!("expected {ty}"),
            );
            return;
        }

        let Some(value) = from_document.or_else(|| field.default_value().cloned()) else {
            if field.is_required() {
                self.report.record(
                    path,
                    DiagnosticKind::MissingRequired,
                    format!("required {ty} field is absent"),
                );
            }
            return;
        };

        if let Some((kind, message)) = field.violation(&value) {
            self.report.record(path, kind, message);
        }
        self.field_verifiers(field, path, &FieldValue::Scalar(value));
    }

    fn array(&mut self, field: &Field, path: &KeyPath) {
        let reader = self.reader();
        let ty = field.value_type();
        if !reader.contains(path) {
            if field.is_required() {
                self.report.record(
                    path,
                    DiagnosticKind::MissingRequired,
                    format!("required array of {ty} is absent"),
                );
            }
            return;
        }

        let Some((accepted, rejected)) = field.resolve_array(reader, path) else {
            self.report.record(
                path,
                DiagnosticKind::TypeMismatch,
                format!("expected an array of {ty}"),
            );
            return;
        };

        // Entries that are not scalars at all never reach get_array.
        let all = reader.get_indices(path).unwrap_or_default();
        for i in all {
            let entry = path.child(i);
            if let Some(v) = rejected.get(i) {
                self.report.record(
                    &entry,
                    DiagnosticKind::TypeMismatch,
                    format!("expected {ty}, found {}", v.value_type()),
                );
            } else if let Some(v) = accepted.get(i) {
                if let Some((kind, message)) = field.violation(v) {
                    self.report.record(&entry, kind, message);
                }
            } else {
                self.report.record(
                    &entry,
                    DiagnosticKind::TypeMismatch,
                    format!("expected {ty}, found a non-scalar"),
                );
            }
        }

        self.field_verifiers(field, path, &FieldValue::Array(accepted));
    }

    fn field_verifiers(&mut self, field: &Field, path: &KeyPath, value: &FieldValue) {
        for (n, verifier) in field.verifiers().iter().enumerate() {
            if !verifier(value) {
                self.report.record(
                    path,
                    DiagnosticKind::VerifierFailed,
                    format!("verifier #{} returned false", n + 1),
                );
            }
        }
    }

    fn function(&mut self, binding: &FunctionBinding, path: &KeyPath) {
        let reader = self.reader();
        let signature = binding.signature();
        let Some(callable) = reader.get_function(path, signature) else {
            if reader.contains(path) {
                self.report.record(
                    path,
                    DiagnosticKind::SignatureMismatch,
                    format!("expected a function {signature}, found a value"),
                );
            } else if binding.is_required() {
                self.report.record(
                    path,
                    DiagnosticKind::MissingRequired,
                    format!("required function {signature} is absent"),
                );
            }
            return;
        };

        let bound = match BoundFunction::bind(path.clone(), signature.clone(), callable) {
            Ok(bound) => bound,
            Err(err) => {
                self.report.record(path, DiagnosticKind::SignatureMismatch, err.to_string());
                return;
            }
        };

        let view = FunctionView::new(bound);
        for (n, verifier) in binding.verifiers().iter().enumerate() {
            let passed = verifier(&view);
            let failure = view.take_failure();
            if passed {
                continue;
            }
            match failure {
                Some(err) => self.report.record(path, DiagnosticKind::CallError, err.to_string()),
                None => self.report.record(
                    path,
                    DiagnosticKind::VerifierFailed,
                    format!("verifier #{} returned false", n + 1),
                ),
            }
        }
    }
}
