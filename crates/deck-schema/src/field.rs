//! # Fields
//!
//! A [`Field`] is a leaf of the schema tree: one scalar value, or one
//! homogeneous scalar array, with a fixed [`ValueType`].
//!
//! ## Resolution order
//!
//! 1. The document holds a value of a compatible type → that value.
//! 2. A default is registered → the default.
//! 3. Otherwise the field has no value.
//!
//! Scalar arrays never take defaults and resolve to whatever entries the
//! document holds.
//!
//! ## Constraints
//!
//! A field carries at most one [`Constraint`]: an inclusive numeric range
//! or a discrete set. For arrays the constraint applies to every element.

use std::fmt;

use deck_core::{DeckError, DeckResult, IndexedMap, KeyPath, Reader, Value, ValueType};

use crate::diagnostic::DiagnosticKind;

/// Whether a field holds one value or an array of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Scalar,
    Array,
}

/// Built-in value constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Inclusive integer range.
    IntRange { lo: i64, hi: i64 },
    /// Inclusive floating point range.
    DoubleRange { lo: f64, hi: f64 },
    /// Allowed values, already coerced to the field's type.
    Discrete(Vec<Value>),
}

impl Constraint {
    /// The diagnostic for `value`, or `None` if it satisfies the constraint.
    pub(crate) fn violation(&self, value: &Value) -> Option<(DiagnosticKind, String)> {
        match self {
            Self::IntRange { lo, hi } => {
                let v = value.as_int()?;
                (v < *lo || v > *hi).then(|| {
                    (
                        DiagnosticKind::RangeViolation,
                        format!("{v} is outside [{lo}, {hi}]"),
                    )
                })
            }
            Self::DoubleRange { lo, hi } => {
                let v = value.as_double()?;
                (v.is_nan() || v < *lo || v > *hi).then(|| {
                    (
                        DiagnosticKind::RangeViolation,
                        format!("{v} is outside [{lo}, {hi}]"),
                    )
                })
            }
            Self::Discrete(allowed) => (!allowed.contains(value)).then(|| {
                (
                    DiagnosticKind::DiscreteSetViolation,
                    format!("{value} is not one of {self}"),
                )
            }),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntRange { lo, hi } => write!(f, "[{lo}, {hi}]"),
            Self::DoubleRange { lo, hi } => write!(f, "[{lo}, {hi}]"),
            Self::Discrete(values) => {
                f.write_str("{")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// The resolved value handed to field verifiers.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Value),
    /// Type-checked entries of a scalar array, in document order.
    Array(IndexedMap<Value>),
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&IndexedMap<Value>> {
        match self {
            Self::Array(a) => Some(a),
            Self::Scalar(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        self.as_scalar()?.as_int()
    }

    pub fn as_double(&self) -> Option<f64> {
        self.as_scalar()?.as_double()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar()?.as_str()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar()?.as_bool()
    }
}

pub(crate) type FieldVerifier = Box<dyn Fn(&FieldValue) -> bool>;

/// Leaf schema node.
pub struct Field {
    path: KeyPath,
    ty: ValueType,
    shape: FieldShape,
    required: bool,
    description: Option<String>,
    default: Option<Value>,
    constraint: Option<Constraint>,
    verifiers: Vec<FieldVerifier>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("path", &self.path)
            .field("ty", &self.ty)
            .field("shape", &self.shape)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("constraint", &self.constraint)
            .field("verifiers", &self.verifiers.len())
            .finish()
    }
}

impl Field {
    pub(crate) fn new(
        path: KeyPath,
        ty: ValueType,
        shape: FieldShape,
        description: Option<String>,
    ) -> Self {
        Self {
            path,
            ty,
            shape,
            required: false,
            description,
            default: None,
            constraint: None,
            verifiers: Vec::new(),
        }
    }

    /// Mark the field required (or not). Required fields must resolve to a
    /// value, from the document or a default.
    pub fn required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    /// Register the value used when the document holds none.
    ///
    /// # Errors
    ///
    /// - [`DeckError::TypeMismatch`] if `value` cannot be held by the
    ///   declared type (Integer is accepted for Double fields).
    /// - [`DeckError::SchemaConflict`] on a scalar array.
    pub fn add_default(&mut self, value: impl Into<Value>) -> DeckResult<&mut Self> {
        if self.shape == FieldShape::Array {
            return Err(DeckError::conflict(&self.path, "scalar arrays do not take defaults"));
        }
        let value = value.into();
        let found = value.value_type();
        let value = value
            .coerce(self.ty)
            .ok_or_else(|| DeckError::type_mismatch(&self.path, self.ty, found))?;
        self.default = Some(value);
        Ok(self)
    }

    /// Constrain values to the inclusive range `[lo, hi]`.
    ///
    /// Integer fields need integer bounds; Double fields accept either.
    ///
    /// # Errors
    ///
    /// - [`DeckError::TypeMismatch`] for non-numeric fields or bounds.
    /// - [`DeckError::InvalidConstraint`] if `lo > hi` or a bound is NaN.
    /// - [`DeckError::SchemaConflict`] if a different constraint exists.
    pub fn add_range(&mut self, lo: impl Into<Value>, hi: impl Into<Value>) -> DeckResult<&mut Self> {
        let (lo, hi) = (lo.into(), hi.into());
        let constraint = match self.ty {
            ValueType::Integer => {
                let (Some(l), Some(h)) = (lo.as_int(), hi.as_int()) else {
                    let found = if lo.as_int().is_none() { lo.value_type() } else { hi.value_type() };
                    return Err(DeckError::type_mismatch(&self.path, self.ty, found));
                };
                if l > h {
                    return Err(self.invalid(format!("lower bound {l} exceeds upper bound {h}")));
                }
                Constraint::IntRange { lo: l, hi: h }
            }
            ValueType::Double => {
                let (Some(l), Some(h)) = (lo.as_double(), hi.as_double()) else {
                    let found = if lo.as_double().is_none() { lo.value_type() } else { hi.value_type() };
                    return Err(DeckError::type_mismatch(&self.path, self.ty, found));
                };
                if l.is_nan() || h.is_nan() {
                    return Err(self.invalid("range bounds must not be NaN".to_string()));
                }
                if l > h {
                    return Err(self.invalid(format!("lower bound {l} exceeds upper bound {h}")));
                }
                Constraint::DoubleRange { lo: l, hi: h }
            }
            other => {
                return Err(DeckError::type_mismatch(&self.path, "a numeric type", other));
            }
        };
        self.set_constraint(constraint)
    }

    /// Constrain values to a fixed set.
    ///
    /// # Errors
    ///
    /// - [`DeckError::TypeMismatch`] on Bool fields or for a member of the
    ///   wrong type.
    /// - [`DeckError::InvalidConstraint`] for an empty set.
    /// - [`DeckError::SchemaConflict`] if a different constraint exists.
    pub fn add_discrete_set<I, V>(&mut self, values: I) -> DeckResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if self.ty == ValueType::Bool {
            return Err(DeckError::type_mismatch(&self.path, "an enumerable type", self.ty));
        }
        let mut allowed = Vec::new();
        for v in values {
            let v = v.into();
            let found = v.value_type();
            let v = v
                .coerce(self.ty)
                .ok_or_else(|| DeckError::type_mismatch(&self.path, self.ty, found))?;
            if !allowed.contains(&v) {
                allowed.push(v);
            }
        }
        if allowed.is_empty() {
            return Err(self.invalid("discrete set is empty".to_string()));
        }
        self.set_constraint(Constraint::Discrete(allowed))
    }

    /// Add a predicate over the resolved value. All registered predicates
    /// must pass.
    pub fn register_verifier<F>(&mut self, verifier: F) -> &mut Self
    where
        F: Fn(&FieldValue) -> bool + 'static,
    {
        self.verifiers.push(Box::new(verifier));
        self
    }

    fn set_constraint(&mut self, constraint: Constraint) -> DeckResult<&mut Self> {
        if let Some(existing) = self.constraint.as_ref().filter(|c| **c != constraint) {
            return Err(DeckError::conflict(
                &self.path,
                format!("already constrained to {existing}"),
            ));
        }
        self.constraint = Some(constraint);
        Ok(self)
    }

    fn invalid(&self, reason: String) -> DeckError {
        DeckError::InvalidConstraint {
            path: self.path.to_string(),
            reason,
        }
    }

    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub fn value_type(&self) -> ValueType {
        self.ty
    }

    pub fn shape(&self) -> FieldShape {
        self.shape
    }

    pub fn is_array(&self) -> bool {
        self.shape == FieldShape::Array
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    pub(crate) fn verifiers(&self) -> &[FieldVerifier] {
        &self.verifiers
    }

    pub(crate) fn set_description(&mut self, description: Option<String>) {
        if self.description.is_none() {
            self.description = description;
        }
    }

    /// Resolve a scalar field at the concrete `path`.
    pub(crate) fn resolve(&self, reader: &dyn Reader, path: &KeyPath) -> Option<Value> {
        reader
            .get_value(path, self.ty)
            .or_else(|| self.default.clone())
    }

    /// Type-checked entries of a scalar array at `path`, split into
    /// accepted values and the indices whose values had the wrong type.
    pub(crate) fn resolve_array(
        &self,
        reader: &dyn Reader,
        path: &KeyPath,
    ) -> Option<(IndexedMap<Value>, IndexedMap<Value>)> {
        let raw = reader.get_array(path)?;
        let mut accepted = IndexedMap::with_capacity(raw.len());
        let mut rejected = IndexedMap::new();
        for (i, v) in raw {
            match v.clone().coerce(self.ty) {
                Some(cv) => accepted.insert(i, cv),
                None => rejected.insert(i, v),
            };
        }
        Some((accepted, rejected))
    }

    pub(crate) fn violation(&self, value: &Value) -> Option<(DiagnosticKind, String)> {
        self.constraint.as_ref()?.violation(value)
    }
}
