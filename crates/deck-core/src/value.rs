//! # Value System — The Closed Type Enumeration
//!
//! Everything that crosses the [`Reader`](crate::Reader) boundary is one of
//! the variants defined here. Backends are dynamically typed; this module
//! is where their values acquire a tag.
//!
//! - [`ValueType`] / [`Value`] — scalar field types and values.
//! - [`FunctionType`] / [`CallValue`] — the argument and return types of
//!   bound functions, which extend the scalar set with `Vec3D` and `Void`.
//! - [`Signature`] — a declared call signature.
//!
//! ## Coercion
//!
//! The only implicit coercion anywhere in deck is Integer → Double. It is
//! applied when a Double field reads an integral document value and when
//! an integer is passed where a Double argument is declared. Nothing ever
//! narrows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vector::Vector3D;

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

/// Declared type of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// `true` / `false`.
    Bool,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Double,
    /// UTF-8 string.
    String,
}

impl ValueType {
    /// Whether range constraints make sense for this type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Double)
    }

    /// The lowercase name used in diagnostics and documentation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::String => "string",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Double(f64),
    /// String value.
    String(String),
}

impl Value {
    /// The type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Integer(_) => ValueType::Integer,
            Self::Double(_) => ValueType::Double,
            Self::String(_) => ValueType::String,
        }
    }

    /// Convert this value to `ty`, widening Integer to Double.
    ///
    /// Returns `None` when the value cannot be represented as `ty`.
    pub fn coerce(self, ty: ValueType) -> Option<Value> {
        match (self, ty) {
            (Self::Integer(i), ValueType::Double) => Some(Self::Double(i as f64)),
            (v, t) if v.value_type() == t => Some(v),
            _ => None,
        }
    }

    /// Whether [`Value::coerce`] would succeed for `ty`.
    pub fn is_compatible(&self, ty: ValueType) -> bool {
        self.value_type() == ty || (ty == ValueType::Double && matches!(self, Self::Integer(_)))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of this value; integers are widened.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

// ---------------------------------------------------------------------------
// Function types
// ---------------------------------------------------------------------------

/// Argument and return types of bound functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionType {
    /// No value. Only meaningful as a return type.
    Void,
    Bool,
    Integer,
    Double,
    String,
    /// Three-component vector, passed to the backend as three doubles.
    Vec3D,
}

impl FunctionType {
    /// Number of backend slots this type occupies in a call.
    pub fn width(&self) -> usize {
        match self {
            Self::Void => 0,
            Self::Vec3D => 3,
            _ => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::String => "string",
            Self::Vec3D => "vec3d",
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ValueType> for FunctionType {
    fn from(ty: ValueType) -> Self {
        match ty {
            ValueType::Bool => Self::Bool,
            ValueType::Integer => Self::Integer,
            ValueType::Double => Self::Double,
            ValueType::String => Self::String,
        }
    }
}

/// Declared signature of a bound function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Declared return type.
    pub returns: FunctionType,
    /// Declared argument types, in call order.
    pub args: Vec<FunctionType>,
}

impl Signature {
    pub fn new(returns: FunctionType, args: impl Into<Vec<FunctionType>>) -> Self {
        Self {
            returns,
            args: args.into(),
        }
    }

    /// Number of backend argument slots a call with this signature fills.
    pub fn flat_arity(&self) -> usize {
        self.args.iter().map(FunctionType::width).sum()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.returns)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// A native value passed to or returned from a bound function.
#[derive(Debug, Clone, PartialEq)]
pub enum CallValue {
    Void,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Vec3D(Vector3D),
}

impl CallValue {
    /// The function type tag of this value.
    pub fn function_type(&self) -> FunctionType {
        match self {
            Self::Void => FunctionType::Void,
            Self::Bool(_) => FunctionType::Bool,
            Self::Integer(_) => FunctionType::Integer,
            Self::Double(_) => FunctionType::Double,
            Self::String(_) => FunctionType::String,
            Self::Vec3D(_) => FunctionType::Vec3D,
        }
    }
}

impl From<bool> for CallValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for CallValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for CallValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for CallValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for CallValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for CallValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vector3D> for CallValue {
    fn from(v: Vector3D) -> Self {
        Self::Vec3D(v)
    }
}

/// Native types a bound function call can return.
pub trait FromCallValue: Sized {
    /// The function type this native type corresponds to.
    const FUNCTION_TYPE: FunctionType;

    /// Unwrap a marshaled return value. `None` if the variant does not fit.
    fn from_call_value(value: CallValue) -> Option<Self>;
}

impl FromCallValue for () {
    const FUNCTION_TYPE: FunctionType = FunctionType::Void;

    fn from_call_value(value: CallValue) -> Option<Self> {
        matches!(value, CallValue::Void).then_some(())
    }
}

impl FromCallValue for bool {
    const FUNCTION_TYPE: FunctionType = FunctionType::Bool;

    fn from_call_value(value: CallValue) -> Option<Self> {
        match value {
            CallValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FromCallValue for i64 {
    const FUNCTION_TYPE: FunctionType = FunctionType::Integer;

    fn from_call_value(value: CallValue) -> Option<Self> {
        match value {
            CallValue::Integer(i) => Some(i),
            _ => None,
        }
    }
}

impl FromCallValue for f64 {
    const FUNCTION_TYPE: FunctionType = FunctionType::Double;

    fn from_call_value(value: CallValue) -> Option<Self> {
        match value {
            CallValue::Double(d) => Some(d),
            CallValue::Integer(i) => Some(i as f64),
            _ => None,
        }
    }
}

impl FromCallValue for String {
    const FUNCTION_TYPE: FunctionType = FunctionType::String;

    fn from_call_value(value: CallValue) -> Option<Self> {
        match value {
            CallValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromCallValue for Vector3D {
    const FUNCTION_TYPE: FunctionType = FunctionType::Vec3D;

    fn from_call_value(value: CallValue) -> Option<Self> {
        match value {
            CallValue::Vec3D(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_widens_to_double() {
        assert_eq!(Value::Integer(3).coerce(ValueType::Double), Some(Value::Double(3.0)));
        assert!(Value::Integer(3).is_compatible(ValueType::Double));
    }

    #[test]
    fn double_never_narrows_to_integer() {
        assert_eq!(Value::Double(3.0).coerce(ValueType::Integer), None);
        assert!(!Value::Double(3.0).is_compatible(ValueType::Integer));
    }

    #[test]
    fn string_is_not_bool() {
        assert_eq!(Value::from("true").coerce(ValueType::Bool), None);
    }

    #[test]
    fn signature_flat_arity_counts_vector_slots() {
        let sig = Signature::new(
            FunctionType::Double,
            [FunctionType::Vec3D, FunctionType::Double],
        );
        assert_eq!(sig.flat_arity(), 4);
        assert_eq!(sig.to_string(), "double(vec3d, double)");
    }

    #[test]
    fn value_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Bool(true),
            Value::Integer(2),
            Value::from("x"),
        ])
        .unwrap();
        assert_eq!(json, r#"[true,2,"x"]"#);
    }

    #[test]
    fn f64_return_accepts_integer() {
        assert_eq!(f64::from_call_value(CallValue::Integer(6)), Some(6.0));
        assert_eq!(i64::from_call_value(CallValue::Double(6.0)), None);
    }
}
