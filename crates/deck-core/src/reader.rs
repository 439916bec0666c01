//! # Reader Capability
//!
//! The narrow interface between the schema engine and whatever actually
//! parsed the configuration document. The engine only ever asks a backend
//! these questions; any backend that answers them can be substituted
//! without touching schema, verification, or extraction logic.
//!
//! ## Contract
//!
//! - `contains` reports presence of *anything* at a path: a scalar, a
//!   table, an array, or a callable. Type-checked getters return `None`
//!   both for absence and for a value of another type, so `contains` is
//!   how the engine tells "missing" from "wrong type".
//! - `get_double` widens integral values.
//! - `get_array` and `get_indices` preserve the backend's own indexing and
//!   ordering verbatim.
//! - Callables take and return flat scalar [`Value`]s. The engine marshals
//!   compound types (e.g. `Vec3D` as three doubles) before calling.

use std::sync::Arc;

use crate::error::BackendError;
use crate::indexed::IndexedMap;
use crate::path::KeyPath;
use crate::value::{Signature, Value, ValueType};

/// Number of arguments a backend callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many flat arguments.
    Fixed(usize),
    /// Any number of arguments.
    Variadic,
}

impl Arity {
    /// Whether a call with `n` flat arguments is acceptable.
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Self::Fixed(k) => *k == n,
            Self::Variadic => true,
        }
    }
}

/// A function exposed by a backend.
pub trait Callable {
    /// The arity the backend reports for this function.
    fn arity(&self) -> Arity;

    /// Run the function on flat scalar arguments.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Fault`] if the backend-side logic fails.
    fn invoke(&self, args: &[Value]) -> Result<Vec<Value>, BackendError>;
}

/// Presence, value, and callable lookup by path.
pub trait Reader {
    /// Whether anything exists at `path`.
    fn contains(&self, path: &KeyPath) -> bool;

    fn get_bool(&self, path: &KeyPath) -> Option<bool>;

    fn get_int(&self, path: &KeyPath) -> Option<i64>;

    /// Numeric value at `path`; integral values are widened.
    fn get_double(&self, path: &KeyPath) -> Option<f64>;

    fn get_string(&self, path: &KeyPath) -> Option<String>;

    /// All scalar entries of the array (or integer-keyed table) at `path`,
    /// in backend order. `None` if `path` is not an array-like container.
    fn get_array(&self, path: &KeyPath) -> Option<IndexedMap<Value>>;

    /// Integer keys present under `path`, of any kind of value, in backend
    /// order. `None` if `path` is not an array-like container.
    fn get_indices(&self, path: &KeyPath) -> Option<Vec<i64>>;

    /// The callable at `path`. `signature` is what the schema declared; a
    /// backend may use it to pick an overload or reject early.
    fn get_function(&self, path: &KeyPath, signature: &Signature) -> Option<Arc<dyn Callable>>;

    /// Type-directed scalar lookup.
    fn get_value(&self, path: &KeyPath, ty: ValueType) -> Option<Value> {
        match ty {
            ValueType::Bool => self.get_bool(path).map(Value::Bool),
            ValueType::Integer => self.get_int(path).map(Value::Integer),
            ValueType::Double => self.get_double(path).map(Value::Double),
            ValueType::String => self.get_string(path).map(Value::String),
        }
    }
}

impl<R: Reader + ?Sized> Reader for Box<R> {
    fn contains(&self, path: &KeyPath) -> bool {
        (**self).contains(path)
    }

    fn get_bool(&self, path: &KeyPath) -> Option<bool> {
        (**self).get_bool(path)
    }

    fn get_int(&self, path: &KeyPath) -> Option<i64> {
        (**self).get_int(path)
    }

    fn get_double(&self, path: &KeyPath) -> Option<f64> {
        (**self).get_double(path)
    }

    fn get_string(&self, path: &KeyPath) -> Option<String> {
        (**self).get_string(path)
    }

    fn get_array(&self, path: &KeyPath) -> Option<IndexedMap<Value>> {
        (**self).get_array(path)
    }

    fn get_indices(&self, path: &KeyPath) -> Option<Vec<i64>> {
        (**self).get_indices(path)
    }

    fn get_function(&self, path: &KeyPath, signature: &Signature) -> Option<Arc<dyn Callable>> {
        (**self).get_function(path, signature)
    }
}
