//! # Call Marshaling
//!
//! Converts native call arguments into the flat scalar [`Value`]s a backend
//! callable accepts, and gathers the backend's flat return values back into
//! a typed [`CallValue`].
//!
//! ## Wire layout
//!
//! | Declared type | Backend slots |
//! |---------------|---------------|
//! | `Bool`, `Integer`, `Double`, `String` | 1 |
//! | `Vec3D` | 3 doubles (x, y, z) |
//! | `Void` | 0 (return only) |
//!
//! A `Vec3D` return also accepts two values, with z = 0.
//!
//! Integer → Double is the only widening, in both directions.

use deck_core::{CallError, CallValue, FunctionType, KeyPath, Signature, Value, Vector3D};

/// Flatten `args` according to `signature`.
///
/// # Errors
///
/// - [`CallError::ArgumentCount`] if the argument count differs from the
///   declared count.
/// - [`CallError::ArgumentType`] if an argument cannot be marshaled as its
///   declared type.
pub(crate) fn flatten_args(
    path: &KeyPath,
    signature: &Signature,
    args: Vec<CallValue>,
) -> Result<Vec<Value>, CallError> {
    if args.len() != signature.args.len() {
        return Err(CallError::ArgumentCount {
            path: path.to_string(),
            expected: signature.args.len(),
            actual: args.len(),
        });
    }

    let mut flat = Vec::with_capacity(signature.flat_arity());
    for (position, (declared, arg)) in signature.args.iter().zip(args).enumerate() {
        match (declared, arg) {
            (FunctionType::Vec3D, CallValue::Vec3D(v)) => {
                flat.extend(v.components().into_iter().map(Value::Double));
            }
            (FunctionType::Double, CallValue::Double(d)) => flat.push(Value::Double(d)),
            (FunctionType::Double, CallValue::Integer(i)) => flat.push(Value::Double(i as f64)),
            (FunctionType::Integer, CallValue::Integer(i)) => flat.push(Value::Integer(i)),
            (FunctionType::Bool, CallValue::Bool(b)) => flat.push(Value::Bool(b)),
            (FunctionType::String, CallValue::String(s)) => flat.push(Value::String(s)),
            (expected, found) => {
                return Err(CallError::ArgumentType {
                    path: path.to_string(),
                    position,
                    expected: *expected,
                    found: found.function_type(),
                });
            }
        }
    }
    Ok(flat)
}

/// Gather backend return values into the declared return type.
///
/// # Errors
///
/// [`CallError::ReturnType`] if the values do not fit `returns`.
pub(crate) fn gather_return(
    path: &KeyPath,
    returns: FunctionType,
    values: Vec<Value>,
) -> Result<CallValue, CallError> {
    let fail = |reason: String| CallError::ReturnType {
        path: path.to_string(),
        expected: returns,
        reason,
    };

    match returns {
        FunctionType::Void => Ok(CallValue::Void),
        FunctionType::Vec3D => {
            if !(2..=3).contains(&values.len()) {
                return Err(fail(format!("expected 2 or 3 values, got {}", values.len())));
            }
            let mut v = Vector3D::default();
            for (i, value) in values.iter().enumerate() {
                v[i] = value
                    .as_double()
                    .ok_or_else(|| fail(format!("component {i} is {}", value.value_type())))?;
            }
            Ok(CallValue::Vec3D(v))
        }
        scalar => {
            let [value]: [Value; 1] = values
                .try_into()
                .map_err(|v: Vec<Value>| fail(format!("expected 1 value, got {}", v.len())))?;
            let found = value.value_type();
            let gathered = match (scalar, value) {
                (FunctionType::Bool, Value::Bool(b)) => Some(CallValue::Bool(b)),
                (FunctionType::Integer, Value::Integer(i)) => Some(CallValue::Integer(i)),
                (FunctionType::Double, Value::Double(d)) => Some(CallValue::Double(d)),
                (FunctionType::Double, Value::Integer(i)) => Some(CallValue::Double(i as f64)),
                (FunctionType::String, Value::String(s)) => Some(CallValue::String(s)),
                _ => None,
            };
            gathered.ok_or_else(|| fail(format!("got {found}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> KeyPath {
        KeyPath::parse("f").unwrap()
    }

    #[test]
    fn vec3_flattens_to_three_doubles() {
        let sig = Signature::new(FunctionType::Double, [FunctionType::Vec3D, FunctionType::Double]);
        let flat = flatten_args(
            &path(),
            &sig,
            vec![Vector3D::new(1.0, 2.0, 3.0).into(), CallValue::Integer(4)],
        )
        .unwrap();
        assert_eq!(
            flat,
            vec![Value::Double(1.0), Value::Double(2.0), Value::Double(3.0), Value::Double(4.0)]
        );
    }

    #[test]
    fn argument_count_checked() {
        let sig = Signature::new(FunctionType::Double, [FunctionType::Double]);
        let err = flatten_args(&path(), &sig, vec![]).unwrap_err();
        assert!(matches!(err, CallError::ArgumentCount { expected: 1, actual: 0, .. }));
    }

    #[test]
    fn double_is_not_narrowed_to_integer() {
        let sig = Signature::new(FunctionType::Void, [FunctionType::Integer]);
        let err = flatten_args(&path(), &sig, vec![CallValue::Double(1.5)]).unwrap_err();
        assert!(matches!(
            err,
            CallError::ArgumentType {
                position: 0,
                expected: FunctionType::Integer,
                found: FunctionType::Double,
                ..
            }
        ));
    }

    #[test]
    fn vec3_return_accepts_two_components() {
        let v = gather_return(&path(), FunctionType::Vec3D, vec![Value::Double(1.0), Value::Integer(2)]).unwrap();
        assert_eq!(v, CallValue::Vec3D(Vector3D::new(1.0, 2.0, 0.0)));
        assert!(gather_return(&path(), FunctionType::Vec3D, vec![Value::Double(1.0)]).is_err());
    }

    #[test]
    fn scalar_return_needs_exactly_one_value() {
        assert!(gather_return(&path(), FunctionType::Double, vec![]).is_err());
        assert!(gather_return(&path(), FunctionType::Double, vec![Value::Double(1.0), Value::Double(2.0)]).is_err());
        assert_eq!(
            gather_return(&path(), FunctionType::Double, vec![Value::Integer(3)]).unwrap(),
            CallValue::Double(3.0)
        );
        assert!(gather_return(&path(), FunctionType::Integer, vec![Value::Double(3.0)]).is_err());
    }

    #[test]
    fn void_ignores_values() {
        assert_eq!(
            gather_return(&path(), FunctionType::Void, vec![Value::Integer(1)]).unwrap(),
            CallValue::Void
        );
    }
}
