//! # Function Bindings
//!
//! A [`FunctionBinding`] declares that the document must expose a callable
//! with a given [`Signature`]. Once verification confirms the backend's
//! callable is arity-compatible, it is wrapped in a [`BoundFunction`] that
//! callers invoke with native arguments.
//!
//! ## Call boundary
//!
//! Every failure on the way through a call becomes a [`CallError`]:
//! argument marshaling, backend faults, panics inside the callable, and
//! return values that do not fit the declared return type.

use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use deck_core::{
    Arity, BackendError, CallError, CallValue, Callable, FromCallValue, FunctionType, KeyPath,
    Signature, Vector3D,
};

use crate::marshal::{flatten_args, gather_return};

pub(crate) type FunctionVerifier = Box<dyn Fn(&FunctionView) -> bool>;

/// Schema node declaring a typed callable.
pub struct FunctionBinding {
    path: KeyPath,
    signature: Signature,
    required: bool,
    description: Option<String>,
    verifiers: Vec<FunctionVerifier>,
}

impl fmt::Debug for FunctionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionBinding")
            .field("path", &self.path)
            .field("signature", &self.signature)
            .field("required", &self.required)
            .field("verifiers", &self.verifiers.len())
            .finish()
    }
}

impl FunctionBinding {
    pub(crate) fn new(path: KeyPath, signature: Signature, description: Option<String>) -> Self {
        Self {
            path,
            signature,
            required: false,
            description,
            verifiers: Vec::new(),
        }
    }

    pub fn required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    /// Add a predicate over the bound callable. The predicate may call the
    /// function through the [`FunctionView`] it receives; a failed call
    /// inside a failing predicate is reported as a call error.
    pub fn register_verifier<F>(&mut self, verifier: F) -> &mut Self
    where
        F: Fn(&FunctionView) -> bool + 'static,
    {
        self.verifiers.push(Box::new(verifier));
        self
    }

    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn verifiers(&self) -> &[FunctionVerifier] {
        &self.verifiers
    }

    pub(crate) fn set_description(&mut self, description: Option<String>) {
        if self.description.is_none() {
            self.description = description;
        }
    }
}

// ---------------------------------------------------------------------------
// Bound functions
// ---------------------------------------------------------------------------

/// A backend callable checked against its declared signature.
#[derive(Clone)]
pub struct BoundFunction {
    path: KeyPath,
    signature: Signature,
    callable: Arc<dyn Callable>,
}

impl fmt::Debug for BoundFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFunction")
            .field("path", &self.path)
            .field("signature", &self.signature)
            .field("arity", &self.callable.arity())
            .finish()
    }
}

impl BoundFunction {
    /// Bind `callable` at the concrete `path`.
    ///
    /// # Errors
    ///
    /// [`CallError::Arity`] if the callable's arity cannot accept the
    /// signature's flattened argument count.
    pub(crate) fn bind(
        path: KeyPath,
        signature: Signature,
        callable: Arc<dyn Callable>,
    ) -> Result<Self, CallError> {
        let expected = signature.flat_arity();
        match callable.arity() {
            Arity::Fixed(actual) if actual != expected => Err(CallError::Arity {
                path: path.to_string(),
                expected,
                actual,
            }),
            _ => Ok(Self {
                path,
                signature,
                callable,
            }),
        }
    }

    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Call with native arguments, returning the native type `R`.
    ///
    /// `R` must correspond to the declared return type; `f64` is also
    /// accepted for an Integer return.
    ///
    /// # Errors
    ///
    /// [`CallError`] for a requested type that does not match, argument
    /// marshaling failures, backend faults (panics included), and return
    /// values that do not fit the declared return type.
    pub fn call<R: FromCallValue>(&self, args: impl IntoArgs) -> Result<R, CallError> {
        let declared = self.signature.returns;
        let requested = R::FUNCTION_TYPE;
        if requested != declared
            && !(requested == FunctionType::Double && declared == FunctionType::Integer)
        {
            return Err(CallError::RequestedType {
                path: self.path.to_string(),
                declared,
                requested,
            });
        }

        let flat = flatten_args(&self.path, &self.signature, args.into_args())?;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.callable.invoke(&flat)));
        let values = match outcome {
            Ok(Ok(values)) => values,
            Ok(Err(BackendError::Fault(message) | BackendError::Parse(message))) => {
                tracing::warn!(path = %self.path, %message, "bound function raised a fault");
                return Err(self.fault(message));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(path = %self.path, %message, "bound function panicked");
                return Err(self.fault(message));
            }
        };

        let value = gather_return(&self.path, declared, values)?;
        R::from_call_value(value).ok_or_else(|| CallError::ReturnType {
            path: self.path.to_string(),
            expected: declared,
            reason: format!("cannot be read as {requested}"),
        })
    }

    fn fault(&self, message: String) -> CallError {
        CallError::Fault {
            path: self.path.to_string(),
            message,
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "callable panicked".to_string()
    }
}

/// What a function verifier receives: the bound callable plus a record of
/// the last failed call made through it.
pub struct FunctionView {
    bound: BoundFunction,
    failure: RefCell<Option<CallError>>,
}

impl FunctionView {
    pub(crate) fn new(bound: BoundFunction) -> Self {
        Self {
            bound,
            failure: RefCell::new(None),
        }
    }

    /// Call the function. A failure is remembered so that a predicate
    /// returning `false` afterwards is reported with its cause.
    pub fn call<R: FromCallValue>(&self, args: impl IntoArgs) -> Result<R, CallError> {
        self.bound.call(args).map_err(|err| {
            *self.failure.borrow_mut() = Some(err.clone());
            err
        })
    }

    pub fn bound(&self) -> &BoundFunction {
        &self.bound
    }

    pub fn path(&self) -> &KeyPath {
        &self.bound.path
    }

    pub(crate) fn take_failure(&self) -> Option<CallError> {
        self.failure.borrow_mut().take()
    }
}

// ---------------------------------------------------------------------------
// Native arguments
// ---------------------------------------------------------------------------

/// Native argument lists accepted by [`BoundFunction::call`].
///
/// Implemented for `()`, tuples of up to four values convertible into
/// [`CallValue`], single values, and `CallValue` slices for callers that
/// build argument lists dynamically.
pub trait IntoArgs {
    fn into_args(self) -> Vec<CallValue>;
}

impl IntoArgs for () {
    fn into_args(self) -> Vec<CallValue> {
        Vec::new()
    }
}

macro_rules! tuple_args {
    ($($name:ident),+) => {
        impl<$($name: Into<CallValue>),+> IntoArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_args(self) -> Vec<CallValue> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

tuple_args!(A);
tuple_args!(A, B);
tuple_args!(A, B, C);
tuple_args!(A, B, C, D);

macro_rules! single_arg {
    ($($ty:ty),+) => {
        $(
            impl IntoArgs for $ty {
                fn into_args(self) -> Vec<CallValue> {
                    vec![self.into()]
                }
            }
        )+
    };
}

single_arg!(bool, i32, i64, f64, String, &str, Vector3D, CallValue);

impl IntoArgs for Vec<CallValue> {
    fn into_args(self) -> Vec<CallValue> {
        self
    }
}

impl IntoArgs for &[CallValue] {
    fn into_args(self) -> Vec<CallValue> {
        self.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use deck_core::Value;

    use super::*;

    struct Sum;

    impl Callable for Sum {
        fn arity(&self) -> Arity {
            Arity::Fixed(3)
        }

        fn invoke(&self, args: &[Value]) -> Result<Vec<Value>, BackendError> {
            Ok(vec![Value::Double(args.iter().filter_map(Value::as_double).sum())])
        }
    }

    struct Explodes;

    impl Callable for Explodes {
        fn arity(&self) -> Arity {
            Arity::Variadic
        }

        fn invoke(&self, _: &[Value]) -> Result<Vec<Value>, BackendError> {
            panic!("division by zero")
        }
    }

    fn sum() -> BoundFunction {
        BoundFunction::bind(
            KeyPath::parse("source").unwrap(),
            Signature::new(FunctionType::Double, [FunctionType::Vec3D]),
            Arc::new(Sum),
        )
        .unwrap()
    }

    #[test]
    fn calls_with_vector_argument() {
        let total: f64 = sum().call(Vector3D::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(total, 6.0);
    }

    #[test]
    fn wrong_requested_type() {
        let err = sum().call::<i64>(Vector3D::default()).unwrap_err();
        assert!(matches!(err, CallError::RequestedType { .. }));
    }

    #[test]
    fn arity_mismatch_refuses_to_bind() {
        let err = BoundFunction::bind(
            KeyPath::parse("source").unwrap(),
            Signature::new(FunctionType::Double, [FunctionType::Double]),
            Arc::new(Sum),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CallError::Arity {
                path: "source".to_string(),
                expected: 1,
                actual: 3
            }
        );
    }

    #[test]
    fn panic_becomes_fault() {
        let f = BoundFunction::bind(
            KeyPath::parse("boom").unwrap(),
            Signature::new(FunctionType::Void, Vec::<FunctionType>::new()),
            Arc::new(Explodes),
        )
        .unwrap();
        match f.call::<()>(()) {
            Err(CallError::Fault { message, .. }) => assert!(message.contains("division by zero")),
            other => panic!("expected a fault, got {other:?}"),
        }
    }

    #[test]
    fn function_view_remembers_failures() {
        let view = FunctionView::new(sum());
        assert!(view.call::<f64>(()).is_err());
        assert!(matches!(view.take_failure(), Some(CallError::ArgumentCount { .. })));
        assert!(view.take_failure().is_none());
    }

    #[test]
    fn tuple_arguments() {
        let args = (Vector3D::new(1.0, 0.0, 0.0), 2.0, "label").into_args();
        assert_eq!(args.len(), 3);
        assert_eq!(args[2], CallValue::String("label".to_string()));
    }
}
