//! # Native Callables
//!
//! Documents parsed from YAML or JSON cannot carry executable code, so
//! callables are attached to a [`DocumentReader`](crate::DocumentReader)
//! as Rust closures over flat scalar values. From the engine's side they
//! behave like any dynamically typed backend function: they report an
//! arity, accept whatever [`Value`]s they are given, and may fail.

use deck_core::{Arity, BackendError, Callable, Value};

type Body = dyn Fn(&[Value]) -> Result<Vec<Value>, String>;

/// A closure exposed to the engine as a backend callable.
pub struct NativeFunction {
    arity: Arity,
    body: Box<Body>,
}

impl NativeFunction {
    pub fn new<F>(arity: Arity, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, String> + 'static,
    {
        Self {
            arity,
            body: Box::new(body),
        }
    }
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunction")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> Arity {
        self.arity
    }

    fn invoke(&self, args: &[Value]) -> Result<Vec<Value>, BackendError> {
        if !self.arity.accepts(args.len()) {
            return Err(BackendError::Fault(format!(
                "called with {} argument(s), arity is {:?}",
                args.len(),
                self.arity
            )));
        }
        (self.body)(args).map_err(BackendError::Fault)
    }
}
