//! # Factory Registry
//!
//! Runtime registrations that build caller-defined native types out of a
//! schema subtree. A factory receives the [`View`] of the table it is
//! applied to and assembles its result by extracting children through the
//! same view, so factories compose to any depth.
//!
//! Registries exist on every [`Table`](crate::Table) and on the
//! [`Deck`](crate::Deck). A table's own registrations take precedence.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use deck_core::DeckResult;

use crate::view::View;

type Factory<T> = Box<dyn Fn(&View<'_>) -> DeckResult<T>>;

/// Factories keyed by the type they produce.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: HashMap<TypeId, (&'static str, Box<dyn Any>)>,
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.factories.values().map(|(name, _)| name))
            .finish()
    }
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `T`, replacing any earlier one.
    pub fn register<T, F>(&mut self, factory: F)
    where
        T: 'static,
        F: Fn(&View<'_>) -> DeckResult<T> + 'static,
    {
        let boxed: Factory<T> = Box::new(factory);
        self.factories
            .insert(TypeId::of::<T>(), (type_name::<T>(), Box::new(boxed)));
    }

    pub(crate) fn get<T: 'static>(&self) -> Option<&dyn Fn(&View<'_>) -> DeckResult<T>> {
        let (_, any) = self.factories.get(&TypeId::of::<T>())?;
        any.downcast_ref::<Factory<T>>().map(|f| &**f)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mesh;

    #[test]
    fn registration_is_keyed_by_type() {
        let mut registry = FactoryRegistry::new();
        assert!(registry.is_empty());
        registry.register(|_: &View<'_>| Ok(Mesh));
        assert!(registry.contains::<Mesh>());
        assert!(!registry.contains::<String>());
        assert!(registry.get::<Mesh>().is_some());
        assert!(registry.get::<String>().is_none());
    }

    #[test]
    fn later_registration_replaces() {
        let mut registry = FactoryRegistry::new();
        registry.register(|_: &View<'_>| Ok(1_i64));
        registry.register(|_: &View<'_>| Ok(2_i64));
        assert_eq!(registry.len(), 1);
        assert!(format!("{registry:?}").contains("i64"));
    }
}
