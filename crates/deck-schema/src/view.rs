//! # Views and Typed Extraction
//!
//! A [`View`] pairs one schema node with one concrete document path. Views
//! are how verifiers inspect the document and how callers extract native
//! values after verification.
//!
//! ## Navigation
//!
//! Views navigate by path segment. A struct array followed by an index
//! segment yields an element view over the template; a scalar array
//! followed by an index segment yields an entry view. Everything else
//! resolves through the declared children, so a path that is not declared
//! is [`DeckError::NotDeclared`] even if the document holds data there.
//!
//! ## Extraction
//!
//! [`FromDeck`] maps a view to a native type:
//!
//! | Native type | Source |
//! |-------------|--------|
//! | `bool`, `i64`, `f64`, `String`, [`Value`] | resolved scalar value (document, then default) |
//! | `Option<T>` | `None` when nothing resolves at the view's own path |
//! | [`IndexedMap<T>`] | one entry per index present in the document, in document order |
//! | [`BoundFunction`] | the arity-checked backend callable |
//! | [`Built<T>`] | a registered factory |
//!
//! Caller-defined types implement [`FromDeck`] directly or go through a
//! factory.

use deck_core::{
    DeckError, DeckResult, FromCallValue, IndexedMap, KeyPath, Reader, Segment, Value, ValueType,
};

use crate::factory::FactoryRegistry;
use crate::field::Field;
use crate::function::{BoundFunction, FunctionBinding, IntoArgs};
use crate::table::Table;

/// The schema node a [`View`] is positioned on.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    /// A plain table, or a struct array as a whole.
    Table(&'a Table),
    /// One element of a struct array.
    Element(&'a Table),
    /// A scalar field, or a scalar array as a whole.
    Field(&'a Field),
    /// One entry of a scalar array.
    Entry(&'a Field),
    Function(&'a FunctionBinding),
}

impl NodeRef<'_> {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Table(t) if t.is_struct_array() => "struct array",
            Self::Table(_) | Self::Element(_) => "table",
            Self::Field(f) if f.is_array() => "array",
            Self::Field(_) | Self::Entry(_) => "scalar",
            Self::Function(_) => "function",
        }
    }
}

/// Backend and deck-level registrations shared by every view of a deck.
#[derive(Clone, Copy)]
pub(crate) struct Context<'a> {
    pub(crate) reader: &'a dyn Reader,
    pub(crate) factories: &'a FactoryRegistry,
}

/// A schema node resolved against the document at a concrete path.
#[derive(Clone)]
pub struct View<'a> {
    ctx: Context<'a>,
    node: NodeRef<'a>,
    path: KeyPath,
    // Array entries already read from the document.
    entry: Option<Value>,
}

impl std::fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("path", &self.path)
            .field("node", &self.node.kind_name())
            .finish()
    }
}

impl<'a> View<'a> {
    pub(crate) fn new(ctx: Context<'a>, node: NodeRef<'a>, path: KeyPath) -> Self {
        Self {
            ctx,
            node,
            path,
            entry: None,
        }
    }

    /// Entry view over a value that was resolved with its whole array.
    fn resolved_entry(&self, field: &'a Field, i: i64, value: Value) -> View<'a> {
        Self {
            ctx: self.ctx,
            node: NodeRef::Entry(field),
            path: self.path.child(i),
            entry: Some(value),
        }
    }

    /// Concrete document path, array indices included.
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub fn node(&self) -> NodeRef<'a> {
        self.node
    }

    pub fn reader(&self) -> &'a dyn Reader {
        self.ctx.reader
    }

    pub fn description(&self) -> Option<&'a str> {
        match self.node {
            NodeRef::Table(t) | NodeRef::Element(t) => t.description(),
            NodeRef::Field(f) | NodeRef::Entry(f) => f.description(),
            NodeRef::Function(b) => b.description(),
        }
    }

    /// Whether anything resolves at this view: a present table, a value
    /// (defaults included), an array, or a callable.
    pub fn is_present(&self) -> bool {
        match self.node {
            NodeRef::Table(_) | NodeRef::Element(_) => {
                self.path.is_root() || self.ctx.reader.contains(&self.path)
            }
            NodeRef::Field(f) if f.is_array() => self.ctx.reader.get_array(&self.path).is_some(),
            NodeRef::Field(f) => f.resolve(self.ctx.reader, &self.path).is_some(),
            NodeRef::Entry(f) => self.entry_value(f).is_some(),
            NodeRef::Function(b) => self
                .ctx
                .reader
                .get_function(&self.path, b.signature())
                .is_some(),
        }
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// The view at the relative path `rel`. An empty `rel` is this view.
    pub fn view(&self, rel: &str) -> DeckResult<View<'a>> {
        let rel = KeyPath::parse(rel)?;
        let mut view = self.clone();
        for segment in rel.segments() {
            view = view.step(segment)?;
        }
        Ok(view)
    }

    /// The element (struct array) or entry (scalar array) at index `i`.
    pub fn index(&self, i: i64) -> DeckResult<View<'a>> {
        self.step(&Segment::Index(i))
    }

    fn step(&self, segment: &Segment) -> DeckResult<View<'a>> {
        let path = self.path.child(segment.clone());
        let node = match (self.node, segment) {
            (NodeRef::Table(t), Segment::Index(_)) if t.is_struct_array() => Some(NodeRef::Element(t)),
            (NodeRef::Table(t), _) if !t.is_struct_array() => t.child(segment),
            (NodeRef::Element(t), _) => t.child(segment),
            (NodeRef::Field(f), Segment::Index(_)) if f.is_array() => Some(NodeRef::Entry(f)),
            _ => None,
        }
        .ok_or_else(|| DeckError::NotDeclared {
            path: path.to_string(),
        })?;
        Ok(View::new(self.ctx, node, path))
    }

    /// Whether something resolves at the relative path `rel`. Undeclared
    /// paths are never present.
    pub fn contains(&self, rel: &str) -> bool {
        self.view(rel).map(|v| v.is_present()).unwrap_or(false)
    }

    /// Indices present in the document for a struct array or scalar
    /// array, in document order. Empty for anything else.
    pub fn indices(&self) -> Vec<i64> {
        match self.node {
            NodeRef::Table(t) if t.is_struct_array() => self
                .ctx
                .reader
                .get_indices(&self.path)
                .unwrap_or_default(),
            NodeRef::Field(f) if f.is_array() => f
                .resolve_array(self.ctx.reader, &self.path)
                .map(|(accepted, _)| accepted.indices().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Extraction
    // -----------------------------------------------------------------------

    /// Extract `T` from the node at the relative path `rel`.
    pub fn get<T: FromDeck>(&self, rel: &str) -> DeckResult<T> {
        self.view(rel)?.extract()
    }

    /// Extract `T` from this node.
    pub fn extract<T: FromDeck>(&self) -> DeckResult<T> {
        T::from_view(self)
    }

    /// The resolved value of a scalar field or array entry, at its declared
    /// type.
    pub fn value(&self) -> Option<Value> {
        match self.node {
            NodeRef::Field(f) if !f.is_array() => f.resolve(self.ctx.reader, &self.path),
            NodeRef::Entry(f) => self.entry_value(f),
            _ => None,
        }
    }

    fn entry_value(&self, f: &Field) -> Option<Value> {
        if let Some(value) = &self.entry {
            return Some(value.clone());
        }
        let i = self.path.last()?.as_index()?;
        let array = self.ctx.reader.get_array(&self.path.parent())?;
        array.get(i)?.clone().coerce(f.value_type())
    }

    /// The resolved scalar converted to `requested`.
    ///
    /// `Ok(None)` when nothing resolves.
    ///
    /// # Errors
    ///
    /// [`DeckError::TypeMismatch`] if this is not a scalar, or if its
    /// declared type cannot be read as `requested`.
    fn scalar(&self, requested: ValueType) -> DeckResult<Option<Value>> {
        let declared = match self.node {
            NodeRef::Field(f) if !f.is_array() => f.value_type(),
            NodeRef::Entry(f) => f.value_type(),
            other => {
                return Err(DeckError::type_mismatch(&self.path, other.kind_name(), requested));
            }
        };
        if declared != requested && !(declared == ValueType::Integer && requested == ValueType::Double) {
            return Err(DeckError::type_mismatch(&self.path, declared, requested));
        }
        Ok(self.value().and_then(|v| v.coerce(requested)))
    }

    fn no_value(&self) -> DeckError {
        DeckError::NoValue {
            path: self.path.to_string(),
        }
    }

    /// Bind the function at this view.
    ///
    /// # Errors
    ///
    /// - [`DeckError::NoValue`] if the document exposes no callable here.
    /// - [`DeckError::Call`] if its arity does not fit the signature.
    /// - [`DeckError::TypeMismatch`] if this view is not a function.
    pub fn function(&self) -> DeckResult<BoundFunction> {
        let NodeRef::Function(binding) = self.node else {
            return Err(DeckError::type_mismatch(&self.path, "function", self.node.kind_name()));
        };
        let callable = self
            .ctx
            .reader
            .get_function(&self.path, binding.signature())
            .ok_or_else(|| self.no_value())?;
        Ok(BoundFunction::bind(
            self.path.clone(),
            binding.signature().clone(),
            callable,
        )?)
    }

    /// Bind and call the function at this view.
    pub fn call<R: FromCallValue>(&self, args: impl IntoArgs) -> DeckResult<R> {
        Ok(self.function()?.call(args)?)
    }

    /// Build `T` with the factory registered on this table, falling back
    /// to the deck-level registry.
    ///
    /// # Errors
    ///
    /// [`DeckError::NoFactory`] if neither registry has a factory for `T`,
    /// plus whatever the factory returns.
    pub fn build<T: 'static>(&self) -> DeckResult<T> {
        let local = match self.node {
            NodeRef::Table(t) | NodeRef::Element(t) => t.factories().get::<T>(),
            _ => None,
        };
        let factory = local
            .or_else(|| self.ctx.factories.get::<T>())
            .ok_or_else(|| DeckError::NoFactory {
                path: self.path.to_string(),
                type_name: std::any::type_name::<T>(),
            })?;
        tracing::debug!(path = %self.path, ty = std::any::type_name::<T>(), "building with factory");
        factory(self)
    }
}

// ---------------------------------------------------------------------------
// FromDeck
// ---------------------------------------------------------------------------

/// Native types extractable from a [`View`].
pub trait FromDeck: Sized {
    /// # Errors
    ///
    /// [`DeckError::NoValue`] when a non-optional value is absent, and
    /// [`DeckError::TypeMismatch`] when `Self` does not fit the node.
    fn from_view(view: &View<'_>) -> DeckResult<Self>;
}

macro_rules! scalar_from_deck {
    ($ty:ty, $value_type:expr, $accessor:expr) => {
        impl FromDeck for $ty {
            fn from_view(view: &View<'_>) -> DeckResult<Self> {
                view.scalar($value_type)?
                    .as_ref()
                    .and_then($accessor)
                    .ok_or_else(|| view.no_value())
            }
        }
    };
}

scalar_from_deck!(bool, ValueType::Bool, Value::as_bool);
scalar_from_deck!(i64, ValueType::Integer, Value::as_int);
scalar_from_deck!(f64, ValueType::Double, Value::as_double);
scalar_from_deck!(String, ValueType::String, |v: &Value| v.as_str().map(str::to_string));

impl FromDeck for Value {
    fn from_view(view: &View<'_>) -> DeckResult<Self> {
        match view.node {
            NodeRef::Field(f) if f.is_array() => {
                Err(DeckError::type_mismatch(&view.path, "array", "scalar"))
            }
            NodeRef::Field(f) | NodeRef::Entry(f) => {
                view.scalar(f.value_type())?.ok_or_else(|| view.no_value())
            }
            other => Err(DeckError::type_mismatch(&view.path, other.kind_name(), "scalar")),
        }
    }
}

impl<T: FromDeck> FromDeck for Option<T> {
    fn from_view(view: &View<'_>) -> DeckResult<Self> {
        let container = match view.node {
            NodeRef::Table(_) | NodeRef::Element(_) => true,
            NodeRef::Field(f) => f.is_array(),
            NodeRef::Entry(_) | NodeRef::Function(_) => false,
        };
        if container && !view.is_present() {
            return Ok(None);
        }
        match T::from_view(view) {
            Ok(v) => Ok(Some(v)),
            Err(DeckError::NoValue { path }) if path == view.path.to_string() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<T: FromDeck> FromDeck for IndexedMap<T> {
    fn from_view(view: &View<'_>) -> DeckResult<Self> {
        match view.node {
            NodeRef::Table(t) if t.is_struct_array() => {
                let indices = view
                    .ctx
                    .reader
                    .get_indices(&view.path)
                    .ok_or_else(|| view.no_value())?;
                indices
                    .into_iter()
                    .map(|i| -> DeckResult<(i64, T)> { Ok((i, view.index(i)?.extract()?)) })
                    .collect()
            }
            NodeRef::Field(f) if f.is_array() => {
                let (accepted, _) = f
                    .resolve_array(view.ctx.reader, &view.path)
                    .ok_or_else(|| view.no_value())?;
                accepted.try_map(|i, value| view.resolved_entry(f, i, value).extract())
            }
            other => Err(DeckError::type_mismatch(&view.path, other.kind_name(), "array")),
        }
    }
}

impl FromDeck for BoundFunction {
    fn from_view(view: &View<'_>) -> DeckResult<Self> {
        view.function()
    }
}

/// A value produced by a registered factory.
///
/// ```ignore
/// let Built(solver) = deck.get::<Built<LinearSolver>>("thermal_solver.solver")?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Built<T>(pub T);

impl<T> Built<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: 'static> FromDeck for Built<T> {
    fn from_view(view: &View<'_>) -> DeckResult<Self> {
        view.build().map(Built)
    }
}

#[cfg(test)]
mod tests {
    use deck_core::{Arity, FunctionType};
    use deck_document::DocumentReader;

    use super::*;

    fn fixture() -> (DocumentReader, Table) {
        let mut reader = DocumentReader::parse_str(
            "solver: {dt: 0.25, steps: 4, kind: cg}\ncoeffs: [1, 2.5, 3]\nbcs: {7: {value: 1.0}, 12: {value: 2.0}}\n",
        )
        .unwrap();
        reader
            .define_function("scale", Arity::Fixed(1), |args| {
                Ok(vec![Value::Double(args[0].as_double().unwrap_or(0.0) * 2.0)])
            })
            .unwrap();

        let mut schema = Table::root(true);
        schema.add_double("solver.dt", "").unwrap();
        schema.add_int("solver.steps", "").unwrap();
        schema.add_string("solver.kind", "").unwrap();
        schema.add_int("solver.max_iter", "").unwrap().add_default(100).unwrap();
        schema.add_string("solver.label", "").unwrap();
        schema.add_array("coeffs", ValueType::Double, "").unwrap();
        schema.add_struct_array("bcs", "").unwrap().add_double("value", "").unwrap();
        schema
            .add_function("scale", FunctionType::Double, [FunctionType::Double], "")
            .unwrap();
        (reader, schema)
    }

    fn root<'a>(reader: &'a DocumentReader, schema: &'a Table, factories: &'a FactoryRegistry) -> View<'a> {
        View::new(Context { reader, factories }, NodeRef::Table(schema), KeyPath::root())
    }

    #[test]
    fn scalars_resolve() {
        let (reader, schema) = fixture();
        let factories = FactoryRegistry::new();
        let root = root(&reader, &schema, &factories);
        assert_eq!(root.get::<f64>("solver.dt").unwrap(), 0.25);
        assert_eq!(root.get::<i64>("solver.steps").unwrap(), 4);
        // Integer fields read as doubles.
        assert_eq!(root.get::<f64>("solver.steps").unwrap(), 4.0);
        assert_eq!(root.get::<String>("solver.kind").unwrap(), "cg");
        assert_eq!(root.get::<i64>("solver.max_iter").unwrap(), 100);
    }

    #[test]
    fn absent_optional_is_no_value() {
        let (reader, schema) = fixture();
        let factories = FactoryRegistry::new();
        let root = root(&reader, &schema, &factories);
        assert!(matches!(root.get::<String>("solver.label"), Err(DeckError::NoValue { .. })));
        assert_eq!(root.get::<Option<String>>("solver.label").unwrap(), None);
        assert!(!root.contains("solver.label"));
    }

    #[test]
    fn wrong_native_type_is_programmer_error() {
        let (reader, schema) = fixture();
        let factories = FactoryRegistry::new();
        let root = root(&reader, &schema, &factories);
        assert!(matches!(root.get::<i64>("solver.dt"), Err(DeckError::TypeMismatch { .. })));
        assert!(matches!(root.get::<Option<i64>>("solver.dt"), Err(DeckError::TypeMismatch { .. })));
        assert!(matches!(root.get::<f64>("solver"), Err(DeckError::TypeMismatch { .. })));
    }

    #[test]
    fn undeclared_path() {
        let (reader, schema) = fixture();
        let factories = FactoryRegistry::new();
        let root = root(&reader, &schema, &factories);
        assert!(matches!(root.view("solver.nope"), Err(DeckError::NotDeclared { .. })));
        assert!(matches!(root.view("bcs.value"), Err(DeckError::NotDeclared { .. })));
    }

    #[test]
    fn arrays_keep_document_indices() {
        let (reader, schema) = fixture();
        let factories = FactoryRegistry::new();
        let root = root(&reader, &schema, &factories);

        let coeffs: IndexedMap<f64> = root.get("coeffs").unwrap();
        assert_eq!(coeffs.indices().collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(coeffs[1], 2.5);
        assert_eq!(root.get::<f64>("coeffs.2").unwrap(), 3.0);

        let bcs = root.view("bcs").unwrap();
        assert_eq!(bcs.indices(), [7, 12]);
        assert_eq!(root.get::<f64>("bcs.12.value").unwrap(), 2.0);
        assert_eq!(bcs.index(7).unwrap().path().to_string(), "bcs.7");
    }

    #[test]
    fn functions_call_through_views() {
        let (reader, schema) = fixture();
        let factories = FactoryRegistry::new();
        let root = root(&reader, &schema, &factories);
        let scale = root.view("scale").unwrap();
        assert_eq!(scale.call::<f64>(1.5).unwrap(), 3.0);
        assert!(matches!(scale.call::<f64>(()), Err(DeckError::Call(_))));
    }

    #[test]
    fn factories_fall_back_to_deck_level() {
        #[derive(Debug, PartialEq)]
        struct Step(f64);

        let (reader, schema) = fixture();
        let mut factories = FactoryRegistry::new();
        assert!(matches!(
            root(&reader, &schema, &factories).get::<Built<Step>>("solver"),
            Err(DeckError::NoFactory { .. })
        ));
        factories.register(|v: &View<'_>| Ok(Step(v.get("dt")?)));
        let Built(step) = root(&reader, &schema, &factories).get::<Built<Step>>("solver").unwrap();
        assert_eq!(step, Step(0.25));
    }
}
