//! # Deck Root
//!
//! [`Deck`] owns the document backend, the schema tree, and the deck-level
//! factory registry. Builders hand out `&mut` borrows into the tree, so a
//! handle can never outlive its deck.
//!
//! ## Lifecycle
//!
//! 1. Declare the schema with the `add_*` builders.
//! 2. [`Deck::verify`] once the schema is complete.
//! 3. Extract with [`Deck::get`] or [`Deck::view`] as often as needed.
//!
//! Verification and extraction borrow the deck immutably and never change
//! the schema.

use deck_core::{DeckResult, FromCallValue, FunctionType, KeyPath, Reader, ValueType};

use crate::diagnostic::VerificationReport;
use crate::factory::FactoryRegistry;
use crate::field::Field;
use crate::function::{FunctionBinding, IntoArgs};
use crate::options::DeckOptions;
use crate::table::Table;
use crate::verify;
use crate::view::{Context, FromDeck, NodeRef, View};

/// A configuration document bound to its schema.
pub struct Deck {
    reader: Box<dyn Reader>,
    schema: Table,
    factories: FactoryRegistry,
    options: DeckOptions,
}

impl std::fmt::Debug for Deck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deck")
            .field("schema", &self.schema)
            .field("factories", &self.factories)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Deck {
    pub fn new(reader: impl Reader + 'static) -> Self {
        Self::with_options(reader, DeckOptions::default())
    }

    pub fn with_options(reader: impl Reader + 'static, options: DeckOptions) -> Self {
        Self {
            reader: Box::new(reader),
            schema: Table::root(options.docs_enabled),
            factories: FactoryRegistry::new(),
            options,
        }
    }

    pub fn options(&self) -> &DeckOptions {
        &self.options
    }

    pub fn reader(&self) -> &dyn Reader {
        &*self.reader
    }

    /// The root table of the schema.
    pub fn schema(&self) -> &Table {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut Table {
        &mut self.schema
    }

    // -----------------------------------------------------------------------
    // Schema definition (delegates to the root table)
    // -----------------------------------------------------------------------

    pub fn add_table(&mut self, path: &str, description: &str) -> DeckResult<&mut Table> {
        self.schema.add_table(path, description)
    }

    pub fn add_struct_array(&mut self, path: &str, description: &str) -> DeckResult<&mut Table> {
        self.schema.add_struct_array(path, description)
    }

    pub fn add_scalar(&mut self, path: &str, ty: ValueType, description: &str) -> DeckResult<&mut Field> {
        self.schema.add_scalar(path, ty, description)
    }

    pub fn add_bool(&mut self, path: &str, description: &str) -> DeckResult<&mut Field> {
        self.schema.add_bool(path, description)
    }

    pub fn add_int(&mut self, path: &str, description: &str) -> DeckResult<&mut Field> {
        self.schema.add_int(path, description)
    }

    pub fn add_double(&mut self, path: &str, description: &str) -> DeckResult<&mut Field> {
        self.schema.add_double(path, description)
    }

    pub fn add_string(&mut self, path: &str, description: &str) -> DeckResult<&mut Field> {
        self.schema.add_string(path, description)
    }

    pub fn add_array(&mut self, path: &str, ty: ValueType, description: &str) -> DeckResult<&mut Field> {
        self.schema.add_array(path, ty, description)
    }

    pub fn add_function(
        &mut self,
        path: &str,
        returns: FunctionType,
        args: impl Into<Vec<FunctionType>>,
        description: &str,
    ) -> DeckResult<&mut FunctionBinding> {
        self.schema.add_function(path, returns, args, description)
    }

    /// Add a predicate over the whole document.
    pub fn register_verifier<F>(&mut self, verifier: F) -> &mut Self
    where
        F: Fn(&View<'_>) -> bool + 'static,
    {
        self.schema.register_verifier(verifier);
        self
    }

    /// Register a deck-level factory for `T`, used for any table without
    /// its own factory for `T`.
    pub fn register_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&View<'_>) -> DeckResult<T> + 'static,
    {
        self.factories.register(factory);
        self
    }

    // -----------------------------------------------------------------------
    // Verification and extraction
    // -----------------------------------------------------------------------

    /// Check the whole document against the schema.
    pub fn verify(&self) -> VerificationReport {
        verify::verify(self.context(), &self.schema)
    }

    /// View of the document root.
    pub fn root(&self) -> View<'_> {
        View::new(self.context(), NodeRef::Table(&self.schema), KeyPath::root())
    }

    /// View at the concrete `path`, e.g. `"bcs.7.kind"`.
    pub fn view(&self, path: &str) -> DeckResult<View<'_>> {
        self.root().view(path)
    }

    /// Extract `T` at the concrete `path`.
    ///
    /// ```
    /// use deck_document::DocumentReader;
    /// use deck_schema::Deck;
    ///
    /// let reader = DocumentReader::parse_str("solver: {dt: 0.25}").unwrap();
    /// let mut deck = Deck::new(reader);
    /// deck.add_double("solver.dt", "time step").unwrap();
    /// deck.add_int("solver.max_iter", "").unwrap().add_default(100).unwrap();
    ///
    /// assert!(deck.verify().is_ok());
    /// assert_eq!(deck.get::<f64>("solver.dt").unwrap(), 0.25);
    /// assert_eq!(deck.get::<i64>("solver.max_iter").unwrap(), 100);
    /// ```
    pub fn get<T: FromDeck>(&self, path: &str) -> DeckResult<T> {
        self.root().get(path)
    }

    /// Call the bound function at `path`.
    pub fn call<R: FromCallValue>(&self, path: &str, args: impl IntoArgs) -> DeckResult<R> {
        self.view(path)?.call(args)
    }

    pub(crate) fn context(&self) -> Context<'_> {
        Context {
            reader: &*self.reader,
            factories: &self.factories,
        }
    }
}
