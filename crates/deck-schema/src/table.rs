//! # Schema Tables
//!
//! A [`Table`] is an interior node of the schema tree. It owns its
//! children (nested tables, fields, and function bindings) keyed by path
//! segment, and carries the required flag, verifiers, and factories that
//! apply to the subtree.
//!
//! ## Struct arrays
//!
//! A table declared with [`Table::add_struct_array`] is a template. Its
//! children describe one element, and verification and extraction apply
//! the template once per index the document actually holds.
//!
//! ## Redeclaration
//!
//! Every `add_*` call is idempotent for a matching declaration and returns
//! the existing node, so builders can be re-entered. A declaration whose
//! kind or type differs from the existing node is
//! [`DeckError::SchemaConflict`], however many siblings were declared in
//! between.

use std::fmt;

use deck_core::{DeckError, DeckResult, FunctionType, KeyPath, Segment, Signature, ValueType};

use crate::factory::FactoryRegistry;
use crate::field::{Field, FieldShape};
use crate::function::FunctionBinding;
use crate::view::{NodeRef, View};

pub(crate) type TableVerifier = Box<dyn Fn(&View<'_>) -> bool>;

/// Whether a table stands for one record or an array of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Plain,
    StructArray,
}

enum Node {
    Table(Table),
    Field(Field),
    Function(FunctionBinding),
}

impl Node {
    fn as_ref(&self) -> NodeRef<'_> {
        match self {
            Self::Table(t) => NodeRef::Table(t),
            Self::Field(f) => NodeRef::Field(f),
            Self::Function(b) => NodeRef::Function(b),
        }
    }

    fn path(&self) -> &KeyPath {
        match self {
            Self::Table(t) => &t.path,
            Self::Field(f) => f.path(),
            Self::Function(b) => b.path(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Table(t) if t.is_struct_array() => "a struct array".to_string(),
            Self::Table(_) => "a table".to_string(),
            Self::Field(f) if f.is_array() => format!("an array of {}", f.value_type()),
            Self::Field(f) => format!("a {} field", f.value_type()),
            Self::Function(b) => format!("a function {}", b.signature()),
        }
    }
}

/// Interior schema node.
pub struct Table {
    path: KeyPath,
    kind: TableKind,
    required: bool,
    description: Option<String>,
    docs_enabled: bool,
    children: Vec<(Segment, Node)>,
    verifiers: Vec<TableVerifier>,
    factories: FactoryRegistry,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field(
                "children",
                &self.children.iter().map(|(s, _)| s).collect::<Vec<_>>(),
            )
            .field("verifiers", &self.verifiers.len())
            .field("factories", &self.factories)
            .finish()
    }
}

impl Table {
    pub(crate) fn new(
        path: KeyPath,
        kind: TableKind,
        description: Option<String>,
        docs_enabled: bool,
    ) -> Self {
        Self {
            path,
            kind,
            required: false,
            description,
            docs_enabled,
            children: Vec::new(),
            verifiers: Vec::new(),
            factories: FactoryRegistry::new(),
        }
    }

    /// The root of a schema tree. The root is always present.
    pub(crate) fn root(docs_enabled: bool) -> Self {
        let mut root = Self::new(KeyPath::root(), TableKind::Plain, None, docs_enabled);
        root.required = true;
        root
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    /// Declare a nested table at `path` (relative, dot-separated).
    /// Intermediate tables are created as needed.
    pub fn add_table(&mut self, path: &str, description: &str) -> DeckResult<&mut Table> {
        self.add_table_of(path, TableKind::Plain, description)
    }

    /// Declare a struct array at `path`. The returned table is the element
    /// template.
    pub fn add_struct_array(&mut self, path: &str, description: &str) -> DeckResult<&mut Table> {
        self.add_table_of(path, TableKind::StructArray, description)
    }

    /// Declare a scalar field.
    pub fn add_scalar(&mut self, path: &str, ty: ValueType, description: &str) -> DeckResult<&mut Field> {
        self.add_field(path, ty, FieldShape::Scalar, description)
    }

    pub fn add_bool(&mut self, path: &str, description: &str) -> DeckResult<&mut Field> {
        self.add_scalar(path, ValueType::Bool, description)
    }

    pub fn add_int(&mut self, path: &str, description: &str) -> DeckResult<&mut Field> {
        self.add_scalar(path, ValueType::Integer, description)
    }

    pub fn add_double(&mut self, path: &str, description: &str) -> DeckResult<&mut Field> {
        self.add_scalar(path, ValueType::Double, description)
    }

    pub fn add_string(&mut self, path: &str, description: &str) -> DeckResult<&mut Field> {
        self.add_scalar(path, ValueType::String, description)
    }

    /// Declare a homogeneous scalar array.
    pub fn add_array(&mut self, path: &str, ty: ValueType, description: &str) -> DeckResult<&mut Field> {
        self.add_field(path, ty, FieldShape::Array, description)
    }

    /// Declare a function binding.
    ///
    /// # Errors
    ///
    /// [`DeckError::TypeMismatch`] if an argument is `Void`, plus the usual
    /// conflict and path errors.
    pub fn add_function(
        &mut self,
        path: &str,
        returns: FunctionType,
        args: impl Into<Vec<FunctionType>>,
        description: &str,
    ) -> DeckResult<&mut FunctionBinding> {
        let rel = KeyPath::parse(path)?;
        let signature = Signature::new(returns, args);
        if signature.args.contains(&FunctionType::Void) {
            return Err(DeckError::type_mismatch(
                self.path.join(&rel),
                "a non-void argument type",
                FunctionType::Void,
            ));
        }
        let description = self.doc(description);
        let (parent, segment) = self.parent_for(&rel)?;
        let node = parent.declare(
            segment,
            |p| Node::Function(FunctionBinding::new(p, signature.clone(), description.clone())),
            |n| matches!(n, Node::Function(b) if *b.signature() == signature),
        )?;
        match node {
            Node::Function(b) => {
                b.set_description(description);
                Ok(b)
            }
            other => Err(conflict(other)),
        }
    }

    pub fn required(&mut self, required: bool) -> &mut Self {
        self.required = required;
        self
    }

    /// Add a predicate over this table's view. For struct arrays the
    /// predicate runs once per element.
    pub fn register_verifier<F>(&mut self, verifier: F) -> &mut Self
    where
        F: Fn(&View<'_>) -> bool + 'static,
    {
        self.verifiers.push(Box::new(verifier));
        self
    }

    /// Register how to build `T` from this table (or from each element,
    /// for a struct array).
    pub fn register_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: 'static,
        F: Fn(&View<'_>) -> DeckResult<T> + 'static,
    {
        self.factories.register(factory);
        self
    }

    fn add_table_of(&mut self, path: &str, kind: TableKind, description: &str) -> DeckResult<&mut Table> {
        let rel = KeyPath::parse(path)?;
        let description = self.doc(description);
        let docs_enabled = self.docs_enabled;
        let (parent, segment) = self.parent_for(&rel)?;
        let node = parent.declare(
            segment,
            |p| Node::Table(Table::new(p, kind, description.clone(), docs_enabled)),
            |n| matches!(n, Node::Table(t) if t.kind == kind),
        )?;
        match node {
            Node::Table(t) => {
                if t.description.is_none() {
                    t.description = description;
                }
                Ok(t)
            }
            other => Err(conflict(other)),
        }
    }

    fn add_field(
        &mut self,
        path: &str,
        ty: ValueType,
        shape: FieldShape,
        description: &str,
    ) -> DeckResult<&mut Field> {
        let rel = KeyPath::parse(path)?;
        let description = self.doc(description);
        let (parent, segment) = self.parent_for(&rel)?;
        let node = parent.declare(
            segment,
            |p| Node::Field(Field::new(p, ty, shape, description.clone())),
            |n| matches!(n, Node::Field(f) if f.value_type() == ty && f.shape() == shape),
        )?;
        match node {
            Node::Field(f) => {
                f.set_description(description);
                Ok(f)
            }
            other => Err(conflict(other)),
        }
    }

    fn doc(&self, description: &str) -> Option<String> {
        (self.docs_enabled && !description.is_empty()).then(|| description.to_string())
    }

    /// Walk (creating plain tables as needed) to the parent of the last
    /// segment of `rel`.
    fn parent_for(&mut self, rel: &KeyPath) -> DeckResult<(&mut Table, Segment)> {
        let Some((last, prefix)) = rel.segments().split_last() else {
            return Err(DeckError::InvalidPath {
                path: self.path.to_string(),
                reason: "a declaration needs a non-empty path".to_string(),
            });
        };

        let mut table = self;
        for segment in prefix {
            table.check_child_segment(segment)?;
            let docs_enabled = table.docs_enabled;
            let node = table.slot(segment.clone(), |p| {
                Node::Table(Table::new(p, TableKind::Plain, None, docs_enabled))
            });
            table = match node {
                Node::Table(t) => t,
                other => return Err(conflict(other)),
            };
        }
        table.check_child_segment(last)?;
        Ok((table, last.clone()))
    }

    fn check_child_segment(&self, segment: &Segment) -> DeckResult<()> {
        if self.is_struct_array() && segment.as_index().is_some() {
            return Err(DeckError::InvalidPath {
                path: self.path.child(segment.clone()).to_string(),
                reason: "struct array elements are declared once, not per index".to_string(),
            });
        }
        Ok(())
    }

    /// The child at `segment`, created by `make` if absent. An existing
    /// child must satisfy `fits`.
    fn declare(
        &mut self,
        segment: Segment,
        make: impl FnOnce(KeyPath) -> Node,
        fits: impl FnOnce(&Node) -> bool,
    ) -> DeckResult<&mut Node> {
        let pos = self.position(segment, make);
        let existing = &self.children[pos].1;
        if !fits(existing) {
            return Err(conflict(existing));
        }
        Ok(&mut self.children[pos].1)
    }

    fn slot(&mut self, segment: Segment, make: impl FnOnce(KeyPath) -> Node) -> &mut Node {
        let pos = self.position(segment, make);
        &mut self.children[pos].1
    }

    fn position(&mut self, segment: Segment, make: impl FnOnce(KeyPath) -> Node) -> usize {
        match self.children.iter().position(|(s, _)| *s == segment) {
            Some(pos) => pos,
            None => {
                let node = make(self.path.child(segment.clone()));
                self.children.push((segment, node));
                self.children.len() - 1
            }
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Declared (template) path of this table.
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn is_struct_array(&self) -> bool {
        self.kind == TableKind::StructArray
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The direct child declared under `segment`.
    pub fn child(&self, segment: &Segment) -> Option<NodeRef<'_>> {
        self.children
            .iter()
            .find(|(s, _)| s == segment)
            .map(|(_, node)| node.as_ref())
    }

    /// Direct children in declaration order.
    pub fn children(&self) -> impl Iterator<Item = (&Segment, NodeRef<'_>)> {
        self.children.iter().map(|(s, node)| (s, node.as_ref()))
    }

    /// The declared node at the relative path `rel`, looking through
    /// struct arrays by name.
    pub fn lookup(&self, rel: &KeyPath) -> Option<NodeRef<'_>> {
        let mut node = NodeRef::Table(self);
        for segment in rel.segments() {
            node = match node {
                NodeRef::Table(t) | NodeRef::Element(t) => t.child(segment)?,
                _ => return None,
            };
        }
        Some(node)
    }

    pub fn factories(&self) -> &FactoryRegistry {
        &self.factories
    }

    pub(crate) fn verifiers(&self) -> &[TableVerifier] {
        &self.verifiers
    }
}

fn conflict(existing: &Node) -> DeckError {
    DeckError::conflict(
        existing.path(),
        format!("already declared as {}", existing.describe()),
    )
}
