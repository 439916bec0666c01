//! # Document Reader
//!
//! [`DocumentReader`] answers [`Reader`] queries against a YAML document
//! (JSON is accepted as the YAML subset it is). The parsed
//! `serde_yaml::Value` tree is private: everything handed to the engine is
//! converted to [`Value`] first.
//!
//! ## Indexing
//!
//! - A mapping key that is an integer, or a string spelling one, is an
//!   index. Other keys are names.
//! - A sequence element at position `p` has index
//!   `ReaderOptions::sequence_base + p`.
//! - Entries are reported in document order. Nothing is sorted.

use std::sync::Arc;

use deck_core::{
    Arity, BackendError, Callable, DeckError, IndexedMap, KeyPath, Reader, Segment, Signature,
    Value,
};
use serde_yaml::Value as Yaml;

use crate::function::NativeFunction;
use crate::options::ReaderOptions;

/// A [`Reader`] over a parsed YAML/JSON document.
pub struct DocumentReader {
    root: Yaml,
    functions: Vec<(KeyPath, Arc<dyn Callable>)>,
    options: ReaderOptions,
}

impl std::fmt::Debug for DocumentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentReader")
            .field("root", &self.root)
            .field(
                "functions",
                &self.functions.iter().map(|(p, _)| p.to_string()).collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish()
    }
}

impl DocumentReader {
    /// Parse YAML (or JSON) text with default options.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Parse`] if the text is not a valid document
    /// or its top level is not a mapping.
    pub fn parse_str(text: &str) -> Result<Self, BackendError> {
        Self::parse_str_with(text, ReaderOptions::default())
    }

    /// Parse YAML (or JSON) text with explicit options.
    pub fn parse_str_with(text: &str, options: ReaderOptions) -> Result<Self, BackendError> {
        let root: Yaml =
            serde_yaml::from_str(text).map_err(|e| BackendError::Parse(e.to_string()))?;
        Self::from_yaml(root, options)
    }

    /// Wrap an already parsed JSON document.
    pub fn from_json(json: serde_json::Value) -> Result<Self, BackendError> {
        let root = serde_yaml::to_value(json).map_err(|e| BackendError::Parse(e.to_string()))?;
        Self::from_yaml(root, ReaderOptions::default())
    }

    fn from_yaml(root: Yaml, options: ReaderOptions) -> Result<Self, BackendError> {
        let root = match untag(&root) {
            Yaml::Null => Yaml::Mapping(serde_yaml::Mapping::new()),
            Yaml::Mapping(_) => root,
            other => {
                return Err(BackendError::Parse(format!(
                    "top level must be a mapping, found {}",
                    kind_name(other)
                )))
            }
        };
        tracing::debug!(sequence_base = options.sequence_base, "document parsed");
        Ok(Self {
            root,
            functions: Vec::new(),
            options,
        })
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Attach a callable at `path`. A later definition at the same path
    /// replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::InvalidPath`] if `path` does not parse.
    pub fn define_function<F>(&mut self, path: &str, arity: Arity, body: F) -> Result<&mut Self, DeckError>
    where
        F: Fn(&[Value]) -> Result<Vec<Value>, String> + 'static,
    {
        let path = KeyPath::parse(path)?;
        tracing::debug!(path = %path, ?arity, "function defined");
        let callable: Arc<dyn Callable> = Arc::new(NativeFunction::new(arity, body));
        match self.functions.iter_mut().find(|(p, _)| *p == path) {
            Some((_, slot)) => *slot = callable,
            None => self.functions.push((path, callable)),
        }
        Ok(self)
    }

    fn lookup(&self, path: &KeyPath) -> Option<&Yaml> {
        let mut node = &self.root;
        for seg in path.segments() {
            node = self.step(untag(node), seg)?;
        }
        Some(untag(node))
    }

    fn step<'a>(&self, node: &'a Yaml, seg: &Segment) -> Option<&'a Yaml> {
        match (node, seg) {
            (Yaml::Mapping(map), Segment::Name(name)) => map.get(name.as_str()),
            (Yaml::Mapping(map), Segment::Index(i)) => map
                .get(&Yaml::Number((*i).into()))
                .or_else(|| map.get(i.to_string().as_str())),
            (Yaml::Sequence(seq), Segment::Index(i)) => {
                let pos = i.checked_sub(self.options.sequence_base)?;
                seq.get(usize::try_from(pos).ok()?)
            }
            _ => None,
        }
    }

    /// `(index, value)` pairs of an array-like node in document order.
    fn indexed_entries<'a>(&self, node: &'a Yaml) -> Option<Vec<(i64, &'a Yaml)>> {
        match node {
            Yaml::Mapping(map) => {
                let entries: Vec<_> = map
                    .iter()
                    .filter_map(|(k, v)| key_index(k).map(|i| (i, untag(v))))
                    .collect();
                // A mapping of names only is a table, not an array.
                (!entries.is_empty() || map.is_empty()).then_some(entries)
            }
            Yaml::Sequence(seq) => {
                let base = self.options.sequence_base;
                // Positions past i64::MAX have no index and are dropped.
                Some(
                    seq.iter()
                        .enumerate()
                        .map_while(|(pos, v)| {
                            let i = i64::try_from(pos).ok().and_then(|p| base.checked_add(p))?;
                            Some((i, untag(v)))
                        })
                        .collect(),
                )
            }
            _ => None,
        }
    }

    fn has_function_under(&self, path: &KeyPath) -> bool {
        self.functions.iter().any(|(p, _)| p.starts_with(path))
    }
}

impl Reader for DocumentReader {
    fn contains(&self, path: &KeyPath) -> bool {
        if path.is_root() {
            return true;
        }
        match self.lookup(path) {
            Some(Yaml::Null) | None => self.has_function_under(path),
            Some(_) => true,
        }
    }

    fn get_bool(&self, path: &KeyPath) -> Option<bool> {
        self.lookup(path)?.as_bool()
    }

    fn get_int(&self, path: &KeyPath) -> Option<i64> {
        self.lookup(path)?.as_i64()
    }

    fn get_double(&self, path: &KeyPath) -> Option<f64> {
        self.lookup(path)?.as_f64()
    }

    fn get_string(&self, path: &KeyPath) -> Option<String> {
        self.lookup(path)?.as_str().map(str::to_string)
    }

    fn get_array(&self, path: &KeyPath) -> Option<IndexedMap<Value>> {
        let node = self.lookup(path)?;
        let entries = self.indexed_entries(node)?;
        Some(
            entries
                .into_iter()
                .filter_map(|(i, v)| scalar(v).map(|s| (i, s)))
                .collect(),
        )
    }

    fn get_indices(&self, path: &KeyPath) -> Option<Vec<i64>> {
        let mut indices: Option<Vec<i64>> = self
            .lookup(path)
            .and_then(|node| self.indexed_entries(node))
            .map(|entries| entries.into_iter().map(|(i, _)| i).collect());

        // Elements that only hold callables exist through their functions.
        for (p, _) in &self.functions {
            if p.len() <= path.len() || !p.starts_with(path) {
                continue;
            }
            if let Some(i) = p.segments()[path.len()].as_index() {
                let list = indices.get_or_insert_with(Vec::new);
                if !list.contains(&i) {
                    list.push(i);
                }
            }
        }
        indices
    }

    fn get_function(&self, path: &KeyPath, signature: &Signature) -> Option<Arc<dyn Callable>> {
        let found = self
            .functions
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, f)| Arc::clone(f));
        tracing::debug!(path = %path, %signature, found = found.is_some(), "function lookup");
        found
    }
}

fn untag(v: &Yaml) -> &Yaml {
    match v {
        Yaml::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn key_index(key: &Yaml) -> Option<i64> {
    match untag(key) {
        Yaml::Number(n) => n.as_i64(),
        Yaml::String(s) => KeyPath::parse(s)
            .ok()
            .filter(|p| p.len() == 1)
            .and_then(|p| p.last().and_then(Segment::as_index)),
        _ => None,
    }
}

fn scalar(v: &Yaml) -> Option<Value> {
    match v {
        Yaml::Bool(b) => Some(Value::Bool(*b)),
        Yaml::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Double),
        },
        Yaml::String(s) => Some(Value::String(s.clone())),
        _ => None,
    }
}

fn kind_name(v: &Yaml) -> &'static str {
    match v {
        Yaml::Null => "null",
        Yaml::Bool(_) => "a boolean",
        Yaml::Number(_) => "a number",
        Yaml::String(_) => "a string",
        Yaml::Sequence(_) => "a sequence",
        Yaml::Mapping(_) => "a mapping",
        Yaml::Tagged(_) => "a tagged value",
    }
}
