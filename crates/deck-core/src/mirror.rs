//! # Persisted Mirror
//!
//! A generic hierarchical key/value store that validated values can be
//! copied into so they are inspectable or serializable after the document
//! backend is gone. The engine only needs two operations from it, captured
//! by [`Mirror`]. [`TreeStore`] is the in-memory implementation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::DeckError;
use crate::path::KeyPath;
use crate::value::Value;

/// Destination for mirrored configuration data.
pub trait Mirror {
    /// Ensure a group exists at `path`, creating parents as needed.
    fn create_group(&mut self, path: &KeyPath) -> Result<(), DeckError>;

    /// Store `value` at `path`, creating parent groups as needed.
    fn create_view(&mut self, path: &KeyPath, value: Value) -> Result<(), DeckError>;
}

/// A node in a [`TreeStore`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoreNode {
    /// Interior node keyed by segment text.
    Group(BTreeMap<String, StoreNode>),
    /// Leaf value.
    View(Value),
}

impl StoreNode {
    fn empty_group() -> Self {
        Self::Group(BTreeMap::new())
    }
}

/// In-memory [`Mirror`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TreeStore {
    root: StoreNode,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self {
            root: StoreNode::empty_group(),
        }
    }
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The node at `path`, if any.
    pub fn get(&self, path: &KeyPath) -> Option<&StoreNode> {
        let mut node = &self.root;
        for seg in path.segments() {
            match node {
                StoreNode::Group(children) => node = children.get(&seg.to_string())?,
                StoreNode::View(_) => return None,
            }
        }
        Some(node)
    }

    /// The value stored at `path`, if `path` is a view.
    pub fn view(&self, path: &KeyPath) -> Option<&Value> {
        match self.get(path)? {
            StoreNode::View(v) => Some(v),
            StoreNode::Group(_) => None,
        }
    }

    pub fn has_group(&self, path: &KeyPath) -> bool {
        matches!(self.get(path), Some(StoreNode::Group(_)))
    }

    /// JSON rendering of the whole store.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Walk to the group at `path`, creating missing groups.
    fn group_mut(&mut self, path: &KeyPath) -> Result<&mut BTreeMap<String, StoreNode>, DeckError> {
        let mut node = &mut self.root;
        for (depth, seg) in path.segments().iter().enumerate() {
            let children = match node {
                StoreNode::Group(children) => children,
                StoreNode::View(_) => {
                    return Err(view_in_the_way(path, depth));
                }
            };
            node = children
                .entry(seg.to_string())
                .or_insert_with(StoreNode::empty_group);
        }
        match node {
            StoreNode::Group(children) => Ok(children),
            StoreNode::View(_) => Err(view_in_the_way(path, path.len())),
        }
    }
}

fn view_in_the_way(path: &KeyPath, depth: usize) -> DeckError {
    let blocking = KeyPath::from_segments(path.segments()[..depth].iter().cloned());
    DeckError::conflict(path, format!("'{blocking}' already holds a value"))
}

impl Mirror for TreeStore {
    fn create_group(&mut self, path: &KeyPath) -> Result<(), DeckError> {
        self.group_mut(path).map(|_| ())
    }

    fn create_view(&mut self, path: &KeyPath, value: Value) -> Result<(), DeckError> {
        let Some(name) = path.last() else {
            return Err(DeckError::conflict(path, "the root is always a group"));
        };
        let key = name.to_string();
        let parent = self.group_mut(&path.parent())?;
        if matches!(parent.get(&key), Some(StoreNode::Group(_))) {
            return Err(DeckError::conflict(path, "a group already exists here"));
        }
        parent.insert(key, StoreNode::View(value));
        Ok(())
    }
}
