//! # Indexed Maps
//!
//! Arrays in configuration documents are keyed by integers chosen by the
//! document (and its backend), not by position. A document may define
//! entries 7 and 12 and nothing else; a backend may number sequences from 1.
//!
//! [`IndexedMap`] keeps entries in the order the backend reported them and
//! never renumbers, sorts, or fills gaps.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Integer-keyed entries in backend order.
///
/// Serializes as a sequence of `[index, value]` pairs.
#[derive(Clone)]
pub struct IndexedMap<T> {
    entries: Vec<(i64, T)>,
    positions: HashMap<i64, usize>,
}

impl<T> Default for IndexedMap<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T> IndexedMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Insert or replace the entry at `index`. A new index is appended; an
    /// existing one keeps its position.
    pub fn insert(&mut self, index: i64, value: T) -> Option<T> {
        match self.positions.get(&index) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.positions.insert(index, self.entries.len());
                self.entries.push((index, value));
                None
            }
        }
    }

    pub fn get(&self, index: i64) -> Option<&T> {
        self.positions.get(&index).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, index: i64) -> bool {
        self.positions.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indices in backend order.
    pub fn indices(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|(i, _)| *i)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &T)> {
        self.entries.iter().map(|(i, v)| (*i, v))
    }

    /// Apply `f` to every value, keeping indices and order.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> IndexedMap<U> {
        IndexedMap {
            entries: self.entries.into_iter().map(|(i, v)| (i, f(v))).collect(),
            positions: self.positions,
        }
    }

    /// Like [`IndexedMap::map`] but stops at the first error.
    pub fn try_map<U, E>(self, mut f: impl FnMut(i64, T) -> Result<U, E>) -> Result<IndexedMap<U>, E> {
        let entries = self
            .entries
            .into_iter()
            .map(|(i, v)| f(i, v).map(|u| (i, u)))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(IndexedMap {
            entries,
            positions: self.positions,
        })
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for IndexedMap<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

// Order is part of equality; the position index is derived from it.
impl<T: PartialEq> PartialEq for IndexedMap<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: Serialize> Serialize for IndexedMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for IndexedMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<(i64, T)>::deserialize(deserializer).map(|entries| entries.into_iter().collect())
    }
}

impl<T> FromIterator<(i64, T)> for IndexedMap<T> {
    fn from_iter<I: IntoIterator<Item = (i64, T)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity(iter.size_hint().0);
        for (i, v) in iter {
            map.insert(i, v);
        }
        map
    }
}

impl<T> IntoIterator for IndexedMap<T> {
    type Item = (i64, T);
    type IntoIter = std::vec::IntoIter<(i64, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<T> std::ops::Index<i64> for IndexedMap<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `index` is not present, like `HashMap`'s `Index`.
    fn index(&self, index: i64) -> &T {
        match self.get(index) {
            Some(v) => v,
            None => panic!("no entry at index {index}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_backend_order() {
        let map: IndexedMap<&str> = [(12, "b"), (7, "a"), (-1, "c")].into_iter().collect();
        assert_eq!(map.indices().collect::<Vec<_>>(), vec![12, 7, -1]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = IndexedMap::new();
        map.insert(3, "x");
        map.insert(1, "y");
        assert_eq!(map.insert(3, "z"), Some("x"));
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![(3, &"z"), (1, &"y")]);
    }

    #[test]
    fn sparse_lookup() {
        let map: IndexedMap<i32> = [(7, 70), (12, 120)].into_iter().collect();
        assert_eq!(map[7], 70);
        assert!(map.get(8).is_none());
        assert!(!map.contains(0));
    }

    #[test]
    fn large_maps_look_up_by_index() {
        let map: IndexedMap<i64> = (0..20_000).rev().map(|i| (i, i * 2)).collect();
        assert_eq!(map.len(), 20_000);
        assert_eq!(map.indices().next(), Some(19_999));
        assert_eq!(map[1234], 2468);
        assert!(!map.contains(20_000));
    }

    #[test]
    fn serializes_as_ordered_pairs() {
        let map: IndexedMap<&str> = [(12, "b"), (7, "a")].into_iter().collect();
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!([[12, "b"], [7, "a"]]));
        let back: IndexedMap<String> = serde_json::from_value(json).unwrap();
        assert_eq!(back.get(7).map(String::as_str), Some("a"));
        assert_eq!(back.indices().collect::<Vec<_>>(), vec![12, 7]);
    }

    #[test]
    fn try_map_short_circuits() {
        let map: IndexedMap<i32> = [(1, 1), (2, -2), (3, 3)].into_iter().collect();
        let res: Result<IndexedMap<u32>, i64> =
            map.try_map(|i, v| u32::try_from(v).map_err(|_| i));
        assert_eq!(res, Err(2));
    }
}
