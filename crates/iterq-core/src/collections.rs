//! Insertion-ordered map/set keyed through an [`Equaler`].
//!
//! Grouping, lookups, `to_map` and the set operators all need the same two
//! guarantees: first-seen key order, and equality that is not `Eq + Hash`
//! (floats, JSON values, caller-supplied equalers). Storage is an
//! [`IndexMap`] driven through its raw-entry API, so the equaler supplies
//! both the hash and the match.

use indexmap::map::raw_entry_v1::{RawEntryApiV1, RawEntryMut};
use indexmap::IndexMap;

use crate::equality::{Equaler, KeyEq, KeyEquality};

#[derive(Clone)]
pub struct EqualityMap<K, V, E = KeyEquality> {
    entries: IndexMap<K, V>,
    equaler: E,
}

impl<K: KeyEq, V> EqualityMap<K, V, KeyEquality> {
    pub fn new() -> Self {
        Self::with_equaler(KeyEquality)
    }
}

impl<K: KeyEq, V> Default for EqualityMap<K, V, KeyEquality> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E> EqualityMap<K, V, E>
where
    E: Equaler<K>,
{
    pub fn with_equaler(equaler: E) -> Self {
        Self {
            entries: IndexMap::new(),
            equaler,
        }
    }

    /// Position of `key` in insertion order.
    pub fn index_of(&self, key: &K) -> Option<usize> {
        let equaler = &self.equaler;
        self.entries
            .raw_entry_v1()
            .index_from_hash(equaler.hash(key), |k| equaler.equals(k, key))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index_of(key).is_some()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index_of(key)
            .and_then(|i| self.entries.get_index(i))
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let i = self.index_of(key)?;
        self.entries.get_index_mut(i).map(|(_, v)| v)
    }

    /// Insert or replace. A replaced entry keeps its original position and
    /// its original key.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.equaler.hash(&key);
        let equaler = &self.equaler;
        match self
            .entries
            .raw_entry_mut_v1()
            .from_hash(hash, |k| equaler.equals(k, &key))
        {
            RawEntryMut::Occupied(mut slot) => Some(slot.insert(value)),
            RawEntryMut::Vacant(slot) => {
                slot.insert_hashed_nocheck(hash, key, value);
                None
            }
        }
    }

    /// Value slot for `key`, created with `make` on first sight.
    pub fn get_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> &mut V {
        let hash = self.equaler.hash(&key);
        let equaler = &self.equaler;
        match self
            .entries
            .raw_entry_mut_v1()
            .from_hash(hash, |k| equaler.equals(k, &key))
        {
            RawEntryMut::Occupied(slot) => slot.into_mut(),
            RawEntryMut::Vacant(slot) => slot.insert_hashed_nocheck(hash, key, make()).1,
        }
    }

    pub fn equaler(&self) -> &E {
        &self.equaler
    }
}

impl<K, V, E> EqualityMap<K, V, E> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at an insertion-order position.
    pub fn entry_at(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get_index(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }
}

impl<K, V, E> IntoIterator for EqualityMap<K, V, E> {
    type Item = (K, V);
    type IntoIter = indexmap::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug, E> std::fmt::Debug for EqualityMap<K, V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Insertion-ordered set over an [`Equaler`].
#[derive(Clone)]
pub struct EqualitySet<T, E = KeyEquality> {
    map: EqualityMap<T, (), E>,
}

impl<T: KeyEq> EqualitySet<T, KeyEquality> {
    pub fn new() -> Self {
        Self::with_equaler(KeyEquality)
    }
}

impl<T: KeyEq> Default for EqualitySet<T, KeyEquality> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> EqualitySet<T, E>
where
    E: Equaler<T>,
{
    pub fn with_equaler(equaler: E) -> Self {
        Self {
            map: EqualityMap::with_equaler(equaler),
        }
    }

    /// Returns `true` when `value` was not present yet.
    pub fn insert(&mut self, value: T) -> bool {
        if self.map.contains_key(&value) {
            false
        } else {
            self.map.insert(value, ());
            true
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.map.contains_key(value)
    }

    pub fn equaler(&self) -> &E {
        self.map.equaler()
    }
}

impl<T, E> EqualitySet<T, E> {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.map.keys()
    }
}

impl<T, E> IntoIterator for EqualitySet<T, E> {
    type Item = T;
    type IntoIter = indexmap::map::IntoKeys<T, ()>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.entries.into_keys()
    }
}

impl<T: std::fmt::Debug, E> std::fmt::Debug for EqualitySet<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
