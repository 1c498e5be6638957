use std::sync::Arc;

use iterq_core::collections::EqualityMap;
use iterq_core::equality::{Equaler, KeyEquality};
use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;

use super::Grouping;
use crate::traits::{Cursor, Sequence};

/// Immutable, repeatable key → elements association.
pub struct Lookup<K, V, E = KeyEquality> {
    groups: Arc<EqualityMap<K, Grouping<K, V>, E>>,
}

impl<K, V, E> Clone for Lookup<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            groups: Arc::clone(&self.groups),
        }
    }
}

impl<K, V, E> Lookup<K, V, E>
where
    K: Clone,
    E: Equaler<K> + Clone,
{
    pub fn from_groups(groups: EqualityMap<K, Vec<V>, E>, hierarchy: Option<Hierarchy<V>>) -> Self {
        let mut out = EqualityMap::with_equaler(groups.equaler().clone());
        for (key, elements) in groups {
            let grouping = Grouping::new(key.clone(), elements, hierarchy.clone());
            out.insert(key, grouping);
        }
        Self {
            groups: Arc::new(out),
        }
    }
}

impl<K, V, E> Lookup<K, V, E>
where
    E: Equaler<K>,
{
    /// Elements for `key`; empty when absent.
    pub fn get(&self, key: &K) -> &[V] {
        self.groups
            .get(key)
            .map(Grouping::elements)
            .unwrap_or(&[])
    }

    pub fn grouping(&self, key: &K) -> Option<&Grouping<K, V>> {
        self.groups.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.groups.contains_key(key)
    }
}

impl<K, V, E> Lookup<K, V, E> {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grouping<K, V>> {
        self.groups.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.groups.keys()
    }
}

impl<K: Clone, V, E> Sequence for Lookup<K, V, E> {
    type Item = Grouping<K, V>;
    type Cursor = LookupCursor<K, V, E>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(LookupCursor {
            groups: Arc::clone(&self.groups),
            pos: 0,
        })
    }
}

pub struct LookupCursor<K, V, E> {
    groups: Arc<EqualityMap<K, Grouping<K, V>, E>>,
    pos: usize,
}

impl<K: Clone, V, E> Cursor for LookupCursor<K, V, E> {
    type Item = Grouping<K, V>;

    fn pull(&mut self) -> Result<Option<Grouping<K, V>>> {
        let next = self.groups.entry_at(self.pos).map(|(_, g)| g.clone());
        if next.is_some() {
            self.pos += 1;
        }
        Ok(next)
    }
}
