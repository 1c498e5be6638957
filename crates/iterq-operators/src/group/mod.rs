//! Grouping/lookup engine.
//!
//! Groups preserve first-seen key order, and source order within a key. Keys
//! are matched through an [`Equaler`]; the default is the library-wide
//! [`KeyEquality`](iterq_core::equality::KeyEquality).

mod lookup;

pub use lookup::{Lookup, LookupCursor};

use std::sync::Arc;

use iterq_core::collections::EqualityMap;
use iterq_core::equality::Equaler;
use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;

use crate::cursor::{drive, Upstream};
use crate::metrics;
use crate::source::ArrayCursor;
use crate::traits::{Cursor, Sequence};

/// A key plus its elements. Itself a restartable sequence of the elements.
pub struct Grouping<K, V> {
    key: K,
    elements: Arc<[V]>,
    hierarchy: Option<Hierarchy<V>>,
}

impl<K, V> Grouping<K, V> {
    pub fn new(key: K, elements: Vec<V>, hierarchy: Option<Hierarchy<V>>) -> Self {
        Self {
            key,
            elements: elements.into(),
            hierarchy,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn elements(&self) -> &[V] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<K: Clone, V> Clone for Grouping<K, V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            elements: Arc::clone(&self.elements),
            hierarchy: self.hierarchy.clone(),
        }
    }
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for Grouping<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grouping")
            .field("key", &self.key)
            .field("elements", &self.elements)
            .finish()
    }
}

impl<K, V: Clone> Sequence for Grouping<K, V> {
    type Item = V;
    type Cursor = ArrayCursor<V>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(ArrayCursor::new(Arc::clone(&self.elements)))
    }

    fn hierarchy(&self) -> Option<Hierarchy<V>> {
        self.hierarchy.clone()
    }
}

/// Identity element selector. Grouping through it keeps the source hierarchy
/// on every group.
pub fn identity<T>(value: T) -> T {
    value
}

fn collect_groups<C, KF, VF, K, V, E>(
    upstream: &mut Upstream<C>,
    key: &KF,
    element: &VF,
    equaler: E,
) -> Result<EqualityMap<K, Vec<V>, E>>
where
    C: Cursor,
    KF: Fn(&C::Item) -> K,
    VF: Fn(C::Item) -> V,
    E: Equaler<K>,
{
    let mut groups = EqualityMap::with_equaler(equaler);
    while let Some(item) = upstream.pull()? {
        let k = key(&item);
        groups.get_or_insert_with(k, Vec::new).push(element(item));
    }
    metrics::emit_materialized("group_by", groups.len());
    Ok(groups)
}

/// Consume `source` entirely into first-seen-ordered groups.
pub fn build_groupings<S, KF, VF, K, V, E>(
    source: &S,
    key: KF,
    element: VF,
    equaler: E,
) -> Result<EqualityMap<K, Vec<V>, E>>
where
    S: Sequence + ?Sized,
    KF: Fn(&S::Item) -> K,
    VF: Fn(S::Item) -> V,
    E: Equaler<K>,
{
    drive(source.open()?, |upstream| {
        collect_groups(upstream, &key, &element, equaler)
    })
}

/// Lazy grouping: drains the upstream on the first pull.
pub struct GroupBy<S, KF, VF, V, E> {
    source: S,
    key: Arc<KF>,
    element: Arc<VF>,
    equaler: E,
    group_hierarchy: Option<Hierarchy<V>>,
}

impl<S, KF, E> GroupBy<S, KF, fn(S::Item) -> S::Item, S::Item, E>
where
    S: Sequence,
{
    /// Group whole elements; each group carries the source hierarchy.
    pub fn new(source: S, key: KF, equaler: E) -> Self {
        let group_hierarchy = source.hierarchy();
        Self {
            source,
            key: Arc::new(key),
            element: Arc::new(identity as fn(S::Item) -> S::Item),
            equaler,
            group_hierarchy,
        }
    }
}

impl<S, KF, VF, V, E> GroupBy<S, KF, VF, V, E> {
    /// Group projected elements. Groups carry no hierarchy.
    pub fn with_element(source: S, key: KF, element: VF, equaler: E) -> Self {
        Self {
            source,
            key: Arc::new(key),
            element: Arc::new(element),
            equaler,
            group_hierarchy: None,
        }
    }
}

impl<S, KF, VF, K, V, E> Sequence for GroupBy<S, KF, VF, V, E>
where
    S: Sequence,
    KF: Fn(&S::Item) -> K,
    VF: Fn(S::Item) -> V,
    E: Equaler<K> + Clone,
{
    type Item = Grouping<K, V>;
    type Cursor = GroupByCursor<S::Cursor, KF, VF, K, V, E>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(GroupByCursor {
            upstream: Upstream::new(self.source.open()?),
            key: Arc::clone(&self.key),
            element: Arc::clone(&self.element),
            equaler: Some(self.equaler.clone()),
            hierarchy: self.group_hierarchy.clone(),
            groups: None,
        })
    }
}

pub struct GroupByCursor<C, KF, VF, K, V, E> {
    upstream: Upstream<C>,
    key: Arc<KF>,
    element: Arc<VF>,
    equaler: Option<E>,
    hierarchy: Option<Hierarchy<V>>,
    groups: Option<std::vec::IntoIter<(K, Vec<V>)>>,
}

impl<C, KF, VF, K, V, E> Cursor for GroupByCursor<C, KF, VF, K, V, E>
where
    C: Cursor,
    KF: Fn(&C::Item) -> K,
    VF: Fn(C::Item) -> V,
    E: Equaler<K>,
{
    type Item = Grouping<K, V>;

    fn pull(&mut self) -> Result<Option<Grouping<K, V>>> {
        if self.groups.is_none() {
            let Some(equaler) = self.equaler.take() else {
                return Ok(None);
            };
            let groups = collect_groups(&mut self.upstream, &*self.key, &*self.element, equaler)?;
            self.groups = Some(groups.into_iter().collect::<Vec<_>>().into_iter());
        }
        Ok(self
            .groups
            .as_mut()
            .and_then(Iterator::next)
            .map(|(key, elements)| Grouping::new(key, elements, self.hierarchy.clone())))
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("group_by");
        self.groups = None;
        self.upstream.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Iter;
    use crate::flow::to_hierarchy;
    use crate::source::from_vec;
    use iterq_core::equality::KeyEquality;
    use iterq_core::hierarchy::hierarchy_fn;
    use serde_json::{json, Value};

    #[test]
    fn test_build_groupings_first_seen_order() {
        let src = from_vec(vec![json!({"k": "b"}), json!({"k": "a"}), json!({"k": "b", "n": 2})]);
        let groups =
            build_groupings(&src, |v: &Value| v["k"].clone(), identity, KeyEquality).unwrap();
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(keys, vec![json!("b"), json!("a")]);
        assert_eq!(
            groups.get(&json!("b")).unwrap(),
            &vec![json!({"k": "b"}), json!({"k": "b", "n": 2})]
        );
    }

    #[test]
    fn test_group_by_sequence_yields_groupings() {
        let seq = GroupBy::with_element(
            from_vec(vec![1, 2, 3, 4, 5]),
            |x: &i32| x % 2,
            |x: i32| x * 10,
            KeyEquality,
        );
        let groups: Vec<_> = Iter::new(seq.open().unwrap())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(*groups[0].key(), 1);
        assert_eq!(groups[0].elements(), &[10, 30, 50]);
        assert!(groups[0].hierarchy().is_none());
    }

    #[test]
    fn test_identity_groups_carry_hierarchy() {
        let h = hierarchy_fn(|_: &i32| None, |_: &i32| Vec::new());
        let src = to_hierarchy(from_vec(vec![1, 2, 3]), h.clone());
        let seq = GroupBy::new(src, |x: &i32| *x > 1, KeyEquality);
        let mut it = Iter::new(seq.open().unwrap());
        let first = it.next().unwrap().unwrap();
        assert!(first.hierarchy().unwrap().same_provider(&h));
    }
}
