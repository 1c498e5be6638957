//! Async grouping: drains the upstream on the first pull and yields
//! [`Grouping`]s in first-seen key order.

use std::sync::Arc;

use iterq_core::collections::EqualityMap;
use iterq_core::equality::Equaler;
use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;
use iterq_operators::group::{identity, Grouping};
use iterq_operators::metrics;

use crate::cursor::Upstream;
use crate::traits::{AsyncCursor, AsyncSequence};

pub struct GroupBy<S, KF, VF, V, E> {
    source: S,
    key: Arc<KF>,
    element: Arc<VF>,
    equaler: E,
    group_hierarchy: Option<Hierarchy<V>>,
}

impl<S, KF, E> GroupBy<S, KF, fn(S::Item) -> S::Item, S::Item, E>
where
    S: AsyncSequence,
{
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

impl<S, KF, VF, K, V, E> AsyncSequence for GroupBy<S, KF, VF, V, E>
where
    S: AsyncSequence,
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

pub struct GroupByCursor<C: AsyncCursor, KF, VF, K, V, E> {
    upstream: Upstream<C>,
    key: Arc<KF>,
    element: Arc<VF>,
    equaler: Option<E>,
    hierarchy: Option<Hierarchy<V>>,
    groups: Option<std::vec::IntoIter<(K, Vec<V>)>>,
}

impl<C, KF, VF, K, V, E> AsyncCursor for GroupByCursor<C, KF, VF, K, V, E>
where
    C: AsyncCursor,
    KF: Fn(&C::Item) -> K,
    VF: Fn(C::Item) -> V,
    E: Equaler<K>,
{
    type Item = Grouping<K, V>;

    async fn pull(&mut self) -> Result<Option<Grouping<K, V>>> {
        if self.groups.is_none() {
            let Some(equaler) = self.equaler.take() else {
                return Ok(None);
            };
            let mut groups = EqualityMap::with_equaler(equaler);
            while let Some(item) = self.upstream.pull().await? {
                let k = (self.key)(&item);
                groups.get_or_insert_with(k, Vec::new).push((self.element)(item));
            }
            metrics::emit_materialized("async_group_by", groups.len());
            self.groups = Some(groups.into_iter().collect::<Vec<_>>().into_iter());
        }
        Ok(self
            .groups
            .as_mut()
            .and_then(Iterator::next)
            .map(|(k, v)| Grouping::new(k, v, self.hierarchy.clone())))
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_group_by");
        self.groups = None;
        self.upstream.close()
    }
}

#[cfg(test)]
mod tests {
    use iterq_core::hierarchy::hierarchy_fn;
    use iterq_operators::traits::Sequence;

    use crate::ext::AsyncSequenceExt;
    use crate::source::from_vec;
    use crate::testing::{count, log, Tracked};
    use crate::traits::AsyncSequence;

    #[tokio::test]
    async fn test_group_by_with_projects_elements() {
        let rows = vec![("x", 1), ("y", 2), ("x", 3)];
        let groups = from_vec(rows)
            .group_by_with(|r| r.0, |r| r.1 * 10)
            .to_vec()
            .await
            .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(*groups[0].key(), "x");
        assert_eq!(groups[0].elements(), &[10, 30]);
        assert_eq!(groups[1].elements(), &[20]);
    }

    #[tokio::test]
    async fn test_groups_carry_source_hierarchy() {
        let h = hierarchy_fn(|_: &i32| None, |_: &i32| vec![]);
        let grouped = from_vec(vec![1, 2, 3]).to_hierarchy(h.clone()).group_by(|n| n % 2);
        assert!(grouped.hierarchy().is_none());
        let groups = grouped.to_vec().await.unwrap();
        assert!(groups[0].hierarchy().unwrap().same_provider(&h));
    }

    #[tokio::test]
    async fn test_stop_after_first_group_drains_without_close() {
        let events = log();
        let grouped = Tracked::new("src", vec![1, 2, 3, 4], &events).group_by(|n| n % 2);
        let first = grouped.first().await.unwrap().unwrap();
        assert_eq!(first.elements(), &[1, 3]);
        assert_eq!(count(&events, "src:pull"), 5);
        assert_eq!(count(&events, "src:close"), 0);
    }
}
