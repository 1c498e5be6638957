//! Async ordering composer. Shares [`SortLevel`] and [`stable_sort`] with the
//! sync side; only the drain is awaited.

use std::cmp::Ordering;

use iterq_core::compare::{Comparer, Direction, NaturalOrder};
use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;
use iterq_operators::metrics;
use iterq_operators::sort::{stable_sort, SortLevel};

use crate::cursor::Upstream;
use crate::traits::{AsyncCursor, AsyncSequence};

pub struct Ordered<S: AsyncSequence> {
    source: S,
    levels: Vec<SortLevel<S::Item>>,
}

impl<S: AsyncSequence> Ordered<S> {
    pub fn new(source: S, level: SortLevel<S::Item>) -> Self {
        Self {
            source,
            levels: vec![level],
        }
    }

    pub fn then_by_level(mut self, level: SortLevel<S::Item>) -> Self {
        self.levels.push(level);
        self
    }
}

impl<S> Ordered<S>
where
    S: AsyncSequence,
    S::Item: 'static,
{
    pub fn then_by<K, F>(self, key: F) -> Self
    where
        F: Fn(&S::Item) -> K + 'static,
        K: PartialOrd + 'static,
    {
        self.then_by_level(SortLevel::by_key(key, NaturalOrder, Direction::Ascending))
    }

    pub fn then_by_descending<K, F>(self, key: F) -> Self
    where
        F: Fn(&S::Item) -> K + 'static,
        K: PartialOrd + 'static,
    {
        self.then_by_level(SortLevel::by_key(key, NaturalOrder, Direction::Descending))
    }

    pub fn then_by_with<K, F, C>(self, key: F, comparer: C) -> Self
    where
        F: Fn(&S::Item) -> K + 'static,
        C: Comparer<K> + 'static,
        K: 'static,
    {
        self.then_by_level(SortLevel::by_key(key, comparer, Direction::Ascending))
    }

    pub fn then_with<F>(self, compare: F) -> Self
    where
        F: Fn(&S::Item, &S::Item) -> Ordering + 'static,
    {
        self.then_by_level(SortLevel::by_compare(compare, Direction::Ascending))
    }
}

impl<S: AsyncSequence> AsyncSequence for Ordered<S> {
    type Item = S::Item;
    type Cursor = OrderedCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(OrderedCursor {
            upstream: Upstream::new(self.source.open()?),
            levels: self.levels.clone(),
            sorted: None,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct OrderedCursor<C: AsyncCursor> {
    upstream: Upstream<C>,
    levels: Vec<SortLevel<C::Item>>,
    sorted: Option<std::vec::IntoIter<C::Item>>,
}

impl<C: AsyncCursor> AsyncCursor for OrderedCursor<C> {
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        if self.sorted.is_none() {
            let mut items = self.upstream.drain().await?;
            stable_sort(&mut items, &self.levels)?;
            metrics::emit_materialized("async_order_by", items.len());
            self.sorted = Some(items.into_iter());
        }
        Ok(self.sorted.as_mut().and_then(Iterator::next))
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_order_by");
        self.sorted = None;
        self.upstream.close()
    }
}

#[cfg(test)]
mod tests {
    use iterq_core::Error;

    use crate::ext::AsyncSequenceExt;
    use crate::source::from_vec;
    use crate::testing::{count, log, Tracked};

    #[tokio::test]
    async fn test_open_does_not_drain() {
        let events = log();
        let ordered = Tracked::new("src", vec![3, 1, 2], &events).order_by(|n| *n);
        let mut iter = ordered.iter().unwrap();
        assert_eq!(*events.borrow(), vec!["src:open"]);
        assert_eq!(iter.next().await.unwrap().unwrap(), 1);
        assert_eq!(count(&events, "src:pull"), 4);
        drop(iter);
        assert_eq!(count(&events, "src:close"), 0);
    }

    #[tokio::test]
    async fn test_then_with_breaks_ties() {
        let words = vec!["bb", "a", "cc", "d", "aa"];
        let ordered = from_vec(words)
            .order_by_descending(|w| w.len())
            .then_with(|a, b| a.cmp(b));
        assert_eq!(
            ordered.to_vec().await.unwrap(),
            vec!["aa", "bb", "cc", "a", "d"]
        );
    }

    #[tokio::test]
    async fn test_drain_error_closes_source() {
        let events = log();
        let ordered = Tracked::new("src", vec![3, 1, 2], &events)
            .failing_at(2)
            .order_by(|n| *n);
        let err = ordered.to_vec().await.unwrap_err();
        assert!(matches!(err, Error::Source(ref m) if m == "src failed at 2"));
        assert_eq!(count(&events, "src:close"), 1);
    }
}
