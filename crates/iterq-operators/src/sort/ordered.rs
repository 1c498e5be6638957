use std::cmp::Ordering;

use iterq_core::compare::{Comparer, Direction, NaturalOrder};
use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;

use super::{stable_sort, SortLevel};
use crate::cursor::Upstream;
use crate::metrics;
use crate::traits::{Cursor, Sequence};

/// Ordered sequence handle. `then_by*` appends a tie-break level without
/// disturbing earlier ones.
pub struct Ordered<S: Sequence> {
    source: S,
    levels: Vec<SortLevel<S::Item>>,
}

impl<S: Sequence> Ordered<S> {
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

    pub fn levels(&self) -> &[SortLevel<S::Item>] {
        &self.levels
    }
}

impl<S> Ordered<S>
where
    S: Sequence,
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

    pub fn then_by_descending_with<K, F, C>(self, key: F, comparer: C) -> Self
    where
        F: Fn(&S::Item) -> K + 'static,
        C: Comparer<K> + 'static,
        K: 'static,
    {
        self.then_by_level(SortLevel::by_key(key, comparer, Direction::Descending))
    }

    /// Tie-break on the elements themselves with a three-way comparer.
    pub fn then_with<F>(self, compare: F) -> Self
    where
        F: Fn(&S::Item, &S::Item) -> Ordering + 'static,
    {
        self.then_by_level(SortLevel::by_compare(compare, Direction::Ascending))
    }
}

impl<S> Sequence for Ordered<S>
where
    S: Sequence,
{
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

pub struct OrderedCursor<C: Cursor> {
    upstream: Upstream<C>,
    levels: Vec<SortLevel<C::Item>>,
    sorted: Option<std::vec::IntoIter<C::Item>>,
}

impl<C: Cursor> Cursor for OrderedCursor<C> {
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        if self.sorted.is_none() {
            let mut items = self.upstream.drain()?;
            stable_sort(&mut items, &self.levels)?;
            metrics::emit_materialized("order_by", items.len());
            self.sorted = Some(items.into_iter());
        }
        Ok(self.sorted.as_mut().and_then(Iterator::next))
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("order_by");
        self.sorted = None;
        self.upstream.close()
    }
}
