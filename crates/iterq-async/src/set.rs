//! Async distinct and union over an [`Equaler`].

use std::sync::Arc;

use iterq_core::collections::EqualitySet;
use iterq_core::equality::Equaler;
use iterq_core::hierarchy::Hierarchy;
use iterq_core::{join_cleanup, Result};
use iterq_operators::metrics;

use crate::cursor::{Deferred, Upstream};
use crate::traits::{AsyncCursor, AsyncSequence};

pub struct Distinct<S, E> {
    source: S,
    equaler: E,
}

impl<S, E> Distinct<S, E> {
    pub fn new(source: S, equaler: E) -> Self {
        Self { source, equaler }
    }
}

impl<S, E> AsyncSequence for Distinct<S, E>
where
    S: AsyncSequence,
    S::Item: Clone,
    E: Equaler<S::Item> + Clone,
{
    type Item = S::Item;
    type Cursor = DistinctCursor<S::Cursor, E>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(DistinctCursor {
            upstream: Upstream::new(self.source.open()?),
            seen: EqualitySet::with_equaler(self.equaler.clone()),
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct DistinctCursor<C: AsyncCursor, E> {
    upstream: Upstream<C>,
    seen: EqualitySet<C::Item, E>,
}

impl<C, E> AsyncCursor for DistinctCursor<C, E>
where
    C: AsyncCursor,
    C::Item: Clone,
    E: Equaler<C::Item>,
{
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        while let Some(item) = self.upstream.pull().await? {
            if self.seen.insert(item.clone()) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_distinct");
        self.upstream.close()
    }
}

/// Distinct elements of left, then of right, in that order.
pub struct Union<L, R, E> {
    left: L,
    right: Arc<R>,
    equaler: E,
}

impl<L, R, E> Union<L, R, E> {
    pub fn new(left: L, right: R, equaler: E) -> Self {
        Self {
            left,
            right: Arc::new(right),
            equaler,
        }
    }
}

impl<L, R, E> AsyncSequence for Union<L, R, E>
where
    L: AsyncSequence,
    L::Item: Clone,
    R: AsyncSequence<Item = L::Item>,
    E: Equaler<L::Item> + Clone,
{
    type Item = L::Item;
    type Cursor = UnionCursor<L::Cursor, R, E>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(UnionCursor {
            left: Upstream::new(self.left.open()?),
            right: Deferred::new(Arc::clone(&self.right)),
            seen: EqualitySet::with_equaler(self.equaler.clone()),
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<L::Item>> {
        self.left.hierarchy()
    }
}

pub struct UnionCursor<C: AsyncCursor, R: AsyncSequence, E> {
    left: Upstream<C>,
    right: Deferred<R>,
    seen: EqualitySet<C::Item, E>,
}

impl<C, R, E> AsyncCursor for UnionCursor<C, R, E>
where
    C: AsyncCursor,
    C::Item: Clone,
    R: AsyncSequence<Item = C::Item>,
    E: Equaler<C::Item>,
{
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        while let Some(item) = self.left.pull().await? {
            if self.seen.insert(item.clone()) {
                return Ok(Some(item));
            }
        }
        while let Some(item) = self.right.pull().await? {
            if self.seen.insert(item.clone()) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_union");
        join_cleanup(self.left.close(), self.right.close())
    }
}
