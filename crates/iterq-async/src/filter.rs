//! Async filter, with a synchronous or an awaited predicate.

use std::future::Future;
use std::sync::Arc;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;
use iterq_operators::callback::Predicate;
use iterq_operators::metrics;

use crate::cursor::Upstream;
use crate::traits::{AsyncCursor, AsyncSequence};

pub struct Filter<S, P> {
    source: S,
    predicate: Arc<P>,
}

impl<S, P> Filter<S, P> {
    pub fn new(source: S, predicate: P) -> Self {
        Self {
            source,
            predicate: Arc::new(predicate),
        }
    }
}

impl<S, P> AsyncSequence for Filter<S, P>
where
    S: AsyncSequence,
    P: Predicate<S::Item>,
{
    type Item = S::Item;
    type Cursor = FilterCursor<S::Cursor, P>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(FilterCursor {
            upstream: Upstream::new(self.source.open()?),
            predicate: Arc::clone(&self.predicate),
            index: 0,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct FilterCursor<C: AsyncCursor, P> {
    upstream: Upstream<C>,
    predicate: Arc<P>,
    index: usize,
}

impl<C, P> AsyncCursor for FilterCursor<C, P>
where
    C: AsyncCursor,
    P: Predicate<C::Item>,
{
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        while let Some(item) = self.upstream.pull().await? {
            let index = self.index;
            self.index += 1;
            if self.predicate.test(&item, index)? {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_filter");
        self.upstream.close()
    }
}

/// Filter whose predicate is awaited per element, one element at a time.
pub struct FilterAsync<S, F> {
    source: S,
    predicate: Arc<F>,
}

impl<S, F> FilterAsync<S, F> {
    pub fn new(source: S, predicate: F) -> Self {
        Self {
            source,
            predicate: Arc::new(predicate),
        }
    }
}

impl<S, F, Fut> AsyncSequence for FilterAsync<S, F>
where
    S: AsyncSequence,
    F: Fn(&S::Item) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    type Item = S::Item;
    type Cursor = FilterAsyncCursor<S::Cursor, F>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(FilterAsyncCursor {
            upstream: Upstream::new(self.source.open()?),
            predicate: Arc::clone(&self.predicate),
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct FilterAsyncCursor<C: AsyncCursor, F> {
    upstream: Upstream<C>,
    predicate: Arc<F>,
}

impl<C, F, Fut> AsyncCursor for FilterAsyncCursor<C, F>
where
    C: AsyncCursor,
    F: Fn(&C::Item) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        while let Some(item) = self.upstream.pull().await? {
            if (self.predicate)(&item).await? {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_filter");
        self.upstream.close()
    }
}
