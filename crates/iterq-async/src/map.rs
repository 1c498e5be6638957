//! Async projections. Awaited selectors run strictly one element at a time,
//! so results keep source order.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use iterq_core::Result;
use iterq_operators::callback::Selector;
use iterq_operators::metrics;

use crate::cursor::Upstream;
use crate::traits::{AsyncCursor, AsyncSequence};

pub struct Map<S, F, U> {
    source: S,
    selector: Arc<F>,
    _out: PhantomData<fn() -> U>,
}

impl<S, F, U> Map<S, F, U> {
    pub fn new(source: S, selector: F) -> Self {
        Self {
            source,
            selector: Arc::new(selector),
            _out: PhantomData,
        }
    }
}

impl<S, F, U> AsyncSequence for Map<S, F, U>
where
    S: AsyncSequence,
    F: Selector<S::Item, U>,
{
    type Item = U;
    type Cursor = MapCursor<S::Cursor, F, U>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(MapCursor {
            upstream: Upstream::new(self.source.open()?),
            selector: Arc::clone(&self.selector),
            index: 0,
            _out: PhantomData,
        })
    }
}

pub struct MapCursor<C: AsyncCursor, F, U> {
    upstream: Upstream<C>,
    selector: Arc<F>,
    index: usize,
    _out: PhantomData<fn() -> U>,
}

impl<C, F, U> AsyncCursor for MapCursor<C, F, U>
where
    C: AsyncCursor,
    F: Selector<C::Item, U>,
{
    type Item = U;

    async fn pull(&mut self) -> Result<Option<U>> {
        match self.upstream.pull().await? {
            Some(item) => {
                let index = self.index;
                self.index += 1;
                self.selector.select(item, index).map(Some)
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_map");
        self.upstream.close()
    }
}

pub struct MapAsync<S, F> {
    source: S,
    selector: Arc<F>,
}

impl<S, F> MapAsync<S, F> {
    pub fn new(source: S, selector: F) -> Self {
        Self {
            source,
            selector: Arc::new(selector),
        }
    }
}

impl<S, F, Fut, U> AsyncSequence for MapAsync<S, F>
where
    S: AsyncSequence,
    F: Fn(S::Item) -> Fut,
    Fut: Future<Output = Result<U>>,
{
    type Item = U;
    type Cursor = MapAsyncCursor<S::Cursor, F>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(MapAsyncCursor {
            upstream: Upstream::new(self.source.open()?),
            selector: Arc::clone(&self.selector),
        })
    }
}

pub struct MapAsyncCursor<C: AsyncCursor, F> {
    upstream: Upstream<C>,
    selector: Arc<F>,
}

impl<C, F, Fut, U> AsyncCursor for MapAsyncCursor<C, F>
where
    C: AsyncCursor,
    F: Fn(C::Item) -> Fut,
    Fut: Future<Output = Result<U>>,
{
    type Item = U;

    async fn pull(&mut self) -> Result<Option<U>> {
        match self.upstream.pull().await? {
            Some(item) => (self.selector)(item).await.map(Some),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_map");
        self.upstream.close()
    }
}
