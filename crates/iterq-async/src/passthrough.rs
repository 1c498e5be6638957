use std::sync::Arc;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;
use iterq_operators::metrics;

use crate::cursor::Upstream;
use crate::traits::{AsyncCursor, AsyncSequence};

pub struct Tap<S, F> {
    source: S,
    callback: Arc<F>,
}

impl<S, F> Tap<S, F> {
    pub fn new(source: S, callback: F) -> Self {
        Self {
            source,
            callback: Arc::new(callback),
        }
    }
}

impl<S, F> AsyncSequence for Tap<S, F>
where
    S: AsyncSequence,
    F: Fn(&S::Item),
{
    type Item = S::Item;
    type Cursor = TapCursor<S::Cursor, F>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(TapCursor {
            upstream: Upstream::new(self.source.open()?),
            callback: Arc::clone(&self.callback),
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct TapCursor<C: AsyncCursor, F> {
    upstream: Upstream<C>,
    callback: Arc<F>,
}

impl<C, F> AsyncCursor for TapCursor<C, F>
where
    C: AsyncCursor,
    F: Fn(&C::Item),
{
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        let next = self.upstream.pull().await?;
        if let Some(item) = &next {
            (self.callback)(item);
        }
        Ok(next)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_tap");
        self.upstream.close()
    }
}

pub struct DefaultIfEmpty<S: AsyncSequence> {
    source: S,
    default: S::Item,
}

impl<S: AsyncSequence> DefaultIfEmpty<S> {
    pub fn new(source: S, default: S::Item) -> Self {
        Self { source, default }
    }
}

impl<S> AsyncSequence for DefaultIfEmpty<S>
where
    S: AsyncSequence,
    S::Item: Clone,
{
    type Item = S::Item;
    type Cursor = DefaultIfEmptyCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(DefaultIfEmptyCursor {
            upstream: Upstream::new(self.source.open()?),
            default: Some(self.default.clone()),
            seen: false,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct DefaultIfEmptyCursor<C: AsyncCursor> {
    upstream: Upstream<C>,
    default: Option<C::Item>,
    seen: bool,
}

impl<C: AsyncCursor> AsyncCursor for DefaultIfEmptyCursor<C> {
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        match self.upstream.pull().await? {
            Some(item) => {
                self.seen = true;
                Ok(Some(item))
            }
            None if self.seen => Ok(None),
            None => Ok(self.default.take()),
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_default_if_empty");
        self.upstream.close()
    }
}
