//! Small shape-preserving adapters: tap, default_if_empty, reverse.

use std::sync::Arc;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;

use crate::cursor::Upstream;
use crate::metrics;
use crate::traits::{Cursor, Sequence};

/// Runs a side effect on each element as it passes.
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

impl<S, F> Sequence for Tap<S, F>
where
    S: Sequence,
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

pub struct TapCursor<C, F> {
    upstream: Upstream<C>,
    callback: Arc<F>,
}

impl<C, F> Cursor for TapCursor<C, F>
where
    C: Cursor,
    F: Fn(&C::Item),
{
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        let next = self.upstream.pull()?;
        if let Some(item) = next.as_ref() {
            (self.callback)(item);
        }
        Ok(next)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("tap");
        self.upstream.close()
    }
}

/// Yields `default` once when the upstream turns out to be empty.
pub struct DefaultIfEmpty<S: Sequence> {
    source: S,
    default: S::Item,
}

impl<S: Sequence> DefaultIfEmpty<S> {
    pub fn new(source: S, default: S::Item) -> Self {
        Self { source, default }
    }
}

impl<S> Sequence for DefaultIfEmpty<S>
where
    S: Sequence,
    S::Item: Clone,
{
    type Item = S::Item;
    type Cursor = DefaultIfEmptyCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(DefaultIfEmptyCursor {
            upstream: Upstream::new(self.source.open()?),
            default: Some(self.default.clone()),
            seen_any: false,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct DefaultIfEmptyCursor<C: Cursor> {
    upstream: Upstream<C>,
    default: Option<C::Item>,
    seen_any: bool,
}

impl<C: Cursor> Cursor for DefaultIfEmptyCursor<C> {
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        match self.upstream.pull()? {
            Some(item) => {
                self.seen_any = true;
                Ok(Some(item))
            }
            None if !self.seen_any => Ok(self.default.take()),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("default_if_empty");
        self.upstream.close()
    }
}

/// Upstream in reverse order. Drains on the first pull.
pub struct Reverse<S> {
    source: S,
}

impl<S> Reverse<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: Sequence> Sequence for Reverse<S> {
    type Item = S::Item;
    type Cursor = ReverseCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(ReverseCursor {
            upstream: Upstream::new(self.source.open()?),
            buffer: None,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct ReverseCursor<C: Cursor> {
    upstream: Upstream<C>,
    buffer: Option<Vec<C::Item>>,
}

impl<C: Cursor> Cursor for ReverseCursor<C> {
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        if self.buffer.is_none() {
            let items = self.upstream.drain()?;
            metrics::emit_materialized("reverse", items.len());
            self.buffer = Some(items);
        }
        // Popping from the back of the drained buffer yields reverse order.
        Ok(self.buffer.as_mut().and_then(Vec::pop))
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("reverse");
        self.buffer = None;
        self.upstream.close()
    }
}
