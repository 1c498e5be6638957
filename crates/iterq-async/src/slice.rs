//! Async bounds: take, skip, take_while, skip_while.

use std::sync::Arc;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;
use iterq_operators::callback::Predicate;
use iterq_operators::metrics;

use crate::cursor::Upstream;
use crate::traits::{AsyncCursor, AsyncSequence};

pub struct Take<S> {
    source: S,
    count: usize,
}

impl<S> Take<S> {
    pub fn new(source: S, count: usize) -> Self {
        Self { source, count }
    }
}

impl<S: AsyncSequence> AsyncSequence for Take<S> {
    type Item = S::Item;
    type Cursor = TakeCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        // `take(0)` never opens its upstream.
        let upstream = match self.count {
            0 => None,
            _ => Some(Upstream::new(self.source.open()?)),
        };
        Ok(TakeCursor {
            upstream,
            remaining: self.count,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct TakeCursor<C: AsyncCursor> {
    upstream: Option<Upstream<C>>,
    remaining: usize,
}

impl<C: AsyncCursor> AsyncCursor for TakeCursor<C> {
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        let Some(upstream) = self.upstream.as_mut() else {
            return Ok(None);
        };
        if self.remaining == 0 {
            upstream.close()?;
            return Ok(None);
        }
        let next = upstream.pull().await?;
        if next.is_some() {
            self.remaining -= 1;
        }
        Ok(next)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_take");
        match self.upstream.as_mut() {
            Some(upstream) => upstream.close(),
            None => Ok(()),
        }
    }
}

pub struct Skip<S> {
    source: S,
    count: usize,
}

impl<S> Skip<S> {
    pub fn new(source: S, count: usize) -> Self {
        Self { source, count }
    }
}

impl<S: AsyncSequence> AsyncSequence for Skip<S> {
    type Item = S::Item;
    type Cursor = SkipCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(SkipCursor {
            upstream: Upstream::new(self.source.open()?),
            to_skip: self.count,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct SkipCursor<C: AsyncCursor> {
    upstream: Upstream<C>,
    to_skip: usize,
}

impl<C: AsyncCursor> AsyncCursor for SkipCursor<C> {
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        while self.to_skip > 0 {
            if self.upstream.pull().await?.is_none() {
                self.to_skip = 0;
                return Ok(None);
            }
            self.to_skip -= 1;
        }
        self.upstream.pull().await
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_skip");
        self.upstream.close()
    }
}

pub struct TakeWhile<S, P> {
    source: S,
    predicate: Arc<P>,
}

impl<S, P> TakeWhile<S, P> {
    pub fn new(source: S, predicate: P) -> Self {
        Self {
            source,
            predicate: Arc::new(predicate),
        }
    }
}

impl<S, P> AsyncSequence for TakeWhile<S, P>
where
    S: AsyncSequence,
    P: Predicate<S::Item>,
{
    type Item = S::Item;
    type Cursor = TakeWhileCursor<S::Cursor, P>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(TakeWhileCursor {
            upstream: Upstream::new(self.source.open()?),
            predicate: Arc::clone(&self.predicate),
            index: 0,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct TakeWhileCursor<C: AsyncCursor, P> {
    upstream: Upstream<C>,
    predicate: Arc<P>,
    index: usize,
}

impl<C, P> AsyncCursor for TakeWhileCursor<C, P>
where
    C: AsyncCursor,
    P: Predicate<C::Item>,
{
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        let Some(item) = self.upstream.pull().await? else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        if self.predicate.test(&item, index)? {
            Ok(Some(item))
        } else {
            self.upstream.close()?;
            Ok(None)
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_take_while");
        self.upstream.close()
    }
}

pub struct SkipWhile<S, P> {
    source: S,
    predicate: Arc<P>,
}

impl<S, P> SkipWhile<S, P> {
    pub fn new(source: S, predicate: P) -> Self {
        Self {
            source,
            predicate: Arc::new(predicate),
        }
    }
}

impl<S, P> AsyncSequence for SkipWhile<S, P>
where
    S: AsyncSequence,
    P: Predicate<S::Item>,
{
    type Item = S::Item;
    type Cursor = SkipWhileCursor<S::Cursor, P>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(SkipWhileCursor {
            upstream: Upstream::new(self.source.open()?),
            predicate: Arc::clone(&self.predicate),
            index: 0,
            skipping: true,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct SkipWhileCursor<C: AsyncCursor, P> {
    upstream: Upstream<C>,
    predicate: Arc<P>,
    index: usize,
    skipping: bool,
}

impl<C, P> AsyncCursor for SkipWhileCursor<C, P>
where
    C: AsyncCursor,
    P: Predicate<C::Item>,
{
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        while self.skipping {
            let Some(item) = self.upstream.pull().await? else {
                return Ok(None);
            };
            let index = self.index;
            self.index += 1;
            if !self.predicate.test(&item, index)? {
                self.skipping = false;
                return Ok(Some(item));
            }
        }
        self.upstream.pull().await
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_skip_while");
        self.upstream.close()
    }
}

#[cfg(test)]
mod tests {
    use crate::ext::AsyncSequenceExt;
    use crate::testing::{count, log, Tracked};

    #[tokio::test]
    async fn test_take_closes_source_after_bound() {
        let events = log();
        let taken = Tracked::new("src", vec![1, 2, 3, 4], &events).take(2);
        assert_eq!(taken.to_vec().await.unwrap(), vec![1, 2]);
        assert_eq!(
            *events.borrow(),
            vec!["src:open", "src:pull", "src:pull", "src:close"]
        );
    }

    #[tokio::test]
    async fn test_take_zero_never_opens() {
        let events = log();
        let taken = Tracked::new("src", vec![1, 2], &events).take(0);
        assert!(taken.to_vec().await.unwrap().is_empty());
        assert!(events.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_take_while_closes_on_first_miss() {
        let events = log();
        let taken = Tracked::new("src", vec![1, 2, 5, 3], &events).take_while(|n| *n < 3);
        assert_eq!(taken.to_vec().await.unwrap(), vec![1, 2]);
        assert_eq!(count(&events, "src:pull"), 3);
        assert_eq!(count(&events, "src:close"), 1);
    }

    #[tokio::test]
    async fn test_skip_while_runs_to_exhaustion_without_close() {
        let events = log();
        let rest = Tracked::new("src", vec![1, 2, 5, 1], &events).skip_while(|n| *n < 3);
        assert_eq!(rest.to_vec().await.unwrap(), vec![5, 1]);
        assert_eq!(count(&events, "src:close"), 0);
    }

    #[tokio::test]
    async fn test_skip_past_end_is_empty() {
        let events = log();
        let rest = Tracked::new("src", vec![1, 2], &events).skip(5);
        assert!(rest.to_vec().await.unwrap().is_empty());
        assert_eq!(count(&events, "src:close"), 0);
    }

    #[tokio::test]
    async fn test_dropped_iter_closes_skip_chain_once() {
        let events = log();
        let seq = Tracked::new("src", vec![1, 2, 3, 4, 5], &events)
            .skip(1)
            .skip_while(|n| *n < 3);
        let mut iter = seq.iter().unwrap();
        assert_eq!(iter.next().await.unwrap().unwrap(), 3);
        drop(iter);
        assert_eq!(count(&events, "src:close"), 1);
    }
}
