//! Two-input async combinators: concat and zip.

use std::sync::Arc;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::{join_cleanup, Result};
use iterq_operators::metrics;

use crate::cursor::{Deferred, Upstream};
use crate::traits::{AsyncCursor, AsyncSequence};

/// Left to exhaustion, then right. Right is opened on first use.
pub struct Concat<L, R> {
    left: L,
    right: Arc<R>,
}

impl<L, R> Concat<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self {
            left,
            right: Arc::new(right),
        }
    }
}

impl<L, R> AsyncSequence for Concat<L, R>
where
    L: AsyncSequence,
    R: AsyncSequence<Item = L::Item>,
{
    type Item = L::Item;
    type Cursor = ConcatCursor<L::Cursor, R>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(ConcatCursor {
            left: Upstream::new(self.left.open()?),
            right: Deferred::new(Arc::clone(&self.right)),
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<L::Item>> {
        self.left.hierarchy()
    }
}

pub struct ConcatCursor<C: AsyncCursor, R: AsyncSequence> {
    left: Upstream<C>,
    right: Deferred<R>,
}

impl<C, R> AsyncCursor for ConcatCursor<C, R>
where
    C: AsyncCursor,
    R: AsyncSequence<Item = C::Item>,
{
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        if let Some(item) = self.left.pull().await? {
            return Ok(Some(item));
        }
        self.right.pull().await
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_concat");
        join_cleanup(self.left.close(), self.right.close())
    }
}

/// One left pull then one right pull per step.
pub struct Zip<L, R, F> {
    left: L,
    right: R,
    selector: Arc<F>,
}

impl<L, R, F> Zip<L, R, F> {
    pub fn new(left: L, right: R, selector: F) -> Self {
        Self {
            left,
            right,
            selector: Arc::new(selector),
        }
    }
}

impl<L, R, F, U> AsyncSequence for Zip<L, R, F>
where
    L: AsyncSequence,
    R: AsyncSequence,
    F: Fn(L::Item, R::Item) -> U,
{
    type Item = U;
    type Cursor = ZipCursor<L::Cursor, R::Cursor, F>;

    fn open(&self) -> Result<Self::Cursor> {
        let left = Upstream::new(self.left.open()?);
        let right = Upstream::new(self.right.open()?);
        Ok(ZipCursor {
            left,
            right,
            selector: Arc::clone(&self.selector),
        })
    }
}

pub struct ZipCursor<A: AsyncCursor, B: AsyncCursor, F> {
    left: Upstream<A>,
    right: Upstream<B>,
    selector: Arc<F>,
}

impl<A, B, F, U> AsyncCursor for ZipCursor<A, B, F>
where
    A: AsyncCursor,
    B: AsyncCursor,
    F: Fn(A::Item, B::Item) -> U,
{
    type Item = U;

    async fn pull(&mut self) -> Result<Option<U>> {
        let Some(a) = self.left.pull().await? else {
            self.right.close()?;
            return Ok(None);
        };
        let Some(b) = self.right.pull().await? else {
            self.left.close()?;
            return Ok(None);
        };
        Ok(Some((self.selector)(a, b)))
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_zip");
        join_cleanup(self.left.close(), self.right.close())
    }
}

#[cfg(test)]
mod tests {
    use iterq_core::Error;

    use crate::ext::AsyncSequenceExt;
    use crate::source::from_stream;
    use crate::testing::{count, log, Tracked};

    #[tokio::test]
    async fn test_concat_opens_right_only_after_left_drains() {
        let events = log();
        let left = Tracked::new("left", vec![1], &events);
        let right = Tracked::new("right", vec![2], &events);
        assert_eq!(left.concat(right).to_vec().await.unwrap(), vec![1, 2]);
        assert_eq!(
            *events.borrow(),
            vec![
                "left:open",
                "left:pull",
                "left:pull",
                "right:open",
                "right:pull",
                "right:pull",
            ]
        );
    }

    #[tokio::test]
    async fn test_concat_stopped_in_left_never_opens_right() {
        let events = log();
        let left = Tracked::new("left", vec![1, 2], &events);
        let right = Tracked::new("right", vec![3], &events);
        assert_eq!(left.concat(right).take(1).to_vec().await.unwrap(), vec![1]);
        assert_eq!(count(&events, "right:open"), 0);
        assert_eq!(count(&events, "left:close"), 1);
    }

    #[tokio::test]
    async fn test_zip_closes_right_when_left_runs_out() {
        let events = log();
        let left = Tracked::new("left", vec![1, 2], &events);
        let right = Tracked::new("right", vec![10, 20, 30], &events);
        let zipped = left.zip_with(right, |a, b| a + b);
        assert_eq!(zipped.to_vec().await.unwrap(), vec![11, 22]);
        assert_eq!(
            *events.borrow(),
            vec![
                "left:open",
                "right:open",
                "left:pull",
                "right:pull",
                "left:pull",
                "right:pull",
                "left:pull",
                "right:close",
            ]
        );
    }

    #[tokio::test]
    async fn test_zip_closes_left_when_right_runs_out() {
        let events = log();
        let left = Tracked::new("left", vec![1, 2, 3], &events);
        let right = Tracked::new("right", vec![10], &events);
        assert_eq!(left.zip(right).count().await.unwrap(), 1);
        assert_eq!(count(&events, "left:close"), 1);
        assert_eq!(count(&events, "right:close"), 0);
    }

    #[tokio::test]
    async fn test_zip_early_stop_closes_both_even_if_left_close_fails() {
        let events = log();
        let left = Tracked::new("left", vec![1, 2], &events).close_fails();
        let right = Tracked::new("right", vec![3, 4], &events);
        let err = left.zip(right).first().await.unwrap_err();
        assert!(matches!(err, Error::Source(ref m) if m == "left close failed"));
        let tail: Vec<_> = events.borrow().iter().rev().take(2).cloned().collect();
        assert_eq!(tail, vec!["right:close", "left:close"]);
    }

    #[tokio::test]
    async fn test_zip_closes_left_when_right_cannot_open() {
        let events = log();
        let right = from_stream(futures::stream::iter(vec![7]));
        assert_eq!(right.to_vec().await.unwrap(), vec![7]);

        let left = Tracked::new("left", vec![1], &events);
        let err = left.zip(&right).to_vec().await.unwrap_err();
        assert!(matches!(err, Error::Consumed));
        assert_eq!(*events.borrow(), vec!["left:open", "left:close"]);
    }
}
