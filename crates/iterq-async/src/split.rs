//! Async `break_when` / `span`.
//!
//! The prefix is materialized (it is a lifted array); the remainder is a
//! one-shot sequence holding the live upstream and the peeked element.

use std::cell::Cell;
use std::future::{ready, Future};

use iterq_core::hierarchy::Hierarchy;
use iterq_core::{Error, Result};
use iterq_operators::callback::Predicate;
use iterq_operators::flow::Flow;
use iterq_operators::metrics;
use iterq_operators::source::ArraySource;

use crate::cursor::Upstream;
use crate::source::{lift, Lift};
use crate::traits::{AsyncCursor, AsyncSequence};

pub type Prefix<T> = Lift<Flow<ArraySource<T>>>;

/// Dropping a remainder that was never opened closes the held cursor through
/// the upstream guard.
pub struct Remainder<C: AsyncCursor> {
    state: Cell<Option<(Option<C::Item>, Upstream<C>)>>,
    hierarchy: Option<Hierarchy<C::Item>>,
}

impl<C: AsyncCursor> AsyncSequence for Remainder<C> {
    type Item = C::Item;
    type Cursor = RemainderCursor<C>;

    fn open(&self) -> Result<Self::Cursor> {
        let (peeked, upstream) = self.state.take().ok_or(Error::Consumed)?;
        Ok(RemainderCursor { peeked, upstream })
    }

    fn hierarchy(&self) -> Option<Hierarchy<C::Item>> {
        self.hierarchy.clone()
    }
}

pub struct RemainderCursor<C: AsyncCursor> {
    peeked: Option<C::Item>,
    upstream: Upstream<C>,
}

impl<C: AsyncCursor> AsyncCursor for RemainderCursor<C> {
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        if let Some(item) = self.peeked.take() {
            return Ok(Some(item));
        }
        self.upstream.pull().await
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("async_remainder");
        self.peeked = None;
        self.upstream.close()
    }
}

async fn split<S, F, Fut>(
    source: &S,
    mut test: F,
    stop_on: bool,
) -> Result<(Prefix<S::Item>, Remainder<S::Cursor>)>
where
    S: AsyncSequence + ?Sized,
    S::Item: Clone,
    F: FnMut(&S::Item, usize) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let hierarchy = source.hierarchy();
    let mut upstream = Upstream::new(source.open()?);
    let mut prefix = Vec::new();
    let mut peeked = None;
    let mut index = 0;

    loop {
        let item = match upstream.pull().await {
            Ok(Some(item)) => item,
            Ok(None) => break,
            Err(e) => return Err(e.with_cleanup(upstream.close())),
        };
        match test(&item, index).await {
            Ok(hit) if hit == stop_on => {
                peeked = Some(item);
                break;
            }
            Ok(_) => prefix.push(item),
            Err(e) => return Err(e.with_cleanup(upstream.close())),
        }
        index += 1;
    }

    let prefix = lift(Flow::new(ArraySource::from(prefix), hierarchy.clone()));
    let remainder = Remainder {
        state: Cell::new(Some((peeked, upstream))),
        hierarchy,
    };
    Ok((prefix, remainder))
}

/// Prefix: the leading run of elements NOT matching `predicate`.
pub async fn break_when<S, P>(
    source: &S,
    predicate: P,
) -> Result<(Prefix<S::Item>, Remainder<S::Cursor>)>
where
    S: AsyncSequence + ?Sized,
    S::Item: Clone,
    P: Predicate<S::Item>,
{
    split(source, |item, index| ready(predicate.test(item, index)), true).await
}

/// Prefix: the leading run of elements matching `predicate`.
pub async fn span<S, P>(source: &S, predicate: P) -> Result<(Prefix<S::Item>, Remainder<S::Cursor>)>
where
    S: AsyncSequence + ?Sized,
    S::Item: Clone,
    P: Predicate<S::Item>,
{
    split(source, |item, index| ready(predicate.test(item, index)), false).await
}

/// [`break_when`] with an awaited predicate. Each answer is awaited before
/// the next element is pulled.
pub async fn break_when_async<S, F, Fut>(
    source: &S,
    predicate: F,
) -> Result<(Prefix<S::Item>, Remainder<S::Cursor>)>
where
    S: AsyncSequence + ?Sized,
    S::Item: Clone,
    F: Fn(&S::Item, usize) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    split(source, predicate, true).await
}

/// [`span`] with an awaited predicate.
pub async fn span_async<S, F, Fut>(
    source: &S,
    predicate: F,
) -> Result<(Prefix<S::Item>, Remainder<S::Cursor>)>
where
    S: AsyncSequence + ?Sized,
    S::Item: Clone,
    F: Fn(&S::Item, usize) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    split(source, predicate, false).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ext::AsyncSequenceExt;
    use crate::source::from_vec;
    use iterq_core::hierarchy::hierarchy_fn;
    use iterq_operators::callback::TryPred;

    use crate::testing::{count, log, Tracked};

    #[tokio::test]
    async fn test_break_when_async_awaits_each_answer() {
        let seq = from_vec(vec![1, 2, 3, 10, 4]);
        let (prefix, rest) = break_when_async(&seq, |n, _| {
            let n = *n;
            async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, Error>(n >= 10)
            }
        })
        .await
        .unwrap();
        assert_eq!(prefix.to_vec().await.unwrap(), vec![1, 2, 3]);
        assert_eq!(rest.to_vec().await.unwrap(), vec![10, 4]);
    }

    #[tokio::test]
    async fn test_span_async_receives_offsets() {
        let seq = from_vec(vec!['a', 'b', 'c', 'd']);
        let (prefix, rest) = span_async(&seq, |_, index| async move { Ok::<_, Error>(index < 2) })
            .await
            .unwrap();
        assert_eq!(prefix.to_vec().await.unwrap(), vec!['a', 'b']);
        assert_eq!(rest.to_vec().await.unwrap(), vec!['c', 'd']);
    }

    #[tokio::test]
    async fn test_unopened_remainder_closes_on_drop() {
        let events = log();
        let source = Tracked::new("src", vec![1, 5, 2], &events);
        let (prefix, rest) = break_when(&source, TryPred(|n: &i32| Ok(*n > 3)))
            .await
            .unwrap();
        assert_eq!(prefix.to_vec().await.unwrap(), vec![1]);
        assert_eq!(count(&events, "src:close"), 0);
        drop(rest);
        assert_eq!(count(&events, "src:close"), 1);
    }

    #[tokio::test]
    async fn test_exhausting_prefix_leaves_nothing_to_close() {
        let events = log();
        let source = Tracked::new("src", vec![1, 2], &events);
        let (prefix, rest) = span_async(&source, |_, _| async { Ok::<_, Error>(true) })
            .await
            .unwrap();
        assert_eq!(prefix.to_vec().await.unwrap(), vec![1, 2]);
        assert!(rest.to_vec().await.unwrap().is_empty());
        assert_eq!(count(&events, "src:close"), 0);
    }

    #[tokio::test]
    async fn test_failed_predicate_closes_source() {
        let events = log();
        let source = Tracked::new("src", vec![1, 2, 3], &events);
        let err = break_when_async(&source, |n, _| {
            let n = *n;
            async move {
                if n == 2 {
                    Err(Error::callback("rejected"))
                } else {
                    Ok::<_, Error>(false)
                }
            }
        })
        .await
        .err()
        .unwrap();
        assert!(matches!(err, Error::Callback(ref m) if m == "rejected"));
        assert_eq!(count(&events, "src:close"), 1);
    }

    #[tokio::test]
    async fn test_both_halves_keep_hierarchy() {
        let h = hierarchy_fn(|_: &i32| None, |_: &i32| vec![]);
        let seq = crate::flow::to_hierarchy(from_vec(vec![1, 2, 3]), h.clone());
        let (prefix, rest) = seq.span(|n| *n < 2).await.unwrap();
        assert!(prefix.hierarchy().unwrap().same_provider(&h));
        assert!(rest.hierarchy().unwrap().same_provider(&h));
    }
}
