//! Async sources: lifted sync sequences, streams, and futures of either.
//!
//! Classification is by constructor. Nothing is awaited until the first pull.

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;

use futures::stream::{Stream, StreamExt};
use iterq_core::hierarchy::Hierarchy;
use iterq_core::{Error, Result};
use iterq_operators::source::ArraySource;
use iterq_operators::traits::{Cursor, Sequence};

use crate::cursor::Upstream;
use crate::traits::{AsyncCursor, AsyncSequence};

/// A sync sequence seen through the async protocol. Restartable when the
/// wrapped sequence is.
#[derive(Clone)]
pub struct Lift<S> {
    inner: S,
}

impl<S: Sequence> AsyncSequence for Lift<S> {
    type Item = S::Item;
    type Cursor = LiftCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(LiftCursor {
            inner: self.inner.open()?,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.inner.hierarchy()
    }
}

pub struct LiftCursor<C> {
    inner: C,
}

impl<C: Cursor> AsyncCursor for LiftCursor<C> {
    type Item = C::Item;

    async fn pull(&mut self) -> Result<Option<C::Item>> {
        self.inner.pull()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

pub fn lift<S: Sequence>(sequence: S) -> Lift<S> {
    Lift { inner: sequence }
}

pub fn from_vec<T: Clone>(items: Vec<T>) -> Lift<ArraySource<T>> {
    lift(ArraySource::from(items))
}

/// One-shot source over a stream of fallible items.
pub struct StreamSource<St> {
    stream: Cell<Option<Pin<Box<St>>>>,
}

impl<St, T> AsyncSequence for StreamSource<St>
where
    St: Stream<Item = Result<T>>,
{
    type Item = T;
    type Cursor = StreamCursor<St>;

    fn open(&self) -> Result<Self::Cursor> {
        self.stream
            .take()
            .map(|stream| StreamCursor { stream })
            .ok_or(Error::Consumed)
    }
}

pub struct StreamCursor<St> {
    stream: Pin<Box<St>>,
}

impl<St, T> AsyncCursor for StreamCursor<St>
where
    St: Stream<Item = Result<T>>,
{
    type Item = T;

    async fn pull(&mut self) -> Result<Option<T>> {
        self.stream.next().await.transpose()
    }
}

type Infallible<T> = fn(T) -> Result<T>;

/// Stream of plain items. One-shot.
pub fn from_stream<St: Stream>(
    stream: St,
) -> StreamSource<futures::stream::Map<St, Infallible<St::Item>>> {
    from_try_stream(stream.map(Ok as Infallible<St::Item>))
}

/// Stream whose items may fail; an `Err` item surfaces from `pull`.
pub fn from_try_stream<St, T>(stream: St) -> StreamSource<St>
where
    St: Stream<Item = Result<T>>,
{
    StreamSource {
        stream: Cell::new(Some(Box::pin(stream))),
    }
}

/// A future resolving to an async sequence, awaited on the first pull.
/// One-shot.
pub struct FutureSource<Fut> {
    future: Cell<Option<Fut>>,
}

pub fn from_future<Fut, S>(future: Fut) -> FutureSource<Fut>
where
    Fut: Future<Output = Result<S>>,
    S: AsyncSequence,
{
    FutureSource {
        future: Cell::new(Some(future)),
    }
}

impl<Fut, S> AsyncSequence for FutureSource<Fut>
where
    Fut: Future<Output = Result<S>>,
    S: AsyncSequence,
{
    type Item = S::Item;
    type Cursor = FutureCursor<Fut, S>;

    fn open(&self) -> Result<Self::Cursor> {
        let future = self.future.take().ok_or(Error::Consumed)?;
        Ok(FutureCursor {
            stage: Stage::Waiting(Box::pin(future)),
        })
    }
}

enum Stage<Fut, C: AsyncCursor> {
    Waiting(Pin<Box<Fut>>),
    Ready(Upstream<C>),
    Done,
}

pub struct FutureCursor<Fut, S: AsyncSequence> {
    stage: Stage<Fut, S::Cursor>,
}

impl<Fut, S> AsyncCursor for FutureCursor<Fut, S>
where
    Fut: Future<Output = Result<S>>,
    S: AsyncSequence,
{
    type Item = S::Item;

    async fn pull(&mut self) -> Result<Option<S::Item>> {
        loop {
            match &mut self.stage {
                Stage::Waiting(future) => {
                    let resolved = future.as_mut().await;
                    self.stage = Stage::Done;
                    let cursor = resolved?.open()?;
                    self.stage = Stage::Ready(Upstream::new(cursor));
                }
                Stage::Ready(upstream) => return upstream.pull().await,
                Stage::Done => return Ok(None),
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.stage, Stage::Done) {
            Stage::Ready(mut upstream) => upstream.close(),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::AsyncIter;
    use futures::stream;

    async fn collect<S: AsyncSequence>(seq: &S) -> Result<Vec<S::Item>> {
        let mut it = AsyncIter::new(seq.open()?);
        let mut out = Vec::new();
        while let Some(item) = it.next().await {
            out.push(item?);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn test_lifted_source_is_restartable() {
        let src = from_vec(vec![1, 2, 3]);
        assert_eq!(collect(&src).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(collect(&src).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stream_source_is_one_shot() {
        let src = from_stream(stream::iter(vec!['a', 'b']));
        assert_eq!(collect(&src).await.unwrap(), vec!['a', 'b']);
        assert!(matches!(src.open(), Err(Error::Consumed)));
    }

    #[tokio::test]
    async fn test_try_stream_error_surfaces() {
        let src = from_try_stream(stream::iter(vec![Ok(1), Err(Error::source("eof"))]));
        assert!(collect(&src).await.is_err());
    }

    #[tokio::test]
    async fn test_future_awaited_on_first_pull() {
        let polled = std::rc::Rc::new(std::cell::Cell::new(false));
        let flag = std::rc::Rc::clone(&polled);
        let src = from_future(async move {
            flag.set(true);
            Ok::<_, iterq_core::Error>(from_vec(vec![5, 6]))
        });
        let cursor = src.open().unwrap();
        assert!(!polled.get());
        let mut it = AsyncIter::new(cursor);
        assert_eq!(it.next().await.unwrap().unwrap(), 5);
        assert!(polled.get());
    }
}
