//! Cursor ownership helpers for async chains.
//!
//! Unlike the sync [`Upstream`](iterq_operators::cursor::Upstream), the async
//! guard also closes on drop: a consumer future dropped mid-await never runs
//! its explicit cleanup, so the guard has to.

use std::sync::Arc;

use futures::stream::{self, Stream};
use iterq_core::Result;
use iterq_operators::metrics;

use crate::traits::{AsyncCursor, AsyncSequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Exhausted,
    Closed,
}

pub struct Upstream<C: AsyncCursor> {
    cursor: C,
    state: State,
}

impl<C: AsyncCursor> Upstream<C> {
    pub fn new(cursor: C) -> Self {
        Self {
            cursor,
            state: State::Open,
        }
    }

    pub async fn pull(&mut self) -> Result<Option<C::Item>> {
        if self.state != State::Open {
            return Ok(None);
        }
        let next = self.cursor.pull().await?;
        if next.is_none() {
            self.state = State::Exhausted;
        }
        Ok(next)
    }

    pub fn close(&mut self) -> Result<()> {
        if self.state != State::Open {
            return Ok(());
        }
        self.state = State::Closed;
        self.cursor.close()
    }

    pub fn is_open(&self) -> bool {
        self.state == State::Open
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    pub async fn drain(&mut self) -> Result<Vec<C::Item>> {
        let mut out = Vec::new();
        while let Some(item) = self.pull().await? {
            out.push(item);
        }
        Ok(out)
    }
}

impl<C: AsyncCursor> Drop for Upstream<C> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            metrics::warn_cleanup("async upstream", &e);
        }
    }
}

/// Close `upstream` after a terminal body finished, attaching a cleanup
/// failure to the body's error instead of replacing it.
pub fn settle<C: AsyncCursor, R>(upstream: &mut Upstream<C>, result: Result<R>) -> Result<R> {
    match result {
        Ok(value) => {
            upstream.close()?;
            Ok(value)
        }
        Err(e) => Err(e.with_cleanup(upstream.close())),
    }
}

/// Second input opened on first use.
pub struct Deferred<S: AsyncSequence> {
    source: Option<Arc<S>>,
    upstream: Option<Upstream<S::Cursor>>,
}

impl<S: AsyncSequence> Deferred<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source: Some(source),
            upstream: None,
        }
    }

    fn active(&mut self) -> Result<Option<&mut Upstream<S::Cursor>>> {
        if self.upstream.is_none() {
            match self.source.take() {
                Some(source) => self.upstream = Some(Upstream::new(source.open()?)),
                None => return Ok(None),
            }
        }
        Ok(self.upstream.as_mut())
    }

    pub async fn pull(&mut self) -> Result<Option<S::Item>> {
        match self.active()? {
            Some(upstream) => upstream.pull().await,
            None => Ok(None),
        }
    }

    pub async fn drain(&mut self) -> Result<Vec<S::Item>> {
        match self.active()? {
            Some(upstream) => upstream.drain().await,
            None => Ok(Vec::new()),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        self.source = None;
        match self.upstream.as_mut() {
            Some(upstream) => upstream.close(),
            None => Ok(()),
        }
    }
}

/// Consumer handle over an async chain.
///
/// An element error closes the chain and is returned once; the iterator is
/// finished afterwards. Dropping the handle closes an unfinished chain.
pub struct AsyncIter<C: AsyncCursor> {
    upstream: Upstream<C>,
}

impl<C: AsyncCursor> AsyncIter<C> {
    pub fn new(cursor: C) -> Self {
        Self {
            upstream: Upstream::new(cursor),
        }
    }

    pub async fn next(&mut self) -> Option<Result<C::Item>> {
        match self.upstream.pull().await {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => Some(Err(e.with_cleanup(self.upstream.close()))),
        }
    }

    pub fn close(mut self) -> Result<()> {
        self.upstream.close()
    }

    /// Adapt into a `futures` stream of results.
    pub fn into_stream(self) -> impl Stream<Item = Result<C::Item>> {
        stream::unfold(self, |mut it| async move {
            let next = it.next().await?;
            Some((next, it))
        })
    }
}
