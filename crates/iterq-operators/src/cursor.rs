//! Cursor ownership helpers.
//!
//! [`Upstream`] is the close-once guard every operator wraps around the cursor
//! it reads from. [`Deferred`] does the same for a second input that must not
//! be opened before it is needed. [`Iter`] and [`drive`] are the two ways a
//! consumer drives a chain; both close it on every non-exhausted exit.

use std::sync::Arc;

use iterq_core::Result;

use crate::metrics;
use crate::traits::{Cursor, Sequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Exhausted,
    Closed,
}

/// Close-once wrapper around an upstream cursor.
///
/// - `pull` after exhaustion or close yields `Ok(None)` without touching the
///   inner cursor.
/// - `close` reaches the inner cursor only while it is still open.
/// - An error from `pull` leaves the cursor open so the owner's cleanup still
///   reaches it.
pub struct Upstream<C> {
    cursor: C,
    state: State,
}

impl<C: Cursor> Upstream<C> {
    pub fn new(cursor: C) -> Self {
        Self {
            cursor,
            state: State::Open,
        }
    }

    pub fn pull(&mut self) -> Result<Option<C::Item>> {
        if self.state != State::Open {
            return Ok(None);
        }
        let next = self.cursor.pull()?;
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

    /// Pull everything that is left.
    pub fn drain(&mut self) -> Result<Vec<C::Item>> {
        let mut out = Vec::new();
        while let Some(item) = self.pull()? {
            out.push(item);
        }
        Ok(out)
    }
}

/// A second input opened on first use.
pub struct Deferred<S: Sequence> {
    source: Option<Arc<S>>,
    upstream: Option<Upstream<S::Cursor>>,
}

impl<S: Sequence> Deferred<S> {
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

    pub fn pull(&mut self) -> Result<Option<S::Item>> {
        match self.active()? {
            Some(upstream) => upstream.pull(),
            None => Ok(None),
        }
    }

    pub fn drain(&mut self) -> Result<Vec<S::Item>> {
        match self.active()? {
            Some(upstream) => upstream.drain(),
            None => Ok(Vec::new()),
        }
    }

    /// Close if opened; an input never opened is simply released.
    pub fn close(&mut self) -> Result<()> {
        self.source = None;
        match self.upstream.as_mut() {
            Some(upstream) => upstream.close(),
            None => Ok(()),
        }
    }
}

/// Consumer-side iterator over a cursor chain.
///
/// Yields `Result<T>`. On the first error the chain is closed and iteration
/// ends. Dropping an unfinished `Iter` closes the chain; a failure there is
/// logged since `Drop` cannot return it. Use [`Iter::close`] to observe it.
pub struct Iter<C: Cursor> {
    cursor: C,
    finished: bool,
}

impl<C: Cursor> Iter<C> {
    pub fn new(cursor: C) -> Self {
        Self {
            cursor,
            finished: false,
        }
    }

    /// Stop early and report the cleanup outcome.
    pub fn close(mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.cursor.close()
    }
}

impl<C: Cursor> Iterator for Iter<C> {
    type Item = Result<C::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.cursor.pull() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                let cleanup = self.cursor.close();
                Some(Err(e.with_cleanup(cleanup)))
            }
        }
    }
}

impl<C: Cursor> Drop for Iter<C> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(e) = self.cursor.close() {
            metrics::warn_cleanup("iter", &e);
        }
    }
}

/// Run `body` against a fresh cursor, then close it unless exhausted.
///
/// On error the chain is closed and a failed cleanup is attached to the
/// error rather than replacing it.
pub fn drive<C, R, F>(cursor: C, body: F) -> Result<R>
where
    C: Cursor,
    F: FnOnce(&mut Upstream<C>) -> Result<R>,
{
    let mut upstream = Upstream::new(cursor);
    match body(&mut upstream) {
        Ok(value) => {
            upstream.close()?;
            Ok(value)
        }
        Err(e) => Err(e.with_cleanup(upstream.close())),
    }
}
