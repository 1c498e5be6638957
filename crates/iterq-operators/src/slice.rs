//! Positional and predicate-bounded slicing.

use std::collections::VecDeque;
use std::sync::Arc;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;

use crate::callback::Predicate;
use crate::cursor::Upstream;
use crate::metrics;
use crate::traits::{Cursor, Sequence};

/// First `count` elements. The upstream is closed on the pull after the
/// bound is reached; a count of zero never opens the upstream.
pub struct Take<S> {
    source: S,
    count: usize,
}

impl<S> Take<S> {
    pub fn new(source: S, count: usize) -> Self {
        Self { source, count }
    }
}

impl<S: Sequence> Sequence for Take<S> {
    type Item = S::Item;
    type Cursor = TakeCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        let upstream = if self.count == 0 {
            None
        } else {
            Some(Upstream::new(self.source.open()?))
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

pub struct TakeCursor<C> {
    upstream: Option<Upstream<C>>,
    remaining: usize,
}

impl<C: Cursor> Cursor for TakeCursor<C> {
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        let Some(upstream) = self.upstream.as_mut() else {
            return Ok(None);
        };
        if self.remaining == 0 {
            upstream.close()?;
            return Ok(None);
        }
        let next = upstream.pull()?;
        if next.is_some() {
            self.remaining -= 1;
        }
        Ok(next)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("take");
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

impl<S: Sequence> Sequence for Skip<S> {
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

pub struct SkipCursor<C> {
    upstream: Upstream<C>,
    to_skip: usize,
}

impl<C: Cursor> Cursor for SkipCursor<C> {
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        while self.to_skip > 0 {
            if self.upstream.pull()?.is_none() {
                self.to_skip = 0;
                return Ok(None);
            }
            self.to_skip -= 1;
        }
        self.upstream.pull()
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("skip");
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

impl<S, P> Sequence for TakeWhile<S, P>
where
    S: Sequence,
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

pub struct TakeWhileCursor<C, P> {
    upstream: Upstream<C>,
    predicate: Arc<P>,
    index: usize,
}

impl<C, P> Cursor for TakeWhileCursor<C, P>
where
    C: Cursor,
    P: Predicate<C::Item>,
{
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        let Some(item) = self.upstream.pull()? else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        if self.predicate.test(&item, index)? {
            Ok(Some(item))
        } else {
            // First failing element ends the run; release the rest.
            self.upstream.close()?;
            Ok(None)
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("take_while");
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

impl<S, P> Sequence for SkipWhile<S, P>
where
    S: Sequence,
    P: Predicate<S::Item>,
{
    type Item = S::Item;
    type Cursor = SkipWhileCursor<S::Cursor, P>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(SkipWhileCursor {
            upstream: Upstream::new(self.source.open()?),
            predicate: Arc::clone(&self.predicate),
            skipping: true,
            index: 0,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct SkipWhileCursor<C, P> {
    upstream: Upstream<C>,
    predicate: Arc<P>,
    skipping: bool,
    index: usize,
}

impl<C, P> Cursor for SkipWhileCursor<C, P>
where
    C: Cursor,
    P: Predicate<C::Item>,
{
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        while self.skipping {
            let Some(item) = self.upstream.pull()? else {
                return Ok(None);
            };
            let index = self.index;
            self.index += 1;
            if !self.predicate.test(&item, index)? {
                self.skipping = false;
                return Ok(Some(item));
            }
        }
        self.upstream.pull()
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("skip_while");
        self.upstream.close()
    }
}

/// Last `count` elements. Drains the upstream on the first pull.
pub struct TakeRight<S> {
    source: S,
    count: usize,
}

impl<S> TakeRight<S> {
    pub fn new(source: S, count: usize) -> Self {
        Self { source, count }
    }
}

impl<S: Sequence> Sequence for TakeRight<S> {
    type Item = S::Item;
    type Cursor = TakeRightCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        let upstream = if self.count == 0 {
            None
        } else {
            Some(Upstream::new(self.source.open()?))
        };
        Ok(TakeRightCursor {
            upstream,
            count: self.count,
            tail: None,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct TakeRightCursor<C: Cursor> {
    upstream: Option<Upstream<C>>,
    count: usize,
    tail: Option<VecDeque<C::Item>>,
}

impl<C: Cursor> Cursor for TakeRightCursor<C> {
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        let Some(upstream) = self.upstream.as_mut() else {
            return Ok(None);
        };
        if self.tail.is_none() {
            let mut tail = VecDeque::with_capacity(self.count.min(1024));
            while let Some(item) = upstream.pull()? {
                if tail.len() == self.count {
                    tail.pop_front();
                }
                tail.push_back(item);
            }
            metrics::emit_materialized("take_right", tail.len());
            self.tail = Some(tail);
        }
        Ok(self.tail.as_mut().and_then(VecDeque::pop_front))
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("take_right");
        self.tail = None;
        match self.upstream.as_mut() {
            Some(upstream) => upstream.close(),
            None => Ok(()),
        }
    }
}

/// All but the last `count` elements, streamed with a `count`-deep lag.
pub struct SkipRight<S> {
    source: S,
    count: usize,
}

impl<S> SkipRight<S> {
    pub fn new(source: S, count: usize) -> Self {
        Self { source, count }
    }
}

impl<S: Sequence> Sequence for SkipRight<S> {
    type Item = S::Item;
    type Cursor = SkipRightCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(SkipRightCursor {
            upstream: Upstream::new(self.source.open()?),
            count: self.count,
            pending: VecDeque::new(),
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct SkipRightCursor<C: Cursor> {
    upstream: Upstream<C>,
    count: usize,
    pending: VecDeque<C::Item>,
}

impl<C: Cursor> Cursor for SkipRightCursor<C> {
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        while let Some(item) = self.upstream.pull()? {
            self.pending.push_back(item);
            if self.pending.len() > self.count {
                return Ok(self.pending.pop_front());
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("skip_right");
        self.pending.clear();
        self.upstream.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::Pred;
    use crate::cursor::Iter;
    use crate::source::{from_fn, from_vec, repeat};
    use std::cell::Cell;
    use std::rc::Rc;

    fn run<S: Sequence>(seq: &S) -> Result<Vec<S::Item>> {
        Iter::new(seq.open()?).collect()
    }

    #[test]
    fn test_take_and_skip() {
        let src = from_vec(vec![1, 2, 3, 4]);
        assert_eq!(run(&Take::new(&src, 2)).unwrap(), vec![1, 2]);
        assert_eq!(run(&Take::new(&src, 10)).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(run(&Skip::new(&src, 3)).unwrap(), vec![4]);
        assert!(run(&Skip::new(&src, 9)).unwrap().is_empty());
    }

    #[test]
    fn test_take_bounds_infinite_source() {
        let seq = Take::new(repeat(1, None), 3);
        assert_eq!(run(&seq).unwrap(), vec![1, 1, 1]);
    }

    #[test]
    fn test_take_zero_never_opens_source() {
        let opened = Rc::new(Cell::new(0));
        let seen = Rc::clone(&opened);
        let src = from_fn(move || {
            seen.set(seen.get() + 1);
            vec![1, 2]
        });
        assert!(run(&Take::new(&src, 0)).unwrap().is_empty());
        assert_eq!(opened.get(), 0);
    }

    #[test]
    fn test_take_while_and_skip_while() {
        let src = from_vec(vec![1, 2, 5, 1, 7]);
        assert_eq!(
            run(&TakeWhile::new(&src, Pred(|x: &i32| *x < 3))).unwrap(),
            vec![1, 2]
        );
        assert_eq!(
            run(&SkipWhile::new(&src, Pred(|x: &i32| *x < 3))).unwrap(),
            vec![5, 1, 7]
        );
    }

    #[test]
    fn test_take_right_and_skip_right() {
        let src = from_vec(vec![1, 2, 3, 4, 5]);
        assert_eq!(run(&TakeRight::new(&src, 2)).unwrap(), vec![4, 5]);
        assert_eq!(run(&TakeRight::new(&src, 0)).unwrap(), Vec::<i32>::new());
        assert_eq!(run(&SkipRight::new(&src, 2)).unwrap(), vec![1, 2, 3]);
        assert_eq!(run(&SkipRight::new(&src, 0)).unwrap(), vec![1, 2, 3, 4, 5]);
    }
}
