//! `break_when` / `span`: split a sequence into an owned prefix and a lazy
//! remainder that resumes exactly where the prefix ended.

use std::cell::Cell;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::{Error, Result};

use crate::callback::Predicate;
use crate::cursor::Upstream;
use crate::flow::Flow;
use crate::metrics;
use crate::source::ArraySource;
use crate::traits::{Cursor, Sequence};

pub type Prefix<T> = Flow<ArraySource<T>>;

/// One-shot continuation of a split source.
///
/// Re-presents the peeked element first. Dropping a remainder that was never
/// opened closes the held cursor.
pub struct Remainder<C: Cursor> {
    state: Cell<Option<(Option<C::Item>, Upstream<C>)>>,
    hierarchy: Option<Hierarchy<C::Item>>,
}

impl<C: Cursor> Sequence for Remainder<C> {
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

impl<C: Cursor> Drop for Remainder<C> {
    fn drop(&mut self) {
        if let Some((_, mut upstream)) = self.state.get_mut().take() {
            if let Err(e) = upstream.close() {
                metrics::warn_cleanup("remainder", &e);
            }
        }
    }
}

pub struct RemainderCursor<C: Cursor> {
    peeked: Option<C::Item>,
    upstream: Upstream<C>,
}

impl<C: Cursor> Cursor for RemainderCursor<C> {
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        if let Some(item) = self.peeked.take() {
            return Ok(Some(item));
        }
        self.upstream.pull()
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("remainder");
        self.peeked = None;
        self.upstream.close()
    }
}

fn split<S, P>(
    source: &S,
    predicate: P,
    stop_on: bool,
) -> Result<(Prefix<S::Item>, Remainder<S::Cursor>)>
where
    S: Sequence + ?Sized,
    S::Item: Clone,
    P: Predicate<S::Item>,
{
    let hierarchy = source.hierarchy();
    let mut upstream = Upstream::new(source.open()?);
    let mut prefix = Vec::new();
    let mut peeked = None;
    let mut index = 0;

    loop {
        let item = match upstream.pull() {
            Ok(Some(item)) => item,
            Ok(None) => break,
            Err(e) => return Err(e.with_cleanup(upstream.close())),
        };
        match predicate.test(&item, index) {
            Ok(hit) if hit == stop_on => {
                peeked = Some(item);
                break;
            }
            Ok(_) => prefix.push(item),
            Err(e) => return Err(e.with_cleanup(upstream.close())),
        }
        index += 1;
    }

    let prefix = Flow::new(ArraySource::from(prefix), hierarchy.clone());
    let remainder = Remainder {
        state: Cell::new(Some((peeked, upstream))),
        hierarchy,
    };
    Ok((prefix, remainder))
}

/// Prefix: the leading run of elements NOT matching `predicate`.
pub fn break_when<S, P>(source: &S, predicate: P) -> Result<(Prefix<S::Item>, Remainder<S::Cursor>)>
where
    S: Sequence + ?Sized,
    S::Item: Clone,
    P: Predicate<S::Item>,
{
    split(source, predicate, true)
}

/// Prefix: the leading run of elements matching `predicate`.
pub fn span<S, P>(source: &S, predicate: P) -> Result<(Prefix<S::Item>, Remainder<S::Cursor>)>
where
    S: Sequence + ?Sized,
    S::Item: Clone,
    P: Predicate<S::Item>,
{
    split(source, predicate, false)
}
