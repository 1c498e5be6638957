//! Cursor + sequence traits.
//!
//! A [`Sequence`] is a description of work; [`Sequence::open`] starts one
//! pass and returns a [`Cursor`]. Opening never pulls. Every pass owns exactly
//! one cursor over each upstream it reads.

use std::sync::Arc;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;

/// Canonical pull interface.
///
/// Invariants:
/// - `pull` returning `Ok(None)` means exhausted; an exhausted cursor is never
///   closed by its owner.
/// - `pull` returning `Err` does not finish the cursor: it stays open and its
///   owner closes it exactly once while unwinding the chain.
/// - `close` releases upstream resources early and is called at most once by
///   a well-behaved owner (see [`crate::cursor::Upstream`]).
pub trait Cursor {
    type Item;

    fn pull(&mut self) -> Result<Option<Self::Item>>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<Self::Item>> {
        (**self).pull()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

pub type BoxCursor<T> = Box<dyn Cursor<Item = T>>;

/// Lazy, possibly restartable producer of elements.
pub trait Sequence {
    type Item;
    type Cursor: Cursor<Item = Self::Item>;

    /// Begin a pass. One-shot sequences fail with `Error::Consumed` the
    /// second time.
    fn open(&self) -> Result<Self::Cursor>;

    /// Hierarchy capability carried by this sequence, if any.
    fn hierarchy(&self) -> Option<Hierarchy<Self::Item>> {
        None
    }
}

impl<S: Sequence + ?Sized> Sequence for &S {
    type Item = S::Item;
    type Cursor = S::Cursor;

    fn open(&self) -> Result<Self::Cursor> {
        (**self).open()
    }

    fn hierarchy(&self) -> Option<Hierarchy<Self::Item>> {
        (**self).hierarchy()
    }
}

impl<S: Sequence + ?Sized> Sequence for Arc<S> {
    type Item = S::Item;
    type Cursor = S::Cursor;

    fn open(&self) -> Result<Self::Cursor> {
        (**self).open()
    }

    fn hierarchy(&self) -> Option<Hierarchy<Self::Item>> {
        (**self).hierarchy()
    }
}

/// Object-safe face of [`Sequence`].
pub trait DynSequence {
    type Item;

    fn open_dyn(&self) -> Result<BoxCursor<Self::Item>>;

    fn hierarchy_dyn(&self) -> Option<Hierarchy<Self::Item>>;
}

impl<S> DynSequence for S
where
    S: Sequence,
    S::Cursor: 'static,
{
    type Item = S::Item;

    fn open_dyn(&self) -> Result<BoxCursor<Self::Item>> {
        Ok(Box::new(self.open()?))
    }

    fn hierarchy_dyn(&self) -> Option<Hierarchy<Self::Item>> {
        self.hierarchy()
    }
}

/// Type-erased, cheaply clonable sequence.
pub struct BoxedSequence<T> {
    inner: Arc<dyn DynSequence<Item = T>>,
}

impl<T> BoxedSequence<T> {
    pub fn new<S>(sequence: S) -> Self
    where
        S: Sequence<Item = T> + 'static,
        S::Cursor: 'static,
    {
        Self {
            inner: Arc::new(sequence),
        }
    }
}

impl<T> Clone for BoxedSequence<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Sequence for BoxedSequence<T> {
    type Item = T;
    type Cursor = BoxCursor<T>;

    fn open(&self) -> Result<Self::Cursor> {
        self.inner.open_dyn()
    }

    fn hierarchy(&self) -> Option<Hierarchy<T>> {
        self.inner.hierarchy_dyn()
    }
}

impl<T> std::fmt::Debug for BoxedSequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedSequence").finish_non_exhaustive()
    }
}
