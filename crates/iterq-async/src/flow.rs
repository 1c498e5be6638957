//! Hierarchy attachment for async sequences.
//!
//! Lifted sync sequences forward their own provider; streams and futures
//! have none until one is attached here.

use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;

use crate::traits::AsyncSequence;

/// Iterates like `inner`, reports `hierarchy`.
pub struct Flow<S: AsyncSequence> {
    inner: S,
    hierarchy: Option<Hierarchy<S::Item>>,
}

impl<S: AsyncSequence> Flow<S> {
    pub fn new(inner: S, hierarchy: Option<Hierarchy<S::Item>>) -> Self {
        Self { inner, hierarchy }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AsyncSequence> AsyncSequence for Flow<S> {
    type Item = S::Item;
    type Cursor = S::Cursor;

    fn open(&self) -> Result<Self::Cursor> {
        self.inner.open()
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.hierarchy.clone()
    }
}

/// `new_sequence` tagged with `source`'s hierarchy, or with none.
pub fn flow_hierarchy<S, Src>(new_sequence: S, source: &Src) -> Flow<S>
where
    S: AsyncSequence,
    Src: AsyncSequence<Item = S::Item> + ?Sized,
{
    Flow::new(new_sequence, source.hierarchy())
}

pub fn to_hierarchy<S: AsyncSequence>(sequence: S, hierarchy: Hierarchy<S::Item>) -> Flow<S> {
    Flow::new(sequence, Some(hierarchy))
}
