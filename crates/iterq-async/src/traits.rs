//! Async half of the cursor protocol.
//!
//! `pull` suspends; `close` stays synchronous so that dropping a consumer,
//! even mid-await, can still release every cursor in the chain.

use std::sync::Arc;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;

#[allow(async_fn_in_trait)]
pub trait AsyncCursor {
    type Item;

    async fn pull(&mut self) -> Result<Option<Self::Item>>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

pub trait AsyncSequence {
    type Item;
    type Cursor: AsyncCursor<Item = Self::Item>;

    /// Cheap: never pulls or awaits anything.
    fn open(&self) -> Result<Self::Cursor>;

    fn hierarchy(&self) -> Option<Hierarchy<Self::Item>> {
        None
    }
}

impl<S: AsyncSequence + ?Sized> AsyncSequence for &S {
    type Item = S::Item;
    type Cursor = S::Cursor;

    fn open(&self) -> Result<Self::Cursor> {
        (**self).open()
    }

    fn hierarchy(&self) -> Option<Hierarchy<Self::Item>> {
        (**self).hierarchy()
    }
}

impl<S: AsyncSequence + ?Sized> AsyncSequence for Arc<S> {
    type Item = S::Item;
    type Cursor = S::Cursor;

    fn open(&self) -> Result<Self::Cursor> {
        (**self).open()
    }

    fn hierarchy(&self) -> Option<Hierarchy<Self::Item>> {
        (**self).hierarchy()
    }
}
