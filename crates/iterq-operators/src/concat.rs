//! Concatenation. The left input is drained before the right one is opened.

use std::sync::Arc;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::{join_cleanup, Result};

use crate::cursor::{Deferred, Upstream};
use crate::metrics;
use crate::traits::{Cursor, Sequence};

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

impl<L, R> Sequence for Concat<L, R>
where
    L: Sequence,
    R: Sequence<Item = L::Item>,
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

pub struct ConcatCursor<C, R: Sequence> {
    left: Upstream<C>,
    right: Deferred<R>,
}

impl<C, R> Cursor for ConcatCursor<C, R>
where
    C: Cursor,
    R: Sequence<Item = C::Item>,
{
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        if let Some(item) = self.left.pull()? {
            return Ok(Some(item));
        }
        self.right.pull()
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("concat");
        join_cleanup(self.left.close(), self.right.close())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Iter;
    use crate::source::{from_fn, from_vec};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_concat_left_then_right() {
        let seq = Concat::new(from_vec(vec![1, 2]), from_vec(vec![3]));
        let out: Result<Vec<_>> = Iter::new(seq.open().unwrap()).collect();
        assert_eq!(out.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_right_not_opened_while_left_has_elements() {
        let opened = Rc::new(Cell::new(false));
        let seen = Rc::clone(&opened);
        let seq = Concat::new(
            from_vec(vec![1, 2]),
            from_fn(move || {
                seen.set(true);
                vec![3]
            }),
        );
        let mut it = Iter::new(seq.open().unwrap());
        assert_eq!(it.next().unwrap().unwrap(), 1);
        assert_eq!(it.next().unwrap().unwrap(), 2);
        assert!(!opened.get());
        assert_eq!(it.next().unwrap().unwrap(), 3);
        assert!(opened.get());
    }
}
