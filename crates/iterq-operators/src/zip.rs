//! Pairwise combination of two inputs.

use std::sync::Arc;

use iterq_core::{join_cleanup, Result};

use crate::cursor::Upstream;
use crate::metrics;
use crate::traits::{Cursor, Sequence};

/// Pulls one left, then one right element per step.
///
/// When either side is exhausted the other is closed. Closing the zip closes
/// left first, then right, and attempts both. If the right side fails to
/// open, the already opened left side is closed before the error returns.
pub struct Zip<L, R, F> {
    left: L,
    right: R,
    selector: Arc<F>,
}

impl<L, R, F> Zip<L, R, F> {
    pub fn new(left: L, right: R, selector: F) -> Self {
        Self {
            left,
            right,
            selector: Arc::new(selector),
        }
    }
}

impl<L, R, F, U> Sequence for Zip<L, R, F>
where
    L: Sequence,
    R: Sequence,
    F: Fn(L::Item, R::Item) -> U,
{
    type Item = U;
    type Cursor = ZipCursor<L::Cursor, R::Cursor, F>;

    fn open(&self) -> Result<Self::Cursor> {
        let mut left = Upstream::new(self.left.open()?);
        let right = match self.right.open() {
            Ok(cursor) => Upstream::new(cursor),
            Err(e) => return Err(e.with_cleanup(left.close())),
        };
        Ok(ZipCursor {
            left,
            right,
            selector: Arc::clone(&self.selector),
        })
    }
}

pub struct ZipCursor<A, B, F> {
    left: Upstream<A>,
    right: Upstream<B>,
    selector: Arc<F>,
}

impl<A, B, F, U> Cursor for ZipCursor<A, B, F>
where
    A: Cursor,
    B: Cursor,
    F: Fn(A::Item, B::Item) -> U,
{
    type Item = U;

    fn pull(&mut self) -> Result<Option<U>> {
        let Some(l) = self.left.pull()? else {
            self.right.close()?;
            return Ok(None);
        };
        let Some(r) = self.right.pull()? else {
            self.left.close()?;
            return Ok(None);
        };
        Ok(Some((self.selector)(l, r)))
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("zip");
        join_cleanup(self.left.close(), self.right.close())
    }
}

pub fn pair<A, B>(a: A, b: B) -> (A, B) {
    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Iter;
    use crate::source::{from_vec, repeat};

    #[test]
    fn test_zip_stops_at_shorter_side() {
        let seq = Zip::new(from_vec(vec![1, 2, 3]), from_vec(vec!["a", "b"]), pair);
        let out: Result<Vec<_>> = Iter::new(seq.open().unwrap()).collect();
        assert_eq!(out.unwrap(), vec![(1, "a"), (2, "b")]);
    }

    #[test]
    fn test_zip_with_selector_over_infinite_right() {
        let seq = Zip::new(from_vec(vec![1, 2]), repeat(10, None), |a: i32, b: i32| a + b);
        let out: Result<Vec<_>> = Iter::new(seq.open().unwrap()).collect();
        assert_eq!(out.unwrap(), vec![11, 12]);
    }

    #[test]
    fn test_left_closed_when_right_fails_to_open() {
        use crate::source::{from_cursor, from_iter};
        use iterq_core::Error;
        use std::cell::Cell;
        use std::rc::Rc;

        struct Handle {
            closes: Rc<Cell<usize>>,
        }
        impl Cursor for Handle {
            type Item = i32;
            fn pull(&mut self) -> Result<Option<i32>> {
                Ok(Some(1))
            }
            fn close(&mut self) -> Result<()> {
                self.closes.set(self.closes.get() + 1);
                Ok(())
            }
        }

        let closes = Rc::new(Cell::new(0));
        let left = from_cursor(Handle {
            closes: Rc::clone(&closes),
        });
        let right = from_iter(vec![2]);
        drop(right.open().unwrap());

        let seq = Zip::new(&left, &right, pair);
        assert!(matches!(seq.open().err(), Some(Error::Consumed)));
        assert_eq!(closes.get(), 1);
    }
}
