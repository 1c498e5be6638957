//! Sequence sources: the synchronous half of the iteration protocol adapter.
//!
//! Restartable sources open a fresh cursor per pass. One-shot sources hand out
//! their single cursor once and fail with `Error::Consumed` afterwards.

use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;

use iterq_core::{Error, Result};

use crate::traits::{Cursor, Sequence};

/// Array-like source. Restartable; clones each element per pass.
#[derive(Debug)]
pub struct ArraySource<T> {
    items: Arc<[T]>,
}

impl<T> ArraySource<T> {
    pub fn new(items: impl Into<Arc<[T]>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> Clone for ArraySource<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> From<Vec<T>> for ArraySource<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: Clone> From<&[T]> for ArraySource<T> {
    fn from(items: &[T]) -> Self {
        Self::new(items)
    }
}

impl<T: Clone> Sequence for ArraySource<T> {
    type Item = T;
    type Cursor = ArrayCursor<T>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(ArrayCursor::new(Arc::clone(&self.items)))
    }
}

pub struct ArrayCursor<T> {
    items: Arc<[T]>,
    pos: usize,
}

impl<T> ArrayCursor<T> {
    pub fn new(items: Arc<[T]>) -> Self {
        Self { items, pos: 0 }
    }
}

impl<T: Clone> Cursor for ArrayCursor<T> {
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>> {
        let item = self.items.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        Ok(item)
    }
}

/// One-shot source over an iterator.
pub struct IterSource<I> {
    iter: Cell<Option<I>>,
}

impl<I: Iterator> IterSource<I> {
    pub fn new(iter: I) -> Self {
        Self {
            iter: Cell::new(Some(iter)),
        }
    }
}

impl<I: Iterator> Sequence for IterSource<I> {
    type Item = I::Item;
    type Cursor = IterCursor<I>;

    fn open(&self) -> Result<Self::Cursor> {
        self.iter
            .take()
            .map(|iter| IterCursor { iter: Some(iter) })
            .ok_or(Error::Consumed)
    }
}

pub struct IterCursor<I> {
    iter: Option<I>,
}

impl<I: Iterator> Cursor for IterCursor<I> {
    type Item = I::Item;

    fn pull(&mut self) -> Result<Option<I::Item>> {
        Ok(self.iter.as_mut().and_then(Iterator::next))
    }

    fn close(&mut self) -> Result<()> {
        self.iter = None;
        Ok(())
    }
}

/// Restartable source: calls the factory for a fresh iterable per pass.
pub struct FnSource<F> {
    factory: F,
}

impl<F, I> Sequence for FnSource<F>
where
    F: Fn() -> I,
    I: IntoIterator,
{
    type Item = I::Item;
    type Cursor = IterCursor<I::IntoIter>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(IterCursor {
            iter: Some((self.factory)().into_iter()),
        })
    }
}

/// One-shot source over a caller-supplied cursor carrying its own close.
pub struct CursorSource<C> {
    cursor: Cell<Option<C>>,
}

impl<C: Cursor> Sequence for CursorSource<C> {
    type Item = C::Item;
    type Cursor = C;

    fn open(&self) -> Result<Self::Cursor> {
        self.cursor.take().ok_or(Error::Consumed)
    }
}

pub struct Empty<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Sequence for Empty<T> {
    type Item = T;
    type Cursor = EmptyCursor<T>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(EmptyCursor {
            _marker: PhantomData,
        })
    }
}

pub struct EmptyCursor<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Cursor for EmptyCursor<T> {
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>> {
        Ok(None)
    }
}

/// `value` repeated `count` times, or forever.
pub struct Repeat<T> {
    value: T,
    count: Option<usize>,
}

impl<T: Clone> Sequence for Repeat<T> {
    type Item = T;
    type Cursor = RepeatCursor<T>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(RepeatCursor {
            value: self.value.clone(),
            remaining: self.count,
        })
    }
}

pub struct RepeatCursor<T> {
    value: T,
    remaining: Option<usize>,
}

impl<T: Clone> Cursor for RepeatCursor<T> {
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>> {
        match self.remaining.as_mut() {
            Some(0) => Ok(None),
            Some(n) => {
                *n -= 1;
                Ok(Some(self.value.clone()))
            }
            None => Ok(Some(self.value.clone())),
        }
    }
}

/// `count` consecutive integers from `start`.
pub struct Range {
    start: i64,
    count: usize,
}

impl Sequence for Range {
    type Item = i64;
    type Cursor = RangeCursor;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(RangeCursor {
            next: self.start,
            remaining: self.count,
        })
    }
}

pub struct RangeCursor {
    next: i64,
    remaining: usize,
}

impl Cursor for RangeCursor {
    type Item = i64;

    fn pull(&mut self) -> Result<Option<i64>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        let value = self.next;
        self.next = self.next.wrapping_add(1);
        Ok(Some(value))
    }
}

/// `count` elements produced by `f(index)`.
pub struct Generate<F> {
    count: usize,
    f: Arc<F>,
}

impl<T, F: Fn(usize) -> T> Sequence for Generate<F> {
    type Item = T;
    type Cursor = GenerateCursor<F>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(GenerateCursor {
            index: 0,
            count: self.count,
            f: Arc::clone(&self.f),
        })
    }
}

pub struct GenerateCursor<F> {
    index: usize,
    count: usize,
    f: Arc<F>,
}

impl<T, F: Fn(usize) -> T> Cursor for GenerateCursor<F> {
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>> {
        if self.index >= self.count {
            return Ok(None);
        }
        let value = (self.f)(self.index);
        self.index += 1;
        Ok(Some(value))
    }
}

pub fn from_vec<T: Clone>(items: Vec<T>) -> ArraySource<T> {
    ArraySource::from(items)
}

pub fn from_slice<T: Clone>(items: &[T]) -> ArraySource<T> {
    ArraySource::from(items)
}

pub fn from_iter<I: IntoIterator>(iter: I) -> IterSource<I::IntoIter> {
    IterSource::new(iter.into_iter())
}

pub fn from_fn<F, I>(factory: F) -> FnSource<F>
where
    F: Fn() -> I,
    I: IntoIterator,
{
    FnSource { factory }
}

pub fn from_cursor<C: Cursor>(cursor: C) -> CursorSource<C> {
    CursorSource {
        cursor: Cell::new(Some(cursor)),
    }
}

pub fn empty<T>() -> Empty<T> {
    Empty {
        _marker: PhantomData,
    }
}

pub fn once<T: Clone>(value: T) -> ArraySource<T> {
    ArraySource::from(vec![value])
}

pub fn repeat<T: Clone>(value: T, count: Option<usize>) -> Repeat<T> {
    Repeat { value, count }
}

pub fn range(start: i64, count: usize) -> Range {
    Range { start, count }
}

pub fn generate<T, F: Fn(usize) -> T>(count: usize, f: F) -> Generate<F> {
    Generate {
        count,
        f: Arc::new(f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Iter;

    fn collect<S: Sequence>(seq: &S) -> Result<Vec<S::Item>> {
        Iter::new(seq.open()?).collect()
    }

    #[test]
    fn test_array_source_is_restartable() {
        let src = from_vec(vec![1, 2, 3]);
        assert_eq!(collect(&src).unwrap(), vec![1, 2, 3]);
        assert_eq!(collect(&src).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_iter_source_is_one_shot() {
        let src = from_iter(vec![1, 2]);
        assert_eq!(collect(&src).unwrap(), vec![1, 2]);
        assert!(matches!(src.open(), Err(Error::Consumed)));
    }

    #[test]
    fn test_fn_source_restarts_factory() {
        let src = from_fn(|| 0..3);
        assert_eq!(collect(&src).unwrap(), vec![0, 1, 2]);
        assert_eq!(collect(&src).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_statics() {
        assert!(collect(&empty::<i32>()).unwrap().is_empty());
        assert_eq!(collect(&once(7)).unwrap(), vec![7]);
        assert_eq!(collect(&repeat("a", Some(2))).unwrap(), vec!["a", "a"]);
        assert_eq!(collect(&range(-1, 3)).unwrap(), vec![-1, 0, 1]);
        assert_eq!(collect(&generate(3, |i| i * i)).unwrap(), vec![0, 1, 4]);
    }

    #[test]
    fn test_failed_source_cursor_is_closed_by_its_owner() {
        use crate::ext::SequenceExt;
        use std::rc::Rc;

        struct Failing {
            closes: Rc<Cell<usize>>,
        }
        impl Cursor for Failing {
            type Item = i32;
            fn pull(&mut self) -> Result<Option<i32>> {
                Err(Error::source("broken"))
            }
            fn close(&mut self) -> Result<()> {
                self.closes.set(self.closes.get() + 1);
                Ok(())
            }
        }

        let closes = Rc::new(Cell::new(0));
        let src = from_cursor(Failing {
            closes: Rc::clone(&closes),
        });
        let err = (&src).map(|n| n + 1).to_vec().unwrap_err();
        assert!(matches!(err, Error::Source(ref m) if m == "broken"));
        assert_eq!(closes.get(), 1);
        assert!(matches!(src.open(), Err(Error::Consumed)));
    }
}
