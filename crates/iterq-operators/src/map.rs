//! Shape-changing projections: map, flat_map and scan.

use std::marker::PhantomData;
use std::sync::Arc;

use iterq_core::Result;

use crate::callback::Selector;
use crate::cursor::Upstream;
use crate::metrics;
use crate::traits::{Cursor, Sequence};

pub struct Map<S, F, U> {
    source: S,
    selector: Arc<F>,
    _out: PhantomData<fn() -> U>,
}

impl<S, F, U> Map<S, F, U> {
    pub fn new(source: S, selector: F) -> Self {
        Self {
            source,
            selector: Arc::new(selector),
            _out: PhantomData,
        }
    }
}

impl<S, F, U> Sequence for Map<S, F, U>
where
    S: Sequence,
    F: Selector<S::Item, U>,
{
    type Item = U;
    type Cursor = MapCursor<S::Cursor, F, U>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(MapCursor {
            upstream: Upstream::new(self.source.open()?),
            selector: Arc::clone(&self.selector),
            index: 0,
            _out: PhantomData,
        })
    }
}

pub struct MapCursor<C, F, U> {
    upstream: Upstream<C>,
    selector: Arc<F>,
    index: usize,
    _out: PhantomData<fn() -> U>,
}

impl<C, F, U> Cursor for MapCursor<C, F, U>
where
    C: Cursor,
    F: Selector<C::Item, U>,
{
    type Item = U;

    fn pull(&mut self) -> Result<Option<U>> {
        match self.upstream.pull()? {
            Some(item) => {
                let index = self.index;
                self.index += 1;
                self.selector.select(item, index).map(Some)
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("map");
        self.upstream.close()
    }
}

/// Projects each element to an iterable and flattens the results.
pub struct FlatMap<S, F> {
    source: S,
    selector: Arc<F>,
}

impl<S, F> FlatMap<S, F> {
    pub fn new(source: S, selector: F) -> Self {
        Self {
            source,
            selector: Arc::new(selector),
        }
    }
}

impl<S, F, I> Sequence for FlatMap<S, F>
where
    S: Sequence,
    F: Fn(S::Item) -> I,
    I: IntoIterator,
{
    type Item = I::Item;
    type Cursor = FlatMapCursor<S::Cursor, F, I::IntoIter>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(FlatMapCursor {
            upstream: Upstream::new(self.source.open()?),
            selector: Arc::clone(&self.selector),
            inner: None,
        })
    }
}

pub struct FlatMapCursor<C, F, It> {
    upstream: Upstream<C>,
    selector: Arc<F>,
    inner: Option<It>,
}

impl<C, F, I, It> Cursor for FlatMapCursor<C, F, It>
where
    C: Cursor,
    F: Fn(C::Item) -> I,
    I: IntoIterator<IntoIter = It>,
    It: Iterator<Item = I::Item>,
{
    type Item = It::Item;

    fn pull(&mut self) -> Result<Option<It::Item>> {
        loop {
            if let Some(inner) = self.inner.as_mut() {
                if let Some(item) = inner.next() {
                    return Ok(Some(item));
                }
                self.inner = None;
            }
            match self.upstream.pull()? {
                Some(outer) => self.inner = Some((self.selector)(outer).into_iter()),
                None => return Ok(None),
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("flat_map");
        self.inner = None;
        self.upstream.close()
    }
}

/// Running accumulation: yields every intermediate state after `seed`.
pub struct Scan<S, F, A> {
    source: S,
    seed: A,
    accumulator: Arc<F>,
}

impl<S, F, A> Scan<S, F, A> {
    pub fn new(source: S, seed: A, accumulator: F) -> Self {
        Self {
            source,
            seed,
            accumulator: Arc::new(accumulator),
        }
    }
}

impl<S, F, A> Sequence for Scan<S, F, A>
where
    S: Sequence,
    F: Fn(&A, S::Item) -> A,
    A: Clone,
{
    type Item = A;
    type Cursor = ScanCursor<S::Cursor, F, A>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(ScanCursor {
            upstream: Upstream::new(self.source.open()?),
            state: self.seed.clone(),
            accumulator: Arc::clone(&self.accumulator),
        })
    }
}

pub struct ScanCursor<C, F, A> {
    upstream: Upstream<C>,
    state: A,
    accumulator: Arc<F>,
}

impl<C, F, A> Cursor for ScanCursor<C, F, A>
where
    C: Cursor,
    F: Fn(&A, C::Item) -> A,
    A: Clone,
{
    type Item = A;

    fn pull(&mut self) -> Result<Option<A>> {
        match self.upstream.pull()? {
            Some(item) => {
                self.state = (self.accumulator)(&self.state, item);
                Ok(Some(self.state.clone()))
            }
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("scan");
        self.upstream.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{Sel, SelIndexed, TrySel};
    use crate::cursor::Iter;
    use crate::source::from_vec;
    use iterq_core::Error;

    fn run<S: Sequence>(seq: &S) -> Result<Vec<S::Item>> {
        Iter::new(seq.open()?).collect()
    }

    #[test]
    fn test_map_variants() {
        let doubled = Map::new(from_vec(vec![1, 2, 3]), Sel(|x: i32| x * 2));
        assert_eq!(run(&doubled).unwrap(), vec![2, 4, 6]);

        let labelled = Map::new(
            from_vec(vec!["a", "b"]),
            SelIndexed(|s: &str, i| format!("{i}:{s}")),
        );
        assert_eq!(run(&labelled).unwrap(), vec!["0:a", "1:b"]);

        let parsed = Map::new(
            from_vec(vec!["1", "x"]),
            TrySel(|s: &str| s.parse::<i32>().map_err(Error::external)),
        );
        assert!(run(&parsed).is_err());
    }

    #[test]
    fn test_flat_map_skips_empty_inner() {
        let seq = FlatMap::new(from_vec(vec![0, 2, 1]), |n: i32| vec![n; n as usize]);
        assert_eq!(run(&seq).unwrap(), vec![2, 2, 1]);
    }

    #[test]
    fn test_scan_running_total() {
        let seq = Scan::new(from_vec(vec![1, 2, 3]), 10, |acc: &i32, x: i32| acc + x);
        assert_eq!(run(&seq).unwrap(), vec![11, 13, 16]);
    }
}
