//! Filter: yields the elements satisfying a predicate, in upstream order.

use std::sync::Arc;

use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;

use crate::callback::Predicate;
use crate::cursor::Upstream;
use crate::metrics;
use crate::traits::{Cursor, Sequence};

pub struct Filter<S, P> {
    source: S,
    predicate: Arc<P>,
}

impl<S, P> Filter<S, P> {
    pub fn new(source: S, predicate: P) -> Self {
        Self {
            source,
            predicate: Arc::new(predicate),
        }
    }
}

impl<S, P> Sequence for Filter<S, P>
where
    S: Sequence,
    P: Predicate<S::Item>,
{
    type Item = S::Item;
    type Cursor = FilterCursor<S::Cursor, P>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(FilterCursor {
            upstream: Upstream::new(self.source.open()?),
            predicate: Arc::clone(&self.predicate),
            index: 0,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct FilterCursor<C, P> {
    upstream: Upstream<C>,
    predicate: Arc<P>,
    index: usize,
}

impl<C, P> Cursor for FilterCursor<C, P>
where
    C: Cursor,
    P: Predicate<C::Item>,
{
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        while let Some(item) = self.upstream.pull()? {
            let index = self.index;
            self.index += 1;
            if self.predicate.test(&item, index)? {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("filter");
        self.upstream.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{Pred, PredIndexed, TryPred};
    use crate::cursor::Iter;
    use crate::source::from_vec;
    use iterq_core::Error;

    fn run<S: Sequence>(seq: &S) -> Result<Vec<S::Item>> {
        Iter::new(seq.open()?).collect()
    }

    #[test]
    fn test_filter_keeps_matching_in_order() {
        let seq = Filter::new(from_vec(vec![1, 2, 3, 4, 5, 6]), Pred(|x: &i32| x % 2 == 0));
        assert_eq!(run(&seq).unwrap(), vec![2, 4, 6]);
    }

    #[test]
    fn test_filter_indexed_sees_upstream_positions() {
        let seq = Filter::new(
            from_vec(vec!["a", "b", "c", "d"]),
            PredIndexed(|_: &&str, i| i % 2 == 1),
        );
        assert_eq!(run(&seq).unwrap(), vec!["b", "d"]);
    }

    #[test]
    fn test_try_filter_propagates_error() {
        let seq = Filter::new(
            from_vec(vec![1, 2, 3]),
            TryPred(|x: &i32| {
                if *x == 2 {
                    Err(Error::callback("two"))
                } else {
                    Ok(true)
                }
            }),
        );
        let err = run(&seq).unwrap_err();
        assert!(matches!(err, Error::Callback(ref m) if m == "two"));
    }
}
