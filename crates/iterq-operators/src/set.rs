//! Set operators over a pluggable [`Equaler`].
//!
//! All of them yield distinct elements in first-seen order. `union` drains
//! its left input before opening the right one; `intersect`, `except` and
//! `symmetric_difference` drain the right input into a set on the first pull,
//! then stream the left one.

use std::sync::Arc;

use iterq_core::collections::EqualitySet;
use iterq_core::equality::Equaler;
use iterq_core::hierarchy::Hierarchy;
use iterq_core::{join_cleanup, Result};

use crate::cursor::{Deferred, Upstream};
use crate::metrics;
use crate::traits::{Cursor, Sequence};

pub struct Distinct<S, E> {
    source: S,
    equaler: E,
}

impl<S, E> Distinct<S, E> {
    pub fn new(source: S, equaler: E) -> Self {
        Self { source, equaler }
    }
}

impl<S, E> Sequence for Distinct<S, E>
where
    S: Sequence,
    S::Item: Clone,
    E: Equaler<S::Item> + Clone,
{
    type Item = S::Item;
    type Cursor = DistinctCursor<S::Cursor, E>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(DistinctCursor {
            upstream: Upstream::new(self.source.open()?),
            seen: EqualitySet::with_equaler(self.equaler.clone()),
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct DistinctCursor<C: Cursor, E> {
    upstream: Upstream<C>,
    seen: EqualitySet<C::Item, E>,
}

impl<C, E> Cursor for DistinctCursor<C, E>
where
    C: Cursor,
    C::Item: Clone,
    E: Equaler<C::Item>,
{
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        while let Some(item) = self.upstream.pull()? {
            if self.seen.insert(item.clone()) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("distinct");
        self.upstream.close()
    }
}

/// Distinct by a derived key; the first element per key wins.
pub struct DistinctBy<S, F, E> {
    source: S,
    key: Arc<F>,
    equaler: E,
}

impl<S, F, E> DistinctBy<S, F, E> {
    pub fn new(source: S, key: F, equaler: E) -> Self {
        Self {
            source,
            key: Arc::new(key),
            equaler,
        }
    }
}

impl<S, F, K, E> Sequence for DistinctBy<S, F, E>
where
    S: Sequence,
    F: Fn(&S::Item) -> K,
    E: Equaler<K> + Clone,
{
    type Item = S::Item;
    type Cursor = DistinctByCursor<S::Cursor, F, K, E>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(DistinctByCursor {
            upstream: Upstream::new(self.source.open()?),
            key: Arc::clone(&self.key),
            seen: EqualitySet::with_equaler(self.equaler.clone()),
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.source.hierarchy()
    }
}

pub struct DistinctByCursor<C, F, K, E> {
    upstream: Upstream<C>,
    key: Arc<F>,
    seen: EqualitySet<K, E>,
}

impl<C, F, K, E> Cursor for DistinctByCursor<C, F, K, E>
where
    C: Cursor,
    F: Fn(&C::Item) -> K,
    E: Equaler<K>,
{
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        while let Some(item) = self.upstream.pull()? {
            if self.seen.insert((self.key)(&item)) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("distinct_by");
        self.upstream.close()
    }
}

pub struct Union<L, R, E> {
    left: L,
    right: Arc<R>,
    equaler: E,
}

impl<L, R, E> Union<L, R, E> {
    pub fn new(left: L, right: R, equaler: E) -> Self {
        Self {
            left,
            right: Arc::new(right),
            equaler,
        }
    }
}

impl<L, R, E> Sequence for Union<L, R, E>
where
    L: Sequence,
    L::Item: Clone,
    R: Sequence<Item = L::Item>,
    E: Equaler<L::Item> + Clone,
{
    type Item = L::Item;
    type Cursor = UnionCursor<L::Cursor, R, E>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(UnionCursor {
            left: Upstream::new(self.left.open()?),
            right: Deferred::new(Arc::clone(&self.right)),
            seen: EqualitySet::with_equaler(self.equaler.clone()),
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<L::Item>> {
        self.left.hierarchy()
    }
}

pub struct UnionCursor<C: Cursor, R: Sequence, E> {
    left: Upstream<C>,
    right: Deferred<R>,
    seen: EqualitySet<C::Item, E>,
}

impl<C, R, E> Cursor for UnionCursor<C, R, E>
where
    C: Cursor,
    C::Item: Clone,
    R: Sequence<Item = C::Item>,
    E: Equaler<C::Item>,
{
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        while let Some(item) = self.left.pull()? {
            if self.seen.insert(item.clone()) {
                return Ok(Some(item));
            }
        }
        while let Some(item) = self.right.pull()? {
            if self.seen.insert(item.clone()) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("union");
        join_cleanup(self.left.close(), self.right.close())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetMode {
    Intersect,
    Except,
    SymmetricDifference,
}

/// Shared implementation of the right-drained set operators.
pub struct SetOp<L, R, E> {
    left: L,
    right: Arc<R>,
    equaler: E,
    mode: SetMode,
}

impl<L, R, E> SetOp<L, R, E> {
    pub fn intersect(left: L, right: R, equaler: E) -> Self {
        Self::with_mode(left, right, equaler, SetMode::Intersect)
    }

    pub fn except(left: L, right: R, equaler: E) -> Self {
        Self::with_mode(left, right, equaler, SetMode::Except)
    }

    pub fn symmetric_difference(left: L, right: R, equaler: E) -> Self {
        Self::with_mode(left, right, equaler, SetMode::SymmetricDifference)
    }

    fn with_mode(left: L, right: R, equaler: E, mode: SetMode) -> Self {
        Self {
            left,
            right: Arc::new(right),
            equaler,
            mode,
        }
    }
}

impl<L, R, E> Sequence for SetOp<L, R, E>
where
    L: Sequence,
    L::Item: Clone,
    R: Sequence<Item = L::Item>,
    E: Equaler<L::Item> + Clone,
{
    type Item = L::Item;
    type Cursor = SetOpCursor<L::Cursor, R, E>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(SetOpCursor {
            left: Upstream::new(self.left.open()?),
            right: Deferred::new(Arc::clone(&self.right)),
            equaler: self.equaler.clone(),
            mode: self.mode,
            right_set: None,
            left_seen: EqualitySet::with_equaler(self.equaler.clone()),
            remainder: None,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<L::Item>> {
        self.left.hierarchy()
    }
}

pub struct SetOpCursor<C: Cursor, R: Sequence, E> {
    left: Upstream<C>,
    right: Deferred<R>,
    equaler: E,
    mode: SetMode,
    right_set: Option<EqualitySet<C::Item, E>>,
    // Intersect/Except: elements already yielded.
    // SymmetricDifference: every left element seen.
    left_seen: EqualitySet<C::Item, E>,
    remainder: Option<std::vec::IntoIter<C::Item>>,
}

impl<C, R, E> SetOpCursor<C, R, E>
where
    C: Cursor,
    C::Item: Clone,
    R: Sequence<Item = C::Item>,
    E: Equaler<C::Item> + Clone,
{
    fn load_right(&mut self) -> Result<()> {
        if self.right_set.is_none() {
            let mut set = EqualitySet::with_equaler(self.equaler.clone());
            for item in self.right.drain()? {
                set.insert(item);
            }
            metrics::emit_materialized("set_right", set.len());
            self.right_set = Some(set);
        }
        Ok(())
    }
}

impl<C, R, E> Cursor for SetOpCursor<C, R, E>
where
    C: Cursor,
    C::Item: Clone,
    R: Sequence<Item = C::Item>,
    E: Equaler<C::Item> + Clone,
{
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        if let Some(rest) = self.remainder.as_mut() {
            for item in rest.by_ref() {
                if !self.left_seen.contains(&item) {
                    return Ok(Some(item));
                }
            }
            return Ok(None);
        }

        self.load_right()?;
        let Some(right) = self.right_set.as_ref() else {
            return Ok(None);
        };

        while let Some(item) = self.left.pull()? {
            let in_right = right.contains(&item);
            let keep = match self.mode {
                SetMode::Intersect => in_right && self.left_seen.insert(item.clone()),
                SetMode::Except => !in_right && self.left_seen.insert(item.clone()),
                SetMode::SymmetricDifference => self.left_seen.insert(item.clone()) && !in_right,
            };
            if keep {
                return Ok(Some(item));
            }
        }

        if self.mode == SetMode::SymmetricDifference {
            let rest: Vec<_> = self
                .right_set
                .take()
                .map(|set| set.into_iter().collect())
                .unwrap_or_default();
            self.remainder = Some(rest.into_iter());
            return self.pull();
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("set_op");
        self.remainder = None;
        join_cleanup(self.left.close(), self.right.close())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Iter;
    use crate::source::from_vec;
    use iterq_core::equality::{equaler_fn, KeyEquality};

    fn run<S: Sequence>(seq: &S) -> Result<Vec<S::Item>> {
        Iter::new(seq.open()?).collect()
    }

    #[test]
    fn test_distinct_first_seen_order() {
        let seq = Distinct::new(from_vec(vec![3, 1, 3, 2, 1]), KeyEquality);
        assert_eq!(run(&seq).unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_distinct_with_custom_equaler() {
        let ci = equaler_fn(
            |a: &String, b: &String| a.eq_ignore_ascii_case(b),
            |s: &String| s.to_ascii_lowercase().len() as u64,
        );
        let words = vec!["A".to_string(), "a".to_string(), "b".to_string()];
        let seq = Distinct::new(from_vec(words), ci);
        assert_eq!(run(&seq).unwrap(), vec!["A".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_distinct_by_key() {
        let seq = DistinctBy::new(
            from_vec(vec![(1, 'a'), (2, 'b'), (1, 'c')]),
            |p: &(i32, char)| p.0,
            KeyEquality,
        );
        assert_eq!(run(&seq).unwrap(), vec![(1, 'a'), (2, 'b')]);
    }

    #[test]
    fn test_union_intersect_except_symmetric() {
        let l = from_vec(vec![1, 2, 2, 3]);
        let r = from_vec(vec![3, 4, 4, 1]);
        assert_eq!(
            run(&Union::new(l.clone(), r.clone(), KeyEquality)).unwrap(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(
            run(&SetOp::intersect(l.clone(), r.clone(), KeyEquality)).unwrap(),
            vec![1, 3]
        );
        assert_eq!(
            run(&SetOp::except(l.clone(), r.clone(), KeyEquality)).unwrap(),
            vec![2]
        );
        assert_eq!(
            run(&SetOp::symmetric_difference(l, r, KeyEquality)).unwrap(),
            vec![2, 4]
        );
    }

    #[test]
    fn test_float_keys_group_nan() {
        let seq = Distinct::new(from_vec(vec![f64::NAN, 0.0, f64::NAN, -0.0]), KeyEquality);
        assert_eq!(run(&seq).unwrap().len(), 2);
    }
}
