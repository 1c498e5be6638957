//! Terminal operations: drive a chain to a plain owned value.
//!
//! All of them run through [`drive`], so a terminal that stops early (`first`,
//! `any`, `single` on a second match, ...) closes the chain it opened.

use iterq_core::collections::{EqualityMap, EqualitySet};
use iterq_core::equality::{KeyEq, KeyEquality};
use iterq_core::{Error, Result};

use crate::callback::Predicate;
use crate::cursor::drive;
use crate::group::{build_groupings, identity, Lookup};
use crate::metrics;
use crate::traits::Sequence;

pub fn to_vec<S: Sequence + ?Sized>(source: &S) -> Result<Vec<S::Item>> {
    drive(source.open()?, |up| up.drain())
}

/// First-seen key order; a later value for an equal key replaces the earlier
/// one in place.
pub fn to_map<S, KF, VF, K, V>(source: &S, key: KF, value: VF) -> Result<EqualityMap<K, V>>
where
    S: Sequence + ?Sized,
    KF: Fn(&S::Item) -> K,
    VF: Fn(S::Item) -> V,
    K: KeyEq,
{
    drive(source.open()?, |up| {
        let mut map = EqualityMap::new();
        while let Some(item) = up.pull()? {
            let k = key(&item);
            map.insert(k, value(item));
        }
        Ok(map)
    })
}

pub fn to_set<S>(source: &S) -> Result<EqualitySet<S::Item>>
where
    S: Sequence + ?Sized,
    S::Item: KeyEq,
{
    drive(source.open()?, |up| {
        let mut set = EqualitySet::new();
        while let Some(item) = up.pull()? {
            set.insert(item);
        }
        Ok(set)
    })
}

/// Materialized lookup. Groups carry the source hierarchy.
pub fn to_lookup<S, KF, K>(source: &S, key: KF) -> Result<Lookup<K, S::Item>>
where
    S: Sequence + ?Sized,
    KF: Fn(&S::Item) -> K,
    K: KeyEq + Clone,
{
    let groups = build_groupings(source, key, identity, KeyEquality)?;
    Ok(Lookup::from_groups(groups, source.hierarchy()))
}

pub fn count<S: Sequence + ?Sized>(source: &S) -> Result<usize> {
    drive(source.open()?, |up| {
        let mut n = 0;
        while up.pull()?.is_some() {
            n += 1;
        }
        Ok(n)
    })
}

pub fn count_where<S, P>(source: &S, predicate: P) -> Result<usize>
where
    S: Sequence + ?Sized,
    P: Predicate<S::Item>,
{
    drive(source.open()?, |up| {
        let mut n = 0;
        let mut index = 0;
        while let Some(item) = up.pull()? {
            if predicate.test(&item, index)? {
                n += 1;
            }
            index += 1;
        }
        Ok(n)
    })
}

pub fn first<S: Sequence + ?Sized>(source: &S) -> Result<Option<S::Item>> {
    drive(source.open()?, |up| up.pull())
}

pub fn last<S: Sequence + ?Sized>(source: &S) -> Result<Option<S::Item>> {
    drive(source.open()?, |up| {
        let mut last = None;
        while let Some(item) = up.pull()? {
            last = Some(item);
        }
        Ok(last)
    })
}

pub fn element_at<S: Sequence + ?Sized>(source: &S, index: usize) -> Result<Option<S::Item>> {
    drive(source.open()?, |up| {
        let mut i = 0;
        while let Some(item) = up.pull()? {
            if i == index {
                return Ok(Some(item));
            }
            i += 1;
        }
        Ok(None)
    })
}

/// The only element. Fails with `Empty` or `NotSingle`.
pub fn single<S: Sequence + ?Sized>(source: &S) -> Result<S::Item> {
    drive(source.open()?, |up| {
        let Some(item) = up.pull()? else {
            return Err(Error::Empty("single"));
        };
        match up.pull()? {
            Some(_) => Err(Error::NotSingle),
            None => Ok(item),
        }
    })
}

pub fn any<S, P>(source: &S, predicate: P) -> Result<bool>
where
    S: Sequence + ?Sized,
    P: Predicate<S::Item>,
{
    drive(source.open()?, |up| {
        let mut index = 0;
        while let Some(item) = up.pull()? {
            if predicate.test(&item, index)? {
                return Ok(true);
            }
            index += 1;
        }
        Ok(false)
    })
}

pub fn all<S, P>(source: &S, predicate: P) -> Result<bool>
where
    S: Sequence + ?Sized,
    P: Predicate<S::Item>,
{
    drive(source.open()?, |up| {
        let mut index = 0;
        while let Some(item) = up.pull()? {
            if !predicate.test(&item, index)? {
                return Ok(false);
            }
            index += 1;
        }
        Ok(true)
    })
}

pub fn includes<S>(source: &S, value: &S::Item) -> Result<bool>
where
    S: Sequence + ?Sized,
    S::Item: KeyEq,
{
    drive(source.open()?, |up| {
        while let Some(item) = up.pull()? {
            if item.key_eq(value) {
                return Ok(true);
            }
        }
        Ok(false)
    })
}

/// Unseeded left fold. Fails with `Empty` on an empty source.
pub fn reduce<S, F>(source: &S, f: F) -> Result<S::Item>
where
    S: Sequence + ?Sized,
    F: Fn(S::Item, S::Item) -> S::Item,
{
    drive(source.open()?, |up| {
        let Some(mut acc) = up.pull()? else {
            return Err(Error::Empty("reduce"));
        };
        while let Some(item) = up.pull()? {
            acc = f(acc, item);
        }
        Ok(acc)
    })
}

pub fn fold<S, A, F>(source: &S, seed: A, f: F) -> Result<A>
where
    S: Sequence + ?Sized,
    F: Fn(A, S::Item) -> A,
{
    drive(source.open()?, |up| {
        let mut acc = seed;
        while let Some(item) = up.pull()? {
            acc = f(acc, item);
        }
        Ok(acc)
    })
}

/// Unseeded right fold: the last element is the initial accumulator.
pub fn reduce_right<S, F>(source: &S, f: F) -> Result<S::Item>
where
    S: Sequence + ?Sized,
    F: Fn(S::Item, S::Item) -> S::Item,
{
    let mut items = to_vec(source)?;
    let Some(mut acc) = items.pop() else {
        return Err(Error::Empty("reduce_right"));
    };
    while let Some(item) = items.pop() {
        acc = f(acc, item);
    }
    Ok(acc)
}

pub fn fold_right<S, A, F>(source: &S, seed: A, f: F) -> Result<A>
where
    S: Sequence + ?Sized,
    F: Fn(A, S::Item) -> A,
{
    let items = to_vec(source)?;
    metrics::emit_materialized("fold_right", items.len());
    Ok(items.into_iter().rev().fold(seed, f))
}

fn extreme_by<S, KF, K>(
    source: &S,
    key: KF,
    replace_on: std::cmp::Ordering,
) -> Result<Option<S::Item>>
where
    S: Sequence + ?Sized,
    KF: Fn(&S::Item) -> K,
    K: PartialOrd,
{
    drive(source.open()?, |up| {
        let Some(first) = up.pull()? else {
            return Ok(None);
        };
        let mut best_key = key(&first);
        let mut best = first;
        while let Some(item) = up.pull()? {
            let k = key(&item);
            if k.partial_cmp(&best_key) == Some(replace_on) {
                best_key = k;
                best = item;
            }
        }
        Ok(Some(best))
    })
}

/// Smallest element; the first of equal minima wins. `None` when empty.
pub fn min<S>(source: &S) -> Result<Option<S::Item>>
where
    S: Sequence + ?Sized,
    S::Item: PartialOrd + Clone,
{
    extreme_by(source, |x: &S::Item| x.clone(), std::cmp::Ordering::Less)
}

pub fn max<S>(source: &S) -> Result<Option<S::Item>>
where
    S: Sequence + ?Sized,
    S::Item: PartialOrd + Clone,
{
    extreme_by(source, |x: &S::Item| x.clone(), std::cmp::Ordering::Greater)
}

pub fn min_by<S, KF, K>(source: &S, key: KF) -> Result<Option<S::Item>>
where
    S: Sequence + ?Sized,
    KF: Fn(&S::Item) -> K,
    K: PartialOrd,
{
    extreme_by(source, key, std::cmp::Ordering::Less)
}

pub fn max_by<S, KF, K>(source: &S, key: KF) -> Result<Option<S::Item>>
where
    S: Sequence + ?Sized,
    KF: Fn(&S::Item) -> K,
    K: PartialOrd,
{
    extreme_by(source, key, std::cmp::Ordering::Greater)
}

pub fn sum<S>(source: &S) -> Result<S::Item>
where
    S: Sequence + ?Sized,
    S::Item: std::iter::Sum<S::Item>,
{
    Ok(to_vec(source)?.into_iter().sum())
}

/// Arithmetic mean; `None` on an empty source.
pub fn average<S>(source: &S) -> Result<Option<f64>>
where
    S: Sequence + ?Sized,
    S::Item: Into<f64>,
{
    drive(source.open()?, |up| {
        let mut total = 0.0;
        let mut n = 0usize;
        while let Some(item) = up.pull()? {
            total += item.into();
            n += 1;
        }
        Ok((n > 0).then(|| total / n as f64))
    })
}

/// Pairwise comparison of two sequences. Whichever side is still open when
/// the answer is known gets closed.
pub fn corresponds_by<L, R, F>(left: &L, right: &R, equal: F) -> Result<bool>
where
    L: Sequence + ?Sized,
    R: Sequence + ?Sized,
    F: Fn(&L::Item, &R::Item) -> bool,
{
    drive(left.open()?, |l| {
        drive(right.open()?, |r| loop {
            match (l.pull()?, r.pull()?) {
                (None, None) => return Ok(true),
                (Some(a), Some(b)) => {
                    if !equal(&a, &b) {
                        return Ok(false);
                    }
                }
                _ => return Ok(false),
            }
        })
    })
}

pub fn corresponds<L, R>(left: &L, right: &R) -> Result<bool>
where
    L: Sequence + ?Sized,
    R: Sequence<Item = L::Item> + ?Sized,
    L::Item: KeyEq,
{
    corresponds_by(left, right, |a: &L::Item, b: &L::Item| a.key_eq(b))
}

/// True when `left` begins with every element of `prefix`, in order.
pub fn starts_with<L, R>(left: &L, prefix: &R) -> Result<bool>
where
    L: Sequence + ?Sized,
    R: Sequence<Item = L::Item> + ?Sized,
    L::Item: KeyEq,
{
    drive(left.open()?, |l| {
        drive(prefix.open()?, |r| loop {
            let Some(b) = r.pull()? else {
                return Ok(true);
            };
            match l.pull()? {
                Some(a) if a.key_eq(&b) => {}
                _ => return Ok(false),
            }
        })
    })
}

pub fn for_each<S, F>(source: &S, mut f: F) -> Result<()>
where
    S: Sequence + ?Sized,
    F: FnMut(S::Item),
{
    drive(source.open()?, |up| {
        while let Some(item) = up.pull()? {
            f(item);
        }
        Ok(())
    })
}

/// Consume and discard every element, for side effects upstream.
pub fn drain<S: Sequence + ?Sized>(source: &S) -> Result<()> {
    for_each(source, |_| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::Pred;
    use crate::source::{empty, from_cursor, from_vec};
    use crate::traits::Cursor;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Tracked {
        next: u32,
        end: u32,
        closes: Rc<Cell<u32>>,
    }

    impl Cursor for Tracked {
        type Item = u32;

        fn pull(&mut self) -> Result<Option<u32>> {
            if self.next >= self.end {
                return Ok(None);
            }
            self.next += 1;
            Ok(Some(self.next - 1))
        }

        fn close(&mut self) -> Result<()> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }

    fn tracked(end: u32) -> (Tracked, Rc<Cell<u32>>) {
        let closes = Rc::new(Cell::new(0));
        let cursor = Tracked {
            next: 0,
            end,
            closes: Rc::clone(&closes),
        };
        (cursor, closes)
    }

    #[test]
    fn test_to_vec_twice_over_restartable_source() {
        let src = from_vec(vec![3, 1, 2]);
        assert_eq!(to_vec(&src).unwrap(), to_vec(&src).unwrap());
    }

    #[test]
    fn test_to_map_replaces_in_first_seen_order() {
        let src = from_vec(vec![("b", 1), ("a", 2), ("b", 3)]);
        let map = to_map(&src, |p: &(&str, i32)| p.0, |p| p.1).unwrap();
        let entries: Vec<_> = map.into_iter().collect();
        assert_eq!(entries, vec![("b", 3), ("a", 2)]);
    }

    #[test]
    fn test_to_set_and_lookup() {
        let src = from_vec(vec![1, 2, 1, 3]);
        let set = to_set(&src).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);

        let lookup = to_lookup(&src, |x: &i32| x % 2).unwrap();
        assert_eq!(lookup.get(&1), &[1, 1, 3]);
        assert!(lookup.get(&5).is_empty());
    }

    #[test]
    fn test_first_closes_unfinished_source() {
        let (cursor, closes) = tracked(10);
        assert_eq!(first(&from_cursor(cursor)).unwrap(), Some(0));
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_count_does_not_close_exhausted_source() {
        let (cursor, closes) = tracked(4);
        assert_eq!(count(&from_cursor(cursor)).unwrap(), 4);
        assert_eq!(closes.get(), 0);
    }

    #[test]
    fn test_single_variants() {
        assert_eq!(single(&from_vec(vec![7])).unwrap(), 7);
        assert!(matches!(single(&empty::<i32>()), Err(Error::Empty(_))));
        assert!(matches!(single(&from_vec(vec![1, 2])), Err(Error::NotSingle)));
    }

    #[test]
    fn test_folds() {
        let src = from_vec(vec!["a".to_string(), "b".into(), "c".into()]);
        assert_eq!(reduce(&src, |a, b| a + &b).unwrap(), "abc");
        assert_eq!(reduce_right(&src, |a, b| a + &b).unwrap(), "cba");
        assert_eq!(fold(&src, String::from(">"), |a, b| a + &b).unwrap(), ">abc");
        assert_eq!(fold_right(&src, String::from("<"), |a, b| a + &b).unwrap(), "<cba");
        assert!(matches!(reduce(&empty::<i32>(), |a, b| a + b), Err(Error::Empty(_))));
    }

    #[test]
    fn test_extremes_and_aggregates() {
        let src = from_vec(vec![3.0, 1.0, 4.0, 1.0, 5.0]);
        assert_eq!(min(&src).unwrap(), Some(1.0));
        assert_eq!(max(&src).unwrap(), Some(5.0));
        assert_eq!(sum(&src).unwrap(), 14.0);
        assert_eq!(average(&src).unwrap(), Some(2.8));
        assert_eq!(average(&empty::<f64>()).unwrap(), None);

        let words = from_vec(vec!["bb", "a", "cc"]);
        assert_eq!(min_by(&words, |w: &&str| w.len()).unwrap(), Some("a"));
        assert_eq!(max_by(&words, |w: &&str| w.len()).unwrap(), Some("bb"));
    }

    #[test]
    fn test_quantifiers() {
        let src = from_vec(vec![1, 2, 3, 4]);
        assert!(any(&src, Pred(|x: &i32| *x > 3)).unwrap());
        assert!(!all(&src, Pred(|x: &i32| *x > 1)).unwrap());
        assert_eq!(count_where(&src, Pred(|x: &i32| x % 2 == 0)).unwrap(), 2);
        assert!(includes(&src, &3).unwrap());
        assert_eq!(element_at(&src, 2).unwrap(), Some(3));
        assert_eq!(element_at(&src, 9).unwrap(), None);
        assert_eq!(last(&src).unwrap(), Some(4));
    }

    #[test]
    fn test_corresponds_closes_the_open_side() {
        let (cursor, closes) = tracked(10);
        let left = from_cursor(cursor);
        assert!(!corresponds(&left, &from_vec(vec![0, 1])).unwrap());
        assert_eq!(closes.get(), 1);

        assert!(corresponds(&from_vec(vec![1, 2]), &from_vec(vec![1, 2])).unwrap());
        assert!(!corresponds(&from_vec(vec![1, 2]), &from_vec(vec![1])).unwrap());
    }

    #[test]
    fn test_starts_with() {
        let (cursor, closes) = tracked(10);
        assert!(starts_with(&from_cursor(cursor), &from_vec(vec![0, 1, 2])).unwrap());
        assert_eq!(closes.get(), 1);
        assert!(!starts_with(&from_vec(vec![1]), &from_vec(vec![1, 2])).unwrap());
    }
}
