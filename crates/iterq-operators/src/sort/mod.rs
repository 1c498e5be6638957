//! Ordering composer.
//!
//! An ordered sequence holds a list of comparison levels. Nothing is compared
//! until the first pull, which drains the upstream, stable-sorts with the
//! composed levels and then yields from the sorted buffer.

mod ordered;

pub use ordered::{Ordered, OrderedCursor};

use std::cmp::Ordering;
use std::sync::Arc;

use iterq_core::compare::{Comparer, Direction};
use iterq_core::Result;

type CompareFn<T> = dyn Fn(&T, &T) -> Result<Ordering>;

/// One tie-break level: key extraction, key comparer and direction.
pub struct SortLevel<T> {
    compare: Arc<CompareFn<T>>,
    direction: Direction,
}

impl<T> Clone for SortLevel<T> {
    fn clone(&self) -> Self {
        Self {
            compare: Arc::clone(&self.compare),
            direction: self.direction,
        }
    }
}

impl<T: 'static> SortLevel<T> {
    pub fn by_key<K, F, C>(key: F, comparer: C, direction: Direction) -> Self
    where
        F: Fn(&T) -> K + 'static,
        C: Comparer<K> + 'static,
    {
        Self {
            compare: Arc::new(move |a: &T, b: &T| Ok(comparer.compare(&key(a), &key(b)))),
            direction,
        }
    }

    /// Level comparing whole elements.
    pub fn by_compare<F>(compare: F, direction: Direction) -> Self
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        Self {
            compare: Arc::new(move |a: &T, b: &T| Ok(compare(a, b))),
            direction,
        }
    }

    /// Level whose key selector may fail; the first failure aborts the sort.
    pub fn try_by_key<K, F, C>(key: F, comparer: C, direction: Direction) -> Self
    where
        F: Fn(&T) -> Result<K> + 'static,
        C: Comparer<K> + 'static,
    {
        Self {
            compare: Arc::new(move |a: &T, b: &T| Ok(comparer.compare(&key(a)?, &key(b)?))),
            direction,
        }
    }
}

impl<T> SortLevel<T> {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn compare(&self, a: &T, b: &T) -> Result<Ordering> {
        (self.compare)(a, b).map(|ord| self.direction.apply(ord))
    }
}

/// Compare through the levels in declaration order.
pub fn compare_levels<T>(levels: &[SortLevel<T>], a: &T, b: &T) -> Result<Ordering> {
    for level in levels {
        let ord = level.compare(a, b)?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
    }
    Ok(Ordering::Equal)
}

/// Stable sort by the composed levels.
///
/// The first comparison error is returned after the sort finishes; the slice
/// order is unspecified in that case.
pub fn stable_sort<T>(items: &mut [T], levels: &[SortLevel<T>]) -> Result<()> {
    let mut failure = None;
    items.sort_by(|a, b| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        compare_levels(levels, a, b).unwrap_or_else(|e| {
            failure = Some(e);
            Ordering::Equal
        })
    });
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iterq_core::compare::NaturalOrder;
    use iterq_core::Error;

    #[test]
    fn test_levels_tie_break_in_order() {
        let levels = vec![
            SortLevel::by_key(|p: &(i32, i32)| p.0, NaturalOrder, Direction::Ascending),
            SortLevel::by_key(|p: &(i32, i32)| p.1, NaturalOrder, Direction::Descending),
        ];
        let mut items = vec![(2, 1), (1, 1), (2, 5), (1, 3)];
        stable_sort(&mut items, &levels).unwrap();
        assert_eq!(items, vec![(1, 3), (1, 1), (2, 5), (2, 1)]);
    }

    #[test]
    fn test_failing_key_aborts_sort() {
        let levels = vec![SortLevel::try_by_key(
            |x: &i32| {
                if *x == 3 {
                    Err(Error::callback("bad key"))
                } else {
                    Ok(*x)
                }
            },
            NaturalOrder,
            Direction::Ascending,
        )];
        let mut items = vec![5, 3, 1];
        assert!(stable_sort(&mut items, &levels).is_err());
    }
}
