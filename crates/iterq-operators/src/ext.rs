//! Method-chaining surface over every [`Sequence`].
//!
//! Combinators consume `self` and return the operator struct; nothing is
//! opened until a terminal (or [`SequenceExt::iter`]) runs. Terminals borrow
//! `self`, so a restartable sequence can be consumed repeatedly.

use iterq_core::collections::{EqualityMap, EqualitySet};
use iterq_core::compare::{Comparer, Direction, NaturalOrder};
use iterq_core::equality::{Equaler, KeyEq, KeyEquality};
use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;

use crate::callback::{Pred, PredIndexed, Sel, SelIndexed, TryPred, TrySel};
use crate::concat::Concat;
use crate::cursor::Iter;
use crate::filter::Filter;
use crate::flow::{to_hierarchy, Flow};
use crate::group::{GroupBy, Lookup};
use crate::hierarchy::{Axis, Outermost, Traverse};
use crate::join::{FullJoin, GroupJoin, Join, JoinSpec};
use crate::map::{FlatMap, Map, Scan};
use crate::passthrough::{DefaultIfEmpty, Reverse, Tap};
use crate::set::{Distinct, DistinctBy, SetOp, Union};
use crate::slice::{Skip, SkipRight, SkipWhile, Take, TakeRight, TakeWhile};
use crate::sort::{Ordered, SortLevel};
use crate::source::{once, ArraySource};
use crate::split::{self, Prefix, Remainder};
use crate::terminal;
use crate::traits::{BoxedSequence, Sequence};
use crate::window::PageBy;
use crate::zip::{pair, Zip};

type Pair<A, B> = fn(A, B) -> (A, B);

pub trait SequenceExt: Sequence + Sized {
    // ---- shape-preserving ------------------------------------------------

    fn filter<F>(self, predicate: F) -> Filter<Self, Pred<F>>
    where
        F: Fn(&Self::Item) -> bool,
    {
        Filter::new(self, Pred(predicate))
    }

    fn try_filter<F>(self, predicate: F) -> Filter<Self, TryPred<F>>
    where
        F: Fn(&Self::Item) -> Result<bool>,
    {
        Filter::new(self, TryPred(predicate))
    }

    fn filter_indexed<F>(self, predicate: F) -> Filter<Self, PredIndexed<F>>
    where
        F: Fn(&Self::Item, usize) -> bool,
    {
        Filter::new(self, PredIndexed(predicate))
    }

    fn take(self, count: usize) -> Take<Self> {
        Take::new(self, count)
    }

    fn skip(self, count: usize) -> Skip<Self> {
        Skip::new(self, count)
    }

    fn take_while<F>(self, predicate: F) -> TakeWhile<Self, Pred<F>>
    where
        F: Fn(&Self::Item) -> bool,
    {
        TakeWhile::new(self, Pred(predicate))
    }

    fn skip_while<F>(self, predicate: F) -> SkipWhile<Self, Pred<F>>
    where
        F: Fn(&Self::Item) -> bool,
    {
        SkipWhile::new(self, Pred(predicate))
    }

    fn take_right(self, count: usize) -> TakeRight<Self> {
        TakeRight::new(self, count)
    }

    fn skip_right(self, count: usize) -> SkipRight<Self> {
        SkipRight::new(self, count)
    }

    fn distinct(self) -> Distinct<Self, KeyEquality>
    where
        Self::Item: KeyEq + Clone,
    {
        Distinct::new(self, KeyEquality)
    }

    fn distinct_with<E>(self, equaler: E) -> Distinct<Self, E>
    where
        E: Equaler<Self::Item> + Clone,
    {
        Distinct::new(self, equaler)
    }

    fn distinct_by<K, F>(self, key: F) -> DistinctBy<Self, F, KeyEquality>
    where
        F: Fn(&Self::Item) -> K,
        K: KeyEq,
    {
        DistinctBy::new(self, key, KeyEquality)
    }

    fn default_if_empty(self, value: Self::Item) -> DefaultIfEmpty<Self>
    where
        Self::Item: Clone,
    {
        DefaultIfEmpty::new(self, value)
    }

    fn tap<F>(self, callback: F) -> Tap<Self, F>
    where
        F: Fn(&Self::Item),
    {
        Tap::new(self, callback)
    }

    fn append(self, value: Self::Item) -> Concat<Self, ArraySource<Self::Item>>
    where
        Self::Item: Clone,
    {
        Concat::new(self, once(value))
    }

    /// Keeps this sequence's hierarchy even though `value` leads.
    fn prepend(self, value: Self::Item) -> Flow<Concat<ArraySource<Self::Item>, Self>>
    where
        Self::Item: Clone,
    {
        let hierarchy = self.hierarchy();
        Flow::new(Concat::new(once(value), self), hierarchy)
    }

    fn concat<R>(self, other: R) -> Concat<Self, R>
    where
        R: Sequence<Item = Self::Item>,
    {
        Concat::new(self, other)
    }

    fn union<R>(self, other: R) -> Union<Self, R, KeyEquality>
    where
        R: Sequence<Item = Self::Item>,
        Self::Item: KeyEq + Clone,
    {
        Union::new(self, other, KeyEquality)
    }

    fn union_with<R, E>(self, other: R, equaler: E) -> Union<Self, R, E>
    where
        R: Sequence<Item = Self::Item>,
        E: Equaler<Self::Item> + Clone,
    {
        Union::new(self, other, equaler)
    }

    fn intersect<R>(self, other: R) -> SetOp<Self, R, KeyEquality>
    where
        R: Sequence<Item = Self::Item>,
        Self::Item: KeyEq + Clone,
    {
        SetOp::intersect(self, other, KeyEquality)
    }

    fn except<R>(self, other: R) -> SetOp<Self, R, KeyEquality>
    where
        R: Sequence<Item = Self::Item>,
        Self::Item: KeyEq + Clone,
    {
        SetOp::except(self, other, KeyEquality)
    }

    fn symmetric_difference<R>(self, other: R) -> SetOp<Self, R, KeyEquality>
    where
        R: Sequence<Item = Self::Item>,
        Self::Item: KeyEq + Clone,
    {
        SetOp::symmetric_difference(self, other, KeyEquality)
    }

    fn reverse(self) -> Reverse<Self> {
        Reverse::new(self)
    }

    fn order_by<K, F>(self, key: F) -> Ordered<Self>
    where
        Self::Item: 'static,
        F: Fn(&Self::Item) -> K + 'static,
        K: PartialOrd + 'static,
    {
        Ordered::new(self, SortLevel::by_key(key, NaturalOrder, Direction::Ascending))
    }

    fn order_by_descending<K, F>(self, key: F) -> Ordered<Self>
    where
        Self::Item: 'static,
        F: Fn(&Self::Item) -> K + 'static,
        K: PartialOrd + 'static,
    {
        Ordered::new(self, SortLevel::by_key(key, NaturalOrder, Direction::Descending))
    }

    fn order_by_with<K, F, C>(self, key: F, comparer: C) -> Ordered<Self>
    where
        Self::Item: 'static,
        F: Fn(&Self::Item) -> K + 'static,
        C: Comparer<K> + 'static,
        K: 'static,
    {
        Ordered::new(self, SortLevel::by_key(key, comparer, Direction::Ascending))
    }

    fn order_by_descending_with<K, F, C>(self, key: F, comparer: C) -> Ordered<Self>
    where
        Self::Item: 'static,
        F: Fn(&Self::Item) -> K + 'static,
        C: Comparer<K> + 'static,
        K: 'static,
    {
        Ordered::new(self, SortLevel::by_key(key, comparer, Direction::Descending))
    }

    /// Apply a caller-built operator chain.
    fn through<U, F>(self, f: F) -> U
    where
        F: FnOnce(Self) -> U,
        U: Sequence,
    {
        f(self)
    }

    // ---- shape-changing --------------------------------------------------

    fn map<U, F>(self, selector: F) -> Map<Self, Sel<F>, U>
    where
        F: Fn(Self::Item) -> U,
    {
        Map::new(self, Sel(selector))
    }

    fn try_map<U, F>(self, selector: F) -> Map<Self, TrySel<F>, U>
    where
        F: Fn(Self::Item) -> Result<U>,
    {
        Map::new(self, TrySel(selector))
    }

    fn map_indexed<U, F>(self, selector: F) -> Map<Self, SelIndexed<F>, U>
    where
        F: Fn(Self::Item, usize) -> U,
    {
        Map::new(self, SelIndexed(selector))
    }

    fn flat_map<I, F>(self, selector: F) -> FlatMap<Self, F>
    where
        F: Fn(Self::Item) -> I,
        I: IntoIterator,
    {
        FlatMap::new(self, selector)
    }

    fn scan<A, F>(self, seed: A, accumulator: F) -> Scan<Self, F, A>
    where
        F: Fn(&A, Self::Item) -> A,
        A: Clone,
    {
        Scan::new(self, seed, accumulator)
    }

    /// Fails with a RangeKind error for `size == 0`.
    fn page_by(self, size: usize) -> Result<PageBy<Self>> {
        PageBy::new(self, size)
    }

    fn zip<R>(self, other: R) -> Zip<Self, R, Pair<Self::Item, R::Item>>
    where
        R: Sequence,
    {
        Zip::new(self, other, pair as Pair<Self::Item, R::Item>)
    }

    fn zip_with<R, U, F>(self, other: R, selector: F) -> Zip<Self, R, F>
    where
        R: Sequence,
        F: Fn(Self::Item, R::Item) -> U,
    {
        Zip::new(self, other, selector)
    }

    /// Groups of whole elements, each carrying this sequence's hierarchy.
    #[allow(clippy::type_complexity)]
    fn group_by<K, F>(
        self,
        key: F,
    ) -> GroupBy<Self, F, fn(Self::Item) -> Self::Item, Self::Item, KeyEquality>
    where
        F: Fn(&Self::Item) -> K,
        K: KeyEq,
    {
        GroupBy::new(self, key, KeyEquality)
    }

    fn group_by_with<K, V, KF, VF>(
        self,
        key: KF,
        element: VF,
    ) -> GroupBy<Self, KF, VF, V, KeyEquality>
    where
        KF: Fn(&Self::Item) -> K,
        VF: Fn(Self::Item) -> V,
        K: KeyEq,
    {
        GroupBy::with_element(self, key, element, KeyEquality)
    }

    fn join<I, K, U, OKF, IKF, F>(
        self,
        inner: I,
        outer_key: OKF,
        inner_key: IKF,
        result: F,
    ) -> Join<Self, I, OKF, IKF, F, KeyEquality>
    where
        I: Sequence,
        OKF: Fn(&Self::Item) -> K,
        IKF: Fn(&I::Item) -> K,
        F: Fn(&Self::Item, &I::Item) -> U,
        K: KeyEq,
    {
        Join::new(
            self,
            inner,
            JoinSpec {
                outer_key,
                inner_key,
                result,
                equaler: KeyEquality,
            },
        )
    }

    fn group_join<I, K, U, OKF, IKF, F>(
        self,
        inner: I,
        outer_key: OKF,
        inner_key: IKF,
        result: F,
    ) -> GroupJoin<Self, I, OKF, IKF, F, KeyEquality>
    where
        I: Sequence,
        OKF: Fn(&Self::Item) -> K,
        IKF: Fn(&I::Item) -> K,
        F: Fn(Self::Item, &[I::Item]) -> U,
        K: KeyEq,
    {
        GroupJoin::new(
            self,
            inner,
            JoinSpec {
                outer_key,
                inner_key,
                result,
                equaler: KeyEquality,
            },
        )
    }

    fn full_join<R, K, U, LKF, RKF, F>(
        self,
        right: R,
        left_key: LKF,
        right_key: RKF,
        result: F,
    ) -> FullJoin<Self, R, LKF, RKF, F, KeyEquality>
    where
        R: Sequence,
        LKF: Fn(&Self::Item) -> K,
        RKF: Fn(&R::Item) -> K,
        F: Fn(Option<&Self::Item>, Option<&R::Item>) -> U,
        K: KeyEq,
    {
        FullJoin::new(
            self,
            right,
            JoinSpec {
                outer_key: left_key,
                inner_key: right_key,
                result,
                equaler: KeyEquality,
            },
        )
    }

    // ---- split -----------------------------------------------------------

    fn break_when<F>(&self, predicate: F) -> Result<(Prefix<Self::Item>, Remainder<Self::Cursor>)>
    where
        Self::Item: Clone,
        F: Fn(&Self::Item) -> bool,
    {
        split::break_when(self, Pred(predicate))
    }

    fn span<F>(&self, predicate: F) -> Result<(Prefix<Self::Item>, Remainder<Self::Cursor>)>
    where
        Self::Item: Clone,
        F: Fn(&Self::Item) -> bool,
    {
        split::span(self, Pred(predicate))
    }

    // ---- hierarchy -------------------------------------------------------

    fn to_hierarchy(self, hierarchy: Hierarchy<Self::Item>) -> Flow<Self> {
        to_hierarchy(self, hierarchy)
    }

    fn traverse(self, axis: Axis) -> Result<Traverse<Self>> {
        Traverse::new(self, axis)
    }

    fn root(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::Root)
    }

    fn ancestors(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::Ancestors)
    }

    fn ancestors_and_self(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::AncestorsAndSelf)
    }

    fn parents(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::Parents)
    }

    fn self_(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::Self_)
    }

    fn children(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::Children)
    }

    fn nth_child(self, n: usize) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::NthChild(n))
    }

    fn siblings(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::Siblings)
    }

    fn siblings_and_self(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::SiblingsAndSelf)
    }

    fn preceding_siblings(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::PrecedingSiblings)
    }

    fn following_siblings(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::FollowingSiblings)
    }

    fn descendants(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::Descendants)
    }

    fn descendants_and_self(self) -> Result<Traverse<Self>> {
        Traverse::new(self, Axis::DescendantsAndSelf)
    }

    fn top_most(self) -> Result<Outermost<Self>> {
        Outermost::top_most(self)
    }

    fn bottom_most(self) -> Result<Outermost<Self>> {
        Outermost::bottom_most(self)
    }

    // ---- consumption -----------------------------------------------------

    /// Open a pass as a std iterator of `Result`s.
    fn iter(&self) -> Result<Iter<Self::Cursor>> {
        Ok(Iter::new(self.open()?))
    }

    fn boxed(self) -> BoxedSequence<Self::Item>
    where
        Self: 'static,
        Self::Cursor: 'static,
    {
        BoxedSequence::new(self)
    }

    fn to_vec(&self) -> Result<Vec<Self::Item>> {
        terminal::to_vec(self)
    }

    fn to_map<K, V, KF, VF>(&self, key: KF, value: VF) -> Result<EqualityMap<K, V>>
    where
        KF: Fn(&Self::Item) -> K,
        VF: Fn(Self::Item) -> V,
        K: KeyEq,
    {
        terminal::to_map(self, key, value)
    }

    fn to_set(&self) -> Result<EqualitySet<Self::Item>>
    where
        Self::Item: KeyEq,
    {
        terminal::to_set(self)
    }

    fn to_lookup<K, F>(&self, key: F) -> Result<Lookup<K, Self::Item>>
    where
        F: Fn(&Self::Item) -> K,
        K: KeyEq + Clone,
    {
        terminal::to_lookup(self, key)
    }

    fn count(&self) -> Result<usize> {
        terminal::count(self)
    }

    fn count_where<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&Self::Item) -> bool,
    {
        terminal::count_where(self, Pred(predicate))
    }

    fn first(&self) -> Result<Option<Self::Item>> {
        terminal::first(self)
    }

    fn last(&self) -> Result<Option<Self::Item>> {
        terminal::last(self)
    }

    fn element_at(&self, index: usize) -> Result<Option<Self::Item>> {
        terminal::element_at(self, index)
    }

    fn single(&self) -> Result<Self::Item> {
        terminal::single(self)
    }

    fn any<F>(&self, predicate: F) -> Result<bool>
    where
        F: Fn(&Self::Item) -> bool,
    {
        terminal::any(self, Pred(predicate))
    }

    fn all<F>(&self, predicate: F) -> Result<bool>
    where
        F: Fn(&Self::Item) -> bool,
    {
        terminal::all(self, Pred(predicate))
    }

    fn includes(&self, value: &Self::Item) -> Result<bool>
    where
        Self::Item: KeyEq,
    {
        terminal::includes(self, value)
    }

    fn reduce<F>(&self, f: F) -> Result<Self::Item>
    where
        F: Fn(Self::Item, Self::Item) -> Self::Item,
    {
        terminal::reduce(self, f)
    }

    fn fold<A, F>(&self, seed: A, f: F) -> Result<A>
    where
        F: Fn(A, Self::Item) -> A,
    {
        terminal::fold(self, seed, f)
    }

    fn reduce_right<F>(&self, f: F) -> Result<Self::Item>
    where
        F: Fn(Self::Item, Self::Item) -> Self::Item,
    {
        terminal::reduce_right(self, f)
    }

    fn fold_right<A, F>(&self, seed: A, f: F) -> Result<A>
    where
        F: Fn(A, Self::Item) -> A,
    {
        terminal::fold_right(self, seed, f)
    }

    fn min(&self) -> Result<Option<Self::Item>>
    where
        Self::Item: PartialOrd + Clone,
    {
        terminal::min(self)
    }

    fn max(&self) -> Result<Option<Self::Item>>
    where
        Self::Item: PartialOrd + Clone,
    {
        terminal::max(self)
    }

    fn min_by<K, F>(&self, key: F) -> Result<Option<Self::Item>>
    where
        F: Fn(&Self::Item) -> K,
        K: PartialOrd,
    {
        terminal::min_by(self, key)
    }

    fn max_by<K, F>(&self, key: F) -> Result<Option<Self::Item>>
    where
        F: Fn(&Self::Item) -> K,
        K: PartialOrd,
    {
        terminal::max_by(self, key)
    }

    fn sum(&self) -> Result<Self::Item>
    where
        Self::Item: std::iter::Sum<Self::Item>,
    {
        terminal::sum(self)
    }

    fn average(&self) -> Result<Option<f64>>
    where
        Self::Item: Into<f64>,
    {
        terminal::average(self)
    }

    fn corresponds<R>(&self, other: &R) -> Result<bool>
    where
        R: Sequence<Item = Self::Item>,
        Self::Item: KeyEq,
    {
        terminal::corresponds(self, other)
    }

    fn corresponds_by<R, F>(&self, other: &R, equal: F) -> Result<bool>
    where
        R: Sequence,
        F: Fn(&Self::Item, &R::Item) -> bool,
    {
        terminal::corresponds_by(self, other, equal)
    }

    fn starts_with<R>(&self, prefix: &R) -> Result<bool>
    where
        R: Sequence<Item = Self::Item>,
        Self::Item: KeyEq,
    {
        terminal::starts_with(self, prefix)
    }

    fn for_each<F>(&self, f: F) -> Result<()>
    where
        F: FnMut(Self::Item),
    {
        terminal::for_each(self, f)
    }

    fn drain(&self) -> Result<()> {
        terminal::drain(self)
    }
}

impl<S: Sequence> SequenceExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{from_vec, range};
    use iterq_core::hierarchy::hierarchy_fn;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        k: &'static str,
        v: i32,
    }

    #[test]
    fn test_chain_reads_left_to_right() {
        let out = range(1, 10)
            .filter(|x| x % 2 == 1)
            .map(|x| x * 10)
            .take(3)
            .to_vec()
            .unwrap();
        assert_eq!(out, vec![10, 30, 50]);
    }

    #[test]
    fn test_order_by_is_stable_across_levels() {
        let rows = from_vec(vec![
            Row { k: "b", v: 1 },
            Row { k: "a", v: 2 },
            Row { k: "b", v: 0 },
            Row { k: "a", v: 2 },
        ]);
        let sorted = rows
            .order_by(|r: &Row| r.k)
            .then_by_descending(|r: &Row| r.v)
            .map(|r| (r.k, r.v))
            .to_vec()
            .unwrap();
        assert_eq!(sorted, vec![("a", 2), ("a", 2), ("b", 1), ("b", 0)]);
    }

    #[test]
    fn test_group_by_first_seen_order() {
        let rows = from_vec(vec![
            Row { k: "b", v: 1 },
            Row { k: "a", v: 2 },
            Row { k: "b", v: 3 },
        ]);
        let groups = rows
            .group_by(|r: &Row| r.k)
            .map(|g| (*g.key(), g.elements().iter().map(|r| r.v).collect::<Vec<_>>()))
            .to_vec()
            .unwrap();
        assert_eq!(groups, vec![("b", vec![1, 3]), ("a", vec![2])]);
    }

    #[test]
    fn test_prepend_keeps_hierarchy() {
        let h = hierarchy_fn(|_: &i32| None, |_: &i32| vec![]);
        let seq = from_vec(vec![2, 3]).to_hierarchy(h.clone()).prepend(1);
        assert!(seq.hierarchy().unwrap().same_provider(&h));
        assert_eq!(seq.to_vec().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_zip_pairs_and_stops_at_shorter() {
        let out = from_vec(vec![1, 2, 3])
            .zip(from_vec(vec!["a", "b"]))
            .to_vec()
            .unwrap();
        assert_eq!(out, vec![(1, "a"), (2, "b")]);
    }

    #[test]
    fn test_span_round_trips_through_ext() {
        let src = from_vec(vec![1, 2, 7, 3]);
        let (prefix, rest) = src.span(|x| *x < 5).unwrap();
        let mut all = prefix.to_vec().unwrap();
        all.extend(rest.to_vec().unwrap());
        assert_eq!(all, vec![1, 2, 7, 3]);
    }

    #[test]
    fn test_joins_through_ext() {
        let people = from_vec(vec![(1, "ann"), (2, "bob")]);
        let pets = from_vec(vec![(1, "cat"), (1, "dog"), (3, "eel")]);
        let joined = (&people)
            .join(&pets, |p| p.0, |q| q.0, |p, q| format!("{}:{}", p.1, q.1))
            .to_vec()
            .unwrap();
        assert_eq!(joined, vec!["ann:cat", "ann:dog"]);

        let counts = (&people)
            .group_join(&pets, |p| p.0, |q| q.0, |p, qs| (p.1, qs.len()))
            .to_vec()
            .unwrap();
        assert_eq!(counts, vec![("ann", 2), ("bob", 0)]);
    }

    #[test]
    fn test_boxed_erases_chain_type() {
        let boxed = from_vec(vec![3, 1, 2]).order_by(|x: &i32| *x).boxed();
        let again = boxed.clone();
        assert_eq!(boxed.to_vec().unwrap(), vec![1, 2, 3]);
        assert_eq!(again.count().unwrap(), 3);
    }
}
