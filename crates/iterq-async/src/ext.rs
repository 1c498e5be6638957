//! Method-chaining surface over every [`AsyncSequence`].
//!
//! Mirrors the sync extension trait: combinators consume `self`, terminals
//! borrow it and are awaited.

#![allow(async_fn_in_trait)]

use std::future::Future;

use iterq_core::collections::{EqualityMap, EqualitySet};
use iterq_core::compare::{Comparer, Direction, NaturalOrder};
use iterq_core::equality::{Equaler, KeyEq, KeyEquality};
use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;
use iterq_operators::callback::{Pred, PredIndexed, Sel, SelIndexed, TryPred, TrySel};
use iterq_operators::group::Lookup;
use iterq_operators::sort::SortLevel;
use iterq_operators::zip::pair;

use crate::combine::{Concat, Zip};
use crate::cursor::AsyncIter;
use crate::filter::{Filter, FilterAsync};
use crate::flow::Flow;
use crate::group::GroupBy;
use crate::map::{Map, MapAsync};
use crate::passthrough::{DefaultIfEmpty, Tap};
use crate::set::{Distinct, Union};
use crate::slice::{Skip, SkipWhile, Take, TakeWhile};
use crate::sort::Ordered;
use crate::split::{self, Prefix, Remainder};
use crate::terminal;
use crate::traits::AsyncSequence;

type Pair<A, B> = fn(A, B) -> (A, B);

pub trait AsyncSequenceExt: AsyncSequence + Sized {
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

    /// Each predicate future completes before the next element is pulled.
    fn filter_async<F, Fut>(self, predicate: F) -> FilterAsync<Self, F>
    where
        F: Fn(&Self::Item) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        FilterAsync::new(self, predicate)
    }

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

    fn map_async<U, F, Fut>(self, selector: F) -> MapAsync<Self, F>
    where
        F: Fn(Self::Item) -> Fut,
        Fut: Future<Output = Result<U>>,
    {
        MapAsync::new(self, selector)
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

    fn concat<R>(self, other: R) -> Concat<Self, R>
    where
        R: AsyncSequence<Item = Self::Item>,
    {
        Concat::new(self, other)
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

    fn union<R>(self, other: R) -> Union<Self, R, KeyEquality>
    where
        R: AsyncSequence<Item = Self::Item>,
        Self::Item: KeyEq + Clone,
    {
        Union::new(self, other, KeyEquality)
    }

    fn zip<R>(self, other: R) -> Zip<Self, R, Pair<Self::Item, R::Item>>
    where
        R: AsyncSequence,
    {
        Zip::new(self, other, pair as Pair<Self::Item, R::Item>)
    }

    fn zip_with<R, U, F>(self, other: R, selector: F) -> Zip<Self, R, F>
    where
        R: AsyncSequence,
        F: Fn(Self::Item, R::Item) -> U,
    {
        Zip::new(self, other, selector)
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

    /// Apply a caller-built operator chain.
    fn through<U, F>(self, f: F) -> U
    where
        F: FnOnce(Self) -> U,
        U: AsyncSequence,
    {
        f(self)
    }

    fn to_hierarchy(self, hierarchy: Hierarchy<Self::Item>) -> Flow<Self> {
        Flow::new(self, Some(hierarchy))
    }

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

    // ---- split -------------------------------------------------------------

    async fn break_when<F>(
        &self,
        predicate: F,
    ) -> Result<(Prefix<Self::Item>, Remainder<Self::Cursor>)>
    where
        Self::Item: Clone,
        F: Fn(&Self::Item) -> bool,
    {
        split::break_when(self, Pred(predicate)).await
    }

    async fn span<F>(
        &self,
        predicate: F,
    ) -> Result<(Prefix<Self::Item>, Remainder<Self::Cursor>)>
    where
        Self::Item: Clone,
        F: Fn(&Self::Item) -> bool,
    {
        split::span(self, Pred(predicate)).await
    }

    async fn break_when_async<F, Fut>(
        &self,
        predicate: F,
    ) -> Result<(Prefix<Self::Item>, Remainder<Self::Cursor>)>
    where
        Self::Item: Clone,
        F: Fn(&Self::Item, usize) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        split::break_when_async(self, predicate).await
    }

    async fn span_async<F, Fut>(
        &self,
        predicate: F,
    ) -> Result<(Prefix<Self::Item>, Remainder<Self::Cursor>)>
    where
        Self::Item: Clone,
        F: Fn(&Self::Item, usize) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        split::span_async(self, predicate).await
    }

    // ---- consumption -------------------------------------------------------

    fn iter(&self) -> Result<AsyncIter<Self::Cursor>> {
        Ok(AsyncIter::new(self.open()?))
    }

    async fn to_vec(&self) -> Result<Vec<Self::Item>> {
        terminal::to_vec(self).await
    }

    async fn to_map<K, V, KF, VF>(&self, key: KF, value: VF) -> Result<EqualityMap<K, V>>
    where
        KF: Fn(&Self::Item) -> K,
        VF: Fn(Self::Item) -> V,
        K: KeyEq,
    {
        terminal::to_map(self, key, value).await
    }

    async fn to_set(&self) -> Result<EqualitySet<Self::Item>>
    where
        Self::Item: KeyEq,
    {
        terminal::to_set(self).await
    }

    async fn to_lookup<K, F>(&self, key: F) -> Result<Lookup<K, Self::Item>>
    where
        F: Fn(&Self::Item) -> K,
        K: KeyEq + Clone,
    {
        terminal::to_lookup(self, key).await
    }

    async fn count(&self) -> Result<usize> {
        terminal::count(self).await
    }

    async fn first(&self) -> Result<Option<Self::Item>> {
        terminal::first(self).await
    }

    async fn reduce<F>(&self, f: F) -> Result<Self::Item>
    where
        F: Fn(Self::Item, Self::Item) -> Self::Item,
    {
        terminal::reduce(self, f).await
    }

    async fn fold<A, F>(&self, seed: A, f: F) -> Result<A>
    where
        F: Fn(A, Self::Item) -> A,
    {
        terminal::fold(self, seed, f).await
    }

    async fn reduce_right<F>(&self, f: F) -> Result<Self::Item>
    where
        F: Fn(Self::Item, Self::Item) -> Self::Item,
    {
        terminal::reduce_right(self, f).await
    }

    async fn min_by<K, F>(&self, key: F) -> Result<Option<Self::Item>>
    where
        F: Fn(&Self::Item) -> K,
        K: PartialOrd,
    {
        terminal::min_by(self, key).await
    }

    async fn max_by<K, F>(&self, key: F) -> Result<Option<Self::Item>>
    where
        F: Fn(&Self::Item) -> K,
        K: PartialOrd,
    {
        terminal::max_by(self, key).await
    }

    async fn for_each<F>(&self, f: F) -> Result<()>
    where
        F: FnMut(Self::Item),
    {
        terminal::for_each(self, f).await
    }
}

impl<S: AsyncSequence> AsyncSequenceExt for S {}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use iterq_core::Error;

    use super::*;
    use crate::source::{from_future, from_vec};

    #[tokio::test]
    async fn test_async_filter_map_keeps_source_order() {
        let delays = vec![30u64, 5, 20, 1, 10, 0];
        let seq = from_vec(delays)
            .filter_async(|d| {
                let d = *d;
                async move {
                    tokio::time::sleep(Duration::from_millis(d)).await;
                    Ok(d != 20)
                }
            })
            .map_async(|d| async move {
                tokio::time::sleep(Duration::from_millis(30 - d)).await;
                Ok(d * 10)
            });
        assert_eq!(seq.to_vec().await.unwrap(), vec![300, 50, 10, 100, 0]);
    }

    #[tokio::test]
    async fn test_async_chain_matches_sync_semantics() {
        let seq = from_vec((1..=10).collect::<Vec<i32>>())
            .skip(1)
            .filter(|n| n % 2 == 0)
            .map(|n| n * n)
            .take(3);
        assert_eq!(seq.to_vec().await.unwrap(), vec![4, 16, 36]);
        assert_eq!(seq.count().await.unwrap(), 3);
        assert_eq!(seq.fold(0, |a, n| a + n).await.unwrap(), 56);
    }

    #[tokio::test]
    async fn test_async_order_by_is_stable() {
        let seq = from_vec(vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')])
            .order_by(|p| p.0)
            .then_by_descending(|p| p.1);
        assert_eq!(
            seq.to_vec().await.unwrap(),
            vec![(1, 'd'), (1, 'b'), (2, 'c'), (2, 'a')]
        );
    }

    #[tokio::test]
    async fn test_async_group_by_first_seen_order() {
        let groups = from_vec(vec!["apple", "bean", "avocado", "beet", "corn"])
            .group_by(|w| w.chars().next())
            .to_vec()
            .await
            .unwrap();
        let keys: Vec<_> = groups.iter().map(|g| *g.key()).collect();
        assert_eq!(keys, vec![Some('a'), Some('b'), Some('c')]);
        assert_eq!(groups[0].len(), 2);
    }

    #[tokio::test]
    async fn test_async_union_and_zip() {
        let union = from_vec(vec![1, 2, 2, 3]).union(from_vec(vec![3, 4, 1]));
        assert_eq!(union.to_vec().await.unwrap(), vec![1, 2, 3, 4]);

        let zipped = from_vec(vec![1, 2, 3]).zip(from_vec(vec!['x', 'y']));
        assert_eq!(zipped.to_vec().await.unwrap(), vec![(1, 'x'), (2, 'y')]);
    }

    #[tokio::test]
    async fn test_async_span_splits_prefix() {
        let seq = from_vec(vec![1, 2, 5, 1, 7]);
        let (prefix, rest) = seq.span(|n| *n < 3).await.unwrap();
        assert_eq!(prefix.to_vec().await.unwrap(), vec![1, 2]);
        assert_eq!(rest.to_vec().await.unwrap(), vec![5, 1, 7]);
        assert!(matches!(rest.to_vec().await, Err(Error::Consumed)));
    }

    #[tokio::test]
    async fn test_async_terminals_on_empty_input() {
        let empty = from_vec(Vec::<i32>::new());
        assert!(matches!(empty.reduce(|a, b| a + b).await, Err(Error::Empty("reduce"))));
        assert_eq!(empty.first().await.unwrap(), None);
        assert_eq!(empty.min_by(|n| *n).await.unwrap(), None);
        assert_eq!(empty.default_if_empty(9).to_vec().await.unwrap(), vec![9]);
    }

    #[tokio::test]
    async fn test_from_future_defers_source_resolution() {
        let seq = from_future(async { Ok::<_, Error>(from_vec(vec![3, 1, 2])) });
        assert_eq!(seq.max_by(|n| *n).await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_async_iter_yields_then_ends() {
        let seq = from_vec(vec!['a', 'b']);
        let mut iter = seq.iter().unwrap();
        assert_eq!(iter.next().await.unwrap().unwrap(), 'a');
        assert_eq!(iter.next().await.unwrap().unwrap(), 'b');
        assert!(iter.next().await.is_none());
        iter.close().unwrap();
    }

    #[tokio::test]
    async fn test_through_applies_async_chain() {
        fn evens<S: AsyncSequence<Item = i32>>(seq: S) -> impl AsyncSequence<Item = i32> {
            seq.filter(|n| n % 2 == 0)
        }
        let out = from_vec(vec![1, 2, 3, 4]).through(evens).map(|n| n * 10);
        assert_eq!(out.to_vec().await.unwrap(), vec![20, 40]);
    }

    #[tokio::test]
    async fn test_to_hierarchy_survives_shape_preserving_chain() {
        use iterq_core::hierarchy::hierarchy_fn;

        let h = hierarchy_fn(|n: &i32| (*n > 1).then(|| n / 2), |n: &i32| vec![n * 2, n * 2 + 1]);
        let seq = from_vec(vec![1, 2, 3])
            .to_hierarchy(h.clone())
            .skip(1)
            .take_while(|n| *n < 10);
        assert!(seq.hierarchy().unwrap().same_provider(&h));
        let (prefix, _) = seq.break_when_async(|n, _| {
            let hit = *n == 3;
            async move { Ok::<_, Error>(hit) }
        })
        .await
        .unwrap();
        assert_eq!(prefix.to_vec().await.unwrap(), vec![2]);
        assert!(prefix.hierarchy().unwrap().same_provider(&h));
    }
}
