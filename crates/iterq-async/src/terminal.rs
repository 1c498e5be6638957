//! Async terminals. Each opens one pass, awaits pulls in order and settles
//! the upstream on every exit path.

use iterq_core::collections::{EqualityMap, EqualitySet};
use iterq_core::equality::{KeyEq, KeyEquality};
use iterq_core::{Error, Result};
use iterq_operators::group::Lookup;

use crate::cursor::{settle, Upstream};
use crate::traits::AsyncSequence;

pub async fn to_vec<S: AsyncSequence + ?Sized>(source: &S) -> Result<Vec<S::Item>> {
    let mut up = Upstream::new(source.open()?);
    let result = up.drain().await;
    settle(&mut up, result)
}

pub async fn to_map<S, KF, VF, K, V>(source: &S, key: KF, value: VF) -> Result<EqualityMap<K, V>>
where
    S: AsyncSequence + ?Sized,
    KF: Fn(&S::Item) -> K,
    VF: Fn(S::Item) -> V,
    K: KeyEq,
{
    let mut up = Upstream::new(source.open()?);
    let result = async {
        let mut map = EqualityMap::new();
        while let Some(item) = up.pull().await? {
            let k = key(&item);
            map.insert(k, value(item));
        }
        Ok(map)
    }
    .await;
    settle(&mut up, result)
}

pub async fn to_set<S>(source: &S) -> Result<EqualitySet<S::Item>>
where
    S: AsyncSequence + ?Sized,
    S::Item: KeyEq,
{
    let mut set = EqualitySet::new();
    for item in to_vec(source).await? {
        set.insert(item);
    }
    Ok(set)
}

pub async fn to_lookup<S, KF, K>(source: &S, key: KF) -> Result<Lookup<K, S::Item>>
where
    S: AsyncSequence + ?Sized,
    KF: Fn(&S::Item) -> K,
    K: KeyEq + Clone,
{
    let hierarchy = source.hierarchy();
    let mut groups = EqualityMap::with_equaler(KeyEquality);
    for item in to_vec(source).await? {
        groups.get_or_insert_with(key(&item), Vec::new).push(item);
    }
    Ok(Lookup::from_groups(groups, hierarchy))
}

pub async fn count<S: AsyncSequence + ?Sized>(source: &S) -> Result<usize> {
    let mut up = Upstream::new(source.open()?);
    let result = async {
        let mut n = 0;
        while up.pull().await?.is_some() {
            n += 1;
        }
        Ok(n)
    }
    .await;
    settle(&mut up, result)
}

pub async fn first<S: AsyncSequence + ?Sized>(source: &S) -> Result<Option<S::Item>> {
    let mut up = Upstream::new(source.open()?);
    let result = up.pull().await;
    settle(&mut up, result)
}

pub async fn reduce<S, F>(source: &S, f: F) -> Result<S::Item>
where
    S: AsyncSequence + ?Sized,
    F: Fn(S::Item, S::Item) -> S::Item,
{
    let mut up = Upstream::new(source.open()?);
    let result = async {
        let Some(mut acc) = up.pull().await? else {
            return Err(Error::Empty("reduce"));
        };
        while let Some(item) = up.pull().await? {
            acc = f(acc, item);
        }
        Ok(acc)
    }
    .await;
    settle(&mut up, result)
}

pub async fn fold<S, A, F>(source: &S, seed: A, f: F) -> Result<A>
where
    S: AsyncSequence + ?Sized,
    F: Fn(A, S::Item) -> A,
{
    let mut up = Upstream::new(source.open()?);
    let result = async {
        let mut acc = seed;
        while let Some(item) = up.pull().await? {
            acc = f(acc, item);
        }
        Ok(acc)
    }
    .await;
    settle(&mut up, result)
}

pub async fn reduce_right<S, F>(source: &S, f: F) -> Result<S::Item>
where
    S: AsyncSequence + ?Sized,
    F: Fn(S::Item, S::Item) -> S::Item,
{
    let mut items = to_vec(source).await?;
    let Some(mut acc) = items.pop() else {
        return Err(Error::Empty("reduce_right"));
    };
    while let Some(item) = items.pop() {
        acc = f(acc, item);
    }
    Ok(acc)
}

async fn extreme_by<S, KF, K>(
    source: &S,
    key: KF,
    replace_on: std::cmp::Ordering,
) -> Result<Option<S::Item>>
where
    S: AsyncSequence + ?Sized,
    KF: Fn(&S::Item) -> K,
    K: PartialOrd,
{
    let mut up = Upstream::new(source.open()?);
    let result = async {
        let Some(first) = up.pull().await? else {
            return Ok(None);
        };
        let mut best_key = key(&first);
        let mut best = first;
        while let Some(item) = up.pull().await? {
            let k = key(&item);
            if k.partial_cmp(&best_key) == Some(replace_on) {
                best_key = k;
                best = item;
            }
        }
        Ok(Some(best))
    }
    .await;
    settle(&mut up, result)
}

pub async fn min_by<S, KF, K>(source: &S, key: KF) -> Result<Option<S::Item>>
where
    S: AsyncSequence + ?Sized,
    KF: Fn(&S::Item) -> K,
    K: PartialOrd,
{
    extreme_by(source, key, std::cmp::Ordering::Less).await
}

pub async fn max_by<S, KF, K>(source: &S, key: KF) -> Result<Option<S::Item>>
where
    S: AsyncSequence + ?Sized,
    KF: Fn(&S::Item) -> K,
    K: PartialOrd,
{
    extreme_by(source, key, std::cmp::Ordering::Greater).await
}

pub async fn for_each<S, F>(source: &S, mut f: F) -> Result<()>
where
    S: AsyncSequence + ?Sized,
    F: FnMut(S::Item),
{
    let mut up = Upstream::new(source.open()?);
    let result = async {
        while let Some(item) = up.pull().await? {
            f(item);
        }
        Ok(())
    }
    .await;
    settle(&mut up, result)
}
