//! Hash joins.
//!
//! `join` and `group_join` drain the inner input into a key table on the
//! first pull, then stream the outer input. `full_join` drains both.

mod full;

pub use full::{FullJoin, FullJoinCursor};

use std::collections::VecDeque;
use std::sync::Arc;

use iterq_core::collections::EqualityMap;
use iterq_core::equality::Equaler;
use iterq_core::{join_cleanup, Result};

use crate::cursor::{Deferred, Upstream};
use crate::metrics;
use crate::traits::{Cursor, Sequence};

/// Key selectors, result selector and equality shared by the join operators.
pub struct JoinSpec<OKF, IKF, F, E> {
    pub outer_key: OKF,
    pub inner_key: IKF,
    pub result: F,
    pub equaler: E,
}

fn build_table<C, KF, K, E>(
    upstream: &mut Deferred<C>,
    key: &KF,
    equaler: E,
) -> Result<EqualityMap<K, Vec<C::Item>, E>>
where
    C: Sequence,
    KF: Fn(&C::Item) -> K,
    E: Equaler<K>,
{
    let mut table = EqualityMap::with_equaler(equaler);
    for item in upstream.drain()? {
        table.get_or_insert_with(key(&item), Vec::new).push(item);
    }
    metrics::emit_materialized("join_inner", table.len());
    Ok(table)
}

/// Inner equi-join. For each outer element, one result per matching inner
/// element, in inner source order.
pub struct Join<O, I, OKF, IKF, F, E> {
    outer: O,
    inner: Arc<I>,
    spec: Arc<JoinSpec<OKF, IKF, F, E>>,
}

impl<O, I, OKF, IKF, F, E> Join<O, I, OKF, IKF, F, E> {
    pub fn new(outer: O, inner: I, spec: JoinSpec<OKF, IKF, F, E>) -> Self {
        Self {
            outer,
            inner: Arc::new(inner),
            spec: Arc::new(spec),
        }
    }
}

impl<O, I, OKF, IKF, F, K, E, U> Sequence for Join<O, I, OKF, IKF, F, E>
where
    O: Sequence,
    I: Sequence,
    OKF: Fn(&O::Item) -> K,
    IKF: Fn(&I::Item) -> K,
    F: Fn(&O::Item, &I::Item) -> U,
    E: Equaler<K> + Clone,
{
    type Item = U;
    type Cursor = JoinCursor<O::Cursor, I, OKF, IKF, F, K, E, U>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(JoinCursor {
            outer: Upstream::new(self.outer.open()?),
            inner: Deferred::new(Arc::clone(&self.inner)),
            spec: Arc::clone(&self.spec),
            table: None,
            pending: VecDeque::new(),
        })
    }
}

pub struct JoinCursor<C, I: Sequence, OKF, IKF, F, K, E, U> {
    outer: Upstream<C>,
    inner: Deferred<I>,
    spec: Arc<JoinSpec<OKF, IKF, F, E>>,
    table: Option<EqualityMap<K, Vec<I::Item>, E>>,
    pending: VecDeque<U>,
}

impl<C, I, OKF, IKF, F, K, E, U> Cursor for JoinCursor<C, I, OKF, IKF, F, K, E, U>
where
    C: Cursor,
    I: Sequence,
    OKF: Fn(&C::Item) -> K,
    IKF: Fn(&I::Item) -> K,
    F: Fn(&C::Item, &I::Item) -> U,
    E: Equaler<K> + Clone,
{
    type Item = U;

    fn pull(&mut self) -> Result<Option<U>> {
        if self.table.is_none() {
            let table = build_table(
                &mut self.inner,
                &self.spec.inner_key,
                self.spec.equaler.clone(),
            )?;
            self.table = Some(table);
        }
        loop {
            if let Some(out) = self.pending.pop_front() {
                return Ok(Some(out));
            }
            let Some(outer) = self.outer.pull()? else {
                return Ok(None);
            };
            let key = (self.spec.outer_key)(&outer);
            if let Some(matches) = self.table.as_ref().and_then(|t| t.get(&key)) {
                for inner in matches {
                    self.pending.push_back((self.spec.result)(&outer, inner));
                }
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("join");
        self.pending.clear();
        join_cleanup(self.outer.close(), self.inner.close())
    }
}

/// Correlates each outer element with the (possibly empty) slice of matching
/// inner elements.
pub struct GroupJoin<O, I, OKF, IKF, F, E> {
    outer: O,
    inner: Arc<I>,
    spec: Arc<JoinSpec<OKF, IKF, F, E>>,
}

impl<O, I, OKF, IKF, F, E> GroupJoin<O, I, OKF, IKF, F, E> {
    pub fn new(outer: O, inner: I, spec: JoinSpec<OKF, IKF, F, E>) -> Self {
        Self {
            outer,
            inner: Arc::new(inner),
            spec: Arc::new(spec),
        }
    }
}

impl<O, I, OKF, IKF, F, K, E, U> Sequence for GroupJoin<O, I, OKF, IKF, F, E>
where
    O: Sequence,
    I: Sequence,
    OKF: Fn(&O::Item) -> K,
    IKF: Fn(&I::Item) -> K,
    F: Fn(O::Item, &[I::Item]) -> U,
    E: Equaler<K> + Clone,
{
    type Item = U;
    type Cursor = GroupJoinCursor<O::Cursor, I, OKF, IKF, F, K, E>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(GroupJoinCursor {
            outer: Upstream::new(self.outer.open()?),
            inner: Deferred::new(Arc::clone(&self.inner)),
            spec: Arc::clone(&self.spec),
            table: None,
        })
    }
}

pub struct GroupJoinCursor<C, I: Sequence, OKF, IKF, F, K, E> {
    outer: Upstream<C>,
    inner: Deferred<I>,
    spec: Arc<JoinSpec<OKF, IKF, F, E>>,
    table: Option<EqualityMap<K, Vec<I::Item>, E>>,
}

impl<C, I, OKF, IKF, F, K, E, U> Cursor for GroupJoinCursor<C, I, OKF, IKF, F, K, E>
where
    C: Cursor,
    I: Sequence,
    OKF: Fn(&C::Item) -> K,
    IKF: Fn(&I::Item) -> K,
    F: Fn(C::Item, &[I::Item]) -> U,
    E: Equaler<K> + Clone,
{
    type Item = U;

    fn pull(&mut self) -> Result<Option<U>> {
        if self.table.is_none() {
            let table = build_table(
                &mut self.inner,
                &self.spec.inner_key,
                self.spec.equaler.clone(),
            )?;
            self.table = Some(table);
        }
        let Some(outer) = self.outer.pull()? else {
            return Ok(None);
        };
        let key = (self.spec.outer_key)(&outer);
        let matches: &[I::Item] = self
            .table
            .as_ref()
            .and_then(|t| t.get(&key))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Ok(Some((self.spec.result)(outer, matches)))
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("group_join");
        join_cleanup(self.outer.close(), self.inner.close())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Iter;
    use crate::source::from_vec;
    use iterq_core::equality::KeyEquality;

    fn run<S: Sequence>(seq: &S) -> Result<Vec<S::Item>> {
        Iter::new(seq.open()?).collect()
    }

    fn people() -> Vec<(u32, &'static str)> {
        vec![(1, "ann"), (2, "bob"), (3, "cy")]
    }

    fn pets() -> Vec<(u32, &'static str)> {
        vec![(1, "rex"), (3, "tom"), (1, "kit")]
    }

    #[test]
    fn test_join_matches_in_inner_order() {
        let seq = Join::new(
            from_vec(people()),
            from_vec(pets()),
            JoinSpec {
                outer_key: |p: &(u32, &str)| p.0,
                inner_key: |p: &(u32, &str)| p.0,
                result: |o: &(u32, &'static str), i: &(u32, &'static str)| (o.1, i.1),
                equaler: KeyEquality,
            },
        );
        assert_eq!(
            run(&seq).unwrap(),
            vec![("ann", "rex"), ("ann", "kit"), ("cy", "tom")]
        );
    }

    #[test]
    fn test_group_join_includes_unmatched_outer() {
        let seq = GroupJoin::new(
            from_vec(people()),
            from_vec(pets()),
            JoinSpec {
                outer_key: |p: &(u32, &str)| p.0,
                inner_key: |p: &(u32, &str)| p.0,
                result: |o: (u32, &'static str), i: &[(u32, &'static str)]| (o.1, i.len()),
                equaler: KeyEquality,
            },
        );
        assert_eq!(run(&seq).unwrap(), vec![("ann", 2), ("bob", 0), ("cy", 1)]);
    }
}
