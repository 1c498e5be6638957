use std::collections::VecDeque;
use std::sync::Arc;

use iterq_core::collections::EqualityMap;
use iterq_core::equality::Equaler;
use iterq_core::{join_cleanup, Result};

use super::{build_table, JoinSpec};
use crate::cursor::Deferred;
use crate::metrics;
use crate::traits::{Cursor, Sequence};

/// Full outer join.
///
/// Both inputs are drained on the first pull, left first. Results follow
/// left key order (left element order within a key), each left element paired
/// with every matching right element or with `None`; right-only keys follow
/// in right key order, paired with `None`.
pub struct FullJoin<L, R, LKF, RKF, F, E> {
    left: Arc<L>,
    right: Arc<R>,
    spec: Arc<JoinSpec<LKF, RKF, F, E>>,
}

impl<L, R, LKF, RKF, F, E> FullJoin<L, R, LKF, RKF, F, E> {
    pub fn new(left: L, right: R, spec: JoinSpec<LKF, RKF, F, E>) -> Self {
        Self {
            left: Arc::new(left),
            right: Arc::new(right),
            spec: Arc::new(spec),
        }
    }
}

impl<L, R, LKF, RKF, F, K, E, U> Sequence for FullJoin<L, R, LKF, RKF, F, E>
where
    L: Sequence,
    R: Sequence,
    LKF: Fn(&L::Item) -> K,
    RKF: Fn(&R::Item) -> K,
    F: Fn(Option<&L::Item>, Option<&R::Item>) -> U,
    E: Equaler<K> + Clone,
{
    type Item = U;
    type Cursor = FullJoinCursor<L, R, LKF, RKF, F, K, E, U>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(FullJoinCursor {
            left: Deferred::new(Arc::clone(&self.left)),
            right: Deferred::new(Arc::clone(&self.right)),
            spec: Arc::clone(&self.spec),
            tables: None,
            left_pos: 0,
            right_pos: 0,
            pending: VecDeque::new(),
        })
    }
}

type Tables<L, R, K, E> = (
    EqualityMap<K, Vec<<L as Sequence>::Item>, E>,
    EqualityMap<K, Vec<<R as Sequence>::Item>, E>,
);

pub struct FullJoinCursor<L: Sequence, R: Sequence, LKF, RKF, F, K, E, U> {
    left: Deferred<L>,
    right: Deferred<R>,
    spec: Arc<JoinSpec<LKF, RKF, F, E>>,
    tables: Option<Tables<L, R, K, E>>,
    left_pos: usize,
    right_pos: usize,
    pending: VecDeque<U>,
}

impl<L, R, LKF, RKF, F, K, E, U> Cursor for FullJoinCursor<L, R, LKF, RKF, F, K, E, U>
where
    L: Sequence,
    R: Sequence,
    LKF: Fn(&L::Item) -> K,
    RKF: Fn(&R::Item) -> K,
    F: Fn(Option<&L::Item>, Option<&R::Item>) -> U,
    E: Equaler<K> + Clone,
{
    type Item = U;

    fn pull(&mut self) -> Result<Option<U>> {
        if self.tables.is_none() {
            let left =
                build_table(&mut self.left, &self.spec.outer_key, self.spec.equaler.clone())?;
            let right =
                build_table(&mut self.right, &self.spec.inner_key, self.spec.equaler.clone())?;
            self.tables = Some((left, right));
        }
        let Some((left, right)) = self.tables.as_ref() else {
            return Ok(None);
        };
        let result = &self.spec.result;

        loop {
            if let Some(out) = self.pending.pop_front() {
                return Ok(Some(out));
            }
            if let Some((key, group)) = left.entry_at(self.left_pos) {
                self.left_pos += 1;
                let matches = right.get(key);
                for l in group {
                    match matches {
                        Some(rs) => {
                            for r in rs {
                                self.pending.push_back(result(Some(l), Some(r)));
                            }
                        }
                        None => self.pending.push_back(result(Some(l), None)),
                    }
                }
                continue;
            }
            if let Some((key, group)) = right.entry_at(self.right_pos) {
                self.right_pos += 1;
                if !left.contains_key(key) {
                    for r in group {
                        self.pending.push_back(result(None, Some(r)));
                    }
                }
                continue;
            }
            return Ok(None);
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("full_join");
        self.pending.clear();
        join_cleanup(self.left.close(), self.right.close())
    }
}
