//! Hierarchy propagation.
//!
//! Shape-preserving operators forward `hierarchy()` from their source
//! directly. [`Flow`] covers the remaining cases: results assembled from other
//! sequences and explicit attachment through `to_hierarchy`.

use iterq_core::hierarchy::Hierarchy;
use iterq_core::Result;

use crate::traits::Sequence;

/// Iterates like `inner`, reports `hierarchy`.
pub struct Flow<S: Sequence> {
    inner: S,
    hierarchy: Option<Hierarchy<S::Item>>,
}

impl<S: Sequence> Flow<S> {
    pub fn new(inner: S, hierarchy: Option<Hierarchy<S::Item>>) -> Self {
        Self { inner, hierarchy }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Sequence + Clone> Clone for Flow<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            hierarchy: self.hierarchy.clone(),
        }
    }
}

impl<S: Sequence> Sequence for Flow<S> {
    type Item = S::Item;
    type Cursor = S::Cursor;

    fn open(&self) -> Result<Self::Cursor> {
        self.inner.open()
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        self.hierarchy.clone()
    }
}

/// `new_sequence` tagged with `source`'s hierarchy, or with none.
pub fn flow_hierarchy<S, Src>(new_sequence: S, source: &Src) -> Flow<S>
where
    S: Sequence,
    Src: Sequence<Item = S::Item> + ?Sized,
{
    Flow::new(new_sequence, source.hierarchy())
}

/// Attach a provider explicitly.
pub fn to_hierarchy<S: Sequence>(sequence: S, hierarchy: Hierarchy<S::Item>) -> Flow<S> {
    Flow::new(sequence, Some(hierarchy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::from_vec;
    use iterq_core::hierarchy::hierarchy_fn;

    #[test]
    fn test_flow_copies_source_capability() {
        let h = hierarchy_fn(|_: &i32| None, |_: &i32| vec![]);
        let tagged = to_hierarchy(from_vec(vec![1, 2]), h.clone());
        let flowed = flow_hierarchy(from_vec(vec![3]), &tagged);
        assert!(flowed.hierarchy().unwrap().same_provider(&h));

        let plain = flow_hierarchy(from_vec(vec![3]), &from_vec(vec![1]));
        assert!(plain.hierarchy().is_none());
    }
}
