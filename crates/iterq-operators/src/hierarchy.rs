//! Hierarchy traversal over sequences carrying a provider.
//!
//! Every axis expands each source element lazily while pulling and keeps the
//! provider on its result, so traversals chain.

use std::collections::VecDeque;

use iterq_core::collections::EqualitySet;
use iterq_core::equality::KeyEq;
use iterq_core::hierarchy::Hierarchy;
use iterq_core::{Error, Result};

use crate::cursor::Upstream;
use crate::metrics;
use crate::traits::{Cursor, Sequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Root,
    Ancestors,
    AncestorsAndSelf,
    Parents,
    Self_,
    Children,
    NthChild(usize),
    Siblings,
    SiblingsAndSelf,
    PrecedingSiblings,
    FollowingSiblings,
    Descendants,
    DescendantsAndSelf,
}

fn require_hierarchy<S: Sequence + ?Sized>(source: &S) -> Result<Hierarchy<S::Item>> {
    source
        .hierarchy()
        .ok_or_else(|| Error::invalid_argument("source", "Hierarchy expected"))
}

pub struct Traverse<S: Sequence> {
    source: S,
    axis: Axis,
    hierarchy: Hierarchy<S::Item>,
}

impl<S: Sequence> Traverse<S> {
    /// Fails with a TypeKind error when `source` carries no hierarchy.
    pub fn new(source: S, axis: Axis) -> Result<Self> {
        let hierarchy = require_hierarchy(&source)?;
        Ok(Self {
            source,
            axis,
            hierarchy,
        })
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }
}

impl<S> Sequence for Traverse<S>
where
    S: Sequence,
    S::Item: Clone + KeyEq,
{
    type Item = S::Item;
    type Cursor = TraverseCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(TraverseCursor {
            upstream: Upstream::new(self.source.open()?),
            axis: self.axis,
            hierarchy: self.hierarchy.clone(),
            expansion: Expansion::Idle,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        Some(self.hierarchy.clone())
    }
}

enum Expansion<T> {
    Idle,
    Queue(VecDeque<T>),
    Ancestors(Option<T>),
    Descendants {
        first: Option<T>,
        stack: Vec<std::vec::IntoIter<T>>,
    },
}

pub struct TraverseCursor<C: Cursor> {
    upstream: Upstream<C>,
    axis: Axis,
    hierarchy: Hierarchy<C::Item>,
    expansion: Expansion<C::Item>,
}

impl<C> TraverseCursor<C>
where
    C: Cursor,
    C::Item: Clone + KeyEq,
{
    fn expand(&self, node: C::Item) -> Expansion<C::Item> {
        let h = &self.hierarchy;
        match self.axis {
            Axis::Root => {
                let mut top = node;
                while let Some(parent) = h.parent(&top) {
                    top = parent;
                }
                Expansion::Queue(VecDeque::from([top]))
            }
            Axis::Ancestors => Expansion::Ancestors(h.parent(&node)),
            Axis::AncestorsAndSelf => Expansion::Ancestors(Some(node)),
            Axis::Parents => Expansion::Queue(h.parent(&node).into_iter().collect()),
            Axis::Self_ => Expansion::Queue(VecDeque::from([node])),
            Axis::Children => Expansion::Queue(h.children(&node).into()),
            Axis::NthChild(n) => {
                Expansion::Queue(h.children(&node).into_iter().nth(n).into_iter().collect())
            }
            Axis::Siblings
            | Axis::SiblingsAndSelf
            | Axis::PrecedingSiblings
            | Axis::FollowingSiblings => Expansion::Queue(self.siblings(node)),
            Axis::Descendants => Expansion::Descendants {
                first: None,
                stack: vec![h.children(&node).into_iter()],
            },
            Axis::DescendantsAndSelf => Expansion::Descendants {
                stack: vec![h.children(&node).into_iter()],
                first: Some(node),
            },
        }
    }

    fn siblings(&self, node: C::Item) -> VecDeque<C::Item> {
        let Some(parent) = self.hierarchy.parent(&node) else {
            return match self.axis {
                Axis::SiblingsAndSelf => VecDeque::from([node]),
                _ => VecDeque::new(),
            };
        };
        let children = self.hierarchy.children(&parent);
        let pos = children.iter().position(|c| c.key_eq(&node));
        children
            .into_iter()
            .enumerate()
            .filter(|(i, _)| match (self.axis, pos) {
                (Axis::SiblingsAndSelf, _) => true,
                (Axis::Siblings, Some(p)) => *i != p,
                (Axis::PrecedingSiblings, Some(p)) => *i < p,
                (Axis::FollowingSiblings, Some(p)) => *i > p,
                (Axis::Siblings, None) => true,
                _ => false,
            })
            .map(|(_, c)| c)
            .collect()
    }
}

impl<C> Cursor for TraverseCursor<C>
where
    C: Cursor,
    C::Item: Clone + KeyEq,
{
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        loop {
            let next = match &mut self.expansion {
                Expansion::Idle => None,
                Expansion::Queue(queue) => queue.pop_front(),
                Expansion::Ancestors(current) => match current.take() {
                    Some(node) => {
                        *current = self.hierarchy.parent(&node);
                        Some(node)
                    }
                    None => None,
                },
                Expansion::Descendants { first, stack } => match first.take() {
                    Some(node) => Some(node),
                    None => loop {
                        let Some(top) = stack.last_mut() else {
                            break None;
                        };
                        match top.next() {
                            Some(child) => {
                                stack.push(self.hierarchy.children(&child).into_iter());
                                break Some(child);
                            }
                            None => {
                                stack.pop();
                            }
                        }
                    },
                },
            };
            if next.is_some() {
                return Ok(next);
            }
            match self.upstream.pull()? {
                Some(node) => self.expansion = self.expand(node),
                None => {
                    self.expansion = Expansion::Idle;
                    return Ok(None);
                }
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("traverse");
        self.expansion = Expansion::Idle;
        self.upstream.close()
    }
}

/// `top_most` / `bottom_most`: keep elements with no ancestor (resp. no
/// descendant) among the other source elements. Source order is preserved.
pub struct Outermost<S: Sequence> {
    source: S,
    top: bool,
    hierarchy: Hierarchy<S::Item>,
}

impl<S: Sequence> Outermost<S> {
    pub fn top_most(source: S) -> Result<Self> {
        let hierarchy = require_hierarchy(&source)?;
        Ok(Self {
            source,
            top: true,
            hierarchy,
        })
    }

    pub fn bottom_most(source: S) -> Result<Self> {
        let hierarchy = require_hierarchy(&source)?;
        Ok(Self {
            source,
            top: false,
            hierarchy,
        })
    }
}

impl<S> Sequence for Outermost<S>
where
    S: Sequence,
    S::Item: Clone + KeyEq,
{
    type Item = S::Item;
    type Cursor = OutermostCursor<S::Cursor>;

    fn open(&self) -> Result<Self::Cursor> {
        Ok(OutermostCursor {
            upstream: Upstream::new(self.source.open()?),
            top: self.top,
            hierarchy: self.hierarchy.clone(),
            result: None,
        })
    }

    fn hierarchy(&self) -> Option<Hierarchy<S::Item>> {
        Some(self.hierarchy.clone())
    }
}

pub struct OutermostCursor<C: Cursor> {
    upstream: Upstream<C>,
    top: bool,
    hierarchy: Hierarchy<C::Item>,
    result: Option<std::vec::IntoIter<C::Item>>,
}

impl<C> OutermostCursor<C>
where
    C: Cursor,
    C::Item: Clone + KeyEq,
{
    fn ancestors(&self, node: &C::Item) -> Vec<C::Item> {
        let mut out = Vec::new();
        let mut current = self.hierarchy.parent(node);
        while let Some(parent) = current {
            current = self.hierarchy.parent(&parent);
            out.push(parent);
        }
        out
    }

    fn select(&self, items: Vec<C::Item>) -> Vec<C::Item> {
        if self.top {
            let mut members = EqualitySet::new();
            for item in &items {
                members.insert(item.clone());
            }
            items
                .into_iter()
                .filter(|item| !self.ancestors(item).iter().any(|a| members.contains(a)))
                .collect()
        } else {
            let mut covered = EqualitySet::new();
            for item in &items {
                for ancestor in self.ancestors(item) {
                    covered.insert(ancestor);
                }
            }
            items
                .into_iter()
                .filter(|item| !covered.contains(item))
                .collect()
        }
    }
}

impl<C> Cursor for OutermostCursor<C>
where
    C: Cursor,
    C::Item: Clone + KeyEq,
{
    type Item = C::Item;

    fn pull(&mut self) -> Result<Option<C::Item>> {
        if self.result.is_none() {
            let items = self.upstream.drain()?;
            metrics::emit_materialized("outermost", items.len());
            self.result = Some(self.select(items).into_iter());
        }
        Ok(self.result.as_mut().and_then(Iterator::next))
    }

    fn close(&mut self) -> Result<()> {
        metrics::emit_close("outermost");
        self.result = None;
        self.upstream.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::Iter;
    use crate::flow::to_hierarchy;
    use crate::source::from_vec;
    use iterq_core::hierarchy::hierarchy_fn;

    //        1
    //      / | \
    //     2  3  4
    //    / \
    //   5   6
    fn tree() -> Hierarchy<u32> {
        hierarchy_fn(
            |n: &u32| match n {
                2..=4 => Some(1),
                5 | 6 => Some(2),
                _ => None,
            },
            |n: &u32| match n {
                1 => vec![2, 3, 4],
                2 => vec![5, 6],
                _ => vec![],
            },
        )
    }

    fn walk(start: Vec<u32>, axis: Axis) -> Vec<u32> {
        let src = to_hierarchy(from_vec(start), tree());
        let seq = Traverse::new(src, axis).unwrap();
        Iter::new(seq.open().unwrap())
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_vertical_axes() {
        assert_eq!(walk(vec![6], Axis::Root), vec![1]);
        assert_eq!(walk(vec![6], Axis::Ancestors), vec![2, 1]);
        assert_eq!(walk(vec![6], Axis::AncestorsAndSelf), vec![6, 2, 1]);
        assert_eq!(walk(vec![5, 3], Axis::Parents), vec![2, 1]);
        assert_eq!(walk(vec![1], Axis::Children), vec![2, 3, 4]);
        assert_eq!(walk(vec![1], Axis::NthChild(1)), vec![3]);
        assert_eq!(walk(vec![1], Axis::Descendants), vec![2, 5, 6, 3, 4]);
        assert_eq!(walk(vec![2], Axis::DescendantsAndSelf), vec![2, 5, 6]);
    }

    #[test]
    fn test_sibling_axes() {
        assert_eq!(walk(vec![3], Axis::Siblings), vec![2, 4]);
        assert_eq!(walk(vec![3], Axis::SiblingsAndSelf), vec![2, 3, 4]);
        assert_eq!(walk(vec![3], Axis::PrecedingSiblings), vec![2]);
        assert_eq!(walk(vec![3], Axis::FollowingSiblings), vec![4]);
        assert_eq!(walk(vec![1], Axis::SiblingsAndSelf), vec![1]);
    }

    #[test]
    fn test_outermost() {
        let src = to_hierarchy(from_vec(vec![5, 2, 3, 6]), tree());
        let top = Outermost::top_most(&src).unwrap();
        let got: Vec<_> = Iter::new(top.open().unwrap()).collect::<Result<_>>().unwrap();
        assert_eq!(got, vec![2, 3]);

        let bottom = Outermost::bottom_most(&src).unwrap();
        let got: Vec<_> = Iter::new(bottom.open().unwrap()).collect::<Result<_>>().unwrap();
        assert_eq!(got, vec![5, 3, 6]);
    }

    #[test]
    fn test_missing_hierarchy_is_type_error() {
        let err = Traverse::new(from_vec(vec![1u32]), Axis::Children).err().unwrap();
        assert!(err.is_type_error());
    }
}
