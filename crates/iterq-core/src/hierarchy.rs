//! Hierarchy provider interfaces.
//!
//! A provider answers "parent of" and "children of" for a node type. Sequences
//! carry at most one provider as an explicit `Option<Hierarchy<T>>`; the
//! operators crate copies it across shape-preserving combinators.

use std::fmt;
use std::sync::Arc;

/// External capability exposing parent/children relations over `T`.
///
/// Implementations are consumed read-only and may be shared between many
/// sequences at once.
pub trait HierarchyProvider<T> {
    fn parent(&self, node: &T) -> Option<T>;
    fn children(&self, node: &T) -> Vec<T>;
}

/// Shared handle to a hierarchy provider.
pub struct Hierarchy<T> {
    provider: Arc<dyn HierarchyProvider<T>>,
}

impl<T> Hierarchy<T> {
    pub fn new<P>(provider: P) -> Self
    where
        P: HierarchyProvider<T> + 'static,
    {
        Self {
            provider: Arc::new(provider),
        }
    }

    pub fn from_arc(provider: Arc<dyn HierarchyProvider<T>>) -> Self {
        Self { provider }
    }

    pub fn parent(&self, node: &T) -> Option<T> {
        self.provider.parent(node)
    }

    pub fn children(&self, node: &T) -> Vec<T> {
        self.provider.children(node)
    }

    /// True when both handles share the same provider instance.
    pub fn same_provider(&self, other: &Hierarchy<T>) -> bool {
        Arc::ptr_eq(&self.provider, &other.provider)
    }
}

impl<T> Clone for Hierarchy<T> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<T> fmt::Debug for Hierarchy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hierarchy").finish_non_exhaustive()
    }
}

/// Provider assembled from two closures.
pub struct FnHierarchy<P, C> {
    parent: P,
    children: C,
}

impl<T, P, C> HierarchyProvider<T> for FnHierarchy<P, C>
where
    P: Fn(&T) -> Option<T>,
    C: Fn(&T) -> Vec<T>,
{
    fn parent(&self, node: &T) -> Option<T> {
        (self.parent)(node)
    }

    fn children(&self, node: &T) -> Vec<T> {
        (self.children)(node)
    }
}

/// Build a [`Hierarchy`] from a parent lookup and a children lookup.
pub fn hierarchy_fn<T, P, C>(parent: P, children: C) -> Hierarchy<T>
where
    T: 'static,
    P: Fn(&T) -> Option<T> + 'static,
    C: Fn(&T) -> Vec<T> + 'static,
{
    Hierarchy::new(FnHierarchy { parent, children })
}
