//! Nameable wrappers around user callbacks.
//!
//! Operators are generic over [`Predicate`] / [`Selector`] rather than raw
//! closures so the indexed and fallible flavours share one operator type.

use iterq_core::Result;

pub trait Predicate<T: ?Sized> {
    fn test(&self, item: &T, index: usize) -> Result<bool>;
}

pub trait Selector<T, U> {
    fn select(&self, item: T, index: usize) -> Result<U>;
}

/// `Fn(&T) -> bool`
#[derive(Clone, Copy)]
pub struct Pred<F>(pub F);

/// `Fn(&T, usize) -> bool`
#[derive(Clone, Copy)]
pub struct PredIndexed<F>(pub F);

/// `Fn(&T) -> Result<bool>`
#[derive(Clone, Copy)]
pub struct TryPred<F>(pub F);

/// Logical negation of another predicate.
#[derive(Clone, Copy)]
pub struct Not<P>(pub P);

impl<T: ?Sized, F: Fn(&T) -> bool> Predicate<T> for Pred<F> {
    fn test(&self, item: &T, _index: usize) -> Result<bool> {
        Ok((self.0)(item))
    }
}

impl<T: ?Sized, F: Fn(&T, usize) -> bool> Predicate<T> for PredIndexed<F> {
    fn test(&self, item: &T, index: usize) -> Result<bool> {
        Ok((self.0)(item, index))
    }
}

impl<T: ?Sized, F: Fn(&T) -> Result<bool>> Predicate<T> for TryPred<F> {
    fn test(&self, item: &T, _index: usize) -> Result<bool> {
        (self.0)(item)
    }
}

impl<T: ?Sized, P: Predicate<T>> Predicate<T> for Not<P> {
    fn test(&self, item: &T, index: usize) -> Result<bool> {
        self.0.test(item, index).map(|b| !b)
    }
}

/// `Fn(T) -> U`
#[derive(Clone, Copy)]
pub struct Sel<F>(pub F);

/// `Fn(T, usize) -> U`
#[derive(Clone, Copy)]
pub struct SelIndexed<F>(pub F);

/// `Fn(T) -> Result<U>`
#[derive(Clone, Copy)]
pub struct TrySel<F>(pub F);

impl<T, U, F: Fn(T) -> U> Selector<T, U> for Sel<F> {
    fn select(&self, item: T, _index: usize) -> Result<U> {
        Ok((self.0)(item))
    }
}

impl<T, U, F: Fn(T, usize) -> U> Selector<T, U> for SelIndexed<F> {
    fn select(&self, item: T, index: usize) -> Result<U> {
        Ok((self.0)(item, index))
    }
}

impl<T, U, F: Fn(T) -> Result<U>> Selector<T, U> for TrySel<F> {
    fn select(&self, item: T, _index: usize) -> Result<U> {
        (self.0)(item)
    }
}
