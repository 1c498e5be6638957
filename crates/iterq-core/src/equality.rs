//! Key equality shared by grouping, lookups and set operators.
//!
//! The default notion is total: NaN equals NaN, and +0.0 equals -0.0.
//! Everything else compares structurally. Callers that need other semantics
//! (identity, case-insensitive, ...) pass their own [`Equaler`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

/// Equality + hashing contract used for keys.
///
/// Invariant: `a.key_eq(b)` implies equal `key_hash` output.
pub trait KeyEq {
    fn key_eq(&self, other: &Self) -> bool;
    fn key_hash<H: Hasher>(&self, state: &mut H);
}

macro_rules! key_eq_via_eq {
    ($($t:ty),* $(,)?) => {
        $(
            impl KeyEq for $t {
                fn key_eq(&self, other: &Self) -> bool {
                    self == other
                }
                fn key_hash<H: Hasher>(&self, state: &mut H) {
                    self.hash(state)
                }
            }
        )*
    };
}

key_eq_via_eq!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, String, str
);

const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

fn f64_bits(v: f64) -> u64 {
    if v.is_nan() {
        CANONICAL_NAN
    } else if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

fn f64_eq(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

impl KeyEq for f64 {
    fn key_eq(&self, other: &Self) -> bool {
        f64_eq(*self, *other)
    }
    fn key_hash<H: Hasher>(&self, state: &mut H) {
        f64_bits(*self).hash(state)
    }
}

impl KeyEq for f32 {
    fn key_eq(&self, other: &Self) -> bool {
        f64_eq(*self as f64, *other as f64)
    }
    fn key_hash<H: Hasher>(&self, state: &mut H) {
        f64_bits(*self as f64).hash(state)
    }
}

impl<T: KeyEq + ?Sized> KeyEq for &T {
    fn key_eq(&self, other: &Self) -> bool {
        (**self).key_eq(*other)
    }
    fn key_hash<H: Hasher>(&self, state: &mut H) {
        (**self).key_hash(state)
    }
}

impl<T: KeyEq + ?Sized> KeyEq for Box<T> {
    fn key_eq(&self, other: &Self) -> bool {
        (**self).key_eq(&**other)
    }
    fn key_hash<H: Hasher>(&self, state: &mut H) {
        (**self).key_hash(state)
    }
}

impl<T: KeyEq + ?Sized> KeyEq for Arc<T> {
    fn key_eq(&self, other: &Self) -> bool {
        (**self).key_eq(&**other)
    }
    fn key_hash<H: Hasher>(&self, state: &mut H) {
        (**self).key_hash(state)
    }
}

impl<T: KeyEq + ?Sized> KeyEq for Rc<T> {
    fn key_eq(&self, other: &Self) -> bool {
        (**self).key_eq(&**other)
    }
    fn key_hash<H: Hasher>(&self, state: &mut H) {
        (**self).key_hash(state)
    }
}

impl<T: KeyEq> KeyEq for Option<T> {
    fn key_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.key_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
    fn key_hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Some(v) => {
                1u8.hash(state);
                v.key_hash(state);
            }
            None => 0u8.hash(state),
        }
    }
}

impl<T: KeyEq> KeyEq for [T] {
    fn key_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.key_eq(b))
    }
    fn key_hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for v in self {
            v.key_hash(state);
        }
    }
}

impl<T: KeyEq> KeyEq for Vec<T> {
    fn key_eq(&self, other: &Self) -> bool {
        self.as_slice().key_eq(other.as_slice())
    }
    fn key_hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().key_hash(state)
    }
}

macro_rules! key_eq_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: KeyEq),+> KeyEq for ($($name,)+) {
            fn key_eq(&self, other: &Self) -> bool {
                $(self.$idx.key_eq(&other.$idx))&&+
            }
            fn key_hash<HS: Hasher>(&self, state: &mut HS) {
                $(self.$idx.key_hash(state);)+
            }
        }
    };
}

key_eq_tuple!(A 0, B 1);
key_eq_tuple!(A 0, B 1, C 2);
key_eq_tuple!(A 0, B 1, C 2, D 3);

impl KeyEq for serde_json::Value {
    fn key_eq(&self, other: &Self) -> bool {
        use serde_json::Value;
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                    x == y
                } else if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
                    x == y
                } else {
                    match (a.as_f64(), b.as_f64()) {
                        (Some(x), Some(y)) => f64_eq(x, y),
                        _ => false,
                    }
                }
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.key_eq(b),
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map(|w| v.key_eq(w)).unwrap_or(false))
            }
            _ => false,
        }
    }

    fn key_hash<H: Hasher>(&self, state: &mut H) {
        use serde_json::Value;
        match self {
            Value::Null => 0u8.hash(state),
            Value::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Value::Number(n) => {
                2u8.hash(state);
                f64_bits(n.as_f64().unwrap_or(f64::NAN)).hash(state);
            }
            Value::String(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            Value::Array(items) => {
                4u8.hash(state);
                items.key_hash(state);
            }
            Value::Object(map) => {
                // Order-insensitive: combine per-entry hashes commutatively.
                5u8.hash(state);
                map.len().hash(state);
                let mut acc = 0u64;
                for (k, v) in map {
                    let mut h = DefaultHasher::new();
                    k.hash(&mut h);
                    v.key_hash(&mut h);
                    acc = acc.wrapping_add(h.finish());
                }
                acc.hash(state);
            }
        }
    }
}

/// Pluggable equality used by set and grouping operators.
pub trait Equaler<T: ?Sized> {
    fn equals(&self, a: &T, b: &T) -> bool;
    fn hash(&self, value: &T) -> u64;
}

/// The library-wide default equality, backed by [`KeyEq`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyEquality;

impl<T: KeyEq + ?Sized> Equaler<T> for KeyEquality {
    fn equals(&self, a: &T, b: &T) -> bool {
        a.key_eq(b)
    }

    fn hash(&self, value: &T) -> u64 {
        let mut h = DefaultHasher::new();
        value.key_hash(&mut h);
        h.finish()
    }
}

/// Identity equality for shared nodes: two `Arc`s are equal only when they
/// point at the same allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByAddress;

impl<T: ?Sized> Equaler<Arc<T>> for ByAddress {
    fn equals(&self, a: &Arc<T>, b: &Arc<T>) -> bool {
        Arc::ptr_eq(a, b)
    }

    fn hash(&self, value: &Arc<T>) -> u64 {
        let mut h = DefaultHasher::new();
        (Arc::as_ptr(value) as *const () as usize).hash(&mut h);
        h.finish()
    }
}

/// Equaler assembled from a pair of closures.
#[derive(Clone)]
pub struct FnEqualer<E, H> {
    eq: E,
    hash: H,
}

pub fn equaler_fn<T, E, H>(eq: E, hash: H) -> FnEqualer<E, H>
where
    T: ?Sized,
    E: Fn(&T, &T) -> bool,
    H: Fn(&T) -> u64,
{
    FnEqualer { eq, hash }
}

impl<T, E, H> Equaler<T> for FnEqualer<E, H>
where
    T: ?Sized,
    E: Fn(&T, &T) -> bool,
    H: Fn(&T) -> u64,
{
    fn equals(&self, a: &T, b: &T) -> bool {
        (self.eq)(a, b)
    }

    fn hash(&self, value: &T) -> u64 {
        (self.hash)(value)
    }
}
