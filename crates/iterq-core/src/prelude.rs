//! Convenient re-exports for downstream crates.

pub use crate::collections::{EqualityMap, EqualitySet};
pub use crate::compare::{Comparer, Direction, NaturalOrder};
pub use crate::config::{InputFormat, QueryConfig};
pub use crate::equality::{equaler_fn, ByAddress, Equaler, KeyEq, KeyEquality};
pub use crate::error::{Error, QueryError, Result};
pub use crate::hierarchy::{hierarchy_fn, Hierarchy, HierarchyProvider};
