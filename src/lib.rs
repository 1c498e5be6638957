#![forbid(unsafe_code)]
//! iterq: lazy LINQ-style combinators over sync and async sequences.
//!
//! This crate only re-exports the workspace members; see each crate for the
//! details.

pub use iterq_async;
pub use iterq_core;
pub use iterq_operators;
pub use iterq_planner;

pub use iterq_core::prelude;
pub use iterq_async::{AsyncCursor, AsyncSequence, AsyncSequenceExt};
pub use iterq_core::{Error, QueryError, Result};
pub use iterq_operators::{BoxedSequence, Cursor, Registry, Sequence, SequenceExt};
