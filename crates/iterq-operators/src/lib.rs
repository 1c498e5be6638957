#![forbid(unsafe_code)]
//! iterq-operators: lazy synchronous combinators over pull cursors.
//!
//! Design intent:
//! - Constructing an operator never touches its upstream; the first pull does.
//! - Every cursor that opened an upstream closes it exactly once when stopped
//!   before exhaustion, and never closes an exhausted one.
//! - Shape-preserving operators forward the source hierarchy; shape-changing
//!   ones drop it unless re-attached with `to_hierarchy`.

pub mod callback;
pub mod cursor;
pub mod ext;
pub mod json;
pub mod metrics;
pub mod registry;
pub mod source;
pub mod terminal;
pub mod traits;

pub mod concat;
pub mod expr;
pub mod filter;
pub mod flow;
pub mod hierarchy;
pub mod map;
pub mod passthrough;
pub mod set;
pub mod slice;
pub mod split;
pub mod zip;

pub mod group;
pub mod join;
pub mod sort;
pub mod window;

pub use cursor::{drive, Deferred, Iter, Upstream};
pub use ext::SequenceExt;
pub use flow::{flow_hierarchy, to_hierarchy, Flow};
pub use group::{build_groupings, Grouping, Lookup};
pub use hierarchy::Axis;
pub use registry::{JsonSeq, Registry, StepArgs};
pub use sort::{Ordered, SortLevel};
pub use split::{break_when, span, Prefix, Remainder};
pub use traits::{BoxCursor, BoxedSequence, Cursor, DynSequence, Sequence};
pub use window::Page;
