#![forbid(unsafe_code)]
//! iterq-async: the cursor protocol with awaited pulls.
//!
//! Pulls are strictly sequential: an async callback's future completes before
//! the next element is requested, so output order always equals source order.
//! Closing stays synchronous, and an upstream dropped mid-await is closed by
//! its guard.

pub mod cursor;
pub mod ext;
pub mod source;
pub mod terminal;
pub mod traits;

pub mod combine;
pub mod filter;
pub mod flow;
pub mod group;
pub mod map;
pub mod passthrough;
pub mod set;
pub mod slice;
pub mod sort;
pub mod split;

#[cfg(test)]
mod testing;

pub use cursor::{settle, AsyncIter, Deferred, Upstream};
pub use ext::AsyncSequenceExt;
pub use flow::{flow_hierarchy, to_hierarchy, Flow};
pub use source::{from_future, from_stream, from_try_stream, from_vec, lift, Lift};
pub use split::{break_when, break_when_async, span, span_async, Prefix, Remainder};
pub use traits::{AsyncCursor, AsyncSequence};
