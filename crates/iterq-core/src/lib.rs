//! Core types for iterq: errors, key equality, comparers, hierarchy
//! providers, equality-keyed collections and configuration.

#![forbid(unsafe_code)]

pub mod collections;
pub mod compare;
pub mod config;
pub mod equality;
pub mod error;
pub mod hierarchy;
pub mod prelude;

pub use error::{join_cleanup, Error, QueryError, Result};
