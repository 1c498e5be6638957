#![forbid(unsafe_code)]
//! iterq-planner: YAML pipelines over the operator registry.
//!
//! A pipeline is a linear list of registry steps. Parsing only checks shape;
//! `validate` runs every step constructor against an empty source so argument
//! errors surface before any input is read; `build` wraps a real source.

pub mod dsl;
pub mod error;
pub mod pipeline;

pub use dsl::yaml::{parse_yaml_pipeline, parse_yaml_pipeline_with, PipelineConfig};
pub use error::{PlanError, Result};
pub use pipeline::{ParsedPipeline, Step};
