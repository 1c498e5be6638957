//! A parsed pipeline: registry steps plus the effective configuration.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use iterq_core::config::QueryConfig;
use iterq_operators::registry::{JsonSeq, Registry, StepArgs};

use crate::dsl::yaml::PipelineConfig;
use crate::error::{PlanError, Result};

/// One registry invocation: operator name and its argument object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub op: String,
    pub args: Value,
}

#[derive(Debug, Clone)]
pub struct ParsedPipeline {
    pub steps: Vec<Step>,
    /// Effective configuration: base config with the pipeline's overrides applied.
    pub config: QueryConfig,
    /// The pipeline's own `config:` block, as written.
    pub overrides: PipelineConfig,
}

impl ParsedPipeline {
    /// Run every step constructor against an empty source. Nothing is read.
    pub fn validate(&self, registry: &Registry) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            registry
                .check(&step.op, StepArgs::new(&step.args, &self.config))
                .map_err(|source| step_error(index, step, source))?;
        }
        Ok(())
    }

    /// Wrap `source` in each step in order. The result is still lazy.
    pub fn build(&self, source: JsonSeq, registry: &Registry) -> Result<JsonSeq> {
        let mut current = source;
        for (index, step) in self.steps.iter().enumerate() {
            current = registry
                .apply(&step.op, current, StepArgs::new(&step.args, &self.config))
                .map_err(|source| step_error(index, step, source))?;
            tracing::debug!(index, op = %step.op, "pipeline step constructed");
        }
        tracing::debug!(steps = self.steps.len(), "pipeline built");
        Ok(current)
    }

    /// Human-readable listing of the steps and the effective configuration.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "pipeline: {} step(s)", self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            match &step.args {
                Value::Object(map) if map.is_empty() => {
                    let _ = writeln!(out, "  [{index}] {}", step.op);
                }
                args => {
                    let _ = writeln!(out, "  [{index}] {} {}", step.op, args);
                }
            }
        }
        let cfg = &self.config;
        let limit = cfg
            .output_limit
            .map_or_else(|| "none".to_string(), |n| n.to_string());
        let _ = writeln!(
            out,
            "config: input_format={:?} pretty={} output_limit={} default_page_size={}",
            cfg.input_format, cfg.pretty, limit, cfg.default_page_size
        );
        out
    }
}

fn step_error(index: usize, step: &Step, source: iterq_core::Error) -> PlanError {
    PlanError::Step {
        index,
        op: step.op.clone(),
        source,
    }
}
