//! YAML pipeline documents.
//!
//! Example:
//! ```yaml
//! config:
//!   default_page_size: 20
//! steps:
//!   - op: filter
//!     expr: "age >= 30"
//!   - op: order_by
//!     keys: [{ key: name }]
//!   - op: select
//!     fields: [name, age]
//!   - reverse
//! ```
//!
//! A step is either a bare operator name or a mapping whose `op` entry names
//! the operator and whose remaining entries are its arguments.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use iterq_core::config::{InputFormat, QueryConfig};

use crate::error::{PlanError, Result};
use crate::pipeline::{ParsedPipeline, Step};

#[derive(Debug, Clone, Deserialize)]
struct Pipeline {
    #[serde(default)]
    config: Option<PipelineConfig>,
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawStep {
    Bare(String),
    Tagged {
        op: String,
        #[serde(flatten)]
        args: Map<String, Value>,
    },
}

/// Per-pipeline overrides layered over the environment configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub input_format: Option<InputFormat>,
    pub pretty: Option<bool>,
    pub output_limit: Option<usize>,
    pub default_page_size: Option<usize>,
    pub log_level: Option<String>,
}

impl PipelineConfig {
    pub fn apply(&self, mut base: QueryConfig) -> QueryConfig {
        if let Some(v) = self.input_format {
            base.input_format = v;
        }
        if let Some(v) = self.pretty {
            base.pretty = v;
        }
        if let Some(v) = self.output_limit {
            base.output_limit = Some(v);
        }
        if let Some(v) = self.default_page_size {
            base.default_page_size = v;
        }
        if let Some(v) = &self.log_level {
            base.log_level = v.clone();
        }
        base
    }
}

/// Parse a pipeline, layering its `config:` block over [`QueryConfig::from_env`].
pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<ParsedPipeline> {
    parse_yaml_pipeline_with(yaml_src, QueryConfig::from_env())
}

/// Parse a pipeline over an explicit base configuration.
pub fn parse_yaml_pipeline_with(yaml_src: &str, base: QueryConfig) -> Result<ParsedPipeline> {
    let doc: Pipeline = serde_yaml::from_str(yaml_src)?;
    let overrides = doc.config.unwrap_or_default();
    if overrides.default_page_size == Some(0) {
        return Err(PlanError::Invalid("default_page_size must be positive".into()));
    }

    let mut steps = Vec::with_capacity(doc.steps.len());
    for (index, raw) in doc.steps.into_iter().enumerate() {
        let (op, args) = match raw {
            RawStep::Bare(op) => (op, Map::new()),
            RawStep::Tagged { op, args } => (op, args),
        };
        let op = op.trim().to_string();
        if op.is_empty() {
            return Err(PlanError::Invalid(format!("step {index} has an empty op")));
        }
        steps.push(Step {
            op,
            args: Value::Object(args),
        });
    }

    Ok(ParsedPipeline {
        steps,
        config: overrides.apply(base),
        overrides,
    })
}
