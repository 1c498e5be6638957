use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlanError>;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("pipeline yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid pipeline: {0}")]
    Invalid(String),

    /// A step constructor rejected its arguments or its source.
    #[error("step {index} ({op}): {source}")]
    Step {
        index: usize,
        op: String,
        #[source]
        source: iterq_core::Error,
    },
}

impl PlanError {
    /// The query-level error behind a step failure, if any.
    pub fn query_error(&self) -> Option<&iterq_core::Error> {
        match self {
            PlanError::Step { source, .. } => Some(source),
            _ => None,
        }
    }
}
