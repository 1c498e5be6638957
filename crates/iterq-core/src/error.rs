use thiserror::Error;

/// Canonical result for every iterq crate that produces or consumes sequences.
pub type Result<T> = std::result::Result<T, Error>;

pub type QueryError = Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Wrong-shaped argument: an unclassifiable source, a missing hierarchy,
    /// an unknown operator name or malformed operator arguments.
    #[error("Invalid argument: {0}")]
    Type(String),

    /// Counts and sizes outside their valid range.
    #[error("Argument out of range: {0}")]
    Range(String),

    #[error("Sequence already consumed: a one-shot source can only be opened once")]
    Consumed,

    /// Raised by a user callback (predicate, selector, comparer).
    #[error("Callback failed: {0}")]
    Callback(String),

    /// Raised by a source cursor while producing elements.
    #[error("Source failed: {0}")]
    Source(String),

    #[error(transparent)]
    External(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Sequence contains no elements ({0})")]
    Empty(&'static str),

    #[error("Sequence contains more than one matching element")]
    NotSingle,

    /// An element error whose cleanup afterwards failed as well. Neither
    /// error is dropped.
    #[error("{error} (cleanup also failed: {cleanup})")]
    Cleanup { error: Box<Error>, cleanup: Box<Error> },
}

impl Error {
    /// TypeKind error naming the offending parameter.
    pub fn invalid_argument(param: &str, message: impl AsRef<str>) -> Self {
        Error::Type(format!("{}: {}", message.as_ref(), param))
    }

    /// RangeKind error naming the offending parameter.
    pub fn out_of_range(param: &str, message: impl AsRef<str>) -> Self {
        Error::Range(format!("{}: {}", message.as_ref(), param))
    }

    pub fn callback(message: impl Into<String>) -> Self {
        Error::Callback(message.into())
    }

    pub fn source(message: impl Into<String>) -> Self {
        Error::Source(message.into())
    }

    pub fn external<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::External(Box::new(err))
    }

    /// Attach the outcome of a cleanup step to an in-flight error.
    ///
    /// A successful cleanup leaves the error untouched.
    pub fn with_cleanup(self, cleanup: Result<()>) -> Self {
        match cleanup {
            Ok(()) => self,
            Err(cleanup) => Error::Cleanup {
                error: Box::new(self),
                cleanup: Box::new(cleanup),
            },
        }
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, Error::Type(_))
    }

    pub fn is_range_error(&self) -> bool {
        matches!(self, Error::Range(_))
    }
}

/// Merge the results of two cleanup steps that must both be attempted.
pub fn join_cleanup(first: Result<()>, second: Result<()>) -> Result<()> {
    match (first, second) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Err(first), second) => Err(first.with_cleanup(second)),
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Source(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_cleanup_keeps_original_on_success() {
        let err = Error::callback("boom").with_cleanup(Ok(()));
        assert!(matches!(err, Error::Callback(ref m) if m == "boom"));
    }

    #[test]
    fn test_with_cleanup_surfaces_both_errors() {
        let err = Error::callback("boom").with_cleanup(Err(Error::source("close failed")));
        match err {
            Error::Cleanup { error, cleanup } => {
                assert!(matches!(*error, Error::Callback(_)));
                assert!(matches!(*cleanup, Error::Source(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_join_cleanup_attempts_both() {
        assert!(join_cleanup(Ok(()), Ok(())).is_ok());
        let err = join_cleanup(Err(Error::source("left")), Err(Error::source("right")))
            .expect_err("both failed");
        assert!(matches!(err, Error::Cleanup { .. }));
    }

    #[test]
    fn test_argument_messages_name_the_parameter() {
        let err = Error::invalid_argument("predicate", "Function expected");
        assert_eq!(err.to_string(), "Invalid argument: Function expected: predicate");
        assert!(err.is_type_error());
        assert!(Error::out_of_range("count", "Non-negative integer expected").is_range_error());
    }
}
