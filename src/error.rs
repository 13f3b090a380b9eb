use std::error::Error as StdError;
use std::result::Result as StdResult;

/// A specialized `Result` type for sqlmeta.
pub type Result<T> = StdResult<T, Error>;

// Convenience type alias for usage within sqlmeta.
pub(crate) type BoxDynError = Box<dyn StdError + 'static + Send + Sync>;

/// Represents all the ways a metadata fetch can fail.
///
/// Every variant is terminal for the current parse/fetch call: the caller
/// receives either a complete descriptor array or one of these, never a
/// partial array. Nothing here is retried.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The statement's leading keyword is not one we know how to decompose.
    #[error("unsupported statement syntax: expected SELECT, INSERT, UPDATE or DELETE, got `{0}`")]
    UnsupportedStatement(String),

    /// The connected server predates the minimum this dialect's metadata
    /// protocol supports.
    #[error("server version {actual} is below the minimum supported version {required}")]
    UnsupportedServerVersion { required: String, actual: String },

    /// The decomposer could not locate a single table in the statement.
    #[error(
        "no tables could be found in the statement; \
         check the SQL syntax or try a simpler form of the query"
    )]
    NoTableFound,

    /// The number of bound values does not match the number of `?` markers.
    #[error("{}", placeholder_mismatch(*.expected, *.supplied))]
    PlaceholderCountMismatch { expected: usize, supplied: usize },

    /// Error propagated verbatim from the Executor collaborator.
    #[error("error from executor: {0}")]
    Executor(#[source] BoxDynError),
}

impl Error {
    pub(crate) fn executor<E>(err: E) -> Self
    where
        E: StdError + 'static + Send + Sync,
    {
        Error::Executor(Box::new(err))
    }
}

fn placeholder_mismatch(expected: usize, supplied: usize) -> String {
    if supplied > expected {
        let diff = supplied - expected;
        if diff > 1 {
            format!("parameter mismatch: {diff} too many values bound for {expected} placeholder(s)")
        } else {
            format!("parameter mismatch: one too many values bound for {expected} placeholder(s)")
        }
    } else {
        let diff = expected - supplied;
        if diff > 1 {
            format!("parameter mismatch: {diff} too few values bound for {expected} placeholder(s)")
        } else {
            format!("parameter mismatch: one missing value for {expected} placeholder(s)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_message_states_direction_and_delta() {
        let too_many = Error::PlaceholderCountMismatch { expected: 2, supplied: 5 };
        assert!(too_many.to_string().contains("3 too many"));

        let one_extra = Error::PlaceholderCountMismatch { expected: 1, supplied: 2 };
        assert!(one_extra.to_string().contains("one too many"));

        let too_few = Error::PlaceholderCountMismatch { expected: 4, supplied: 1 };
        assert!(too_few.to_string().contains("3 too few"));

        let one_short = Error::PlaceholderCountMismatch { expected: 3, supplied: 2 };
        assert!(one_short.to_string().contains("one missing"));
    }
}
