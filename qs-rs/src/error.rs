//! Crate-wide error type.
//!
//! Almost nothing in the language is an error: unresolved names expand to
//! nothing, malformed numbers read as zero and failed I/O inside a script is
//! skipped.  What remains are programmer errors, the optional recursion
//! guard, and I/O failures the host front end chooses to report.

use thiserror::Error;

/// Errors surfaced by the evaluator and the host front end.
#[derive(Debug, Error)]
pub enum Error {
    /// An [`OutBuf`](crate::outbuf::OutBuf) was finalized more than once.
    #[error("output buffer already finalized")]
    InvalidState,

    /// Call nesting exceeded the configured depth limit.
    #[error("recursion limit of {limit} exceeded")]
    RecursionLimitExceeded { limit: usize },

    /// The host could not read a script it was asked to run.
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
