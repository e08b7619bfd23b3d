//! Error kinds surfaced by a `find_arbitrages` invocation.
//!
//! Only three conditions abort an invocation: the oracle transport dying,
//! a broken path-chaining invariant, and caller-initiated cancellation.
//! Everything else (a reverted quote, a token without a price, a graph with
//! fewer than two tokens) is recovered locally and never becomes an error
//! value.

use thiserror::Error;

/// Fatal failure of a single `find_arbitrages` invocation.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying RPC transport failed for the whole batch. No partial
    /// results are produced.
    #[error("quote oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// A path operation violated the token-chaining invariant. This is a
    /// programming error in the caller or in a search kernel, never a
    /// market condition.
    #[error("invariant violated: {0}")]
    InvariantViolated(String),

    /// The caller cancelled the invocation. No results are produced.
    #[error("invocation cancelled")]
    Cancelled,
}

impl Error {
    /// Wrap a transport-level failure, preserving its message.
    pub fn oracle<E: std::fmt::Display>(err: E) -> Self {
        Error::OracleUnavailable(err.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::oracle("connection refused");
        assert_eq!(
            err.to_string(),
            "quote oracle unavailable: connection refused"
        );

        let err = Error::InvariantViolated("hop does not chain".to_string());
        assert!(err.to_string().contains("hop does not chain"));

        assert_eq!(Error::Cancelled.to_string(), "invocation cancelled");
    }
}
