//! Error type shared by every fallible operation in the crate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A caller-supplied value is outside the accepted domain
    /// (empty key, zero bound, unknown algorithm tag, oversized request).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The platform cannot provide a required primitive, usually the OS CSPRNG.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// A known-answer check failed.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<getrandom::Error> for Error {
    fn from(err: getrandom::Error) -> Self {
        Self::UnsupportedPlatform(format!("OS CSPRNG failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
