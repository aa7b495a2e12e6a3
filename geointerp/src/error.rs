//! Error types shared by the whole crate.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The shape of an input does not match the shape of another input it
    /// must be consistent with.
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    /// An argument has a value outside the set accepted by the operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A query coordinate lies outside a non-circular axis while
    /// `bounds_error` was requested.
    #[error("coordinate {coordinate} is out of the axis domain [{min}, {max}]")]
    OutOfDomain {
        /// The offending coordinate.
        coordinate: f64,
        /// Lower end of the axis domain.
        min: f64,
        /// Upper end of the axis domain.
        max: f64,
    },
    /// The operation requires a regular (evenly spaced) axis.
    #[error("axis values are not evenly spaced")]
    NotRegular,
    /// A dense linear system has no unique solution.
    #[error("linear system is singular")]
    SingularSystem,
    /// The requested thread pool could not be created.
    #[error("unable to create the thread pool: {0}")]
    ThreadPool(String),
}

/// Alias for `Result` with this crate's [`enum@Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
