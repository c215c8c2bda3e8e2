//! Error types for projection operations.

use thiserror::Error;

/// Result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Errors raised while building or evaluating a projection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// A projection parameter is outside its valid range.
    #[error("invalid projection parameter '{param}': {message}")]
    InvalidParameter { param: &'static str, message: String },

    /// An input coordinate is NaN or infinite.
    #[error("non-finite coordinate ({0}, {1})")]
    NonFinite(f64, f64),

    /// An input latitude is outside [-90, 90].
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// The coordinate has no finite image under the projection.
    #[error("coordinate ({0}, {1}) cannot be projected")]
    OutOfDomain(f64, f64),
}

impl ProjectionError {
    pub(crate) fn invalid(param: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param,
            message: message.into(),
        }
    }
}
