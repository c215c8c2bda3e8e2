//! Error types for the kcell pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using KcellError.
pub type KcellResult<T> = Result<T, KcellError>;

/// Fatal pipeline errors.
///
/// Data-quality problems (malformed reference lines, zero matches, fewer
/// matches than requested) are counted in the diagnostics instead.
#[derive(Debug, Error)]
pub enum KcellError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("point-source file error: {0}")]
    PointSource(#[from] uamiv_parser::UamivError),

    #[error("missing variable '{0}' in point-source data")]
    MissingVariable(String),

    #[error("variable '{name}' has {found} stacks at time step {step}, expected {expected}")]
    ShapeMismatch {
        name: String,
        step: usize,
        found: usize,
        expected: usize,
    },

    #[error("variable '{name}' has {found} time steps, expected {expected}")]
    StepMismatch {
        name: String,
        found: usize,
        expected: usize,
    },

    #[error("point-source data has no time steps")]
    NoTimeSteps,

    #[error("projection error: {0}")]
    Projection(#[from] projection::ProjectionError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("KML error: {0}")]
    Kml(#[from] quick_xml::Error),
}

impl KcellError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
