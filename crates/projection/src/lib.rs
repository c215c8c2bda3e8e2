//! Coordinate reference system transformations.
//!
//! Implements the spherical Lambert Conformal Conic projection used by
//! CAMx/CMAQ continental grids, without external dependencies.

pub mod error;
pub mod lambert;

pub use error::{ProjectionError, ProjectionResult};
pub use lambert::{LambertConformal, LccParams};
