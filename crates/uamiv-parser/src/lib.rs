//! CAMx UAM-IV point-source file reader and writer.
//!
//! UAM-IV files are Fortran sequential unformatted files: every record is
//! framed by a 4-byte length marker on both sides. CAMx writes them
//! big-endian by default, but little-endian files produced on x86 builds
//! are common, so the byte order is detected from the first record.
//!
//! # Point-Source Layout
//!
//! ```text
//! header       name(10) note(60) ione nspec ibdate btime iedate etime
//! region       plon plat iutm xorg yorg delx dely nx ny nz iproj istag tlat1 tlat2 rdum
//! segment      ione ione nx ny
//! species      name(10) x nspec
//! stack count  ione nstk
//! stacks       (xstk ystk hstk dstk tstk vstk) x nstk
//! per time step:
//!   time span  ibdate btime iedate etime
//!   stack cnt  ione nstk
//!   dynamics   (icell jcell kcell flow plmht) x nstk
//!   per species: ione name(10) rate(nstk)
//! ```
//!
//! Names are stored one character per 4-byte word.

pub mod point_source;
pub mod records;

pub use point_source::{
    julian_to_date, Header, PointSourceFile, Region, Stack, StackState, TimeStep,
};
pub use records::{Endian, Record, RecordReader, RecordWriter};

use thiserror::Error;

/// Result type for UAM-IV parser operations.
pub type UamivResult<T> = Result<T, UamivError>;

/// Error types for UAM-IV parsing.
#[derive(Error, Debug)]
pub enum UamivError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Neither byte order yields a consistent first record
    #[error("not a Fortran sequential file (no consistent record markers)")]
    UnrecognizedLayout,

    /// A record or field extends past the available data
    #[error("record {record} truncated: need {needed} bytes, {available} available")]
    Truncated {
        record: usize,
        needed: usize,
        available: usize,
    },

    /// Leading and trailing record markers disagree
    #[error("record {record} marker mismatch: leading {leading}, trailing {trailing}")]
    MarkerMismatch {
        record: usize,
        leading: u32,
        trailing: u32,
    },

    /// Structurally valid records with inconsistent content
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Requested species is not present in the file
    #[error("species not found: {0}")]
    UnknownSpecies(String),
}
