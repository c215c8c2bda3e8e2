//! Substation to point-source matching for CAMx source tagging.
//!
//! The pipeline:
//! 1. Load stacks from a CAMx point-source file and keep the large NOx
//!    emitters (likely EGUs).
//! 2. Load substation coordinates from a delimited text file.
//! 3. Match stacks to substations within a radius, assigning sequential
//!    kcell ids.
//! 4. Select the N matches closest to a point of interest.
//! 5. Split them into fixed-size groups and write flat files, a KML
//!    placemark file and a diagnostic log.

pub mod config;
pub mod diagnostics;
pub mod distance;
pub mod error;
pub mod grouping;
pub mod matcher;
pub mod output;
pub mod pipeline;
pub mod references;
pub mod selector;
pub mod sources;
pub mod types;

pub use config::{DedupMode, OutputLayout, PipelineConfig, Separator};
pub use diagnostics::Diagnostics;
pub use distance::DistanceMatrix;
pub use error::{KcellError, KcellResult};
pub use grouping::{group, Group, GroupRow};
pub use matcher::{match_sources, Matcher};
pub use output::OutputWriter;
pub use pipeline::{Pipeline, PipelineInputs, RunReport};
pub use references::{load_references, parse_references, ReferenceSet};
pub use selector::{closest_n, closest_points};
pub use sources::{load_sources, mean_nox, NoxMeans, PointSourceData, SourceSummary};
pub use types::{EmissionSource, Match, Point, Ranked};
