//! End-to-end orchestration of a kcell prep run.

use chrono::{DateTime, Utc};
use projection::LambertConformal;
use std::path::PathBuf;
use tracing::{info, warn};
use uamiv_parser::PointSourceFile;

use crate::config::PipelineConfig;
use crate::diagnostics::Diagnostics;
use crate::distance::DistanceMatrix;
use crate::error::{KcellError, KcellResult};
use crate::grouping::group;
use crate::matcher::{describe_match, Matcher};
use crate::output::OutputWriter;
use crate::references::{load_references, ReferenceSet};
use crate::selector::closest_n;
use crate::sources::{load_sources, PointSourceData};
use crate::types::Point;

/// Per-run inputs, normally the positional command-line arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineInputs {
    pub point_sources: PathBuf,
    pub references: PathBuf,
    /// Point of interest latitude (degrees)
    pub lat: f64,
    /// Point of interest longitude (degrees)
    pub lon: f64,
    /// How many of the closest matches to keep
    pub num_points: usize,
    /// Rows per output file
    pub group_size: usize,
}

impl PipelineInputs {
    pub fn validate(&self) -> KcellResult<()> {
        if self.group_size == 0 {
            return Err(KcellError::Config("group size must be > 0".into()));
        }
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(KcellError::Config(format!(
                "point of interest must be finite, got {}, {}",
                self.lat, self.lon
            )));
        }
        Ok(())
    }
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started: DateTime<Utc>,
    /// Point of interest in projected meters
    pub target: Point,
    pub total_stacks: usize,
    pub kept_stacks: usize,
    pub rejected_stacks: usize,
    pub references: usize,
    pub skipped_lines: usize,
    pub duplicate_references: usize,
    pub matches: usize,
    pub selected: usize,
    pub group_files: Vec<PathBuf>,
    pub kml: Option<PathBuf>,
    pub diag: PathBuf,
    pub closest_km: Option<f64>,
    pub farthest_km: Option<f64>,
}

/// A configured matching pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    projection: LambertConformal,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> KcellResult<Self> {
        config.validate()?;
        let projection = LambertConformal::new(config.projection)?;
        Ok(Self { config, projection })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn projection(&self) -> &LambertConformal {
        &self.projection
    }

    /// Load both input files and run.
    pub fn run(&self, inputs: &PipelineInputs) -> KcellResult<RunReport> {
        inputs.validate()?;

        let file = PointSourceFile::open(&inputs.point_sources)?;
        info!(
            path = %inputs.point_sources.display(),
            stacks = file.num_stacks(),
            species = file.species.len(),
            time_steps = file.time_steps.len(),
            begin = ?file.header.begin(),
            end = ?file.header.end(),
            "Opened point-source file"
        );

        let references = load_references(&inputs.references, self.config.separator)?;
        self.run_with(&file, &references, inputs)
    }

    /// Run over already loaded inputs.
    pub fn run_with<D: PointSourceData + ?Sized>(
        &self,
        data: &D,
        references: &ReferenceSet,
        inputs: &PipelineInputs,
    ) -> KcellResult<RunReport> {
        inputs.validate()?;
        let started = Utc::now();
        let config = &self.config;
        let mut diag = Diagnostics::new();

        diag.line(format!("Run started: {}", started.to_rfc3339()))
            .line(format!("Point-source file: {}", inputs.point_sources.display()))
            .line(format!("Reference file: {}", inputs.references.display()))
            .line(format!("Closest points: {}, group size: {}", inputs.num_points, inputs.group_size))
            .line(format!("Minimum NOx emission: {} mole/hr", config.min_nox))
            .line(format!("Maximum point-source radius: {} meters", config.max_dist))
            .line(format!("Duplicate handling: {}", config.dedup_mode))
            .blank();

        let (tx, ty) = self.projection.project(inputs.lon, inputs.lat)?;
        let target = Point::new(tx, ty);
        diag.line(format!(
            "Lat: {}, Lon: {} ---> X: {}, Y: {}",
            inputs.lat, inputs.lon, tx, ty
        ));

        let summary = load_sources(data, config.min_nox)?;
        diag.line(format!(
            "Point sources: {} stacks over {} time steps, {} kept, {} below threshold",
            summary.total_stacks,
            summary.time_steps,
            summary.sources.len(),
            summary.rejected
        ));
        diag.line(format!(
            "Substation lines: {} accepted, {} skipped, {} duplicates, {} unique",
            references.accepted,
            references.skipped,
            references.duplicates,
            references.len()
        ));
        if references.is_empty() {
            warn!(path = %inputs.references.display(), "No valid reference points");
        }

        let sources = summary.points();
        let matcher = Matcher::new(config.max_dist, config.dedup_mode);
        let matrix = DistanceMatrix::compute(&sources, &references.points);
        let matches = matcher.run_matrix(&matrix, &sources);
        if let Some(nearest) = matrix.min() {
            diag.line(format!("Nearest stack to substation: {:.1} meters", nearest));
        }

        diag.blank()
            .section("Matches")
            .line("CAMx X, Y -----> Substation Lat,Lon");
        for m in &matches {
            diag.line(describe_match(m, &references.points, &self.projection)?);
        }
        diag.blank()
            .line(format!("Total matching points found: {}", matches.len()));

        let ranked = closest_n(&matches, target, inputs.num_points);
        let closest_km = ranked.first().map(|r| r.distance / 1000.0);
        let farthest_km = ranked.last().map(|r| r.distance / 1000.0);
        match (closest_km, farthest_km) {
            (Some(closest), Some(farthest)) => {
                diag.line(format!("Closest point from center: {:.4} km", closest))
                    .line(format!("Farthest point from center: {:.4} km", farthest));
            }
            _ if matches.is_empty() => {
                diag.line("No matching points");
            }
            _ => {
                diag.line("No points selected");
            }
        }
        if ranked.len() < inputs.num_points {
            info!(
                requested = inputs.num_points,
                available = ranked.len(),
                "Fewer matches than requested"
            );
        }

        let groups = group(&matches, &ranked, inputs.group_size)?;
        let writer = OutputWriter::new(config.output.clone(), self.projection.clone());
        writer.prepare()?;
        let group_files = writer.write_groups(&groups)?;
        let kml = if config.write_kml {
            Some(writer.write_kml(&groups)?)
        } else {
            None
        };

        diag.line(format!(
            "Wrote {} files, for a total of {} points",
            group_files.len(),
            ranked.len()
        ));
        let diag_path = writer.write_diagnostics(&diag)?;

        info!(
            matches = matches.len(),
            selected = ranked.len(),
            files = group_files.len(),
            "Finished kcell prep"
        );

        Ok(RunReport {
            started,
            target,
            total_stacks: summary.total_stacks,
            kept_stacks: summary.sources.len(),
            rejected_stacks: summary.rejected,
            references: references.len(),
            skipped_lines: references.skipped,
            duplicate_references: references.duplicates,
            matches: matches.len(),
            selected: ranked.len(),
            group_files,
            kml,
            diag: diag_path,
            closest_km,
            farthest_km,
        })
    }
}
