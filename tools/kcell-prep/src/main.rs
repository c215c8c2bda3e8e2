//! kcell prep
//!
//! Matches substation locations against a CAMx point-source file, keeps the
//! matches closest to a point of interest, and writes them as kcell group
//! files for a source-tagging run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use kcell_match::{DedupMode, Pipeline, PipelineConfig, PipelineInputs, RunReport, Separator};

#[derive(Parser, Debug)]
#[command(name = "kcell-prep")]
#[command(about = "Match substations to CAMx point sources and write kcell files")]
#[command(allow_negative_numbers = true)]
struct Args {
    /// CAMx point-source emissions file
    point_sources: PathBuf,

    /// Substation coordinates, one "x y" pair per line (projected meters)
    references: PathBuf,

    /// Point of interest latitude (degrees)
    lat: f64,

    /// Point of interest longitude (degrees)
    lon: f64,

    /// Number of closest matches to keep
    num_points: usize,

    /// Matches per output file
    group_size: usize,

    /// YAML configuration file
    #[arg(short, long, env = "KCELL_CONFIG")]
    config: Option<PathBuf>,

    /// Minimum mean NOx for a stack to count (mol/h)
    #[arg(long, env = "KCELL_MIN_NOX")]
    min_nox: Option<f64>,

    /// Match radius between stack and substation (m)
    #[arg(long, env = "KCELL_MAX_DIST")]
    max_dist: Option<f64>,

    /// Reference file column separator: space, comma or either
    #[arg(long, env = "KCELL_SEPARATOR")]
    separator: Option<Separator>,

    /// Duplicate handling: adjacent or full-history
    #[arg(long, env = "KCELL_DEDUP")]
    dedup: Option<DedupMode>,

    /// Directory for output files
    #[arg(short, long, env = "KCELL_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Group file prefix; files are named <prefix><n>.out
    #[arg(long, env = "KCELL_PREFIX")]
    prefix: Option<String>,

    /// Skip the KML placemark file
    #[arg(long)]
    no_kml: bool,

    /// Deprecated, use --max-dist
    #[arg(long, hide = true)]
    radius: Option<f64>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Log as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn inputs(&self) -> PipelineInputs {
        PipelineInputs {
            point_sources: self.point_sources.clone(),
            references: self.references.clone(),
            lat: self.lat,
            lon: self.lon,
            num_points: self.num_points,
            group_size: self.group_size,
        }
    }

    /// Defaults, then the config file, then flags and environment.
    fn build_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(min_nox) = self.min_nox {
            config.min_nox = min_nox;
        }
        if let Some(max_dist) = self.max_dist {
            config.max_dist = max_dist;
        }
        if let Some(separator) = self.separator {
            config.separator = separator;
        }
        if let Some(dedup) = self.dedup {
            config.dedup_mode = dedup;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.output.prefix = prefix.clone();
        }
        if self.no_kml {
            config.write_kml = false;
        }

        Ok(config)
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json);

    if let Some(radius) = args.radius {
        warn!(radius, "--radius is deprecated and ignored; use --max-dist");
    }

    let config = args.build_config()?;
    info!(
        min_nox = config.min_nox,
        max_dist = config.max_dist,
        separator = %config.separator,
        dedup = %config.dedup_mode,
        output_dir = %config.output.dir.display(),
        "Starting kcell prep"
    );

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let inputs = args.inputs();
    let report = pipeline.run(&inputs).with_context(|| {
        format!(
            "kcell prep failed for {} and {}",
            inputs.point_sources.display(),
            inputs.references.display()
        )
    })?;

    print_summary(&report);
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!(
        "Stacks: {} total, {} kept, {} below threshold",
        report.total_stacks, report.kept_stacks, report.rejected_stacks
    );
    println!(
        "Substations: {} unique, {} lines skipped, {} duplicates",
        report.references, report.skipped_lines, report.duplicate_references
    );
    println!(
        "Matches: {} found, {} selected",
        report.matches, report.selected
    );
    if let (Some(closest), Some(farthest)) = (report.closest_km, report.farthest_km) {
        println!("Distance from center: {:.4} km to {:.4} km", closest, farthest);
    }
    for path in &report.group_files {
        println!("Wrote {}", path.display());
    }
    if let Some(kml) = &report.kml {
        println!("Wrote {}", kml.display());
    }
    println!("Diagnostics: {}", report.diag.display());
}
