//! Generators for synthetic CAMx point-source files.
//!
//! Stacks are described by location and mean NOx; the generator spreads the
//! NOx over NO and NO2 and varies it by hour so that the daily mean equals
//! the requested value exactly.

use std::path::{Path, PathBuf};

use uamiv_parser::{Endian, Header, PointSourceFile, Region, Stack, StackState, TimeStep};

/// Share of NOx emitted as NO; the rest is NO2.
const NO_FRACTION: f32 = 0.75;

/// A stack to place in a synthetic file.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticStack {
    pub x: f32,
    pub y: f32,
    /// Mean NO + NO2 over all hours (mol/h)
    pub mean_nox: f32,
}

impl SyntheticStack {
    pub fn new(x: f32, y: f32, mean_nox: f32) -> Self {
        Self { x, y, mean_nox }
    }
}

/// Builds a point-source file with `hours` time steps and species NO, NO2, SO2.
///
/// Hourly NOx alternates `mean ± mean/2` (for an even number of hours), so
/// the mean over the day is exactly `mean_nox`.
///
/// # Example
///
/// ```
/// use test_utils::{synthetic_point_source, SyntheticStack};
///
/// let file = synthetic_point_source(&[SyntheticStack::new(0.0, 0.0, 500.0)], 4);
/// assert_eq!(file.num_stacks(), 1);
/// assert_eq!(file.time_steps.len(), 4);
/// ```
pub fn synthetic_point_source(stacks: &[SyntheticStack], hours: usize) -> PointSourceFile {
    let time_steps = (0..hours)
        .map(|h| {
            let swing = if hours % 2 == 0 {
                if h % 2 == 0 {
                    0.5
                } else {
                    -0.5
                }
            } else {
                0.0
            };
            let nox: Vec<f32> = stacks
                .iter()
                .map(|s| s.mean_nox * (1.0 + swing))
                .collect();
            TimeStep {
                begin_date: 11_032,
                begin_hour: (h * 100) as f32,
                end_date: 11_032,
                end_hour: ((h + 1) * 100) as f32,
                states: vec![StackState::default(); stacks.len()],
                emissions: vec![
                    nox.iter().map(|v| v * NO_FRACTION).collect(),
                    nox.iter().map(|v| v * (1.0 - NO_FRACTION)).collect(),
                    vec![1.0; stacks.len()],
                ],
            }
        })
        .collect();

    PointSourceFile {
        header: Header {
            name: "PTSOURCE".to_string(),
            note: "synthetic point sources".to_string(),
            begin_date: 11_032,
            begin_hour: 0.0,
            end_date: 11_032,
            end_hour: (hours * 100) as f32,
        },
        region: Region {
            iutm: 0,
            xorg: -2_736_000.0,
            yorg: -2_088_000.0,
            delx: 12_000.0,
            dely: 12_000.0,
            nx: 456,
            ny: 348,
            nz: 1,
            ..Region::default()
        },
        species: vec!["NO".to_string(), "NO2".to_string(), "SO2".to_string()],
        stacks: stacks
            .iter()
            .map(|s| Stack {
                x: s.x,
                y: s.y,
                height: 100.0,
                diameter: 4.0,
                temperature: 400.0,
                velocity: 15.0,
            })
            .collect(),
        time_steps,
    }
}

/// Writes a synthetic point-source file (big-endian) to `dir/name`.
pub fn write_point_source(
    dir: &Path,
    name: &str,
    stacks: &[SyntheticStack],
    hours: usize,
) -> PathBuf {
    let path = dir.join(name);
    synthetic_point_source(stacks, hours)
        .write(&path, Endian::Big)
        .expect("Failed to write synthetic point-source file");
    path
}
