//! Emission-source loading and NOx filtering.

use tracing::{debug, info};
use uamiv_parser::{PointSourceFile, UamivError};

use crate::error::{KcellError, KcellResult};
use crate::types::{EmissionSource, Point};

/// Species summed into NOx.
pub const NOX_SPECIES: [&str; 2] = ["NO", "NO2"];

/// Point-source data the loader needs: stack locations and hourly series.
pub trait PointSourceData {
    /// Projected stack locations, in file order.
    fn stack_coordinates(&self) -> Vec<Point>;

    /// Emission rates of a species as `[time][stack]`.
    fn species_series(&self, name: &str) -> KcellResult<Vec<Vec<f64>>>;
}

impl PointSourceData for PointSourceFile {
    fn stack_coordinates(&self) -> Vec<Point> {
        self.stacks
            .iter()
            .map(|s| Point::new(s.x as f64, s.y as f64))
            .collect()
    }

    fn species_series(&self, name: &str) -> KcellResult<Vec<Vec<f64>>> {
        let series = PointSourceFile::species_series(self, name).map_err(|e| match e {
            UamivError::UnknownSpecies(name) => KcellError::MissingVariable(name),
            other => KcellError::PointSource(other),
        })?;
        Ok(series
            .into_iter()
            .map(|step| step.iter().map(|&v| v as f64).collect())
            .collect())
    }
}

/// Result of loading and filtering stacks.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    /// Stacks above the NOx threshold, in file order
    pub sources: Vec<EmissionSource>,
    pub total_stacks: usize,
    /// Stacks at or below the threshold
    pub rejected: usize,
    pub time_steps: usize,
}

impl SourceSummary {
    pub fn points(&self) -> Vec<Point> {
        self.sources.iter().map(|s| s.point).collect()
    }
}

/// Per-stack mean NOx and the number of time steps averaged.
#[derive(Debug, Clone, PartialEq)]
pub struct NoxMeans {
    pub per_stack: Vec<f64>,
    pub time_steps: usize,
}

/// Mean over all time steps of NO + NO2, one value per stack.
pub fn mean_nox<D: PointSourceData + ?Sized>(data: &D) -> KcellResult<NoxMeans> {
    let nstk = data.stack_coordinates().len();
    let mut totals = vec![0.0_f64; nstk];
    let mut steps = None;

    for name in NOX_SPECIES {
        let series = data.species_series(name)?;
        for (step, rates) in series.iter().enumerate() {
            if rates.len() != nstk {
                return Err(KcellError::ShapeMismatch {
                    name: name.to_string(),
                    step,
                    found: rates.len(),
                    expected: nstk,
                });
            }
            for (total, rate) in totals.iter_mut().zip(rates) {
                *total += rate;
            }
        }
        match steps {
            None => steps = Some(series.len()),
            Some(n) if n != series.len() => {
                return Err(KcellError::StepMismatch {
                    name: name.to_string(),
                    found: series.len(),
                    expected: n,
                })
            }
            Some(_) => {}
        }
    }

    let steps = steps.unwrap_or(0);
    if steps == 0 {
        return Err(KcellError::NoTimeSteps);
    }

    Ok(NoxMeans {
        per_stack: totals.into_iter().map(|t| t / steps as f64).collect(),
        time_steps: steps,
    })
}

/// Keep stacks whose mean NOx exceeds `min_nox`, preserving file order.
pub fn load_sources<D: PointSourceData + ?Sized>(
    data: &D,
    min_nox: f64,
) -> KcellResult<SourceSummary> {
    let coordinates = data.stack_coordinates();
    let NoxMeans {
        per_stack: means,
        time_steps,
    } = mean_nox(data)?;

    let sources: Vec<EmissionSource> = coordinates
        .iter()
        .zip(&means)
        .enumerate()
        .filter(|(_, (_, nox))| **nox > min_nox)
        .map(|(stack_index, (&point, &mean_nox))| EmissionSource {
            point,
            mean_nox,
            stack_index,
        })
        .collect();

    for source in &sources {
        debug!(stack = source.stack_index, point = %source.point, nox = source.mean_nox, "Kept stack");
    }

    let total_stacks = coordinates.len();
    let rejected = total_stacks - sources.len();
    info!(
        total_stacks,
        kept = sources.len(),
        rejected,
        min_nox,
        "Filtered point sources by mean NOx"
    );

    Ok(SourceSummary {
        sources,
        total_stacks,
        rejected,
        time_steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;

    /// In-memory dataset keyed by species name.
    struct MemoryData {
        points: Vec<Point>,
        series: HashMap<&'static str, Vec<Vec<f64>>>,
        lookups: Cell<usize>,
    }

    impl PointSourceData for MemoryData {
        fn stack_coordinates(&self) -> Vec<Point> {
            self.points.clone()
        }

        fn species_series(&self, name: &str) -> KcellResult<Vec<Vec<f64>>> {
            self.lookups.set(self.lookups.get() + 1);
            self.series
                .get(name)
                .cloned()
                .ok_or_else(|| KcellError::MissingVariable(name.to_string()))
        }
    }

    fn three_stacks() -> MemoryData {
        MemoryData {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(20.0, 0.0),
            ],
            series: HashMap::from([
                ("NO", vec![vec![900.0, 10.0, 600.0], vec![1100.0, 30.0, 400.0]]),
                ("NO2", vec![vec![100.0, 0.0, 500.0], vec![100.0, 0.0, 500.0]]),
            ]),
            lookups: Cell::new(0),
        }
    }

    #[test]
    fn test_mean_nox() {
        let means = mean_nox(&three_stacks()).unwrap();
        assert_eq!(means.per_stack, vec![1100.0, 20.0, 1000.0]);
        assert_eq!(means.time_steps, 2);
    }

    #[test]
    fn test_each_species_read_once() {
        let data = three_stacks();
        let summary = load_sources(&data, 0.0).unwrap();
        assert_eq!(summary.time_steps, 2);
        assert_eq!(data.lookups.get(), NOX_SPECIES.len());
    }

    #[test]
    fn test_threshold_is_strict() {
        let summary = load_sources(&three_stacks(), 1000.0).unwrap();
        assert_eq!(summary.total_stacks, 3);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.time_steps, 2);
        assert_eq!(summary.sources.len(), 1);
        assert_eq!(summary.sources[0].stack_index, 0);
    }

    #[test]
    fn test_file_order_preserved() {
        let summary = load_sources(&three_stacks(), 15.0).unwrap();
        let indices: Vec<usize> = summary.sources.iter().map(|s| s.stack_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(summary.points()[2], Point::new(20.0, 0.0));
    }

    #[test]
    fn test_missing_species_is_fatal() {
        let mut data = three_stacks();
        data.series.remove("NO2");
        assert!(matches!(
            load_sources(&data, 0.0),
            Err(KcellError::MissingVariable(name)) if name == "NO2"
        ));
    }

    #[test]
    fn test_ragged_series_is_fatal() {
        let mut data = three_stacks();
        data.series.get_mut("NO").unwrap()[1].pop();
        assert!(matches!(
            load_sources(&data, 0.0),
            Err(KcellError::ShapeMismatch { step: 1, found: 2, expected: 3, .. })
        ));
    }

    #[test]
    fn test_no_time_steps_is_fatal() {
        let data = MemoryData {
            points: vec![Point::new(0.0, 0.0)],
            series: HashMap::from([("NO", vec![]), ("NO2", vec![])]),
            lookups: Cell::new(0),
        };
        assert!(matches!(load_sources(&data, 0.0), Err(KcellError::NoTimeSteps)));
    }
}
