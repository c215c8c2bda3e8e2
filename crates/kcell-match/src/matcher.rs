//! Proximity matching between emission sources and reference points.
//!
//! The distance matrix is walked row by row (sources), column by column
//! (references). Every entry within `max_dist` produces a match with the
//! next kcell id, unless the source repeats an earlier accepted source:
//!
//! - [`DedupMode::Adjacent`] only compares against the last accepted match,
//!   so one source matching several references collapses to one entry, but
//!   identical stacks separated by another accepted stack each get an id.
//! - [`DedupMode::FullHistory`] compares against every accepted match.

use projection::LambertConformal;
use std::collections::HashSet;
use tracing::debug;

use crate::config::DedupMode;
use crate::distance::DistanceMatrix;
use crate::error::KcellResult;
use crate::types::{Match, Point};

/// Matches sources to references within a radius.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    max_dist: f64,
    mode: DedupMode,
}

impl Matcher {
    pub fn new(max_dist: f64, mode: DedupMode) -> Self {
        Self { max_dist, mode }
    }

    pub fn max_dist(&self) -> f64 {
        self.max_dist
    }

    pub fn mode(&self) -> DedupMode {
        self.mode
    }

    /// Assign kcell ids to every source within `max_dist` of a reference.
    pub fn run(&self, sources: &[Point], references: &[Point]) -> Vec<Match> {
        let matrix = DistanceMatrix::compute(sources, references);
        self.run_matrix(&matrix, sources)
    }

    /// Same as [`Matcher::run`] over a precomputed matrix.
    pub fn run_matrix(&self, matrix: &DistanceMatrix, sources: &[Point]) -> Vec<Match> {
        let mut matches: Vec<Match> = Vec::new();
        let mut accepted = HashSet::new();

        for (row, col, distance) in matrix.iter_row_major() {
            // NaN distances never match
            if !(distance <= self.max_dist) {
                continue;
            }
            let point = sources[row];

            let repeat = match self.mode {
                DedupMode::Adjacent => matches
                    .last()
                    .is_some_and(|prev| prev.point.same_bits(&point)),
                DedupMode::FullHistory => accepted.contains(&point.bits()),
            };
            if repeat {
                continue;
            }

            accepted.insert(point.bits());
            let m = Match {
                point,
                kcell: matches.len() + 1,
                source_index: row,
                reference_index: col,
                distance,
            };
            debug!(kcell = m.kcell, source = row, reference = col, distance, "Accepted match");
            matches.push(m);
        }

        matches
    }
}

/// Match `sources` against `references` in one call.
pub fn match_sources(
    sources: &[Point],
    references: &[Point],
    max_dist: f64,
    mode: DedupMode,
) -> Vec<Match> {
    Matcher::new(max_dist, mode).run(sources, references)
}

/// Diagnostic line tying a match to its reference's geographic location:
/// `"<x>, <y> --> <lat>, <lon>"`.
pub fn describe_match(
    m: &Match,
    references: &[Point],
    projection: &LambertConformal,
) -> KcellResult<String> {
    let reference = references[m.reference_index];
    let (lon, lat) = projection.unproject(reference.x, reference.y)?;
    Ok(format!("{} --> {}, {}", m.point, lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kcells(matches: &[Match]) -> Vec<usize> {
        matches.iter().map(|m| m.kcell).collect()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let references = [Point::new(0.0, 0.0)];
        let at_limit = [Point::new(750.0, 0.0)];
        let beyond = [Point::new(750.0 + 1e-9, 0.0)];
        let matcher = Matcher::new(750.0, DedupMode::Adjacent);

        assert_eq!(matcher.run(&at_limit, &references).len(), 1);
        assert!(matcher.run(&beyond, &references).is_empty());
    }

    #[test]
    fn test_ids_are_dense_and_sequential() {
        let sources = [
            Point::new(0.0, 0.0),
            Point::new(5_000.0, 0.0),
            Point::new(10_000.0, 0.0),
        ];
        let references = [Point::new(10_100.0, 0.0), Point::new(100.0, 0.0)];
        let matches = Matcher::new(750.0, DedupMode::Adjacent).run(&sources, &references);

        assert_eq!(kcells(&matches), vec![1, 2]);
        assert_eq!(matches[0].source_index, 0);
        assert_eq!(matches[0].reference_index, 1);
        assert_eq!(matches[1].source_index, 2);
        assert_eq!(matches[1].reference_index, 0);
        assert_eq!(matches[1].distance, 100.0);
    }

    #[test]
    fn test_adjacent_references_collapse() {
        // One source within radius of two references: a single entry
        let sources = [Point::new(0.0, 0.0)];
        let references = [Point::new(100.0, 0.0), Point::new(-100.0, 0.0)];
        let matches = Matcher::new(750.0, DedupMode::Adjacent).run(&sources, &references);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].reference_index, 0);
    }

    #[test]
    fn test_identical_sources_adjacent_collapse() {
        let sources = [Point::new(0.0, 0.0), Point::new(0.0, 0.0)];
        let references = [Point::new(100.0, 0.0)];
        let matches = Matcher::new(750.0, DedupMode::Adjacent).run(&sources, &references);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_identical_sources_separated_are_kept_in_adjacent_mode() {
        let stack = Point::new(0.0, 0.0);
        let sources = [stack, Point::new(50_000.0, 0.0), stack];
        let references = [Point::new(100.0, 0.0), Point::new(50_100.0, 0.0)];

        let matches = Matcher::new(750.0, DedupMode::Adjacent).run(&sources, &references);
        assert_eq!(kcells(&matches), vec![1, 2, 3]);
        assert_eq!(matches[0].point, matches[2].point);
        assert_ne!(matches[0].kcell, matches[2].kcell);
    }

    #[test]
    fn test_full_history_collapses_separated_repeats() {
        let stack = Point::new(0.0, 0.0);
        let sources = [stack, Point::new(50_000.0, 0.0), stack];
        let references = [Point::new(100.0, 0.0), Point::new(50_100.0, 0.0)];

        let matches = Matcher::new(750.0, DedupMode::FullHistory).run(&sources, &references);
        assert_eq!(kcells(&matches), vec![1, 2]);
        assert_eq!(matches[1].source_index, 1);
    }

    #[test]
    fn test_no_references_no_matches() {
        let sources = [Point::new(0.0, 0.0)];
        let matches = Matcher::new(750.0, DedupMode::Adjacent).run(&sources, &[]);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_describe_match_uses_reference_location() {
        let proj = LambertConformal::camx();
        let references = [Point::new(0.0, 0.0)];
        let m = Match {
            point: Point::new(12.5, -3.25),
            kcell: 1,
            source_index: 0,
            reference_index: 0,
            distance: 12.9,
        };
        let line = describe_match(&m, &references, &proj).unwrap();
        let (source, geo) = line.split_once(" --> ").unwrap();
        assert_eq!(source, "12.5000, -3.2500");

        let (lat, lon) = geo.split_once(", ").unwrap();
        test_utils::assert_approx_eq!(lat.parse::<f64>().unwrap(), 40.0, 1e-9);
        test_utils::assert_approx_eq!(lon.parse::<f64>().unwrap(), -97.0, 1e-9);
    }
}
