//! Reference (substation) coordinate loading.
//!
//! Each line holding `<x>.<frac><sep><y>.<frac>` at its start contributes one
//! point; every other line (headers, comments, integers, blank lines) is
//! skipped and counted. Identical coordinate pairs collapse to the first
//! occurrence.

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::config::Separator;
use crate::error::{KcellError, KcellResult};
use crate::types::Point;

/// Unique reference points plus line accounting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSet {
    /// Unique points in first-seen order
    pub points: Vec<Point>,
    /// Lines that passed validation
    pub accepted: usize,
    /// Lines that failed validation
    pub skipped: usize,
    /// Valid lines dropped as repeats of an earlier point
    pub duplicates: usize,
}

impl ReferenceSet {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Validates and parses a single reference line.
#[derive(Debug, Clone)]
pub struct LineValidator {
    pattern: Regex,
}

impl LineValidator {
    pub fn new(separator: Separator) -> KcellResult<Self> {
        let source = format!(
            r"^(-?[0-9]+\.[0-9]+){}(-?[0-9]+\.[0-9]+)",
            separator.pattern()
        );
        let pattern = Regex::new(&source)
            .map_err(|e| KcellError::Config(format!("bad reference pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Parse a line, or `None` if it is not a coordinate line.
    ///
    /// Surrounding whitespace is ignored and anything after the second
    /// number is allowed.
    pub fn parse(&self, line: &str) -> Option<Point> {
        let caps = self.pattern.captures(line.trim())?;
        let x = caps.get(1)?.as_str().parse().ok()?;
        let y = caps.get(2)?.as_str().parse().ok()?;
        Some(Point::new(x, y))
    }
}

/// Parse reference points from file contents.
pub fn parse_references(text: &str, separator: Separator) -> KcellResult<ReferenceSet> {
    let validator = LineValidator::new(separator)?;
    let mut seen = HashSet::new();
    let mut set = ReferenceSet::default();

    for (lineno, line) in text.lines().enumerate() {
        let Some(point) = validator.parse(line) else {
            debug!(line = lineno + 1, "Skipped non-coordinate reference line");
            set.skipped += 1;
            continue;
        };
        set.accepted += 1;
        if seen.insert(point.bits()) {
            set.points.push(point);
        } else {
            set.duplicates += 1;
        }
    }

    Ok(set)
}

/// Read and parse a reference file. An unreadable file is fatal; a file
/// with no valid lines yields an empty set.
pub fn load_references(path: impl AsRef<Path>, separator: Separator) -> KcellResult<ReferenceSet> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| KcellError::read(path, e))?;
    let set = parse_references(&text, separator)?;
    info!(
        path = %path.display(),
        unique = set.len(),
        accepted = set.accepted,
        skipped = set.skipped,
        duplicates = set.duplicates,
        "Loaded reference points"
    );
    Ok(set)
}
