//! Core data model.

use std::fmt;

/// Planar coordinate pair in projected meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in meters.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// True when both coordinates hold exactly the same value.
    ///
    /// `-0.0` and `0.0` are the same value.
    pub fn same_bits(&self, other: &Point) -> bool {
        self.bits() == other.bits()
    }

    /// Hashable key for exact-value set semantics.
    pub fn bits(&self) -> (u64, u64) {
        (value_bits(self.x), value_bits(self.y))
    }
}

/// Bit pattern of `v` with negative zero folded into zero.
fn value_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0_f64.to_bits()
    } else {
        v.to_bits()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.x, self.y)
    }
}

/// A stack location with its mean daily NOx rate (mol/h).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionSource {
    pub point: Point,
    pub mean_nox: f64,
    /// Position of the stack in the point-source file
    pub stack_index: usize,
}

/// An accepted source/reference match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Source stack location
    pub point: Point,
    /// Dense 1-based id in acceptance order
    pub kcell: usize,
    /// Row of the source in the filtered source list
    pub source_index: usize,
    /// Column of the reference that produced the match
    pub reference_index: usize,
    pub distance: f64,
}

/// A match ranked by distance to the point of interest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    /// Index into the match list
    pub index: usize,
    pub distance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_zero_is_one_value() {
        let a = Point::new(-0.0, 5.0);
        let b = Point::new(0.0, 5.0);
        assert!(a.same_bits(&b));
        assert_eq!(a.bits(), b.bits());
        assert!(!a.same_bits(&Point::new(0.0, -5.0)));
    }

    #[test]
    fn test_display_four_decimals() {
        assert_eq!(Point::new(1.0, -2.123456).to_string(), "1.0000, -2.1235");
    }
}
