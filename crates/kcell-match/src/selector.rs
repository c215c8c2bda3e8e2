//! Closest-N selection relative to a point of interest.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::types::{Match, Point, Ranked};

/// Heap entry ordered by distance, then by original index.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// The `n` points nearest `target`, ascending by distance.
///
/// Uses a bounded max-heap of size `n`. Ties keep the original order.
/// Returns fewer than `n` entries when fewer points exist.
pub fn closest_points(points: &[Point], target: Point, n: usize) -> Vec<Ranked> {
    if n == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(n.min(points.len()) + 1);
    for (index, point) in points.iter().enumerate() {
        let candidate = Candidate {
            distance: point.distance(&target),
            index,
        };
        if heap.len() < n {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|c| Ranked {
            index: c.index,
            distance: c.distance,
        })
        .collect()
}

/// The `n` matches nearest `target`; indices refer to `matches`.
pub fn closest_n(matches: &[Match], target: Point, n: usize) -> Vec<Ranked> {
    let points: Vec<Point> = matches.iter().map(|m| m.point).collect();
    closest_points(&points, target, n)
}
