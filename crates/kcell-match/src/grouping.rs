//! Splits ranked matches into fixed-size output groups.

use crate::error::{KcellError, KcellResult};
use crate::types::{Match, Point, Ranked};

/// One output row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupRow {
    pub point: Point,
    /// 1-based position within the group; the kcell number written out
    pub kcell: usize,
    /// 1-based position across all groups
    pub output_index: usize,
    /// Index into the match list
    pub match_index: usize,
    /// Distance to the point of interest (m)
    pub distance: f64,
}

/// One output file's worth of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// 1-based file number
    pub number: usize,
    pub rows: Vec<GroupRow>,
}

/// Split `ranked` into groups of `group_size` rows, preserving order.
///
/// The last group may be shorter. No rows means no groups.
pub fn group(matches: &[Match], ranked: &[Ranked], group_size: usize) -> KcellResult<Vec<Group>> {
    if group_size == 0 {
        return Err(KcellError::Config("group size must be > 0".into()));
    }

    let groups = ranked
        .chunks(group_size)
        .enumerate()
        .map(|(g, chunk)| Group {
            number: g + 1,
            rows: chunk
                .iter()
                .enumerate()
                .map(|(k, r)| GroupRow {
                    point: matches[r.index].point,
                    kcell: k + 1,
                    output_index: g * group_size + k + 1,
                    match_index: r.index,
                    distance: r.distance,
                })
                .collect(),
        })
        .collect();

    Ok(groups)
}
