//! Coarse extents of path data.
//!
//! Every numeric token in a `d` attribute is read in order and consumed in
//! pairs as `(x, y)` samples. Command letters, relative coordinates, arc flags
//! and curve control points are not interpreted, so the result is an
//! approximation of the drawn extent, not the exact geometry.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::bbox::BBox;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d*\.?\d+").unwrap());

/// Numeric tokens of the path data paired up as points.
///
/// A trailing unpaired token is ignored, as are pairs that do not parse to
/// finite numbers.
pub fn sample_points(d: &str) -> Vec<(f64, f64)> {
    let numbers: Vec<&str> = NUMBER_RE.find_iter(d).map(|m| m.as_str()).collect();
    numbers
        .chunks_exact(2)
        .filter_map(|pair| {
            let x: f64 = pair[0].parse().ok()?;
            let y: f64 = pair[1].parse().ok()?;
            (x.is_finite() && y.is_finite()).then_some((x, y))
        })
        .collect()
}

/// Min/max box over [`sample_points`], if it has positive area.
pub fn coarse_bounds(d: &str) -> Option<BBox> {
    let points = sample_points(d);
    let (first, rest) = points.split_first()?;
    let (mut min_x, mut min_y) = *first;
    let (mut max_x, mut max_y) = *first;
    for &(x, y) in rest {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    BBox::from_extents(min_x, min_y, max_x, max_y)
}
