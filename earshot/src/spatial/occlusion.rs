//! Reduces wall crossings to attenuation and muffling coefficients.

use crate::scene::ObstacleId;
use crate::scene::geometry::Intersection;
use std::collections::HashSet;

/// Ceiling on volume attenuation from walls. Geometry alone never silences a source.
pub const MAX_OCCLUSION_STRENGTH: f64 = 0.9;

/// Ceiling on low-pass strength from walls.
pub const MAX_MUFFLING_STRENGTH: f64 = 0.8;

/// Muffling added per wall-edge crossing.
pub const MUFFLING_PER_CROSSING: f64 = 0.3;

/// Number of distinct walls represented in `intersections`.
///
/// Crossing a rectangle produces an entry and an exit hit, so hits are
/// deduplicated by obstacle identity.
pub fn distinct_wall_count(intersections: &[Intersection]) -> usize {
    intersections
        .iter()
        .map(|hit| hit.obstacle)
        .collect::<HashSet<ObstacleId>>()
        .len()
}

/// Fraction of volume removed by the walls in `intersections`.
///
/// Each wall halves the transmitted energy: `1 - 0.5^walls`, capped at
/// [`MAX_OCCLUSION_STRENGTH`].
pub fn occlusion_strength(intersections: &[Intersection]) -> f64 {
    occlusion_for_wall_count(distinct_wall_count(intersections))
}

pub fn occlusion_for_wall_count(walls: usize) -> f64 {
    if walls == 0 {
        return 0.0;
    }
    let exponent = i32::try_from(walls).unwrap_or(i32::MAX);
    (1.0 - 0.5_f64.powi(exponent)).clamp(0.0, MAX_OCCLUSION_STRENGTH)
}

/// Low-pass strength from the raw number of edge crossings.
///
/// Unlike [`occlusion_strength`] this is not deduplicated: thick walls
/// (two crossings) muffle more than a single edge graze.
pub fn muffling_strength(intersections: &[Intersection]) -> f64 {
    (MUFFLING_PER_CROSSING * intersections.len() as f64).clamp(0.0, MAX_MUFFLING_STRENGTH)
}
