//! Line-of-sight queries between the listener and a sound source.
//!
//! Walls are axis-aligned rectangles. A query draws the straight segment from
//! listener to source and collects every point where it crosses a wall edge.

use super::{Obstacle, ObstacleId};
use crate::config::OcclusionSettings;
use crate::math::{LineSegment, Point2D};

/// Determinant threshold used by [`intersect`].
pub const PARALLEL_EPSILON: f64 = 1e-10;

/// A point where the listener-to-source segment crosses a wall edge.
///
/// Recomputed on every query and never stored across ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub point: Point2D,
    /// Distance from the listener to `point`
    pub distance: f64,
    /// Wall whose edge was crossed
    pub obstacle: ObstacleId,
}

/// Intersection point of two segments, if they cross within both.
///
/// Near-parallel segments (determinant below [`PARALLEL_EPSILON`]) never
/// intersect, including collinear overlaps.
pub fn intersect(a: &LineSegment, b: &LineSegment) -> Option<Point2D> {
    intersect_with_epsilon(a, b, PARALLEL_EPSILON)
}

pub(crate) fn intersect_with_epsilon(
    a: &LineSegment,
    b: &LineSegment,
    epsilon: f64,
) -> Option<Point2D> {
    let (x1, y1) = (a.start.x, a.start.y);
    let (x2, y2) = (a.end.x, a.end.y);
    let (x3, y3) = (b.start.x, b.start.y);
    let (x4, y4) = (b.end.x, b.end.y);

    let denominator = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if denominator.abs() < epsilon {
        return None;
    }

    let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / denominator;
    let u = -((x1 - x2) * (y1 - y3) - (y1 - y2) * (x1 - x3)) / denominator;

    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }

    Some(Point2D::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1)))
}

/// The four edges of a wall as a closed clockwise traversal (y-down):
/// top, right, bottom, left.
pub fn obstacle_boundary_segments(obstacle: &Obstacle) -> [LineSegment; 4] {
    let bounds = obstacle.bounds();
    let top_left = bounds.min;
    let top_right = Point2D::new(bounds.max.x, bounds.min.y);
    let bottom_right = bounds.max;
    let bottom_left = Point2D::new(bounds.min.x, bounds.max.y);

    [
        LineSegment::new(top_left, top_right),
        LineSegment::new(top_right, bottom_right),
        LineSegment::new(bottom_right, bottom_left),
        LineSegment::new(bottom_left, top_left),
    ]
}

/// Wall-edge crossings on the segment from `listener` to `source`, nearest first.
///
/// Pairs closer than `settings.min_occlusion_distance` are treated as
/// unoccluded. Collection stops after `settings.max_intersections` points, so
/// dense geometry yields an approximate rather than exhaustive result.
pub fn wall_intersections(
    listener: Point2D,
    source: Point2D,
    obstacles: &[Obstacle],
    settings: &OcclusionSettings,
) -> Vec<Intersection> {
    if listener.distance(source) < settings.min_occlusion_distance {
        return Vec::new();
    }

    let line = LineSegment::new(listener, source);
    let line_bounds = line.bounds();
    let mut intersections = Vec::new();

    'obstacles: for obstacle in obstacles {
        if !line_bounds.overlaps(&obstacle.bounds()) {
            continue;
        }

        for edge in obstacle_boundary_segments(obstacle) {
            let Some(point) = intersect_with_epsilon(&line, &edge, settings.parallel_epsilon)
            else {
                continue;
            };

            intersections.push(Intersection {
                point,
                distance: listener.distance(point),
                obstacle: obstacle.id,
            });

            if intersections.len() >= settings.max_intersections {
                log::trace!(
                    "Intersection cap of {} reached, remaining walls skipped",
                    settings.max_intersections
                );
                break 'obstacles;
            }
        }
    }

    intersections.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    intersections
}
