//! Math types for Earshot

pub use glam::DVec2;

/// A position in level space. Level space is y-down, matching tile maps.
pub type Point2D = DVec2;

/// Width and height of an axis-aligned box.
pub type Size2D = DVec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Point2D,
    pub end: Point2D,
}

impl LineSegment {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Smallest axis-aligned box containing both endpoints.
    pub fn bounds(&self) -> Aabb {
        Aabb {
            min: self.start.min(self.end),
            max: self.start.max(self.end),
        }
    }
}

/// Axis-aligned bounding box with inclusive edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point2D,
    pub max: Point2D,
}

impl Aabb {
    pub fn from_position_size(position: Point2D, size: Size2D) -> Self {
        let corner = position + size;
        Self {
            min: position.min(corner),
            max: position.max(corner),
        }
    }

    /// Touching edges count as overlap, so a line grazing a wall is still tested.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}
