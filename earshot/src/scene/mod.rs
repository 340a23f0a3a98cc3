//! Level-owned inputs to the occlusion pipeline.
//!
//! The level/content layer owns walls and sound emitters; Earshot only reads
//! them each tick. This module defines the shapes it reads:
//!
//! 1. **Obstacle** - an axis-aligned wall rectangle with a stable [`ObstacleId`]
//! 2. **SoundSource** - a continuously emitting sound with a key, position and range
//! 3. **geometry** - segment/rectangle intersection used to find walls between
//!    the listener and a source
//!
//! # Example
//!
//! ```
//! use earshot::math::{Point2D, Size2D};
//! use earshot::scene::{geometry, Obstacle, ObstacleId};
//!
//! let wall = Obstacle::new(ObstacleId(1), Point2D::new(40.0, -50.0), Size2D::new(20.0, 100.0));
//! let hits = geometry::wall_intersections(
//!     Point2D::new(0.0, 0.0),
//!     Point2D::new(100.0, 0.0),
//!     &[wall],
//!     &Default::default(),
//! );
//! assert_eq!(hits.len(), 2);
//! ```

pub mod geometry;

use crate::error::{EarshotError, Result};
use crate::math::{Aabb, Point2D, Size2D};

/// Stable identity of a wall, used to count distinct walls crossed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(pub u64);

impl std::fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObstacleId({})", self.0)
    }
}

/// An axis-aligned wall rectangle positioned by its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub position: Point2D,
    pub size: Size2D,
}

impl Obstacle {
    pub fn new(id: ObstacleId, position: Point2D, size: Size2D) -> Self {
        Self { id, position, size }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_position_size(self.position, self.size)
    }
}

/// Lightweight handle for sound sources registered with an
/// [`EarshotWorld`](crate::world::EarshotWorld).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub(crate) u64);

impl SourceId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

/// What a sound source represents in the level.
///
/// Earshot does not branch on this; it is carried for narration and game-rule
/// collaborators that need to tell a door from a pickup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceKind {
    #[default]
    Ambient,
    Item,
    Door,
    Exit,
}

/// A continuously emitting sound placed in the level.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundSource {
    /// Asset key of the looping sample, e.g. `"water_drip"`
    pub sound_key: String,
    /// Top-left corner of the emitter's footprint
    pub position: Point2D,
    /// Half extents of the footprint; the emitter point is `position + half_size`
    pub half_size: Size2D,
    /// Distance at which the source becomes inaudible
    pub max_distance: f64,
    pub kind: SourceKind,
    /// Inactive sources keep their registration but release their session
    pub is_active: bool,
}

impl SoundSource {
    /// Create an active point emitter at `position`.
    pub fn new(sound_key: impl Into<String>, position: Point2D, max_distance: f64) -> Self {
        Self {
            sound_key: sound_key.into(),
            position,
            half_size: Size2D::ZERO,
            max_distance,
            kind: SourceKind::default(),
            is_active: true,
        }
    }

    pub fn with_half_size(mut self, half_size: Size2D) -> Self {
        self.half_size = half_size;
        self
    }

    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// The point sound is considered to come from.
    pub fn emitter_position(&self) -> Point2D {
        self.position + self.half_size
    }

    pub fn validate(&self) -> Result<()> {
        if self.sound_key.trim().is_empty() {
            return Err(EarshotError::InvalidSource(
                "sound_key must not be empty".into(),
            ));
        }
        if !(self.max_distance.is_finite() && self.max_distance > 0.0) {
            return Err(EarshotError::InvalidSource(format!(
                "max_distance must be positive and finite, got {}",
                self.max_distance
            )));
        }
        if !(self.position.is_finite() && self.half_size.is_finite()) {
            return Err(EarshotError::InvalidSource(
                "position and half_size must be finite".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitter_position_is_footprint_center() {
        let source = SoundSource::new("clock", Point2D::new(10.0, 20.0), 200.0)
            .with_half_size(Size2D::new(8.0, 8.0));
        assert_eq!(source.emitter_position(), Point2D::new(18.0, 28.0));
    }

    #[test]
    fn test_source_validation() {
        assert!(SoundSource::new("clock", Point2D::ZERO, 200.0).validate().is_ok());
        assert!(SoundSource::new("", Point2D::ZERO, 200.0).validate().is_err());
        assert!(SoundSource::new("clock", Point2D::ZERO, 0.0).validate().is_err());
        assert!(SoundSource::new("clock", Point2D::ZERO, f64::NAN).validate().is_err());
        assert!(
            SoundSource::new("clock", Point2D::new(f64::INFINITY, 0.0), 10.0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_source_defaults() {
        let source = SoundSource::new("exit_hum", Point2D::ZERO, 300.0).with_kind(SourceKind::Exit);
        assert!(source.is_active);
        assert_eq!(source.kind, SourceKind::Exit);
        assert_eq!(source.half_size, Size2D::ZERO);
    }
}
