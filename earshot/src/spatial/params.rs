use crate::config::OcclusionSettings;
use crate::math::Point2D;
use crate::scene::Obstacle;
use crate::scene::geometry::wall_intersections;

use super::occlusion::{distinct_wall_count, muffling_strength, occlusion_strength};

/// Distance-only playback parameters before walls are considered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseParams {
    pub volume: f64,
    pub balance: f64,
    pub distance: f64,
}

/// Final per-source playback parameters for one update.
///
/// Built fresh every update and replaced wholesale, never patched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialAudioParams {
    /// Playback volume in `[0, 1]`
    pub volume: f64,
    /// Stereo pan in `[-1, 1]`, negative is left
    pub balance: f64,
    /// Straight-line distance from listener to emitter
    pub distance: f64,
    /// Volume fraction removed by walls, in `[0, 0.9]`
    pub occlusion_strength: f64,
    /// Low-pass strength for the backend to apply, in `[0, 0.8]`
    pub muffling_strength: f64,
    /// Distinct walls between listener and emitter
    pub wall_count: usize,
}

impl SpatialAudioParams {
    /// Parameters for a source that should not be heard.
    pub fn silent(distance: f64) -> Self {
        Self {
            volume: 0.0,
            balance: 0.0,
            distance,
            occlusion_strength: 0.0,
            muffling_strength: 0.0,
            wall_count: 0,
        }
    }

    pub fn is_audible(&self) -> bool {
        self.volume > 0.0
    }
}

/// Linear distance falloff and horizontal-offset panning.
///
/// `max_distance` must be positive; callers validate it when sources are
/// registered.
pub fn base_params(listener: Point2D, source: Point2D, max_distance: f64) -> BaseParams {
    let distance = listener.distance(source);
    let volume = ((max_distance - distance) / max_distance).clamp(0.0, 1.0);
    let balance = ((source.x - listener.x) / max_distance).clamp(-1.0, 1.0);

    BaseParams {
        volume,
        balance,
        distance,
    }
}

/// Apply wall attenuation to distance-only parameters.
pub fn with_occlusion(
    base: BaseParams,
    occlusion_strength: f64,
    muffling_strength: f64,
    wall_count: usize,
) -> SpatialAudioParams {
    SpatialAudioParams {
        volume: base.volume * (1.0 - occlusion_strength),
        balance: base.balance,
        distance: base.distance,
        occlusion_strength,
        muffling_strength,
        wall_count,
    }
}

/// Full pipeline for one listener/source pair: wall query, occlusion, falloff.
pub fn compute_params(
    listener: Point2D,
    source: Point2D,
    max_distance: f64,
    obstacles: &[Obstacle],
    settings: &OcclusionSettings,
) -> SpatialAudioParams {
    let base = base_params(listener, source, max_distance);

    // Still queried out of range so debug views show the walls in the way.
    let intersections = wall_intersections(listener, source, obstacles, settings);
    with_occlusion(
        base,
        occlusion_strength(&intersections),
        muffling_strength(&intersections),
        distinct_wall_count(&intersections),
    )
}
