// Spatial parameter pipeline
//
// Distance falloff, stereo balance and wall occlusion for one listener/source
// pair. Everything here is pure; sessions and the backend live elsewhere.

pub mod occlusion;
mod params;

pub use occlusion::{muffling_strength, occlusion_strength};
pub use params::{BaseParams, SpatialAudioParams, base_params, compute_params, with_occlusion};
