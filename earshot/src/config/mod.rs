mod engine_desc;
mod policy;

pub use engine_desc::{EarshotDesc, FallbackSettings, OcclusionSettings};
pub use policy::{PlaybackReliabilityPolicy, SessionKeying};
