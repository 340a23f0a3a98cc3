use super::policy::{PlaybackReliabilityPolicy, SessionKeying};
use crate::error::{EarshotError, Result};
use std::time::Duration;

/// Tuning for the line-of-sight wall query.
#[derive(Debug, Clone, PartialEq)]
pub struct OcclusionSettings {
    /// Listener/source pairs closer than this are never occluded
    pub min_occlusion_distance: f64,
    /// Stop collecting wall hits once this many points have been found
    pub max_intersections: usize,
    /// Determinant magnitude below which two segments are treated as parallel
    pub parallel_epsilon: f64,
}

impl Default for OcclusionSettings {
    fn default() -> Self {
        Self {
            min_occlusion_distance: 10.0,
            max_intersections: 10,
            parallel_epsilon: 1e-10,
        }
    }
}

/// Tuning for one-shot bursts that stand in for a failed continuous session.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackSettings {
    /// Burst period at zero volume; louder sources repeat faster, down to half of this
    pub base_interval: Duration,
    /// Sources quieter than this get no bursts at all
    pub min_volume: f64,
    /// Burst volume as a fraction of the computed continuous volume
    pub burst_gain: f64,
    /// How long a burst is assumed to sound
    pub burst_duration: Duration,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(2),
            min_volume: 0.1,
            burst_gain: 0.3,
            burst_duration: Duration::from_millis(500),
        }
    }
}

/// Configuration descriptor for an Earshot world
#[derive(Debug, Clone, PartialEq)]
pub struct EarshotDesc {
    /// Parameter recompute and backend push rate, independent of the tick rate
    pub update_rate_hz: f64,
    /// Injected platform verdict on continuous playback
    pub reliability: PlaybackReliabilityPolicy,
    pub session_keying: SessionKeying,
    /// Soft budget of concurrent backend channels. Exceeding it is reported,
    /// not prevented.
    pub max_concurrent_channels: usize,
    pub occlusion: OcclusionSettings,
    pub fallback: FallbackSettings,
}

impl Default for EarshotDesc {
    fn default() -> Self {
        Self {
            update_rate_hz: 30.0,
            reliability: PlaybackReliabilityPolicy::default(),
            session_keying: SessionKeying::default(),
            max_concurrent_channels: 32,
            occlusion: OcclusionSettings::default(),
            fallback: FallbackSettings::default(),
        }
    }
}

impl EarshotDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_rate_hz(mut self, rate: f64) -> Self {
        self.update_rate_hz = rate;
        self
    }

    pub fn reliability(mut self, policy: PlaybackReliabilityPolicy) -> Self {
        self.reliability = policy;
        self
    }

    pub fn session_keying(mut self, keying: SessionKeying) -> Self {
        self.session_keying = keying;
        self
    }

    pub fn max_concurrent_channels(mut self, max: usize) -> Self {
        self.max_concurrent_channels = max;
        self
    }

    pub fn occlusion(mut self, occlusion: OcclusionSettings) -> Self {
        self.occlusion = occlusion;
        self
    }

    pub fn fallback(mut self, fallback: FallbackSettings) -> Self {
        self.fallback = fallback;
        self
    }

    /// Minimum simulated time between two pushes to the same session.
    ///
    /// Rates too small for the interval to fit in a `Duration` saturate to
    /// `Duration::MAX`; [`validate`](Self::validate) rejects them.
    pub fn update_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.update_rate_hz).unwrap_or(Duration::MAX)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.update_rate_hz.is_finite() && self.update_rate_hz > 0.0) {
            return Err(EarshotError::Configuration(format!(
                "update_rate_hz must be positive and finite, got {}",
                self.update_rate_hz
            )));
        }
        if Duration::try_from_secs_f64(1.0 / self.update_rate_hz).is_err() {
            return Err(EarshotError::Configuration(format!(
                "update_rate_hz {} is too small to schedule",
                self.update_rate_hz
            )));
        }

        let occlusion = &self.occlusion;
        if !(occlusion.min_occlusion_distance.is_finite() && occlusion.min_occlusion_distance >= 0.0)
        {
            return Err(EarshotError::Configuration(format!(
                "min_occlusion_distance must be non-negative, got {}",
                occlusion.min_occlusion_distance
            )));
        }
        if occlusion.max_intersections == 0 {
            return Err(EarshotError::Configuration(
                "max_intersections must be at least 1".into(),
            ));
        }
        if !(occlusion.parallel_epsilon.is_finite() && occlusion.parallel_epsilon > 0.0) {
            return Err(EarshotError::Configuration(format!(
                "parallel_epsilon must be positive, got {}",
                occlusion.parallel_epsilon
            )));
        }

        let fallback = &self.fallback;
        if fallback.base_interval.is_zero() {
            return Err(EarshotError::Configuration(
                "fallback base_interval must be non-zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&fallback.min_volume) {
            return Err(EarshotError::Configuration(format!(
                "fallback min_volume must be between 0.0 and 1.0, got {}",
                fallback.min_volume
            )));
        }
        if !(0.0..=1.0).contains(&fallback.burst_gain) {
            return Err(EarshotError::Configuration(format!(
                "fallback burst_gain must be between 0.0 and 1.0, got {}",
                fallback.burst_gain
            )));
        }

        Ok(())
    }
}
