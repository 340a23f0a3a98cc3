//! Periodic one-shot playback standing in for a failed continuous session.
//!
//! While a session is degraded, the controller is consulted every tick with
//! the most recent volume. Audible sources get a quiet one-shot burst, repeated
//! faster the louder (closer) they are:
//!
//! ```text
//! interval = base_interval * (1 - volume * 0.5)   // base .. base/2
//! burst    = volume * burst_gain
//! ```

use crate::backend::PlaybackBackend;
use crate::config::FallbackSettings;
use crate::error::SessionError;
use crate::playback::{FallbackState, SessionKey};
use std::time::Duration;

/// Share of the base interval that full volume removes.
const INTERVAL_VOLUME_FACTOR: f64 = 0.5;

/// What a fallback tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FallbackOutcome {
    /// Volume under the audibility floor; nothing scheduled
    TooQuiet,
    /// Interval since the last burst has not elapsed
    Waiting,
    /// A burst was issued at `volume`
    Burst { volume: f64 },
}

pub struct FallbackController {
    settings: FallbackSettings,
}

impl FallbackController {
    pub fn new(settings: FallbackSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FallbackSettings {
        &self.settings
    }

    /// Burst period for a source at `volume`, bounded below by half the base interval.
    pub fn dynamic_interval(&self, volume: f64) -> Duration {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.settings
            .base_interval
            .mul_f64(1.0 - volume * INTERVAL_VOLUME_FACTOR)
    }

    pub fn burst_volume(&self, volume: f64) -> f64 {
        volume.clamp(0.0, 1.0) * self.settings.burst_gain
    }

    /// Run one fallback tick for a degraded session.
    ///
    /// The burst timer restarts on every attempt, successful or not, so a
    /// failing backend is retried at the burst cadence rather than every tick.
    /// A failed burst leaves `playing_until` untouched.
    pub fn tick<B: PlaybackBackend + ?Sized>(
        &self,
        key: &SessionKey,
        state: &mut FallbackState,
        now: Duration,
        backend: &mut B,
    ) -> Result<FallbackOutcome, SessionError> {
        let volume = state.last_known_volume;
        if !volume.is_finite() || volume < self.settings.min_volume {
            return Ok(FallbackOutcome::TooQuiet);
        }

        state.dynamic_interval = self.dynamic_interval(volume);
        if let Some(last) = state.last_fallback_time {
            if now.saturating_sub(last) < state.dynamic_interval {
                return Ok(FallbackOutcome::Waiting);
            }
        }

        let burst_volume = self.burst_volume(volume);
        state.last_fallback_time = Some(now);

        backend
            .play_one_shot(key, burst_volume)
            .map_err(|source| SessionError::BackendOneShotFailure {
                key: key.clone(),
                source,
            })?;

        state.playing_until = Some(now.saturating_add(self.settings.burst_duration));
        log::debug!(
            "Fallback burst for {} at volume {:.3} (next in {:?})",
            key,
            burst_volume,
            state.dynamic_interval
        );
        Ok(FallbackOutcome::Burst {
            volume: burst_volume,
        })
    }
}
