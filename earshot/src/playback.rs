//! Continuous session state.
//!
//! This module provides the per-session record kept by the
//! [`SessionManager`](crate::session::SessionManager):
//! - [`SessionKey`]: What a session is unique by
//! - [`SessionState`]: Lifecycle of a continuous session
//! - [`FallbackState`]: Burst bookkeeping for degraded sessions
//! - [`SoundSession`]: The record itself
//!
//! Sources never hold playback state; they only name a sound key.

use crate::scene::SourceId;
use std::time::Duration;

/// Uniqueness domain of a continuous session.
///
/// Under [`SessionKeying::PerSource`](crate::config::SessionKeying::PerSource)
/// the key carries the owning source; under `PerSoundKey` it does not, so all
/// sources with the same sample share it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    sound_key: String,
    source: Option<SourceId>,
}

impl SessionKey {
    pub fn per_source(source: SourceId, sound_key: impl Into<String>) -> Self {
        Self {
            sound_key: sound_key.into(),
            source: Some(source),
        }
    }

    pub fn shared(sound_key: impl Into<String>) -> Self {
        Self {
            sound_key: sound_key.into(),
            source: None,
        }
    }

    /// Asset key the backend should play.
    pub fn sound_key(&self) -> &str {
        &self.sound_key
    }

    /// Owning source, if the session is not shared.
    pub fn source(&self) -> Option<SourceId> {
        self.source
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.source {
            Some(source) => write!(f, "{}@{}", self.sound_key, source.raw()),
            None => write!(f, "{}", self.sound_key),
        }
    }
}

/// Lifecycle of a continuous session.
///
/// ```text
/// Stopped -> Starting -> Active -> Degraded <-> FallbackPlaying
///    ^                                |
///    +------------- teardown ---------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No backend playback. Initial and terminal state.
    #[default]
    Stopped,
    /// A start command is in flight
    Starting,
    /// Continuous playback running; parameters pushed on the update cadence
    Active,
    /// Continuous playback failed on an unreliable platform; bursts stand in
    Degraded,
    /// Degraded, with a fallback burst currently sounding
    FallbackPlaying,
}

impl SessionState {
    /// True for both degraded sub-modes.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded | Self::FallbackPlaying)
    }
}

/// Bookkeeping for fallback bursts, present only while degraded.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackState {
    /// Simulated time of the last burst attempt, successful or not
    pub last_fallback_time: Option<Duration>,
    /// Burst period derived from the last known volume
    pub dynamic_interval: Duration,
    /// Volume from the most recent parameter update
    pub last_known_volume: f64,
    /// End of the burst currently sounding
    pub(crate) playing_until: Option<Duration>,
}

impl FallbackState {
    pub fn new(base_interval: Duration, last_known_volume: f64) -> Self {
        Self {
            last_fallback_time: None,
            dynamic_interval: base_interval,
            last_known_volume,
            playing_until: None,
        }
    }
}

/// One continuous session, owned by the session manager.
#[derive(Debug, Clone)]
pub struct SoundSession {
    pub key: SessionKey,
    pub state: SessionState,
    /// Simulated time of the last parameter push or start attempt
    pub last_update: Option<Duration>,
    /// Volume from the most recent parameter update
    pub last_volume: f64,
    pub fallback: Option<FallbackState>,
}

impl SoundSession {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            state: SessionState::Stopped,
            last_update: None,
            last_volume: 0.0,
            fallback: None,
        }
    }

    /// Whether the update cadence allows another push at `now`.
    pub fn is_due(&self, now: Duration, interval: Duration) -> bool {
        match self.last_update {
            None => true,
            Some(last) => now.saturating_sub(last) >= interval,
        }
    }

    pub(crate) fn transition(&mut self, state: SessionState) {
        if self.state != state {
            log::debug!("Session {} {:?} -> {:?}", self.key, self.state, state);
            self.state = state;
        }
    }

    /// Enter `Degraded`, creating fallback bookkeeping if needed.
    pub(crate) fn degrade(&mut self, base_interval: Duration) {
        if self.fallback.is_none() {
            self.fallback = Some(FallbackState::new(base_interval, self.last_volume));
        }
        self.transition(SessionState::Degraded);
    }

    /// Back to `Stopped`, dropping any fallback bookkeeping.
    pub(crate) fn reset(&mut self) {
        self.transition(SessionState::Stopped);
        self.fallback = None;
        self.last_update = None;
    }

    pub(crate) fn record_volume(&mut self, volume: f64) {
        self.last_volume = volume;
        if let Some(fallback) = self.fallback.as_mut() {
            fallback.last_known_volume = volume;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_display() {
        assert_eq!(SessionKey::shared("drip").to_string(), "drip");
        assert_eq!(
            SessionKey::per_source(SourceId(4), "drip").to_string(),
            "drip@4"
        );
    }

    #[test]
    fn test_keys_with_same_sound_differ_per_source() {
        let a = SessionKey::per_source(SourceId(1), "drip");
        let b = SessionKey::per_source(SourceId(2), "drip");
        assert_ne!(a, b);
        assert_eq!(a.sound_key(), b.sound_key());
        assert_eq!(SessionKey::shared("drip"), SessionKey::shared("drip"));
    }

    #[test]
    fn test_is_due_respects_interval() {
        let interval = Duration::from_millis(33);
        let mut session = SoundSession::new(SessionKey::shared("drip"));
        assert!(session.is_due(Duration::ZERO, interval));

        session.last_update = Some(Duration::from_millis(100));
        assert!(!session.is_due(Duration::from_millis(116), interval));
        assert!(session.is_due(Duration::from_millis(133), interval));
    }

    #[test]
    fn test_degrade_and_reset() {
        let mut session = SoundSession::new(SessionKey::shared("drip"));
        session.record_volume(0.7);
        session.degrade(Duration::from_secs(2));

        assert_eq!(session.state, SessionState::Degraded);
        assert!(session.state.is_degraded());
        let fallback = session.fallback.as_ref().expect("fallback state");
        assert_eq!(fallback.last_known_volume, 0.7);
        assert_eq!(fallback.last_fallback_time, None);

        session.record_volume(0.2);
        assert_eq!(session.fallback.as_ref().map(|f| f.last_known_volume), Some(0.2));

        session.reset();
        assert_eq!(session.state, SessionState::Stopped);
        assert!(session.fallback.is_none());
        assert!(session.last_update.is_none());
    }
}
