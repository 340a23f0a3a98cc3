/// How the session manager reacts when the playback backend reports a failure.
///
/// Platform capability detection lives with the host; Earshot only receives
/// the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackReliabilityPolicy {
    /// Continuous playback is trusted. Failures are logged and retried on the
    /// next update.
    #[default]
    Reliable,
    /// Continuous playback is known to drop out (e.g. some mobile browsers).
    /// A failed start or update degrades the session to fallback bursts.
    Unreliable,
}

impl PlaybackReliabilityPolicy {
    pub fn degrades_on_failure(&self) -> bool {
        matches!(self, Self::Unreliable)
    }
}

/// What a continuous session is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionKeying {
    /// Every source instance owns its own session, so two emitters of the same
    /// sample pan and attenuate independently.
    #[default]
    PerSource,
    /// All sources sharing a sound key drive one session. Each update the
    /// loudest referencing source wins.
    PerSoundKey,
}
