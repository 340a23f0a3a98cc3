//! Continuous sound session manager.
//!
//! Owns one [`SoundSession`] per [`SessionKey`] and drives it through
//! `Stopped -> Starting -> Active -> Degraded` against a [`PlaybackBackend`].
//! Parameter recomputation and pushes are throttled to the configured update
//! rate; degraded sessions hand over to the [`FallbackController`] every tick.
//!
//! Backend failures never escape. They are logged, published as
//! [`EarshotEvent`]s, and either retried or turned into degradation depending
//! on the [`PlaybackReliabilityPolicy`].

use crate::backend::PlaybackBackend;
use crate::config::{EarshotDesc, PlaybackReliabilityPolicy};
use crate::error::SessionError;
use crate::events::EarshotEvent;
use crate::fallback::{FallbackController, FallbackOutcome};
use crate::playback::{SessionKey, SessionState, SoundSession};
use crate::spatial::SpatialAudioParams;
use crossbeam_channel::Sender;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub struct SessionManager {
    sessions: HashMap<SessionKey, SoundSession>,
    reliability: PlaybackReliabilityPolicy,
    update_interval: Duration,
    fallback: FallbackController,
    max_concurrent_channels: usize,
    over_budget: bool,
    event_sender: Sender<EarshotEvent>,
}

impl SessionManager {
    pub fn new(desc: &EarshotDesc, event_sender: Sender<EarshotEvent>) -> Self {
        Self {
            sessions: HashMap::new(),
            reliability: desc.reliability,
            update_interval: desc.update_interval(),
            fallback: FallbackController::new(desc.fallback.clone()),
            max_concurrent_channels: desc.max_concurrent_channels,
            over_budget: false,
            event_sender,
        }
    }

    pub fn reliability(&self) -> PlaybackReliabilityPolicy {
        self.reliability
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn state(&self, key: &SessionKey) -> Option<SessionState> {
        self.sessions.get(key).map(|session| session.state)
    }

    pub fn session(&self, key: &SessionKey) -> Option<&SoundSession> {
        self.sessions.get(key)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &SoundSession> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions currently holding (or acquiring) a continuous backend channel.
    ///
    /// Degraded sessions only issue one-shots and are not counted.
    pub fn live_sessions(&self) -> usize {
        self.sessions
            .values()
            .filter(|session| {
                matches!(
                    session.state,
                    SessionState::Starting | SessionState::Active
                )
            })
            .count()
    }

    /// Drive the session for `key` through one simulation tick.
    ///
    /// Creates the session on first reference. When the update cadence allows,
    /// `compute` is called for fresh parameters, which are then used to start
    /// or update playback. Degraded sessions run the fallback controller on
    /// every call regardless of cadence.
    ///
    /// Returns the freshly computed parameters, or `None` if this tick was
    /// throttled.
    pub fn update<B, F>(
        &mut self,
        key: &SessionKey,
        now: Duration,
        backend: &mut B,
        compute: F,
    ) -> Option<SpatialAudioParams>
    where
        B: PlaybackBackend + ?Sized,
        F: FnOnce() -> SpatialAudioParams,
    {
        let mut session = self.sessions.remove(key).unwrap_or_else(|| {
            log::debug!("Creating session {}", key);
            SoundSession::new(key.clone())
        });

        let mut computed = None;
        if session.is_due(now, self.update_interval) {
            let params = compute();
            session.record_volume(params.volume);
            session.last_update = Some(now);

            match session.state {
                SessionState::Stopped => {
                    if self.start(&mut session, backend) {
                        self.push(&mut session, &params, backend);
                    }
                }
                SessionState::Starting | SessionState::Active => {
                    self.push(&mut session, &params, backend);
                }
                SessionState::Degraded | SessionState::FallbackPlaying => {}
            }
            computed = Some(params);
        }

        if session.state.is_degraded() {
            self.run_fallback(&mut session, now, backend);
        }

        self.sessions.insert(key.clone(), session);
        computed
    }

    /// Tear down one session. Backend stop is best-effort.
    ///
    /// Returns `false` if no session existed for `key`.
    pub fn stop<B: PlaybackBackend + ?Sized>(&mut self, key: &SessionKey, backend: &mut B) -> bool {
        let Some(mut session) = self.sessions.remove(key) else {
            return false;
        };

        if session.state != SessionState::Stopped {
            if let Err(e) = backend.stop(key) {
                log::warn!("Backend stop for {} failed, ignoring: {}", key, e);
            }
            session.reset();
            log::info!("Session {} stopped", key);
            self.emit(EarshotEvent::SessionStopped { key: key.clone() });
        } else {
            log::debug!("Dropping idle session {}", key);
        }
        true
    }

    /// Tear down every session whose key is not in `referenced`.
    pub fn retain_referenced<B: PlaybackBackend + ?Sized>(
        &mut self,
        referenced: &HashSet<SessionKey>,
        backend: &mut B,
    ) {
        let mut orphaned: Vec<SessionKey> = self
            .sessions
            .keys()
            .filter(|key| !referenced.contains(*key))
            .cloned()
            .collect();
        orphaned.sort();

        for key in orphaned {
            log::debug!("Session {} no longer referenced", key);
            self.stop(&key, backend);
        }
    }

    pub fn stop_all<B: PlaybackBackend + ?Sized>(&mut self, backend: &mut B) {
        let mut keys: Vec<SessionKey> = self.sessions.keys().cloned().collect();
        keys.sort();
        for key in keys {
            self.stop(&key, backend);
        }
    }

    /// Report (once per excursion) when live sessions exceed the channel budget.
    pub fn check_channel_budget(&mut self) {
        let live_sessions = self.live_sessions();
        let exceeded = live_sessions > self.max_concurrent_channels;

        if exceeded && !self.over_budget {
            log::warn!(
                "{} live sessions exceed the channel budget of {}",
                live_sessions,
                self.max_concurrent_channels
            );
            self.emit(EarshotEvent::ChannelBudgetExceeded {
                live_sessions,
                budget: self.max_concurrent_channels,
            });
        }
        self.over_budget = exceeded;
    }

    /// Returns true if continuous playback is now running.
    fn start<B: PlaybackBackend + ?Sized>(
        &self,
        session: &mut SoundSession,
        backend: &mut B,
    ) -> bool {
        session.transition(SessionState::Starting);

        match backend.start(&session.key) {
            Ok(()) => {
                session.transition(SessionState::Active);
                log::info!("Session {} started", session.key);
                self.emit(EarshotEvent::SessionStarted {
                    key: session.key.clone(),
                });
                true
            }
            Err(source) => {
                let error = SessionError::BackendStartFailure {
                    key: session.key.clone(),
                    source,
                };
                self.handle_failure(session, error, SessionState::Stopped);
                false
            }
        }
    }

    fn push<B: PlaybackBackend + ?Sized>(
        &self,
        session: &mut SoundSession,
        params: &SpatialAudioParams,
        backend: &mut B,
    ) {
        let key = &session.key;
        let result = backend
            .set_muffling(key, params.muffling_strength)
            .and_then(|()| backend.set_volume_balance(key, params.volume, params.balance));

        match result {
            Ok(()) => log::debug!(
                "Pushed {}: volume {:.3}, balance {:.3}, muffling {:.2}",
                key,
                params.volume,
                params.balance,
                params.muffling_strength
            ),
            Err(source) => {
                let error = SessionError::BackendUpdateFailure {
                    key: key.clone(),
                    source,
                };
                self.handle_failure(session, error, SessionState::Active);
            }
        }
    }

    /// Degrade under the unreliable policy, otherwise settle in `retry_state`
    /// and try again on the next update.
    fn handle_failure(
        &self,
        session: &mut SoundSession,
        error: SessionError,
        retry_state: SessionState,
    ) {
        if self.reliability.degrades_on_failure() {
            log::warn!("{}; degrading to fallback bursts", error);
            session.degrade(self.fallback.settings().base_interval);
            self.emit(EarshotEvent::SessionDegraded {
                key: session.key.clone(),
                reason: error,
            });
        } else {
            match retry_state {
                SessionState::Stopped => log::error!("{}; will retry", error),
                _ => log::warn!("{}; will retry", error),
            }
            session.transition(retry_state);
            self.emit(EarshotEvent::BackendFailure { error });
        }
    }

    fn run_fallback<B: PlaybackBackend + ?Sized>(
        &self,
        session: &mut SoundSession,
        now: Duration,
        backend: &mut B,
    ) {
        let Some(state) = session.fallback.as_mut() else {
            return;
        };

        if state.playing_until.is_some_and(|until| now >= until) {
            state.playing_until = None;
        }

        let outcome = self.fallback.tick(&session.key, state, now, backend);
        let sounding = state.playing_until.is_some();

        match outcome {
            Ok(FallbackOutcome::Burst { volume }) => {
                log::info!("Fallback burst for {} at volume {:.3}", session.key, volume);
                self.emit(EarshotEvent::FallbackBurst {
                    key: session.key.clone(),
                    volume,
                });
            }
            Ok(FallbackOutcome::TooQuiet | FallbackOutcome::Waiting) => {}
            Err(error) => {
                log::error!("{}", error);
                self.emit(EarshotEvent::BackendFailure { error });
            }
        }

        session.transition(if sounding {
            SessionState::FallbackPlaying
        } else {
            SessionState::Degraded
        });
    }

    fn emit(&self, event: EarshotEvent) {
        if self.event_sender.send(event).is_err() {
            log::trace!("Event receiver dropped, event discarded");
        }
    }
}
