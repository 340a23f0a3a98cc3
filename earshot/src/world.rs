use crate::backend::PlaybackBackend;
use crate::config::{EarshotDesc, SessionKeying};
use crate::error::{EarshotError, Result};
use crate::events::EarshotEvent;
use crate::math::Point2D;
use crate::playback::{SessionKey, SessionState};
use crate::scene::{Obstacle, SoundSource, SourceId};
use crate::session::SessionManager;
use crate::spatial::{SpatialAudioParams, compute_params};
use crossbeam_channel::{Receiver, unbounded};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

/// Main world object that turns level state into playback commands.
///
/// `EarshotWorld` owns the listener position, the sound sources and walls of
/// the current level, a simulated clock, the [`SessionManager`] and the
/// playback backend. The host calls [`advance`](Self::advance) once per frame.
///
/// # Per-tick pipeline
///
/// - **Geometry**: walls crossed by the listener-to-source line
/// - **Occlusion**: wall count to attenuation and muffling
/// - **Parameters**: distance falloff and balance, scaled by occlusion
/// - **Sessions**: start, update, degrade or burst through the backend
///
/// Steps one to three only run when a session's update cadence allows, so a
/// 60 Hz host still recomputes at the configured rate.
pub struct EarshotWorld<B: PlaybackBackend> {
    desc: EarshotDesc,
    backend: B,
    sessions: SessionManager,
    obstacles: Vec<Obstacle>,
    sources: BTreeMap<SourceId, SoundSource>,
    listener: Point2D,
    clock: Duration,
    next_source_id: u64,
    last_params: HashMap<SourceId, SpatialAudioParams>,
    event_receiver: Receiver<EarshotEvent>,
}

impl<B: PlaybackBackend> EarshotWorld<B> {
    pub fn new(desc: EarshotDesc, backend: B) -> Result<Self> {
        desc.validate()?;

        let (event_sender, event_receiver) = unbounded();
        let sessions = SessionManager::new(&desc, event_sender);

        log::info!(
            "Earshot world created ({} Hz updates, {:?} playback, {:?} sessions)",
            desc.update_rate_hz,
            desc.reliability,
            desc.session_keying
        );

        Ok(Self {
            desc,
            backend,
            sessions,
            obstacles: Vec::new(),
            sources: BTreeMap::new(),
            listener: Point2D::ZERO,
            clock: Duration::ZERO,
            next_source_id: 0,
            last_params: HashMap::new(),
            event_receiver,
        })
    }

    pub fn desc(&self) -> &EarshotDesc {
        &self.desc
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Simulated time accumulated through [`advance`](Self::advance).
    pub fn elapsed(&self) -> Duration {
        self.clock
    }

    pub fn listener_position(&self) -> Point2D {
        self.listener
    }

    pub fn set_listener_position(&mut self, position: Point2D) -> Result<()> {
        ensure_finite(position)?;
        self.listener = position;
        Ok(())
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Replace the wall set, e.g. after a door opens.
    pub fn set_obstacles(&mut self, obstacles: Vec<Obstacle>) {
        log::debug!("Wall set replaced ({} walls)", obstacles.len());
        self.obstacles = obstacles;
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Registers a sound source and returns its handle.
    ///
    /// Playback starts on the next [`advance`](Self::advance) if the source is
    /// active.
    ///
    /// # Errors
    ///
    /// Returns [`EarshotError::InvalidSource`] for an empty sound key or a
    /// non-positive `max_distance`.
    pub fn add_source(&mut self, source: SoundSource) -> Result<SourceId> {
        source.validate()?;

        let id = SourceId(self.next_source_id);
        self.next_source_id += 1;

        log::debug!(
            "Added {:?} source {} ({}) at {:?}",
            source.kind,
            id,
            source.sound_key,
            source.emitter_position()
        );
        self.sources.insert(id, source);
        Ok(id)
    }

    pub fn source(&self, id: SourceId) -> Option<&SoundSource> {
        self.sources.get(&id)
    }

    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.keys().copied().collect()
    }

    /// Removes a source, stopping its session if no other source shares it.
    pub fn remove_source(&mut self, id: SourceId) -> Result<SoundSource> {
        let source = self
            .sources
            .remove(&id)
            .ok_or(EarshotError::UnknownSource(id))?;

        self.last_params.remove(&id);
        let key = self.session_key(id, &source);
        self.release_session(&key);
        Ok(source)
    }

    /// Activates or deactivates a source. Deactivation releases its session
    /// immediately.
    pub fn set_source_active(&mut self, id: SourceId, is_active: bool) -> Result<()> {
        let source = self
            .sources
            .get_mut(&id)
            .ok_or(EarshotError::UnknownSource(id))?;

        if source.is_active == is_active {
            return Ok(());
        }
        source.is_active = is_active;

        if !is_active {
            let key = self.session_key(id, &self.sources[&id]);
            self.last_params.remove(&id);
            self.release_session(&key);
        }
        Ok(())
    }

    pub fn set_source_position(&mut self, id: SourceId, position: Point2D) -> Result<()> {
        ensure_finite(position)?;
        let source = self
            .sources
            .get_mut(&id)
            .ok_or(EarshotError::UnknownSource(id))?;
        source.position = position;
        Ok(())
    }

    /// Most recently computed parameters for a source, for debug display.
    pub fn params(&self, id: SourceId) -> Option<&SpatialAudioParams> {
        self.last_params.get(&id)
    }

    /// State of the session the source currently drives.
    pub fn session_state(&self, id: SourceId) -> Option<SessionState> {
        let source = self.sources.get(&id)?;
        self.sessions.state(&self.session_key(id, source))
    }

    /// Drains events emitted since the last call.
    pub fn poll_events(&self) -> Vec<EarshotEvent> {
        self.event_receiver.try_iter().collect()
    }

    /// Advance the simulated clock by `dt` and run one tick of the pipeline.
    pub fn advance(&mut self, dt: Duration) {
        self.clock = self.clock.saturating_add(dt);
        let now = self.clock;

        let mut groups: BTreeMap<SessionKey, Vec<SourceId>> = BTreeMap::new();
        for (id, source) in &self.sources {
            if source.is_active {
                groups
                    .entry(self.session_key(*id, source))
                    .or_default()
                    .push(*id);
            }
        }

        for (key, members) in &groups {
            let sources = &self.sources;
            let obstacles = &self.obstacles;
            let settings = &self.desc.occlusion;
            let listener = self.listener;
            let last_params = &mut self.last_params;

            self.sessions.update(key, now, &mut self.backend, || {
                let mut loudest: Option<SpatialAudioParams> = None;
                for id in members {
                    let source = &sources[id];
                    let params = compute_params(
                        listener,
                        source.emitter_position(),
                        source.max_distance,
                        obstacles,
                        settings,
                    );
                    last_params.insert(*id, params);
                    if loudest.is_none_or(|current| params.volume > current.volume) {
                        loudest = Some(params);
                    }
                }
                loudest.unwrap_or_else(|| SpatialAudioParams::silent(f64::INFINITY))
            });
        }

        let referenced: HashSet<SessionKey> = groups.into_keys().collect();
        self.sessions.retain_referenced(&referenced, &mut self.backend);
        self.sessions.check_channel_budget();
    }

    /// Stops every session and forgets the level's sources and walls.
    pub fn unload_level(&mut self) {
        log::info!(
            "Unloading level ({} sources, {} sessions)",
            self.sources.len(),
            self.sessions.len()
        );
        self.sessions.stop_all(&mut self.backend);
        self.sources.clear();
        self.obstacles.clear();
        self.last_params.clear();
    }

    fn session_key(&self, id: SourceId, source: &SoundSource) -> SessionKey {
        match self.desc.session_keying {
            SessionKeying::PerSource => SessionKey::per_source(id, source.sound_key.clone()),
            SessionKeying::PerSoundKey => SessionKey::shared(source.sound_key.clone()),
        }
    }

    /// Stop `key` unless another active source still references it.
    fn release_session(&mut self, key: &SessionKey) {
        let still_referenced = self
            .sources
            .iter()
            .any(|(id, source)| source.is_active && &self.session_key(*id, source) == key);

        if !still_referenced {
            self.sessions.stop(key, &mut self.backend);
        }
    }
}

fn ensure_finite(position: Point2D) -> Result<()> {
    if position.is_finite() {
        Ok(())
    } else {
        Err(EarshotError::NonFinitePosition(position))
    }
}

impl<B: PlaybackBackend> Drop for EarshotWorld<B> {
    fn drop(&mut self) {
        self.sessions.stop_all(&mut self.backend);
    }
}
