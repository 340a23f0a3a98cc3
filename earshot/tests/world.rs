//! End-to-end scenarios through `EarshotWorld` with a scripted backend.

use earshot::*;
use std::time::Duration;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Start(String),
    Stop(String),
    Update(String, f64, f64),
    Muffle(String, f64),
    OneShot(String, f64),
}

/// Backend that records calls and can be told to refuse continuous playback.
#[derive(Default)]
struct ScriptedBackend {
    calls: Vec<Call>,
    refuse_start: bool,
    refuse_one_shot: bool,
}

impl ScriptedBackend {
    fn one_shots(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::OneShot(_, volume) => Some(*volume),
                _ => None,
            })
            .collect()
    }

    fn updates(&self) -> Vec<(f64, f64)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Update(_, volume, balance) => Some((*volume, *balance)),
                _ => None,
            })
            .collect()
    }
}

impl PlaybackBackend for ScriptedBackend {
    fn start(&mut self, key: &SessionKey) -> BackendResult {
        if self.refuse_start {
            return Err(BackendError::Unavailable("no free voice".into()));
        }
        self.calls.push(Call::Start(key.to_string()));
        Ok(())
    }

    fn stop(&mut self, key: &SessionKey) -> BackendResult {
        self.calls.push(Call::Stop(key.to_string()));
        Ok(())
    }

    fn set_volume_balance(&mut self, key: &SessionKey, volume: f64, balance: f64) -> BackendResult {
        self.calls.push(Call::Update(key.to_string(), volume, balance));
        Ok(())
    }

    fn play_one_shot(&mut self, key: &SessionKey, volume: f64) -> BackendResult {
        if self.refuse_one_shot {
            return Err(BackendError::Rejected("one-shot refused".into()));
        }
        self.calls.push(Call::OneShot(key.to_string(), volume));
        Ok(())
    }

    fn set_muffling(&mut self, key: &SessionKey, strength: f64) -> BackendResult {
        self.calls.push(Call::Muffle(key.to_string(), strength));
        Ok(())
    }
}

fn wall(id: u64, x: f64, y: f64, w: f64, h: f64) -> Obstacle {
    Obstacle::new(ObstacleId(id), Point2D::new(x, y), Size2D::new(w, h))
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

const FRAME: Duration = Duration::from_millis(10);

#[test]
fn test_walls_attenuate_and_muffle() {
    init_logger();
    let mut world = EarshotWorld::new(EarshotDesc::default(), ScriptedBackend::default()).unwrap();
    world.set_obstacles(vec![
        wall(1, 30.0, -50.0, 10.0, 100.0),
        wall(2, 60.0, -50.0, 10.0, 100.0),
    ]);
    let id = world
        .add_source(SoundSource::new("hum", Point2D::new(100.0, 0.0), 200.0))
        .unwrap();

    world.advance(FRAME);

    let params = *world.params(id).unwrap();
    assert_eq!(params.wall_count, 2);
    assert!(approx(params.occlusion_strength, 0.75));
    assert!(approx(params.volume, 0.5 * 0.25));
    assert!(approx(params.balance, 0.5));
    // Four boundary crossings, capped at 0.8.
    assert!(approx(params.muffling_strength, 0.8));

    let muffle = world
        .backend()
        .calls
        .iter()
        .find_map(|call| match call {
            Call::Muffle(_, strength) => Some(*strength),
            _ => None,
        });
    assert_eq!(muffle, Some(params.muffling_strength));
}

#[test]
fn test_walking_around_a_wall_restores_volume() {
    init_logger();
    let mut world = EarshotWorld::new(EarshotDesc::default(), ScriptedBackend::default()).unwrap();
    world.add_obstacle(wall(1, 40.0, -20.0, 20.0, 40.0));
    let id = world
        .add_source(SoundSource::new("drip", Point2D::new(100.0, 0.0), 200.0))
        .unwrap();

    world.advance(FRAME);
    let hidden = world.params(id).unwrap().volume;

    // Step far enough that the line of sight passes below the wall.
    world.set_listener_position(Point2D::new(0.0, 100.0)).unwrap();
    world.set_source_position(id, Point2D::new(100.0, 100.0)).unwrap();
    world.advance(Duration::from_millis(50));
    let clear = world.params(id).unwrap();

    assert_eq!(clear.wall_count, 0);
    assert!(clear.volume > hidden);
    assert!(approx(clear.volume, 0.5));
}

#[test]
fn test_close_sources_ignore_walls() {
    init_logger();
    let mut world = EarshotWorld::new(EarshotDesc::default(), ScriptedBackend::default()).unwrap();
    world.add_obstacle(wall(1, 2.0, -5.0, 1.0, 10.0));
    let id = world
        .add_source(SoundSource::new("drip", Point2D::new(5.0, 0.0), 200.0))
        .unwrap();

    world.advance(FRAME);

    let params = world.params(id).unwrap();
    assert_eq!(params.wall_count, 0);
    assert_eq!(params.occlusion_strength, 0.0);
}

#[test]
fn test_unreliable_backend_falls_back_to_bursts() {
    init_logger();
    let backend = ScriptedBackend {
        refuse_start: true,
        ..Default::default()
    };
    let desc = EarshotDesc::new().reliability(PlaybackReliabilityPolicy::Unreliable);
    let mut world = EarshotWorld::new(desc, backend).unwrap();
    let id = world
        .add_source(
            SoundSource::new("exit", Point2D::new(100.0, 0.0), 200.0).with_kind(SourceKind::Exit),
        )
        .unwrap();

    world.advance(FRAME);
    assert_eq!(world.session_state(id), Some(SessionState::FallbackPlaying));

    let events = world.poll_events();
    assert!(matches!(
        events[0],
        EarshotEvent::SessionDegraded {
            reason: SessionError::BackendStartFailure { .. },
            ..
        }
    ));
    assert!(matches!(events[1], EarshotEvent::FallbackBurst { .. }));

    // Volume 0.5: bursts every 1.5 s at 0.15, burst audible for 0.5 s.
    for _ in 0..60 {
        world.advance(FRAME);
    }
    assert_eq!(world.session_state(id), Some(SessionState::Degraded));
    assert_eq!(world.backend().one_shots().len(), 1);

    for _ in 0..100 {
        world.advance(FRAME);
    }
    let bursts = world.backend().one_shots();
    assert_eq!(bursts.len(), 2);
    assert!(bursts.iter().all(|v| approx(*v, 0.15)));
    assert!(world.backend().updates().is_empty());
}

#[test]
fn test_reliable_backend_keeps_retrying() {
    init_logger();
    let backend = ScriptedBackend {
        refuse_start: true,
        ..Default::default()
    };
    let mut world = EarshotWorld::new(EarshotDesc::default(), backend).unwrap();
    let id = world
        .add_source(SoundSource::new("drip", Point2D::new(50.0, 0.0), 200.0))
        .unwrap();

    for _ in 0..10 {
        world.advance(FRAME);
    }
    assert_eq!(world.session_state(id), Some(SessionState::Stopped));
    assert!(world.backend().one_shots().is_empty());
    assert!(world.poll_events().iter().all(|e| matches!(
        e,
        EarshotEvent::BackendFailure {
            error: SessionError::BackendStartFailure { .. }
        }
    )));

    world.backend_mut().refuse_start = false;
    for _ in 0..4 {
        world.advance(FRAME);
    }
    assert_eq!(world.session_state(id), Some(SessionState::Active));
}

#[test]
fn test_failed_bursts_do_not_escalate() {
    init_logger();
    let backend = ScriptedBackend {
        refuse_start: true,
        refuse_one_shot: true,
        ..Default::default()
    };
    let desc = EarshotDesc::new().reliability(PlaybackReliabilityPolicy::Unreliable);
    let mut world = EarshotWorld::new(desc, backend).unwrap();
    let id = world
        .add_source(SoundSource::new("drip", Point2D::new(0.0, 0.0), 200.0))
        .unwrap();

    // Full volume retries every second: attempts at 10 ms and 1010 ms.
    for _ in 0..150 {
        world.advance(FRAME);
    }
    assert_eq!(world.session_state(id), Some(SessionState::Degraded));

    let failures = world
        .poll_events()
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                EarshotEvent::BackendFailure {
                    error: SessionError::BackendOneShotFailure { .. }
                }
            )
        })
        .count();
    assert_eq!(failures, 2);
}

#[test]
fn test_deactivating_a_source_stops_its_session() {
    init_logger();
    let mut world = EarshotWorld::new(EarshotDesc::default(), ScriptedBackend::default()).unwrap();
    let door = world
        .add_source(
            SoundSource::new("door", Point2D::new(20.0, 0.0), 100.0).with_kind(SourceKind::Door),
        )
        .unwrap();
    world.advance(FRAME);

    world.set_source_active(door, false).unwrap();
    world.advance(FRAME);

    assert_eq!(world.session_state(door), None);
    assert!(world.sessions().is_empty());
    assert_eq!(
        world.backend().calls.last(),
        Some(&Call::Stop(format!("door@{}", door.raw())))
    );

    // Reactivation starts a fresh session.
    world.set_source_active(door, true).unwrap();
    world.advance(FRAME);
    assert_eq!(world.session_state(door), Some(SessionState::Active));
}

#[test]
fn test_shared_key_session_survives_until_last_source() {
    init_logger();
    let desc = EarshotDesc::new().session_keying(SessionKeying::PerSoundKey);
    let mut world = EarshotWorld::new(desc, ScriptedBackend::default()).unwrap();
    let a = world
        .add_source(SoundSource::new("drip", Point2D::new(-50.0, 0.0), 200.0))
        .unwrap();
    let b = world
        .add_source(SoundSource::new("drip", Point2D::new(150.0, 0.0), 200.0))
        .unwrap();
    world.advance(FRAME);

    assert_eq!(world.sessions().len(), 1);
    assert_eq!(world.backend().updates(), vec![(0.75, -0.25)]);

    world.remove_source(a).unwrap();
    assert_eq!(world.session_state(b), Some(SessionState::Active));
    assert!(!world.backend().calls.contains(&Call::Stop("drip".into())));

    world.remove_source(b).unwrap();
    assert!(world.sessions().is_empty());
    assert!(world.backend().calls.contains(&Call::Stop("drip".into())));
}

#[test]
fn test_unload_level_and_drop_stop_sessions() {
    init_logger();
    let (backend, commands) = ChannelBackend::channel();
    let mut world = EarshotWorld::new(EarshotDesc::default(), backend).unwrap();
    world
        .add_source(SoundSource::new("drip", Point2D::new(10.0, 0.0), 200.0))
        .unwrap();
    world.advance(FRAME);
    world.unload_level();

    let sent: Vec<PlaybackCommand> = commands.try_iter().collect();
    assert!(matches!(sent[0], PlaybackCommand::Start(_)));
    assert!(matches!(sent[1], PlaybackCommand::Update { .. }));
    assert!(matches!(sent.last(), Some(PlaybackCommand::Stop(_))));

    world
        .add_source(SoundSource::new("hum", Point2D::new(10.0, 0.0), 200.0))
        .unwrap();
    world.advance(FRAME);
    drop(world);

    let sent: Vec<PlaybackCommand> = commands.try_iter().collect();
    assert_eq!(
        sent.last().map(|c| c.key().sound_key().to_owned()),
        Some("hum".to_owned())
    );
    assert!(matches!(sent.last(), Some(PlaybackCommand::Stop(_))));
}

#[test]
fn test_channel_budget_is_reported() {
    init_logger();
    let desc = EarshotDesc::new().max_concurrent_channels(2);
    let mut world = EarshotWorld::new(desc, ScriptedBackend::default()).unwrap();
    for i in 0..3 {
        world
            .add_source(SoundSource::new(
                format!("src{}", i),
                Point2D::new(10.0 * i as f64, 0.0),
                200.0,
            ))
            .unwrap();
    }

    world.advance(FRAME);
    world.advance(FRAME);

    let reports: Vec<EarshotEvent> = world
        .poll_events()
        .into_iter()
        .filter(|e| matches!(e, EarshotEvent::ChannelBudgetExceeded { .. }))
        .collect();
    assert_eq!(
        reports,
        vec![EarshotEvent::ChannelBudgetExceeded {
            live_sessions: 3,
            budget: 2
        }]
    );
}
