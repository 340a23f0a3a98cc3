use anyhow::{Result, bail};
use earshot::backend::{BackendResult, PlaybackBackend};
use earshot::{
    BackendError, EarshotDesc, EarshotEvent, EarshotWorld, Obstacle, ObstacleId,
    PlaybackReliabilityPolicy, Point2D, SessionKey, SessionKeying, Size2D, SoundSource,
    SourceKind,
};
use std::collections::BTreeSet;
use std::time::Duration;

const FRAME: Duration = Duration::from_micros(16_667);

#[derive(Debug)]
pub struct Options {
    pub reliability: PlaybackReliabilityPolicy,
    pub session_keying: SessionKeying,
    pub voices: usize,
}

impl Options {
    pub fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut options = Options {
            reliability: PlaybackReliabilityPolicy::Reliable,
            session_keying: SessionKeying::PerSource,
            voices: 3,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--unreliable" => options.reliability = PlaybackReliabilityPolicy::Unreliable,
                "--shared" => options.session_keying = SessionKeying::PerSoundKey,
                "--voices" => {
                    let Some(value) = args.next() else {
                        bail!("--voices needs a number");
                    };
                    options.voices = value.parse()?;
                }
                other => bail!(
                    "unknown argument {:?} (expected --unreliable, --shared or --voices N)",
                    other
                ),
            }
        }
        Ok(options)
    }
}

/// Prints every command and refuses new loops once its voices are taken.
struct ConsoleBackend {
    voices: usize,
    playing: BTreeSet<String>,
}

impl ConsoleBackend {
    fn new(voices: usize) -> Self {
        Self {
            voices,
            playing: BTreeSet::new(),
        }
    }
}

impl PlaybackBackend for ConsoleBackend {
    fn start(&mut self, key: &SessionKey) -> BackendResult {
        if self.playing.len() >= self.voices {
            return Err(BackendError::Unavailable(format!(
                "all {} voices busy",
                self.voices
            )));
        }
        self.playing.insert(key.to_string());
        println!("  [audio] loop  {}", key);
        Ok(())
    }

    fn stop(&mut self, key: &SessionKey) -> BackendResult {
        self.playing.remove(&key.to_string());
        println!("  [audio] stop  {}", key);
        Ok(())
    }

    fn set_volume_balance(&mut self, key: &SessionKey, volume: f64, balance: f64) -> BackendResult {
        log::debug!("[audio] {} volume {:.2} balance {:+.2}", key, volume, balance);
        Ok(())
    }

    fn play_one_shot(&mut self, key: &SessionKey, volume: f64) -> BackendResult {
        println!("  [audio] blip  {} at {:.2}", key.sound_key(), volume);
        Ok(())
    }

    fn set_muffling(&mut self, key: &SessionKey, strength: f64) -> BackendResult {
        log::debug!("[audio] {} muffling {:.2}", key, strength);
        Ok(())
    }
}

/// Two rooms joined by a doorway, with a corridor wall to the south.
fn maze() -> Vec<Obstacle> {
    let wall = |id, x, y, w, h| Obstacle::new(ObstacleId(id), Point2D::new(x, y), Size2D::new(w, h));
    vec![
        wall(1, 200.0, 0.0, 20.0, 160.0),
        wall(2, 200.0, 220.0, 20.0, 180.0),
        wall(3, 0.0, 400.0, 420.0, 20.0),
        wall(4, 320.0, 100.0, 100.0, 20.0),
    ]
}

pub fn run_maze_walk(options: &Options) -> Result<()> {
    log::info!("Running maze walk with {:?}", options);

    let desc = EarshotDesc::new()
        .reliability(options.reliability)
        .session_keying(options.session_keying);
    let mut world = EarshotWorld::new(desc, ConsoleBackend::new(options.voices))?;
    world.set_obstacles(maze());

    let mut sources = Vec::new();
    for (key, position, kind) in [
        ("drip", Point2D::new(60.0, 60.0), SourceKind::Ambient),
        ("drip", Point2D::new(140.0, 330.0), SourceKind::Ambient),
        ("hum", Point2D::new(360.0, 40.0), SourceKind::Ambient),
        ("key", Point2D::new(380.0, 300.0), SourceKind::Item),
        ("exit", Point2D::new(400.0, 460.0), SourceKind::Exit),
    ] {
        let source = SoundSource::new(key, position, 350.0)
            .with_half_size(Size2D::new(8.0, 8.0))
            .with_kind(kind);
        sources.push(world.add_source(source)?);
    }

    // Walk from the west room through the doorway towards the exit.
    let waypoints = [
        Point2D::new(40.0, 40.0),
        Point2D::new(150.0, 190.0),
        Point2D::new(280.0, 190.0),
        Point2D::new(380.0, 300.0),
        Point2D::new(300.0, 380.0),
    ];
    let steps_per_leg = 90;

    for leg in waypoints.windows(2) {
        let (from, to) = (leg[0], leg[1]);
        println!("walking {:?} -> {:?}", from, to);

        for step in 0..steps_per_leg {
            let t = step as f64 / steps_per_leg as f64;
            world.set_listener_position(from.lerp(to, t))?;
            world.advance(FRAME);
            report_events(&world);
        }

        print_params(&world, &sources);

        // Picking up the key silences it.
        if to == Point2D::new(380.0, 300.0) {
            world.set_source_active(sources[3], false)?;
            println!("picked up the key");
        }
    }

    world.unload_level();
    report_events(&world);
    log::info!("Maze walk finished after {:?}", world.elapsed());
    Ok(())
}

fn report_events(world: &EarshotWorld<ConsoleBackend>) {
    for event in world.poll_events() {
        match &event {
            EarshotEvent::SessionDegraded { key, reason } => {
                println!("  ! {} degraded: {}", key, reason)
            }
            EarshotEvent::BackendFailure { error } => println!("  ! {}", error),
            EarshotEvent::ChannelBudgetExceeded {
                live_sessions,
                budget,
            } => println!("  ! {} sessions over budget {}", live_sessions, budget),
            _ => log::debug!("{:?}", event),
        }
    }
}

fn print_params(world: &EarshotWorld<ConsoleBackend>, sources: &[earshot::SourceId]) {
    println!(
        "  listener at ({:.0}, {:.0}), t = {:.2}s",
        world.listener_position().x,
        world.listener_position().y,
        world.elapsed().as_secs_f64()
    );
    for id in sources {
        let Some(source) = world.source(*id) else {
            continue;
        };
        match world.params(*id) {
            Some(params) => println!(
                "    {:<5} {:<6} vol {:.2} bal {:+.2} walls {} muffle {:.1} [{:?}]",
                source.sound_key,
                id.raw(),
                params.volume,
                params.balance,
                params.wall_count,
                params.muffling_strength,
                world.session_state(*id)
            ),
            None => println!("    {:<5} {:<6} inactive", source.sound_key, id.raw()),
        }
    }
}
