//! # Earshot
//!
//! Wall-aware 2D audio parameters for sound-only navigation games.
//!
//! Earshot decides how every sound in a level should be heard from where the
//! player stands. Each source gets a volume, a stereo balance and a muffling
//! strength derived from distance and from the walls between it and the
//! listener. Those parameters drive playback sessions on a host-provided
//! [`PlaybackBackend`]. When the backend cannot sustain a continuous loop, the
//! session degrades to periodic one-shot bursts so the source stays locatable.
//!
//! ## Quick Start
//!
//! ```
//! use earshot::*;
//! use std::time::Duration;
//!
//! // Forward playback commands to an audio thread
//! let (backend, commands) = ChannelBackend::channel();
//! let mut world = EarshotWorld::new(EarshotDesc::default(), backend)?;
//!
//! // A wall between the player and a dripping pipe
//! world.add_obstacle(Obstacle::new(
//!     ObstacleId(1),
//!     Point2D::new(40.0, -50.0),
//!     Size2D::new(20.0, 100.0),
//! ));
//! let drip = world.add_source(SoundSource::new("drip", Point2D::new(100.0, 0.0), 200.0))?;
//!
//! world.set_listener_position(Point2D::ZERO)?;
//! world.advance(Duration::from_millis(16));
//!
//! let params = world.params(drip).unwrap();
//! assert_eq!(params.wall_count, 1);
//! assert!((params.volume - 0.25).abs() < 1e-9);
//!
//! // Start, then the first volume/balance update
//! assert!(matches!(commands.try_recv(), Ok(PlaybackCommand::Start(_))));
//! assert!(matches!(commands.try_recv(), Ok(PlaybackCommand::Update { .. })));
//!
//! for event in world.poll_events() {
//!     if event.is_error() {
//!         eprintln!("{:?}", event);
//!     }
//! }
//! # Ok::<(), EarshotError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`EarshotWorld`]**: Owns the level, the listener and the clock; call `advance` every frame
//! - **[`scene::geometry`]**: Segment intersection and per-wall boundary hits
//! - **[`spatial`]**: Occlusion, muffling, falloff and balance
//! - **[`SessionManager`]**: Session lifecycle, update throttling and failure policy
//! - **[`FallbackController`]**: Periodic one-shot bursts for degraded sessions
//! - **[`PlaybackBackend`]**: Trait the host implements to make sound
//! - **[`EarshotEvent`]**: Lifecycle and failure notifications
//!
//! ## Failure policy
//!
//! [`PlaybackReliabilityPolicy::Reliable`] treats backend failures as
//! transient: they are reported and the command is retried at the next update.
//! [`PlaybackReliabilityPolicy::Unreliable`] degrades the session on the first
//! failure and hands it to the fallback controller.

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod fallback;
pub mod math;
pub mod playback;
pub mod scene;
pub mod session;
pub mod spatial;
pub mod world;

pub use backend::{BackendResult, ChannelBackend, PlaybackBackend, PlaybackCommand};
pub use config::{
    EarshotDesc, FallbackSettings, OcclusionSettings, PlaybackReliabilityPolicy, SessionKeying,
};
pub use error::{BackendError, EarshotError, SessionError};
pub use events::EarshotEvent;
pub use fallback::{FallbackController, FallbackOutcome};
pub use math::{Point2D, Size2D};
pub use playback::{SessionKey, SessionState};
pub use scene::{Obstacle, ObstacleId, SoundSource, SourceId, SourceKind};
pub use session::SessionManager;
pub use spatial::SpatialAudioParams;
pub use world::EarshotWorld;
