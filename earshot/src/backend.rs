//! Playback backend capability.
//!
//! Earshot computes parameters; something else makes sound. That something
//! implements [`PlaybackBackend`]. Every command reports success or a
//! [`BackendError`], and the session manager decides what a failure means.
//!
//! # Threading
//!
//! Commands are issued from the single thread that calls
//! [`EarshotWorld::advance`](crate::world::EarshotWorld::advance). Hosts whose
//! audio runs elsewhere can use [`ChannelBackend`], which forwards commands
//! over a channel in issue order.
//!
//! # Example
//!
//! ```
//! use earshot::backend::{BackendResult, PlaybackBackend};
//! use earshot::playback::SessionKey;
//!
//! struct PrintBackend;
//!
//! impl PlaybackBackend for PrintBackend {
//!     fn start(&mut self, key: &SessionKey) -> BackendResult {
//!         println!("loop {}", key.sound_key());
//!         Ok(())
//!     }
//!
//!     fn stop(&mut self, key: &SessionKey) -> BackendResult {
//!         println!("stop {}", key);
//!         Ok(())
//!     }
//!
//!     fn set_volume_balance(&mut self, key: &SessionKey, volume: f64, balance: f64) -> BackendResult {
//!         println!("{} vol={:.2} bal={:.2}", key, volume, balance);
//!         Ok(())
//!     }
//!
//!     fn play_one_shot(&mut self, key: &SessionKey, volume: f64) -> BackendResult {
//!         println!("one-shot {} vol={:.2}", key.sound_key(), volume);
//!         Ok(())
//!     }
//! }
//! ```

pub use crate::error::BackendError;
use crate::playback::SessionKey;
use crossbeam_channel::{Receiver, Sender, unbounded};

pub type BackendResult = std::result::Result<(), BackendError>;

/// Commands accepted by an external playback backend.
pub trait PlaybackBackend {
    /// Begin continuous (looping) playback of `key.sound_key()`.
    fn start(&mut self, key: &SessionKey) -> BackendResult;

    /// End continuous playback. Called best-effort on teardown.
    fn stop(&mut self, key: &SessionKey) -> BackendResult;

    /// Update a running session's volume `[0, 1]` and balance `[-1, 1]`.
    fn set_volume_balance(&mut self, key: &SessionKey, volume: f64, balance: f64)
    -> BackendResult;

    /// Play `key.sound_key()` once at `volume`, independent of any session.
    fn play_one_shot(&mut self, key: &SessionKey, volume: f64) -> BackendResult;

    /// Apply a low-pass strength in `[0, 0.8]` to a running session (optional).
    ///
    /// Pushed together with volume and balance. Default implementation does nothing.
    fn set_muffling(&mut self, _key: &SessionKey, _strength: f64) -> BackendResult {
        Ok(())
    }
}

impl<B: PlaybackBackend + ?Sized> PlaybackBackend for Box<B> {
    fn start(&mut self, key: &SessionKey) -> BackendResult {
        (**self).start(key)
    }

    fn stop(&mut self, key: &SessionKey) -> BackendResult {
        (**self).stop(key)
    }

    fn set_volume_balance(
        &mut self,
        key: &SessionKey,
        volume: f64,
        balance: f64,
    ) -> BackendResult {
        (**self).set_volume_balance(key, volume, balance)
    }

    fn play_one_shot(&mut self, key: &SessionKey, volume: f64) -> BackendResult {
        (**self).play_one_shot(key, volume)
    }

    fn set_muffling(&mut self, key: &SessionKey, strength: f64) -> BackendResult {
        (**self).set_muffling(key, strength)
    }
}

/// Backend commands as messages, for hosts that play audio on another thread.
///
/// # Variants
///
/// - `Start`: Begin looping a session's sound
/// - `Stop`: End a session
/// - `Update`: New volume, balance and muffling for a running session
/// - `OneShot`: Play a sound once
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    Start(SessionKey),
    Stop(SessionKey),
    Update {
        key: SessionKey,
        volume: f64,
        balance: f64,
        muffling: f64,
    },
    OneShot {
        key: SessionKey,
        volume: f64,
    },
}

impl PlaybackCommand {
    pub fn key(&self) -> &SessionKey {
        match self {
            Self::Start(key) | Self::Stop(key) => key,
            Self::Update { key, .. } | Self::OneShot { key, .. } => key,
        }
    }
}

/// Forwards every command to a [`Receiver`] owned by the audio thread.
///
/// Volume, balance and muffling are coalesced into a single
/// [`PlaybackCommand::Update`] sent when `set_volume_balance` is called; a
/// preceding `set_muffling` for the same key is folded into it.
pub struct ChannelBackend {
    command_sender: Sender<PlaybackCommand>,
    pending_muffling: Option<(SessionKey, f64)>,
}

impl ChannelBackend {
    /// Create a backend and the receiver the audio thread should drain.
    pub fn channel() -> (Self, Receiver<PlaybackCommand>) {
        let (command_sender, command_receiver) = unbounded();
        (
            Self {
                command_sender,
                pending_muffling: None,
            },
            command_receiver,
        )
    }

    fn send(&self, command: PlaybackCommand) -> BackendResult {
        self.command_sender
            .send(command)
            .map_err(|_| BackendError::Disconnected)
    }
}

impl PlaybackBackend for ChannelBackend {
    fn start(&mut self, key: &SessionKey) -> BackendResult {
        self.send(PlaybackCommand::Start(key.clone()))
    }

    fn stop(&mut self, key: &SessionKey) -> BackendResult {
        if matches!(&self.pending_muffling, Some((pending, _)) if pending == key) {
            self.pending_muffling = None;
        }
        self.send(PlaybackCommand::Stop(key.clone()))
    }

    fn set_volume_balance(
        &mut self,
        key: &SessionKey,
        volume: f64,
        balance: f64,
    ) -> BackendResult {
        let muffling = match self.pending_muffling.take() {
            Some((pending, strength)) if &pending == key => strength,
            _ => 0.0,
        };
        self.send(PlaybackCommand::Update {
            key: key.clone(),
            volume,
            balance,
            muffling,
        })
    }

    fn play_one_shot(&mut self, key: &SessionKey, volume: f64) -> BackendResult {
        self.send(PlaybackCommand::OneShot {
            key: key.clone(),
            volume,
        })
    }

    fn set_muffling(&mut self, key: &SessionKey, strength: f64) -> BackendResult {
        self.pending_muffling = Some((key.clone(), strength));
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scriptable recording backend for unit tests.

    use super::*;

    #[derive(Default)]
    pub(crate) struct RecordingBackend {
        pub commands: Vec<PlaybackCommand>,
        pub fail_start: bool,
        pub fail_update: bool,
        pub fail_one_shot: bool,
    }

    impl RecordingBackend {
        pub fn one_shots(&self) -> Vec<f64> {
            self.commands
                .iter()
                .filter_map(|command| match command {
                    PlaybackCommand::OneShot { volume, .. } => Some(*volume),
                    _ => None,
                })
                .collect()
        }

        pub fn count(&self, predicate: impl Fn(&PlaybackCommand) -> bool) -> usize {
            self.commands.iter().filter(|c| predicate(c)).count()
        }
    }

    fn rejected(what: &str) -> BackendError {
        BackendError::Rejected(format!("scripted {} failure", what))
    }

    impl PlaybackBackend for RecordingBackend {
        fn start(&mut self, key: &SessionKey) -> BackendResult {
            if self.fail_start {
                return Err(rejected("start"));
            }
            self.commands.push(PlaybackCommand::Start(key.clone()));
            Ok(())
        }

        fn stop(&mut self, key: &SessionKey) -> BackendResult {
            self.commands.push(PlaybackCommand::Stop(key.clone()));
            Ok(())
        }

        fn set_volume_balance(
            &mut self,
            key: &SessionKey,
            volume: f64,
            balance: f64,
        ) -> BackendResult {
            if self.fail_update {
                return Err(rejected("update"));
            }
            self.commands.push(PlaybackCommand::Update {
                key: key.clone(),
                volume,
                balance,
                muffling: 0.0,
            });
            Ok(())
        }

        fn play_one_shot(&mut self, key: &SessionKey, volume: f64) -> BackendResult {
            if self.fail_one_shot {
                return Err(rejected("one-shot"));
            }
            self.commands.push(PlaybackCommand::OneShot {
                key: key.clone(),
                volume,
            });
            Ok(())
        }
    }
}
