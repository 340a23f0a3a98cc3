//! Error types for Earshot

use crate::math::Point2D;
use crate::playback::SessionKey;
use crate::scene::SourceId;
use thiserror::Error;

/// Failure reported by a [`PlaybackBackend`](crate::backend::PlaybackBackend) command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Playback unavailable: {0}")]
    Unavailable(String),

    #[error("Command rejected: {0}")]
    Rejected(String),

    #[error("Backend disconnected")]
    Disconnected,
}

/// Non-fatal failures raised while driving a sound session.
///
/// These never escape a tick. The session manager logs them, publishes them as
/// [`EarshotEvent::BackendFailure`](crate::events::EarshotEvent::BackendFailure)
/// and either retries or degrades depending on the reliability policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Failed to start continuous playback for {key}: {source}")]
    BackendStartFailure {
        key: SessionKey,
        #[source]
        source: BackendError,
    },

    #[error("Failed to update playback parameters for {key}: {source}")]
    BackendUpdateFailure {
        key: SessionKey,
        #[source]
        source: BackendError,
    },

    #[error("Failed to play fallback burst for {key}: {source}")]
    BackendOneShotFailure {
        key: SessionKey,
        #[source]
        source: BackendError,
    },
}

impl SessionError {
    pub fn key(&self) -> &SessionKey {
        match self {
            Self::BackendStartFailure { key, .. }
            | Self::BackendUpdateFailure { key, .. }
            | Self::BackendOneShotFailure { key, .. } => key,
        }
    }
}

#[derive(Error, Debug)]
pub enum EarshotError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid sound source: {0}")]
    InvalidSource(String),

    #[error("Position must be finite, got {0}")]
    NonFinitePosition(Point2D),

    #[error("Unknown sound source {0}")]
    UnknownSource(SourceId),
}

pub type Result<T> = std::result::Result<T, EarshotError>;
