//! Event types for Earshot

use crate::error::SessionError;
use crate::playback::SessionKey;

#[derive(Debug, Clone, PartialEq)]
pub enum EarshotEvent {
    SessionStarted {
        key: SessionKey,
    },
    SessionStopped {
        key: SessionKey,
    },
    SessionDegraded {
        key: SessionKey,
        reason: SessionError,
    },
    FallbackBurst {
        key: SessionKey,
        volume: f64,
    },
    BackendFailure {
        error: SessionError,
    },
    ChannelBudgetExceeded {
        live_sessions: usize,
        budget: usize,
    },
}

impl EarshotEvent {
    pub fn key(&self) -> Option<&SessionKey> {
        match self {
            Self::SessionStarted { key }
            | Self::SessionStopped { key }
            | Self::SessionDegraded { key, .. }
            | Self::FallbackBurst { key, .. } => Some(key),
            Self::BackendFailure { error } => Some(error.key()),
            Self::ChannelBudgetExceeded { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::SessionDegraded { .. } | Self::BackendFailure { .. }
        )
    }
}
