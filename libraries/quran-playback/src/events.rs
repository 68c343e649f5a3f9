//! Controller Events
//!
//! Typed observer payload the controller emits for its collaborators. The
//! media-control bridge, the wake lock and the UI all consume the same stream
//! via `drain_events()`.

use crate::error::UserFacingError;
use crate::types::{ControllerState, PlayerMode, TrackRef};
use serde::{Deserialize, Serialize};

/// What caused a track change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackChangeCause {
    /// Explicit user request
    User,

    /// Restored from the persisted session
    Restore,

    /// Natural end of track or OS next/previous
    Advance,
}

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControllerEvent {
    /// Controller state changed
    StateChanged {
        state: ControllerState,
    },

    /// A new track was requested
    TrackChanged {
        track: TrackRef,
        previous: Option<TrackRef>,
        cause: TrackChangeCause,
    },

    /// The current track's resource is ready
    Ready {
        track: TrackRef,
        duration: f64,
        /// Offset restored from the saved session (0 when starting fresh)
        start_offset: f64,
    },

    /// Periodic position update while playing
    PositionUpdate {
        position: f64,
        duration: Option<f64>,
    },

    /// Position jumped (seek, restart, replay)
    Seeked {
        position: f64,
    },

    ModeChanged {
        mode: PlayerMode,
    },

    VolumeChanged {
        level: u8,
        is_muted: bool,
    },

    RateChanged {
        rate: f64,
    },

    TranslationToggled {
        show: bool,
    },

    /// A failed load/play will be retried
    RetryScheduled {
        attempt: u32,
        delay_ms: u64,
    },

    /// A user-facing error was raised
    Error {
        error: UserFacingError,
    },

    /// The user-facing error was cleared (retry, dismiss, new track)
    ErrorCleared,

    /// The controller released its resources
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(ControllerEvent::ModeChanged {
            mode: PlayerMode::Shuffle,
        })
        .unwrap();
        assert_eq!(json["type"], "modeChanged");
        assert_eq!(json["mode"], "shuffle");

        let json = serde_json::to_value(ControllerEvent::ErrorCleared).unwrap();
        assert_eq!(json["type"], "errorCleared");
    }
}
