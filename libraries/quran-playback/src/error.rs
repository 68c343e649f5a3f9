//! Error types for playback control

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a play attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayErrorKind {
    /// The platform refused programmatic playback without a user gesture
    AutoplayBlocked,

    /// The resource could not be decoded
    Decode,

    /// `play()` was issued before a resource was ready
    NoResource,

    /// Anything else reported by the engine
    Other,
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Resource unreachable or unsupported format
    #[error("Load error: {0}")]
    Load(String),

    /// Decode failure or autoplay-policy rejection
    #[error("Play error ({kind:?}): {cause}")]
    Play { kind: PlayErrorKind, cause: String },

    /// Invalid seek parameters (never surfaced to the user)
    #[error("Invalid seek: {0}")]
    Seek(String),

    /// Storage unavailable or unwritable
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),

    /// Automatic progression to another track failed
    #[error("Advance error: {0}")]
    Advance(String),

    /// Track reference outside the corpus
    #[error("Invalid track: {0}")]
    InvalidTrack(String),

    /// Configuration could not be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Key-value storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage backend is not available (private mode, quota, no window)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Wake lock errors (logged, never fatal)
#[derive(Debug, Error)]
pub enum WakeLockError {
    /// Platform has no wake lock API
    #[error("Wake lock unsupported")]
    Unsupported,

    /// Request or release refused by the platform
    #[error("Wake lock rejected: {0}")]
    Rejected(String),
}

/// Category of an error shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserErrorKind {
    Load,
    Play,
    AutoplayBlocked,
    Advance,
}

/// Error surfaced to the UI
///
/// Stays set until the user retries, dismisses it, or requests another track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFacingError {
    pub kind: UserErrorKind,
    pub message: String,
    /// The next `play()` must come from a user gesture ("tap to play")
    pub needs_user_gesture: bool,
}

impl UserFacingError {
    pub fn load_exhausted(attempts: u32) -> Self {
        Self {
            kind: UserErrorKind::Load,
            message: format!(
                "Failed to load audio after {} attempts. Check your connection and try again.",
                attempts
            ),
            needs_user_gesture: false,
        }
    }

    pub fn play_exhausted(attempts: u32) -> Self {
        Self {
            kind: UserErrorKind::Play,
            message: format!("Playback failed after {} attempts", attempts),
            needs_user_gesture: false,
        }
    }

    pub fn advance_failed(attempts: u32) -> Self {
        Self {
            kind: UserErrorKind::Advance,
            message: format!(
                "Failed to load the next surah after {} attempts",
                attempts
            ),
            needs_user_gesture: false,
        }
    }

    pub fn autoplay_blocked() -> Self {
        Self {
            kind: UserErrorKind::AutoplayBlocked,
            message: "The browser blocked automatic playback. Tap to play.".to_string(),
            needs_user_gesture: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_converts_to_persistence() {
        let err: PlaybackError = StorageError::Unavailable("quota".into()).into();
        assert!(matches!(err, PlaybackError::Persistence(_)));
        assert_eq!(
            err.to_string(),
            "Persistence error: Storage unavailable: quota"
        );
    }

    #[test]
    fn autoplay_error_requires_gesture() {
        let err = UserFacingError::autoplay_blocked();
        assert!(err.needs_user_gesture);
        assert_eq!(err.kind, UserErrorKind::AutoplayBlocked);

        let err = UserFacingError::load_exhausted(3);
        assert!(!err.needs_user_gesture);
        assert!(err.message.contains("3 attempts"));
    }
}
