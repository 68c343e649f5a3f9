//! Player configuration
//!
//! Every field has a default, so a partial (or empty) JSON document is a
//! valid configuration.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for a player instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    pub controller: ControllerConfig,
    pub source: SourceConfig,
    pub bridge: BridgeConfig,
}

impl PlayerConfig {
    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PlaybackError::InvalidConfig(e.to_string()))
    }
}

/// State machine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControllerConfig {
    /// Failures tolerated per load/play sequence before the error is terminal
    pub max_retries: u32,

    /// First retry delay; doubles per attempt
    pub retry_base_delay_ms: u64,

    /// Media-time interval between position checkpoints
    pub checkpoint_interval_secs: f64,

    /// "Previous" restarts the current track past this position
    pub restart_threshold_secs: f64,

    /// Step used by relative seeks without an explicit offset
    pub seek_step_secs: f64,
}

impl ControllerConfig {
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay_ms: 1000,
            checkpoint_interval_secs: 5.0,
            restart_threshold_secs: 3.0,
            seek_step_secs: 10.0,
        }
    }
}

/// Where audio is fetched from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SourceConfig {
    /// Serve static files instead of the range-serving endpoint
    pub use_local_audio: bool,

    /// Static path prefix for local mode
    pub local_base: String,

    /// Range-serving endpoint for remote mode (absolute URL or path)
    pub remote_base: String,

    /// File extension for local mode
    pub format: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            use_local_audio: false,
            local_base: "/audio".to_string(),
            remote_base: "/api/audio".to_string(),
            format: "ogg".to_string(),
        }
    }
}

/// Artwork entry published to the OS media surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// OS media control settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    pub album: String,
    pub artwork: Vec<Artwork>,

    /// Seek offset when the OS does not supply one
    pub default_seek_offset_secs: f64,

    /// Media-time interval between position-state publications
    pub position_sync_interval_secs: f64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            album: "อัลกุรอาน - Al-Quran".to_string(),
            artwork: vec![Artwork {
                src: "/favicon.ico".to_string(),
                sizes: "48x48".to_string(),
                mime_type: "image/x-icon".to_string(),
            }],
            default_seek_offset_secs: 10.0,
            position_sync_interval_secs: 5.0,
        }
    }
}
