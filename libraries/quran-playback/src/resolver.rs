//! Track URL resolution
//!
//! URLs are derived purely from the track reference and the source mode; no
//! network round-trip is needed to compute them.

use crate::config::SourceConfig;
use crate::error::{PlaybackError, Result};
use crate::types::TrackRef;
use url::Url;

/// Where streamable audio comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMode {
    /// Static files: `{base}/{reciter:03}/{surah:03}.{format}`
    Local { base: String, format: String },

    /// Range-serving endpoint: `{base}/{reciter}/{surah}`
    Remote { base: RemoteBase },
}

/// Remote endpoint, either absolute or relative to the page origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteBase {
    Absolute(Url),
    Path(String),
}

/// Maps a [`TrackRef`] to a streamable URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackResolver {
    mode: SourceMode,
}

impl TrackResolver {
    pub fn new(mode: SourceMode) -> Self {
        Self { mode }
    }

    /// Build a resolver from configuration
    ///
    /// A remote base that looks absolute (has a scheme) must parse as a URL.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let mode = if config.use_local_audio {
            SourceMode::Local {
                base: config.local_base.trim_end_matches('/').to_string(),
                format: config.format.clone(),
            }
        } else {
            let base = config.remote_base.trim_end_matches('/');
            let base = if base.contains("://") {
                let url = Url::parse(&format!("{}/", base)).map_err(|e| {
                    PlaybackError::InvalidConfig(format!("remote base {:?}: {}", base, e))
                })?;
                if url.cannot_be_a_base() {
                    return Err(PlaybackError::InvalidConfig(format!(
                        "remote base {:?} cannot be a base URL",
                        base
                    )));
                }
                RemoteBase::Absolute(url)
            } else {
                RemoteBase::Path(base.to_string())
            };
            SourceMode::Remote { base }
        };

        Ok(Self::new(mode))
    }

    pub fn mode(&self) -> &SourceMode {
        &self.mode
    }

    /// Streamable URL for a track
    pub fn resolve(&self, track: TrackRef) -> String {
        let surah = track.surah.get();
        let reciter = track.reciter.get();

        match &self.mode {
            SourceMode::Local { base, format } => {
                format!("{}/{:03}/{:03}.{}", base, reciter, surah, format)
            }
            SourceMode::Remote {
                base: RemoteBase::Absolute(url),
            } => {
                let mut url = url.clone();
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments
                        .pop_if_empty()
                        .push(&reciter.to_string())
                        .push(&surah.to_string());
                }
                url.to_string()
            }
            SourceMode::Remote {
                base: RemoteBase::Path(base),
            } => format!("{}/{}/{}", base, reciter, surah),
        }
    }
}
