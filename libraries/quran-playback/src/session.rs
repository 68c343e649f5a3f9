//! Persisted player session
//!
//! A single JSON record under [`STORAGE_KEY`] holds the last track, position,
//! mode and preferences. Reads never fail as a whole: each field that is
//! missing or malformed falls back to its default on its own.

use crate::error::{Result, StorageError};
use crate::storage::KeyValueStorage;
use crate::types::{PlaybackPosition, PlayerMode, ReciterId, SurahId, TrackRef};
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Well-known key of the session record
pub const STORAGE_KEY: &str = "quran-th-player-state";

pub const MIN_PLAYBACK_RATE: f64 = 0.25;
pub const MAX_PLAYBACK_RATE: f64 = 2.0;
pub const MAX_VOLUME: u8 = 100;

/// Durable record of the last session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(rename = "currentSurah")]
    pub surah: Option<SurahId>,

    #[serde(rename = "currentReciter")]
    pub reciter: ReciterId,

    /// Last known offset; only meaningful for `track()`
    #[serde(rename = "currentTime")]
    pub offset_secs: f64,

    #[serde(rename = "playerMode")]
    pub mode: PlayerMode,

    /// 0..=100
    pub volume: u8,

    /// 0.25..=2.0
    #[serde(rename = "playbackRate")]
    pub playback_rate: f64,

    #[serde(rename = "showTranslation")]
    pub show_translation: bool,
}

impl Default for PersistedSession {
    fn default() -> Self {
        Self {
            surah: None,
            reciter: ReciterId::DEFAULT,
            offset_secs: 0.0,
            mode: PlayerMode::AutoNext,
            volume: 80,
            playback_rate: 1.0,
            show_translation: true,
        }
    }
}

impl PersistedSession {
    /// Track the session refers to, if any
    pub fn track(&self) -> Option<TrackRef> {
        self.surah.map(|surah| TrackRef::new(surah, self.reciter))
    }

    /// Saved position, only when a track is recorded
    pub fn position(&self) -> Option<PlaybackPosition> {
        self.track().map(|track| PlaybackPosition {
            track,
            offset_secs: self.offset_secs,
        })
    }

    /// Saved offset if it belongs to `track` and lies strictly inside `(0, duration)`
    pub fn restorable_offset(&self, track: TrackRef, duration: f64) -> Option<f64> {
        let saved = self.offset_secs;
        (self.track() == Some(track) && saved > 0.0 && saved < duration).then_some(saved)
    }

    /// Decode a stored record field by field
    ///
    /// Returns `None` only when the document is not a JSON object at all.
    pub fn decode(json: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(json).ok()?;
        let obj = value.as_object()?;
        let defaults = Self::default();

        let offset_secs = field::<f64>(obj, "currentTime")
            .filter(|t| t.is_finite() && *t >= 0.0)
            .unwrap_or(defaults.offset_secs);

        let volume = field::<f64>(obj, "volume")
            .filter(|v| v.is_finite())
            .map(|v| v.round().clamp(0.0, f64::from(MAX_VOLUME)) as u8)
            .unwrap_or(defaults.volume);

        let playback_rate = field::<f64>(obj, "playbackRate")
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE))
            .unwrap_or(defaults.playback_rate);

        Some(Self {
            surah: field::<Option<SurahId>>(obj, "currentSurah").unwrap_or(defaults.surah),
            reciter: field(obj, "currentReciter").unwrap_or(defaults.reciter),
            offset_secs,
            mode: field(obj, "playerMode").unwrap_or(defaults.mode),
            volume,
            playback_rate,
            show_translation: field(obj, "showTranslation").unwrap_or(defaults.show_translation),
        })
    }
}

fn field<T: DeserializeOwned>(obj: &Map<String, Value>, name: &str) -> Option<T> {
    let value = obj.get(name)?;
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(field = name, error = %e, "Ignoring malformed session field");
            None
        }
    }
}

/// Owner of the persisted session
///
/// Every mutation is written through synchronously; a failed write is logged
/// by the caller and the in-memory copy stays authoritative.
pub struct SessionStore {
    storage: Box<dyn KeyValueStorage>,
    session: PersistedSession,
}

impl SessionStore {
    /// Load the session, creating one with a random surah for first-time users
    pub fn open(storage: Box<dyn KeyValueStorage>, rng: &mut dyn RngCore) -> Self {
        let mut store = Self {
            storage,
            session: PersistedSession::default(),
        };

        match store.storage.get(STORAGE_KEY) {
            Ok(Some(json)) => {
                if let Some(session) = PersistedSession::decode(&json) {
                    debug!(surah = ?session.surah, reciter = %session.reciter, "Loaded session");
                    store.session = session;
                } else {
                    warn!("Stored session is corrupt, starting fresh");
                    store.session.surah = Some(SurahId::random(rng));
                }
            }
            Ok(None) => {
                let surah = SurahId::random(rng);
                store.session.surah = Some(surah);
                info!(surah = %surah, reciter = %store.session.reciter, "New session with random surah");
                if let Err(e) = store.write() {
                    warn!(error = %e, "Failed to save initial session");
                }
            }
            Err(e) => {
                warn!(error = %e, "Session storage unavailable, continuing in memory");
                store.session.surah = Some(SurahId::random(rng));
            }
        }

        store
    }

    pub fn session(&self) -> &PersistedSession {
        &self.session
    }

    /// Mutate the session and write it through
    pub fn update(&mut self, mutate: impl FnOnce(&mut PersistedSession)) -> Result<()> {
        mutate(&mut self.session);
        self.write()
    }

    /// Remove the stored record and reset to defaults in memory
    pub fn clear(&mut self) -> Result<()> {
        self.session = PersistedSession::default();
        self.storage.remove(STORAGE_KEY)?;
        Ok(())
    }

    fn write(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.session).map_err(StorageError::from)?;
        self.storage.set(STORAGE_KEY, &json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn track(surah: u16, reciter: u32) -> TrackRef {
        TrackRef::new(SurahId::new(surah).unwrap(), ReciterId(reciter))
    }

    #[test]
    fn first_read_creates_random_surah_and_saves() {
        let storage = MemoryStorage::new();
        let mut rng = StdRng::seed_from_u64(1);
        let store = SessionStore::open(Box::new(storage.clone()), &mut rng);

        let session = store.session();
        assert!(session.surah.is_some());
        assert_eq!(session.reciter, ReciterId(2));
        assert_eq!(session.offset_secs, 0.0);
        assert_eq!(session.mode, PlayerMode::AutoNext);
        assert_eq!(session.volume, 80);

        let saved = storage.get(STORAGE_KEY).unwrap().unwrap();
        assert_eq!(PersistedSession::decode(&saved).as_ref(), Some(session));
    }

    #[test]
    fn bad_fields_fall_back_individually() {
        let json = r#"{
            "currentSurah": 500,
            "currentReciter": 1,
            "currentTime": "soon",
            "playerMode": "shuffle",
            "volume": 250,
            "playbackRate": 9,
            "showTranslation": false
        }"#;
        let session = PersistedSession::decode(json).unwrap();
        assert_eq!(session.surah, None);
        assert_eq!(session.reciter, ReciterId(1));
        assert_eq!(session.offset_secs, 0.0);
        assert_eq!(session.mode, PlayerMode::Shuffle);
        assert_eq!(session.volume, 100);
        assert_eq!(session.playback_rate, MAX_PLAYBACK_RATE);
        assert!(!session.show_translation);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let session = PersistedSession::decode(r#"{ "currentSurah": 18 }"#).unwrap();
        assert_eq!(session.track(), Some(track(18, 2)));
        assert_eq!(session.playback_rate, 1.0);
        assert!(session.show_translation);
    }

    #[test]
    fn non_object_is_corrupt() {
        assert!(PersistedSession::decode("[1,2,3]").is_none());
        assert!(PersistedSession::decode("garbage").is_none());

        let storage = MemoryStorage::with_entry(STORAGE_KEY, "garbage");
        let mut rng = StdRng::seed_from_u64(3);
        let store = SessionStore::open(Box::new(storage), &mut rng);
        assert!(store.session().surah.is_some());
    }

    #[test]
    fn restorable_offset_requires_matching_track_and_range() {
        let session = PersistedSession {
            surah: SurahId::new(2).ok(),
            reciter: ReciterId(2),
            offset_secs: 120.0,
            ..Default::default()
        };
        assert_eq!(session.restorable_offset(track(2, 2), 600.0), Some(120.0));
        assert_eq!(session.restorable_offset(track(2, 1), 600.0), None);
        assert_eq!(session.restorable_offset(track(3, 2), 600.0), None);
        assert_eq!(session.restorable_offset(track(2, 2), 100.0), None);
        assert_eq!(session.restorable_offset(track(2, 2), 120.0), None);

        let zero = PersistedSession {
            offset_secs: 0.0,
            ..session
        };
        assert_eq!(zero.restorable_offset(track(2, 2), 600.0), None);
    }

    #[test]
    fn update_writes_through() {
        let storage = MemoryStorage::new();
        let mut rng = StdRng::seed_from_u64(9);
        let mut store = SessionStore::open(Box::new(storage.clone()), &mut rng);

        store.update(|s| s.volume = 33).unwrap();
        let saved = PersistedSession::decode(&storage.get(STORAGE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(saved.volume, 33);

        store.clear().unwrap();
        assert!(storage.get(STORAGE_KEY).unwrap().is_none());
        assert_eq!(store.session(), &PersistedSession::default());
    }
}
