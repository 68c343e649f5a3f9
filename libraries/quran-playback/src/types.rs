//! Core types for playback control

use crate::error::{PlaybackError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the 114 numbered chapters
///
/// Ordering is fixed and wraps: the surah after 114 is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct SurahId(u16);

impl SurahId {
    /// First surah (Al-Fatiha)
    pub const FIRST: SurahId = SurahId(1);

    /// Last surah (An-Nas)
    pub const LAST: SurahId = SurahId(114);

    /// Number of surahs in the corpus
    pub const COUNT: u16 = 114;

    /// Create a surah id, rejecting anything outside 1..=114
    pub fn new(id: u16) -> Result<Self> {
        if (1..=Self::COUNT).contains(&id) {
            Ok(Self(id))
        } else {
            Err(PlaybackError::InvalidTrack(format!(
                "surah id must be between 1 and {}, got {}",
                Self::COUNT,
                id
            )))
        }
    }

    /// Raw chapter number
    pub fn get(self) -> u16 {
        self.0
    }

    /// Following surah, wrapping 114 -> 1
    #[allow(clippy::should_implement_trait)]
    pub fn next(self) -> Self {
        if self.0 >= Self::COUNT {
            Self::FIRST
        } else {
            Self(self.0 + 1)
        }
    }

    /// Preceding surah, wrapping 1 -> 114
    pub fn previous(self) -> Self {
        if self.0 <= 1 {
            Self::LAST
        } else {
            Self(self.0 - 1)
        }
    }

    /// Uniformly random surah
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen_range(1..=Self::COUNT))
    }

    /// Uniformly random surah that is never `self`
    ///
    /// Draws from the 113 remaining chapters and shifts past the excluded one,
    /// so no rejection loop is needed.
    pub fn random_excluding<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let pick = rng.gen_range(1..Self::COUNT);
        if pick >= self.0 {
            Self(pick + 1)
        } else {
            Self(pick)
        }
    }
}

impl TryFrom<u16> for SurahId {
    type Error = PlaybackError;

    fn try_from(value: u16) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SurahId> for u16 {
    fn from(id: SurahId) -> Self {
        id.0
    }
}

impl fmt::Display for SurahId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reciter identifier (maps to a zero-padded directory such as `002`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReciterId(pub u32);

impl ReciterId {
    /// Reciter selected for first-time users
    pub const DEFAULT: ReciterId = ReciterId(2);

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for ReciterId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for ReciterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies what is loaded: one (surah, reciter) audio unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRef {
    pub surah: SurahId,
    pub reciter: ReciterId,
}

impl TrackRef {
    pub fn new(surah: SurahId, reciter: ReciterId) -> Self {
        Self { surah, reciter }
    }

    /// Same reciter, different surah
    pub fn with_surah(self, surah: SurahId) -> Self {
        Self { surah, ..self }
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surah {} / reciter {}", self.surah, self.reciter)
    }
}

/// Last known position within a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackPosition {
    pub track: TrackRef,
    pub offset_secs: f64,
}

/// Track-boundary policy
///
/// Exactly one mode is active at a time; setting one replaces the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerMode {
    /// Stop at the end of the track
    None,

    /// Continue with the next surah, wrapping after 114
    #[default]
    AutoNext,

    /// Continue with a random surah other than the current one
    Shuffle,

    /// Replay the current track
    Loop,
}

impl PlayerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerMode::None => "none",
            PlayerMode::AutoNext => "autoNext",
            PlayerMode::Shuffle => "shuffle",
            PlayerMode::Loop => "loop",
        }
    }
}

/// Network class detected once per load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkClass {
    Cellular,
    Wifi,
    #[default]
    Unknown,
}

impl NetworkClass {
    /// Constrained networks only fetch metadata up front
    pub fn preload_strategy(self) -> PreloadStrategy {
        match self {
            NetworkClass::Cellular => PreloadStrategy::Metadata,
            NetworkClass::Wifi | NetworkClass::Unknown => PreloadStrategy::Full,
        }
    }
}

/// How much of a resource the engine should fetch before playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreloadStrategy {
    Metadata,
    Full,
}

impl PreloadStrategy {
    /// Value of the HTML `preload` attribute
    pub fn as_str(self) -> &'static str {
        match self {
            PreloadStrategy::Metadata => "metadata",
            PreloadStrategy::Full => "auto",
        }
    }
}

/// Source of network-class information
pub trait NetworkProbe {
    fn network_class(&self) -> NetworkClass;
}

/// Probe that always reports the same class
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedNetwork(pub NetworkClass);

impl NetworkProbe for FixedNetwork {
    fn network_class(&self) -> NetworkClass {
        self.0
    }
}

/// Controller state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControllerState {
    /// Nothing requested yet (or error dismissed)
    Idle,

    /// Resource requested, waiting for `ready`
    Loading,

    /// Resource ready, not playing
    Ready,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Track ended, applying the advance policy
    Ending,

    /// Load or play failed
    Error,
}

/// Format seconds as `m:ss`, or `h:mm:ss` past an hour
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn surah_bounds() {
        assert!(SurahId::new(0).is_err());
        assert!(SurahId::new(115).is_err());
        assert_eq!(SurahId::new(114).unwrap(), SurahId::LAST);
    }

    #[test]
    fn surah_wraps_both_ways() {
        assert_eq!(SurahId::LAST.next(), SurahId::FIRST);
        assert_eq!(SurahId::FIRST.previous(), SurahId::LAST);
        assert_eq!(SurahId::new(36).unwrap().next().get(), 37);
    }

    #[test]
    fn random_excluding_covers_edges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let first = SurahId::FIRST.random_excluding(&mut rng);
            assert_ne!(first, SurahId::FIRST);
            let last = SurahId::LAST.random_excluding(&mut rng);
            assert_ne!(last, SurahId::LAST);
            assert!(last.get() >= 1 && last.get() <= 113);
        }
    }

    #[test]
    fn surah_deserialize_validates() {
        assert!(serde_json::from_str::<SurahId>("12").is_ok());
        assert!(serde_json::from_str::<SurahId>("0").is_err());
    }

    #[test]
    fn player_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&PlayerMode::AutoNext).unwrap(),
            "\"autoNext\""
        );
        assert_eq!(
            serde_json::from_str::<PlayerMode>("\"none\"").unwrap(),
            PlayerMode::None
        );
        assert_eq!(PlayerMode::default(), PlayerMode::AutoNext);
    }

    #[test]
    fn cellular_preloads_metadata_only() {
        assert_eq!(
            NetworkClass::Cellular.preload_strategy(),
            PreloadStrategy::Metadata
        );
        assert_eq!(NetworkClass::Wifi.preload_strategy(), PreloadStrategy::Full);
        assert_eq!(
            NetworkClass::Unknown.preload_strategy(),
            PreloadStrategy::Full
        );
    }

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(3725.0), "1:02:05");
        assert_eq!(format_time(f64::NAN), "0:00");
    }
}
