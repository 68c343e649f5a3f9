//! Catalog data consumed by the controller
//!
//! The catalog endpoint returns, per reciter, the surahs it has audio for.
//! Only a few fields matter here: duration and format seed the UI before the
//! stream reports its own duration, and verse timings drive verse navigation.

use crate::types::{ReciterId, SurahId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Start/end of one verse within a recitation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseTiming {
    /// `"{surah}:{verse}"`
    pub verse_key: String,

    /// Milliseconds from track start
    pub timestamp_from: u64,

    /// Milliseconds from track start
    pub timestamp_to: u64,
}

impl VerseTiming {
    /// Verse number parsed from the key
    pub fn verse_number(&self) -> Option<u32> {
        self.verse_key.split(':').nth(1)?.parse().ok()
    }

    pub fn start_secs(&self) -> f64 {
        self.timestamp_from as f64 / 1000.0
    }

    pub fn end_secs(&self) -> f64 {
        self.timestamp_to as f64 / 1000.0
    }

    fn contains(&self, secs: f64) -> bool {
        secs >= self.start_secs() && secs < self.end_secs()
    }
}

/// One surah as listed for a reciter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: SurahId,

    #[serde(alias = "name")]
    pub display_name: String,

    /// Seconds; 0 when unknown
    #[serde(default)]
    pub duration: f64,

    #[serde(default, alias = "file_size")]
    pub file_size: u64,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default, alias = "verse_timings")]
    pub verse_timings: Vec<VerseTiming>,
}

impl CatalogEntry {
    /// Duration if the catalog knows it
    pub fn known_duration(&self) -> Option<f64> {
        (self.duration.is_finite() && self.duration > 0.0).then_some(self.duration)
    }

    /// Verse playing at `secs`
    pub fn verse_at(&self, secs: f64) -> Option<u32> {
        self.verse_timings
            .iter()
            .find(|timing| timing.contains(secs))
            .and_then(VerseTiming::verse_number)
    }

    /// Start offset of a verse
    pub fn verse_start(&self, verse: u32) -> Option<f64> {
        self.verse_timings
            .iter()
            .find(|timing| timing.verse_number() == Some(verse))
            .map(VerseTiming::start_secs)
    }
}

/// Catalog endpoint payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogPayload {
    reciter_id: String,
    surahs: Vec<CatalogEntry>,
}

/// All catalog entries for one reciter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReciterCatalog {
    reciter: ReciterId,
    entries: HashMap<SurahId, CatalogEntry>,
}

impl ReciterCatalog {
    pub fn new(reciter: ReciterId, entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            reciter,
            entries: entries.into_iter().map(|e| (e.id, e)).collect(),
        }
    }

    /// Decode `{ "reciterId": "002", "surahs": [...], "total": n }`
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let payload: CatalogPayload = serde_json::from_str(json)?;
        let reciter = payload
            .reciter_id
            .trim_start_matches('0')
            .parse()
            .map(ReciterId)
            .unwrap_or_default();
        Ok(Self::new(reciter, payload.surahs))
    }

    pub fn reciter(&self) -> ReciterId {
        self.reciter
    }

    pub fn get(&self, surah: SurahId) -> Option<&CatalogEntry> {
        self.entries.get(&surah)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A reciter the player knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reciter {
    pub id: ReciterId,
    pub name: &'static str,
    pub translated_name: &'static str,
}

/// Reciters with audio available
pub const RECITERS: &[Reciter] = &[
    Reciter {
        id: ReciterId(1),
        name: "อ.บรรจง โซ๊ะมณี",
        translated_name: "Bancheong Somanee",
    },
    Reciter {
        id: ReciterId(2),
        name: "อุมัร สุจิตวรรณศรี",
        translated_name: "Umar Suchitawansri",
    },
];

/// Look up a reciter by id
pub fn reciter(id: ReciterId) -> Option<&'static Reciter> {
    RECITERS.iter().find(|r| r.id == id)
}
