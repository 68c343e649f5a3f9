//! Mode-aware advance policy
//!
//! Natural end-of-track and OS next/previous commands all go through
//! [`plan_advance`], so background-triggered and natural advancement cannot
//! diverge.

use crate::types::{PlayerMode, SurahId};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What initiated an advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdvanceTrigger {
    TrackEnded,
    NextRequested,
    PreviousRequested,
}

/// Outcome of the advance policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancePlan {
    /// Seek to 0 and play the same track again
    Replay,

    /// Seek to 0 of the current track, keeping the play state
    Restart,

    /// Stay on the current track, stopped at 0
    Stop,

    /// Load another surah with the same reciter
    Load(SurahId),
}

/// Decide where playback goes next
///
/// `position` is the current offset, used by "previous" to restart the track
/// when more than `restart_threshold` seconds have played.
pub fn plan_advance<R: Rng + ?Sized>(
    trigger: AdvanceTrigger,
    mode: PlayerMode,
    current: SurahId,
    position: f64,
    restart_threshold: f64,
    rng: &mut R,
) -> AdvancePlan {
    match trigger {
        AdvanceTrigger::TrackEnded => match mode {
            PlayerMode::None => AdvancePlan::Stop,
            PlayerMode::Loop => AdvancePlan::Replay,
            PlayerMode::Shuffle => AdvancePlan::Load(current.random_excluding(rng)),
            PlayerMode::AutoNext => AdvancePlan::Load(current.next()),
        },
        AdvanceTrigger::NextRequested => match mode {
            PlayerMode::Shuffle => AdvancePlan::Load(current.random_excluding(rng)),
            PlayerMode::None | PlayerMode::AutoNext | PlayerMode::Loop => {
                AdvancePlan::Load(current.next())
            }
        },
        AdvanceTrigger::PreviousRequested => {
            if position.is_finite() && position > restart_threshold {
                AdvancePlan::Restart
            } else {
                AdvancePlan::Load(current.previous())
            }
        }
    }
}
