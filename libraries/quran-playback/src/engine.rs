//! Streaming engine
//!
//! [`StreamingEngine`] owns at most one decodable resource and implements the
//! engine contract once for every platform: dispose-before-load, clamping,
//! preference retention, bounded-rate position ticks and load-generation
//! tagging. The platform-specific part (an HTML media element, a native
//! decoder, a test fake) sits behind [`MediaBackend`].
//!
//! The engine never retries. Failures surface as `LoadError`/`PlayError`
//! events and the controller decides what happens next.

use crate::error::PlayErrorKind;
use crate::session::{MAX_PLAYBACK_RATE, MAX_VOLUME, MIN_PLAYBACK_RATE};
use crate::types::PreloadStrategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

/// Minimum spacing of position ticks while playing (4 Hz)
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Monotonically increasing load-attempt counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct LoadGeneration(pub u64);

impl LoadGeneration {
    #[allow(clippy::should_implement_trait)]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Everything a backend needs to open a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub url: String,
    pub generation: LoadGeneration,
    pub preload: PreloadStrategy,
}

/// Lifecycle event emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEventKind {
    /// Metadata known, playback possible
    Ready { duration: f64 },

    /// Playback actually started
    Started,

    Paused,

    /// Reached the end of the resource
    Ended,

    LoadError { cause: String },

    PlayError { kind: PlayErrorKind, cause: String },

    /// Current position, emitted at a bounded rate while playing
    PositionTick { seconds: f64 },
}

/// Engine event tagged with the load it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub generation: LoadGeneration,
    pub kind: EngineEventKind,
}

/// Lifecycle of the loaded resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineState {
    Empty,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
    Error,
}

impl EngineState {
    /// State after an event, or `None` when the event is not valid here
    pub fn after(self, event: &EngineEventKind) -> Option<EngineState> {
        use EngineEventKind as E;
        use EngineState as S;

        match (self, event) {
            (S::Loading, E::Ready { .. }) => Some(S::Ready),
            (S::Loading, E::LoadError { .. }) => Some(S::Error),
            (S::Ready | S::Paused | S::Ended | S::Playing, E::Started) => Some(S::Playing),
            (S::Playing | S::Paused, E::Paused) => Some(S::Paused),
            // Media elements fire `pause` just before `ended`
            (S::Playing | S::Paused, E::Ended) => Some(S::Ended),
            (S::Playing | S::Paused, E::LoadError { .. }) => Some(S::Error),
            // A refused play leaves the resource usable
            (S::Ready | S::Paused | S::Ended, E::PlayError { .. }) => Some(self),
            (S::Playing, E::PlayError { .. }) => Some(S::Paused),
            (S::Playing, E::PositionTick { .. }) => Some(S::Playing),
            _ => None,
        }
    }

    /// Whether `play()` has a resource to work with
    pub fn can_play(self) -> bool {
        matches!(
            self,
            EngineState::Ready | EngineState::Paused | EngineState::Ended
        )
    }
}

/// Native event from a backend, for the currently open resource only
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Ready { duration: f64 },
    Started,
    Paused,
    Ended,
    LoadFailed(String),
    PlayFailed { kind: PlayErrorKind, cause: String },
}

/// Platform decode mechanism
///
/// Implementations must configure resources for progressive/range-based
/// streaming, never a full download before playback.
pub trait MediaBackend {
    /// Open a new resource; the previous one has already been closed
    fn open(&mut self, url: &str, preload: PreloadStrategy);

    /// Release the current resource, dropping any undelivered events
    fn close(&mut self);

    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, seconds: f64);

    /// Linear gain 0.0..=1.0
    fn set_volume(&mut self, gain: f64);

    fn set_muted(&mut self, muted: bool);

    fn set_rate(&mut self, rate: f64);

    /// Current position of the open resource
    fn current_time(&self) -> Option<f64>;

    /// Drain native events
    fn poll(&mut self) -> Vec<BackendEvent>;
}

/// The single engine implementation, generic over its backend
pub struct StreamingEngine {
    backend: Box<dyn MediaBackend>,
    state: EngineState,
    generation: LoadGeneration,
    duration: Option<f64>,

    // Last play/pause sent to the backend and not yet confirmed by it
    requested: Option<bool>,

    // Preferences survive across resources
    volume: u8,
    muted: bool,
    rate: f64,

    pending: Vec<EngineEvent>,
    last_tick: Option<Duration>,
}

impl StreamingEngine {
    pub fn new(backend: Box<dyn MediaBackend>) -> Self {
        Self {
            backend,
            state: EngineState::Empty,
            generation: LoadGeneration::default(),
            duration: None,
            requested: None,
            volume: 80,
            muted: false,
            rate: 1.0,
            pending: Vec::new(),
            last_tick: None,
        }
    }

    // ===== Resource =====

    /// Dispose the current resource and start loading a new one
    pub fn load(&mut self, request: LoadRequest) {
        // Whatever the old resource already produced keeps its old tag
        self.collect_backend_events();
        self.dispose();

        debug!(url = %request.url, generation = request.generation.0, preload = ?request.preload, "Engine load");

        self.generation = request.generation;
        self.state = EngineState::Loading;
        self.backend.open(&request.url, request.preload);
        self.backend.set_volume(self.gain());
        self.backend.set_muted(self.muted);
        self.backend.set_rate(self.rate);
    }

    /// Release the live resource, if any
    pub fn dispose(&mut self) {
        if self.state != EngineState::Empty {
            self.backend.close();
        }
        self.state = EngineState::Empty;
        self.duration = None;
        self.requested = None;
        self.last_tick = None;
    }

    // ===== Playback =====

    /// Start playback; without a ready resource this becomes a `PlayError` event
    pub fn play(&mut self) {
        if self.wants_playing() {
            return;
        }

        if self.state.can_play() || self.state == EngineState::Playing {
            self.backend.play();
            self.requested = Some(true);
        } else {
            self.push(EngineEventKind::PlayError {
                kind: PlayErrorKind::NoResource,
                cause: format!("no resource ready (engine {:?})", self.state),
            });
        }
    }

    /// Pause playback, including a play the backend has not confirmed yet
    pub fn pause(&mut self) {
        if self.wants_playing() {
            self.backend.pause();
            self.requested = Some(false);
        }
    }

    pub fn toggle_play(&mut self) {
        if self.wants_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Seek within `[0, duration]`
    ///
    /// Returns the applied position, or `None` when the input is not finite or
    /// the duration is unknown.
    pub fn seek(&mut self, seconds: f64) -> Option<f64> {
        if !seconds.is_finite() {
            return None;
        }
        let duration = self.duration.filter(|d| d.is_finite() && *d > 0.0)?;
        let clamped = seconds.clamp(0.0, duration);
        self.backend.seek(clamped);
        Some(clamped)
    }

    // ===== Preferences =====

    /// Set volume 0..=100; applied to the live resource if there is one
    pub fn set_volume(&mut self, volume: i32) -> u8 {
        self.volume = volume.clamp(0, i32::from(MAX_VOLUME)) as u8;
        if self.state != EngineState::Empty {
            self.backend.set_volume(self.gain());
        }
        self.volume
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if self.state != EngineState::Empty {
            self.backend.set_muted(muted);
        }
    }

    /// Set playback rate 0.25..=2.0; non-finite input is ignored
    pub fn set_rate(&mut self, rate: f64) -> f64 {
        if rate.is_finite() {
            self.rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
            if self.state != EngineState::Empty {
                self.backend.set_rate(self.rate);
            }
        }
        self.rate
    }

    fn gain(&self) -> f64 {
        f64::from(self.volume) / 100.0
    }

    // ===== Queries =====

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn generation(&self) -> LoadGeneration {
        self.generation
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Whether the last command asked for playback
    ///
    /// Follows `play()`/`pause()` immediately, before the backend reports
    /// the resulting state.
    pub fn wants_playing(&self) -> bool {
        match self.requested {
            Some(play) => play && self.state != EngineState::Empty,
            None => self.state == EngineState::Playing,
        }
    }

    pub fn position(&self) -> Option<f64> {
        if self.state == EngineState::Empty {
            None
        } else {
            self.backend.current_time().filter(|t| t.is_finite())
        }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    // ===== Events =====

    /// Drain lifecycle events, adding a position tick when one is due
    pub fn poll_events(&mut self, now: Duration) -> Vec<EngineEvent> {
        self.collect_backend_events();

        if self.state == EngineState::Playing && self.wants_playing() {
            let due = match self.last_tick {
                Some(last) => now.saturating_sub(last) >= TICK_INTERVAL,
                None => true,
            };
            if due {
                if let Some(seconds) = self.position() {
                    self.last_tick = Some(now);
                    self.push(EngineEventKind::PositionTick { seconds });
                }
            }
        }

        std::mem::take(&mut self.pending)
    }

    fn collect_backend_events(&mut self) {
        if self.state == EngineState::Empty {
            return;
        }

        for event in self.backend.poll() {
            let kind = match event {
                BackendEvent::Ready { duration } => EngineEventKind::Ready { duration },
                BackendEvent::Started => EngineEventKind::Started,
                BackendEvent::Paused => EngineEventKind::Paused,
                BackendEvent::Ended => EngineEventKind::Ended,
                BackendEvent::LoadFailed(cause) => EngineEventKind::LoadError { cause },
                BackendEvent::PlayFailed { kind, cause } => {
                    EngineEventKind::PlayError { kind, cause }
                }
            };

            match self.state.after(&kind) {
                Some(next) => {
                    if let EngineEventKind::Ready { duration } = kind {
                        self.duration = Some(duration);
                    }
                    if next != EngineState::Playing {
                        self.last_tick = None;
                    }
                    self.state = next;

                    if self.settle_request(&kind) {
                        self.push(kind);
                    } else {
                        trace!(event = ?kind, "Backend lags behind the last command");
                    }
                }
                None => {
                    trace!(state = ?self.state, event = ?kind, "Dropping out-of-order backend event");
                }
            }
        }
    }

    /// Reconcile a backend event with the pending play/pause command
    ///
    /// Returns `false` when the event is overtaken by that command and must
    /// not reach the controller.
    fn settle_request(&mut self, kind: &EngineEventKind) -> bool {
        match (kind, self.requested) {
            (EngineEventKind::Started, Some(false)) => {
                // Started anyway; pause again
                debug!("Backend started after pause was requested, pausing");
                self.backend.pause();
                false
            }
            (EngineEventKind::Paused, Some(true)) => false,
            (EngineEventKind::Ready { .. } | EngineEventKind::PositionTick { .. }, _) => true,
            _ => {
                self.requested = None;
                true
            }
        }
    }

    fn push(&mut self, kind: EngineEventKind) {
        self.pending.push(EngineEvent {
            generation: self.generation,
            kind,
        });
    }
}
