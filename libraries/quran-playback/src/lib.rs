//! Quran Player - Streaming Playback Controller
//!
//! Client-side controller for a single audio stream served by a
//! range-capable endpoint.
//!
//! This crate provides:
//! - A playback state machine (load, ready, play, pause, end, error)
//! - Track-boundary modes (none, auto-next, shuffle, loop) with wrap-around
//! - Bounded retry with exponential backoff, guarded against overlap
//! - Session persistence (last surah/reciter/position/preferences)
//! - OS media controls with platform-specific registration strategies
//! - A display wake lock bound to the playing state
//!
//! # Architecture
//!
//! The controller is platform-agnostic and sans-IO. Platform specifics are
//! injected through traits:
//! - [`MediaBackend`] decodes one resource (an HTML audio element, a fake)
//! - [`KeyValueStorage`] persists the session (localStorage, files, memory)
//! - [`MediaSurface`] and [`WakeLock`] are the OS integrations
//! - [`Clock`] supplies time for retry backoff
//!
//! The host drives everything by calling [`QuranPlayer::pump`] from its
//! event loop. Browser bindings live behind the `wasm` feature.
//!
//! # Example
//!
//! ```rust
//! use quran_playback::{
//!     BackendEvent, ControllerState, ControllerConfig, ManualClock, MediaBackend,
//!     MemoryStorage, PlaybackController, PreloadStrategy, ReciterId, SessionStore,
//!     SourceConfig, StreamingEngine, SurahId, TrackRef, TrackResolver,
//! };
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! // Minimal backend that is ready as soon as it opens
//! #[derive(Default)]
//! struct InstantBackend {
//!     queued: Vec<BackendEvent>,
//! }
//!
//! impl MediaBackend for InstantBackend {
//!     fn open(&mut self, _url: &str, _preload: PreloadStrategy) {
//!         self.queued.push(BackendEvent::Ready { duration: 60.0 });
//!     }
//!     fn close(&mut self) {
//!         self.queued.clear();
//!     }
//!     fn play(&mut self) {
//!         self.queued.push(BackendEvent::Started);
//!     }
//!     fn pause(&mut self) {
//!         self.queued.push(BackendEvent::Paused);
//!     }
//!     fn seek(&mut self, _seconds: f64) {}
//!     fn set_volume(&mut self, _gain: f64) {}
//!     fn set_muted(&mut self, _muted: bool) {}
//!     fn set_rate(&mut self, _rate: f64) {}
//!     fn current_time(&self) -> Option<f64> {
//!         Some(0.0)
//!     }
//!     fn poll(&mut self) -> Vec<BackendEvent> {
//!         std::mem::take(&mut self.queued)
//!     }
//! }
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let store = SessionStore::open(Box::new(MemoryStorage::new()), &mut rng);
//! let resolver = TrackResolver::from_config(&SourceConfig::default()).unwrap();
//!
//! let mut controller = PlaybackController::new(
//!     StreamingEngine::new(Box::new(InstantBackend::default())),
//!     resolver,
//!     store,
//!     Box::new(ManualClock::new()),
//!     ControllerConfig::default(),
//! );
//!
//! let track = TrackRef::new(SurahId::new(36).unwrap(), ReciterId(2));
//! controller.play_track(track);
//! controller.poll(); // ready -> play
//! controller.poll(); // started
//! assert_eq!(controller.state(), ControllerState::Playing);
//! ```

pub mod advance;
pub mod bridge;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod controller;
pub mod engine;
mod error;
pub mod events;
pub mod player;
pub mod resolver;
pub mod retry;
pub mod session;
pub mod storage;
pub mod types;
pub mod wake_lock;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use advance::{AdvancePlan, AdvanceTrigger};
pub use bridge::{
    Capabilities, ExternalControlBridge, MediaAction, MediaActionKind, MediaMetadata,
    MediaSurface, PositionState, SurfacePlaybackState,
};
pub use catalog::{CatalogEntry, Reciter, ReciterCatalog, VerseTiming, RECITERS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BridgeConfig, ControllerConfig, PlayerConfig, SourceConfig};
pub use controller::PlaybackController;
pub use engine::{
    BackendEvent, EngineEvent, EngineEventKind, EngineState, LoadGeneration, LoadRequest,
    MediaBackend, StreamingEngine,
};
pub use error::{
    PlayErrorKind, PlaybackError, Result, StorageError, UserErrorKind, UserFacingError,
    WakeLockError,
};
pub use events::{ControllerEvent, TrackChangeCause};
pub use player::{PlayerParts, QuranPlayer};
pub use resolver::{SourceMode, TrackResolver};
pub use session::{PersistedSession, SessionStore, STORAGE_KEY};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use types::{
    format_time, ControllerState, FixedNetwork, NetworkClass, NetworkProbe, PlaybackPosition,
    PlayerMode, PreloadStrategy, ReciterId, SurahId, TrackRef,
};
pub use wake_lock::{WakeLock, WakeLockManager};
