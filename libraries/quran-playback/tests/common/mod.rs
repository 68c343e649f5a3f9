//! Shared fakes for integration tests

#![allow(dead_code)]

use quran_playback::{
    BackendEvent, Capabilities, ControllerConfig, FixedNetwork, KeyValueStorage, ManualClock,
    MediaActionKind, MediaBackend, MediaMetadata, MediaSurface, MemoryStorage, NetworkClass,
    PersistedSession, PlaybackController, PlayerConfig, PlayerParts, PositionState,
    PreloadStrategy, QuranPlayer, ReciterId, SessionStore, SourceConfig, StorageError,
    StreamingEngine, SurahId, SurfacePlaybackState, TrackRef, TrackResolver, WakeLock,
    WakeLockError, STORAGE_KEY,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

/// Route controller logs to the test output, once per binary
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ===== Backend =====

/// Operation recorded by [`FakeBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Open(String, PreloadStrategy),
    Close,
    Play,
    Pause,
    Seek(f64),
    Volume(f64),
    Muted(bool),
    Rate(f64),
}

#[derive(Debug, Default)]
pub struct BackendState {
    pub ops: Vec<Op>,
    pub queued: Vec<BackendEvent>,
    pub time: f64,
    pub open: bool,
}

/// Media backend scripted by the test; clones share state
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    pub state: Rc<RefCell<BackendState>>,
}

impl FakeBackend {
    pub fn emit(&self, event: BackendEvent) {
        self.state.borrow_mut().queued.push(event);
    }

    pub fn set_time(&self, seconds: f64) {
        self.state.borrow_mut().time = seconds;
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.borrow().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.state.borrow_mut().ops.clear();
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    /// URLs opened so far
    pub fn opened(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Open(url, _) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Op) -> usize {
        self.ops().iter().filter(|op| *op == wanted).count()
    }
}

impl MediaBackend for FakeBackend {
    fn open(&mut self, url: &str, preload: PreloadStrategy) {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Open(url.to_string(), preload));
        state.open = true;
        state.time = 0.0;
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Close);
        state.open = false;
        state.queued.clear();
    }

    fn play(&mut self) {
        self.state.borrow_mut().ops.push(Op::Play);
    }

    fn pause(&mut self) {
        self.state.borrow_mut().ops.push(Op::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Seek(seconds));
        state.time = seconds;
    }

    fn set_volume(&mut self, gain: f64) {
        self.state.borrow_mut().ops.push(Op::Volume(gain));
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.borrow_mut().ops.push(Op::Muted(muted));
    }

    fn set_rate(&mut self, rate: f64) {
        self.state.borrow_mut().ops.push(Op::Rate(rate));
    }

    fn current_time(&self) -> Option<f64> {
        let state = self.state.borrow();
        state.open.then_some(state.time)
    }

    fn poll(&mut self) -> Vec<BackendEvent> {
        std::mem::take(&mut self.state.borrow_mut().queued)
    }
}

// ===== Storage =====

/// Storage whose every operation fails
#[derive(Debug, Default)]
pub struct FailingStorage;

impl KeyValueStorage for FailingStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("private mode".into()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".into()))
    }

    fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("private mode".into()))
    }
}

/// Storage pre-populated with a session record
pub fn storage_with_session(surah: u16, reciter: u32, offset: f64) -> MemoryStorage {
    let json = format!(
        r#"{{"currentSurah":{},"currentReciter":{},"currentTime":{},"playerMode":"autoNext","volume":80,"playbackRate":1.0,"showTranslation":true}}"#,
        surah, reciter, offset
    );
    MemoryStorage::with_entry(STORAGE_KEY, &json)
}

/// Decode what the controller last wrote
pub fn saved_session(storage: &MemoryStorage) -> PersistedSession {
    let json = storage
        .get(STORAGE_KEY)
        .expect("memory storage never fails")
        .expect("session record present");
    PersistedSession::decode(&json).expect("valid session record")
}

// ===== Surfaces =====

#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub actions: Vec<Vec<MediaActionKind>>,
    pub metadata: Vec<MediaMetadata>,
    pub states: Vec<SurfacePlaybackState>,
    pub positions: Vec<PositionState>,
}

/// Media surface recording every call
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub log: Rc<RefCell<SurfaceLog>>,
}

impl MediaSurface for RecordingSurface {
    fn set_action_handlers(&mut self, actions: &[MediaActionKind]) {
        self.log.borrow_mut().actions.push(actions.to_vec());
    }

    fn clear_action_handlers(&mut self) {
        self.log.borrow_mut().actions.push(Vec::new());
    }

    fn set_metadata(&mut self, metadata: &MediaMetadata) {
        self.log.borrow_mut().metadata.push(metadata.clone());
    }

    fn set_playback_state(&mut self, state: SurfacePlaybackState) {
        self.log.borrow_mut().states.push(state);
    }

    fn set_position_state(&mut self, state: &PositionState) {
        self.log.borrow_mut().positions.push(*state);
    }
}

#[derive(Debug, Default)]
pub struct LockLog {
    pub requests: u32,
    pub releases: u32,
}

#[derive(Debug, Clone, Default)]
pub struct FakeWakeLock {
    pub log: Rc<RefCell<LockLog>>,
}

impl WakeLock for FakeWakeLock {
    fn is_supported(&self) -> bool {
        true
    }

    fn request(&mut self) -> Result<(), WakeLockError> {
        self.log.borrow_mut().requests += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<(), WakeLockError> {
        self.log.borrow_mut().releases += 1;
        Ok(())
    }
}

// ===== Fixtures =====

pub fn track(surah: u16) -> TrackRef {
    TrackRef::new(SurahId::new(surah).expect("valid surah"), ReciterId(2))
}

/// Controller wired to fakes, with handles to drive them
pub struct Fixture {
    pub controller: PlaybackController,
    pub backend: FakeBackend,
    pub clock: ManualClock,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_storage(Box::new(MemoryStorage::new()))
    }

    pub fn with_storage(storage: Box<dyn KeyValueStorage>) -> Self {
        Self::build(storage, ControllerConfig::default(), NetworkClass::Wifi)
    }

    pub fn build(
        storage: Box<dyn KeyValueStorage>,
        config: ControllerConfig,
        network: NetworkClass,
    ) -> Self {
        init_tracing();
        let backend = FakeBackend::default();
        let clock = ManualClock::new();
        let mut rng = StdRng::seed_from_u64(0x51_7a_4e);
        let store = SessionStore::open(storage, &mut rng);
        let resolver = TrackResolver::from_config(&SourceConfig::default()).expect("valid source");

        let controller = PlaybackController::new(
            StreamingEngine::new(Box::new(backend.clone())),
            resolver,
            store,
            Box::new(clock.clone()),
            config,
        )
        .with_network(Box::new(FixedNetwork(network)))
        .with_rng(Box::new(rng));

        Self {
            controller,
            backend,
            clock,
        }
    }

    pub fn ready(&mut self, duration: f64) {
        self.backend.emit(BackendEvent::Ready { duration });
        self.controller.poll();
    }

    pub fn started(&mut self) {
        self.backend.emit(BackendEvent::Started);
        self.controller.poll();
    }

    pub fn ended(&mut self) {
        self.backend.emit(BackendEvent::Ended);
        self.controller.poll();
    }

    pub fn load_failed(&mut self) {
        self.backend
            .emit(BackendEvent::LoadFailed("connection reset".into()));
        self.controller.poll();
    }

    /// Move media time and wall time forward by one tick
    pub fn tick(&mut self, seconds: f64) {
        self.backend.set_time(seconds);
        self.clock.advance(Duration::from_millis(250));
        self.controller.poll();
    }

    pub fn wait(&mut self, duration: Duration) {
        self.clock.advance(duration);
        self.controller.poll();
    }

    /// Load `surah`, report ready and started
    pub fn playing(&mut self, surah: u16, duration: f64) {
        self.controller.play_track(track(surah));
        self.ready(duration);
        self.started();
    }
}

// ===== Player =====

pub struct PlayerFixture {
    pub player: QuranPlayer,
    pub backend: FakeBackend,
    pub surface: RecordingSurface,
    pub wake_lock: FakeWakeLock,
    pub storage: MemoryStorage,
    pub clock: ManualClock,
}

impl PlayerFixture {
    pub fn new(capabilities: Capabilities) -> Self {
        init_tracing();
        let backend = FakeBackend::default();
        let surface = RecordingSurface::default();
        let wake_lock = FakeWakeLock::default();
        let storage = MemoryStorage::new();
        let clock = ManualClock::new();

        let parts = PlayerParts {
            backend: Box::new(backend.clone()),
            storage: Box::new(storage.clone()),
            surface: Box::new(surface.clone()),
            wake_lock: Box::new(wake_lock.clone()),
            clock: Box::new(clock.clone()),
            network: Box::new(FixedNetwork(NetworkClass::Wifi)),
            rng: Box::new(StdRng::seed_from_u64(99)),
            capabilities,
        };
        let player =
            QuranPlayer::from_parts(&PlayerConfig::default(), parts).expect("valid config");

        Self {
            player,
            backend,
            surface,
            wake_lock,
            storage,
            clock,
        }
    }

    pub fn emit(&mut self, event: BackendEvent) {
        self.backend.emit(event);
        self.clock.advance(Duration::from_millis(250));
        self.player.pump();
    }

    pub fn tick(&mut self, seconds: f64) {
        self.backend.set_time(seconds);
        self.clock.advance(Duration::from_millis(250));
        self.player.pump();
    }

    pub fn playing(&mut self, surah: u16, duration: f64) {
        self.player.controller_mut().play_track(track(surah));
        self.player.dispatch();
        self.emit(BackendEvent::Ready { duration });
        self.emit(BackendEvent::Started);
    }
}
