//! WASM-compatible player wrapper

use super::backend::HtmlAudioBackend;
use super::storage::LocalStorage;
use super::surface::{
    detect_capabilities, BrowserNetwork, JsMediaSurface, JsWakeLock, SurfaceCallbacks,
    WakeLockCallbacks,
};
use crate::bridge::MediaAction;
use crate::catalog::ReciterCatalog;
use crate::clock::ManualClock;
use crate::config::PlayerConfig;
use crate::events::ControllerEvent;
use crate::player::{PlayerParts, QuranPlayer};
use crate::storage::{KeyValueStorage, MemoryStorage};
use crate::types::{PlayerMode, ReciterId, SurahId, TrackRef};
use js_sys::Function;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;

/// WASM-compatible player
///
/// The page calls `tick(performance.now())` from a timer (every 200-250 ms is
/// plenty); each tick drains audio events, fires due retries and returns the
/// resulting controller events.
#[wasm_bindgen]
pub struct WasmQuranPlayer {
    inner: QuranPlayer,
    clock: ManualClock,
    surface: Rc<RefCell<SurfaceCallbacks>>,
    wake_lock: Rc<RefCell<WakeLockCallbacks>>,
    on_event: Option<Function>,
}

#[wasm_bindgen]
impl WasmQuranPlayer {
    /// Create a player from an optional configuration object
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmQuranPlayer, JsValue> {
        console_error_panic_hook::set_once();

        let config: PlayerConfig = if config.is_undefined() || config.is_null() {
            PlayerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?
        };

        let storage: Box<dyn KeyValueStorage> = match LocalStorage::open() {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                warn!(error = %e, "localStorage unavailable, session will not survive reloads");
                Box::new(MemoryStorage::new())
            }
        };

        let clock = ManualClock::new();
        let surface = Rc::new(RefCell::new(SurfaceCallbacks::default()));
        let wake_lock = Rc::new(RefCell::new(WakeLockCallbacks::default()));

        let parts = PlayerParts {
            backend: Box::new(HtmlAudioBackend::new()),
            storage,
            surface: Box::new(JsMediaSurface::new(surface.clone())),
            wake_lock: Box::new(JsWakeLock::new(wake_lock.clone())),
            clock: Box::new(clock.clone()),
            network: Box::new(BrowserNetwork),
            rng: Box::new(StdRng::from_entropy()),
            capabilities: detect_capabilities(),
        };
        let inner = QuranPlayer::from_parts(&config, parts).map_err(to_js)?;

        Ok(Self {
            inner,
            clock,
            surface,
            wake_lock,
            on_event: None,
        })
    }

    /// Advance time and process pending work
    pub fn tick(&mut self, now_ms: f64) -> JsValue {
        if !self.clock.set_millis(now_ms) {
            debug!(now_ms, "Ignoring host timestamp");
        }
        let events = self.inner.pump();
        self.emit(&events)
    }

    // ===== Track Selection =====

    #[wasm_bindgen(js_name = restoreSession)]
    pub fn restore_session(&mut self) -> JsValue {
        let track = self.inner.controller_mut().restore_session();
        self.flush();
        serde_wasm_bindgen::to_value(&track).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = requestTrack)]
    pub fn request_track(&mut self, surah: u16, reciter: u32) -> Result<(), JsValue> {
        let track = track(surah, reciter)?;
        self.inner.controller_mut().request_track(track);
        self.flush();
        Ok(())
    }

    #[wasm_bindgen(js_name = playTrack)]
    pub fn play_track(&mut self, surah: u16, reciter: u32) -> Result<(), JsValue> {
        let track = track(surah, reciter)?;
        self.inner.controller_mut().play_track(track);
        self.flush();
        Ok(())
    }

    /// Load the reciter catalog payload (JSON text)
    #[wasm_bindgen(js_name = setCatalog)]
    pub fn set_catalog(&mut self, json: &str) -> Result<(), JsValue> {
        let catalog = ReciterCatalog::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.set_catalog(catalog);
        Ok(())
    }

    // ===== Playback Control =====

    pub fn play(&mut self) {
        self.inner.controller_mut().play();
        self.flush();
    }

    pub fn pause(&mut self) {
        self.inner.controller_mut().pause();
        self.flush();
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&mut self) {
        self.inner.controller_mut().toggle_play();
        self.flush();
    }

    #[wasm_bindgen(js_name = nextTrack)]
    pub fn next_track(&mut self) {
        self.inner.controller_mut().next_track();
        self.flush();
    }

    #[wasm_bindgen(js_name = previousTrack)]
    pub fn previous_track(&mut self) {
        self.inner.controller_mut().previous_track();
        self.flush();
    }

    pub fn retry(&mut self) {
        self.inner.controller_mut().retry();
        self.flush();
    }

    #[wasm_bindgen(js_name = dismissError)]
    pub fn dismiss_error(&mut self) {
        self.inner.controller_mut().dismiss_error();
        self.flush();
    }

    // ===== Seek =====

    #[wasm_bindgen(js_name = seekTo)]
    pub fn seek_to(&mut self, seconds: f64) {
        self.inner.controller_mut().seek_to(seconds);
        self.flush();
    }

    #[wasm_bindgen(js_name = seekBy)]
    pub fn seek_by(&mut self, delta: f64) {
        self.inner.controller_mut().seek_by(delta);
        self.flush();
    }

    /// Seek by fraction of the duration (0.0 - 1.0)
    #[wasm_bindgen(js_name = seekToPercent)]
    pub fn seek_to_percent(&mut self, percent: f64) {
        self.inner.controller_mut().seek_to_percent(percent);
        self.flush();
    }

    #[wasm_bindgen(js_name = goToVerse)]
    pub fn go_to_verse(&mut self, verse: u32) {
        self.inner.controller_mut().go_to_verse(verse);
        self.flush();
    }

    #[wasm_bindgen(js_name = currentVerse)]
    pub fn current_verse(&self) -> Option<u32> {
        self.inner.controller().current_verse()
    }

    // ===== Preferences =====

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, level: i32) {
        self.inner.controller_mut().set_volume(level);
        self.flush();
    }

    #[wasm_bindgen(js_name = getVolume)]
    pub fn get_volume(&self) -> u8 {
        self.inner.controller().volume()
    }

    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&mut self) {
        self.inner.controller_mut().toggle_mute();
        self.flush();
    }

    #[wasm_bindgen(js_name = isMuted)]
    pub fn is_muted(&self) -> bool {
        self.inner.controller().is_muted()
    }

    #[wasm_bindgen(js_name = setPlaybackRate)]
    pub fn set_playback_rate(&mut self, rate: f64) {
        self.inner.controller_mut().set_rate(rate);
        self.flush();
    }

    #[wasm_bindgen(js_name = getPlaybackRate)]
    pub fn get_playback_rate(&self) -> f64 {
        self.inner.controller().playback_rate()
    }

    /// Set mode: "none", "autoNext", "shuffle" or "loop"
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode: PlayerMode = serde_wasm_bindgen::from_value(JsValue::from_str(mode))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.inner.controller_mut().set_mode(mode);
        self.flush();
        Ok(())
    }

    #[wasm_bindgen(js_name = getMode)]
    pub fn get_mode(&self) -> String {
        self.inner.controller().mode().as_str().to_string()
    }

    #[wasm_bindgen(js_name = setShowTranslation)]
    pub fn set_show_translation(&mut self, show: bool) {
        self.inner.controller_mut().set_show_translation(show);
        self.flush();
    }

    #[wasm_bindgen(js_name = showTranslation)]
    pub fn show_translation(&self) -> bool {
        self.inner.controller().show_translation()
    }

    // ===== Queries =====

    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.controller().state()).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = getCurrentTrack)]
    pub fn get_current_track(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.controller().current_track())
            .unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = getPosition)]
    pub fn get_position(&self) -> f64 {
        self.inner.controller().position()
    }

    #[wasm_bindgen(js_name = getDuration)]
    pub fn get_duration(&self) -> Option<f64> {
        self.inner.controller().duration()
    }

    #[wasm_bindgen(js_name = getError)]
    pub fn get_error(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.controller().error()).unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = isRetrying)]
    pub fn is_retrying(&self) -> bool {
        self.inner.controller().is_retrying()
    }

    // ===== Platform Signals =====

    /// Route a media-session action, e.g. `{ action: "seekTo", time: 42 }`
    #[wasm_bindgen(js_name = handleMediaAction)]
    pub fn handle_media_action(&mut self, action: JsValue) -> Result<(), JsValue> {
        let action: MediaAction =
            serde_wasm_bindgen::from_value(action).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let events = self.inner.handle_media_action(action);
        self.emit(&events);
        Ok(())
    }

    #[wasm_bindgen(js_name = onVisibilityChange)]
    pub fn on_visibility_change(&mut self, visible: bool) {
        self.inner.on_visibility_change(visible);
    }

    #[wasm_bindgen(js_name = onWakeLockRevoked)]
    pub fn on_wake_lock_revoked(&mut self) {
        self.inner.on_wake_lock_revoked();
    }

    /// Page is going away (`pagehide`)
    pub fn teardown(&mut self) {
        let events = self.inner.teardown();
        self.emit(&events);
    }

    // ===== Event Listeners =====

    /// Register controller event callback
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&mut self, callback: Function) {
        self.on_event = Some(callback);
    }

    /// Register media-session handler list callback (receives action names)
    #[wasm_bindgen(js_name = onActionHandlers)]
    pub fn on_action_handlers(&mut self, callback: Function) {
        self.surface.borrow_mut().set_on_action_handlers(callback);
    }

    #[wasm_bindgen(js_name = onMetadata)]
    pub fn on_metadata(&mut self, callback: Function) {
        self.surface.borrow_mut().on_metadata = Some(callback);
    }

    #[wasm_bindgen(js_name = onPlaybackState)]
    pub fn on_playback_state(&mut self, callback: Function) {
        self.surface.borrow_mut().on_playback_state = Some(callback);
    }

    #[wasm_bindgen(js_name = onPositionState)]
    pub fn on_position_state(&mut self, callback: Function) {
        self.surface.borrow_mut().on_position_state = Some(callback);
    }

    /// Provide `navigator.wakeLock` request/release wrappers
    #[wasm_bindgen(js_name = setWakeLock)]
    pub fn set_wake_lock(&mut self, request: Function, release: Function) {
        let mut callbacks = self.wake_lock.borrow_mut();
        callbacks.request = Some(request);
        callbacks.release = Some(release);
    }

    // ===== Internal =====

    fn flush(&mut self) {
        let events = self.inner.dispatch();
        self.emit(&events);
    }

    fn emit(&self, events: &[ControllerEvent]) -> JsValue {
        let value = serde_wasm_bindgen::to_value(events).unwrap_or(JsValue::NULL);
        if let Some(ref cb) = self.on_event {
            for event in events {
                if let Ok(js_event) = serde_wasm_bindgen::to_value(event) {
                    cb.call1(&JsValue::NULL, &js_event).ok();
                }
            }
        }
        value
    }
}

fn track(surah: u16, reciter: u32) -> Result<TrackRef, JsValue> {
    let surah = SurahId::new(surah).map_err(to_js)?;
    Ok(TrackRef::new(surah, ReciterId(reciter)))
}

fn to_js(error: crate::error::PlaybackError) -> JsValue {
    JsValue::from_str(&error.to_string())
}
