//! Playback controller
//!
//! Owns the streaming engine and the persisted session, and turns engine
//! events into state transitions, retries, position checkpoints and track
//! advances. The controller is sans-IO: the host calls [`PlaybackController::poll`]
//! from its event loop (or timer), which drains engine events and fires a due
//! retry, then forwards [`PlaybackController::drain_events`] to observers.

use crate::advance::{plan_advance, AdvancePlan, AdvanceTrigger};
use crate::catalog::{CatalogEntry, ReciterCatalog};
use crate::clock::Clock;
use crate::config::ControllerConfig;
use crate::engine::{EngineEvent, EngineEventKind, EngineState, LoadGeneration, LoadRequest, StreamingEngine};
use crate::error::{PlayErrorKind, PlaybackError, UserFacingError};
use crate::events::{ControllerEvent, TrackChangeCause};
use crate::resolver::TrackResolver;
use crate::retry::{PendingRetry, RetryBudget, RetryOp, RetrySlot};
use crate::session::{PersistedSession, SessionStore};
use crate::types::{
    ControllerState, FixedNetwork, NetworkProbe, PlaybackPosition, PlayerMode, SurahId, TrackRef,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, error, info, warn};

/// Playback state machine for a single audio stream
pub struct PlaybackController {
    // Collaborators
    engine: StreamingEngine,
    resolver: TrackResolver,
    store: SessionStore,
    clock: Box<dyn Clock>,
    network: Box<dyn NetworkProbe>,
    rng: Box<dyn RngCore>,
    catalog: Option<ReciterCatalog>,
    config: ControllerConfig,

    // State
    state: ControllerState,
    current: Option<TrackRef>,
    generation: LoadGeneration,
    position: f64,
    duration: Option<f64>,
    error: Option<UserFacingError>,

    // Retry
    budget: RetryBudget,
    retry: RetrySlot,

    // Intent flags
    play_when_ready: bool,
    advance_in_flight: bool,

    // Media-time offset of the last position checkpoint
    last_checkpoint: f64,

    pending_events: Vec<ControllerEvent>,
}

impl PlaybackController {
    /// Create a controller and apply the persisted preferences to the engine
    pub fn new(
        engine: StreamingEngine,
        resolver: TrackResolver,
        store: SessionStore,
        clock: Box<dyn Clock>,
        config: ControllerConfig,
    ) -> Self {
        let budget = RetryBudget::new(config.max_retries, config.retry_base_delay());
        let mut controller = Self {
            engine,
            resolver,
            store,
            clock,
            network: Box::new(FixedNetwork::default()),
            rng: Box::new(StdRng::from_entropy()),
            catalog: None,
            config,
            state: ControllerState::Idle,
            current: None,
            generation: LoadGeneration::default(),
            position: 0.0,
            duration: None,
            error: None,
            budget,
            retry: RetrySlot::default(),
            play_when_ready: false,
            advance_in_flight: false,
            last_checkpoint: 0.0,
            pending_events: Vec::new(),
        };

        let session = controller.store.session().clone();
        controller.engine.set_volume(i32::from(session.volume));
        controller.engine.set_rate(session.playback_rate);
        controller
    }

    /// Use a network-class probe (consulted once per load)
    pub fn with_network(mut self, network: Box<dyn NetworkProbe>) -> Self {
        self.network = network;
        self
    }

    /// Use a specific random source (shuffle)
    pub fn with_rng(mut self, rng: Box<dyn RngCore>) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_catalog(mut self, catalog: ReciterCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Replace the catalog, e.g. after the reciter list finished loading
    pub fn set_catalog(&mut self, catalog: ReciterCatalog) {
        if self.state == ControllerState::Loading && self.duration.is_none() {
            self.duration = self
                .current
                .and_then(|track| catalog_entry(Some(&catalog), track))
                .and_then(CatalogEntry::known_duration);
        }
        self.catalog = Some(catalog);
    }

    // ===== Track selection =====

    /// Load a track on behalf of the user, without starting playback
    ///
    /// Cancels any pending retry, resets the retry budget and clears the
    /// current error, whatever state the controller is in.
    pub fn request_track(&mut self, track: TrackRef) {
        self.request_track_inner(track, false);
    }

    /// Load a track on behalf of the user and play it once ready
    pub fn play_track(&mut self, track: TrackRef) {
        self.request_track_inner(track, true);
    }

    fn request_track_inner(&mut self, track: TrackRef, autoplay: bool) {
        info!(surah = %track.surah, reciter = %track.reciter, autoplay, "Track requested");

        self.cancel_retry();
        self.budget.reset();
        self.advance_in_flight = false;
        self.clear_error();
        self.play_when_ready = autoplay;
        self.begin_load(track, Some(TrackChangeCause::User));
    }

    /// Load the persisted track without autoplay
    ///
    /// The saved offset is applied once the stream reports ready. Returns the
    /// restored track, if the session had one.
    pub fn restore_session(&mut self) -> Option<TrackRef> {
        let track = self.store.session().track()?;
        info!(
            surah = %track.surah,
            reciter = %track.reciter,
            offset = self.store.session().offset_secs,
            "Restoring session"
        );

        self.cancel_retry();
        self.budget.reset();
        self.clear_error();
        self.play_when_ready = false;
        self.begin_load(track, Some(TrackChangeCause::Restore));
        Some(track)
    }

    /// Dispose the live resource and start loading `track` under a new generation
    fn begin_load(&mut self, track: TrackRef, cause: Option<TrackChangeCause>) {
        let previous = self.current.replace(track);
        self.generation = self.generation.next();

        // A different track must never inherit a stale offset
        if self.store.session().track() != Some(track) {
            self.persist(|s| {
                s.surah = Some(track.surah);
                s.reciter = track.reciter;
                s.offset_secs = 0.0;
            });
        }

        self.position = 0.0;
        self.last_checkpoint = 0.0;
        self.duration = catalog_entry(self.catalog.as_ref(), track).and_then(CatalogEntry::known_duration);

        let preload = self.network.network_class().preload_strategy();
        let url = self.resolver.resolve(track);
        debug!(url = %url, generation = self.generation.0, "Loading track");

        self.engine.load(LoadRequest {
            url,
            generation: self.generation,
            preload,
        });

        if let Some(cause) = cause {
            if previous != Some(track) || cause != TrackChangeCause::Advance {
                self.pending_events.push(ControllerEvent::TrackChanged {
                    track,
                    previous,
                    cause,
                });
            }
        }
        self.set_state(ControllerState::Loading);
    }

    // ===== Playback control =====

    /// Start or resume playback
    ///
    /// While loading, playback starts as soon as the resource is ready. From
    /// `Idle` the persisted (or last) track is loaded and played. After an
    /// autoplay rejection this call is the user gesture that unblocks playback.
    pub fn play(&mut self) {
        match self.state {
            ControllerState::Playing => {}
            ControllerState::Ready | ControllerState::Paused => self.engine.play(),
            ControllerState::Loading | ControllerState::Ending => self.play_when_ready = true,
            ControllerState::Idle => {
                let track = self.current.or_else(|| self.store.session().track());
                if let Some(track) = track {
                    self.play_when_ready = true;
                    self.begin_load(track, Some(TrackChangeCause::Restore));
                }
            }
            ControllerState::Error => {
                if self.error.as_ref().is_some_and(|e| e.needs_user_gesture) {
                    self.clear_error();
                    self.play_now();
                } else if self.retry.is_retrying() {
                    self.play_when_ready = true;
                } else {
                    self.retry();
                }
            }
        }
    }

    /// Pause playback and persist the current offset
    pub fn pause(&mut self) {
        match self.state {
            ControllerState::Playing => {
                self.engine.pause();
                self.position = self.live_position();
                self.set_state(ControllerState::Paused);
                self.persist_position();
            }
            ControllerState::Loading => self.play_when_ready = false,
            // A play may be sent but not started yet
            ControllerState::Ready | ControllerState::Paused => {
                self.play_when_ready = false;
                self.engine.pause();
            }
            // Loop replay not started yet
            ControllerState::Ending => {
                self.engine.pause();
                self.advance_in_flight = false;
                self.set_state(ControllerState::Paused);
                self.persist_position();
            }
            ControllerState::Error
                if matches!(self.retry.pending(), Some(r) if r.op == RetryOp::Play) =>
            {
                self.cancel_retry();
                self.budget.reset();
                self.set_state(ControllerState::Paused);
                self.persist_position();
            }
            _ => {}
        }
    }

    pub fn toggle_play(&mut self) {
        if self.state == ControllerState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    fn play_now(&mut self) {
        if self.engine.state().can_play() {
            self.engine.play();
        } else if self.engine.state() == EngineState::Loading {
            self.play_when_ready = true;
        } else if let Some(track) = self.current {
            self.play_when_ready = true;
            self.begin_load(track, None);
        }
    }

    // ===== Seek =====

    /// Seek to an absolute offset
    ///
    /// Clamped into `[0, duration]`. Non-finite input, or an unknown duration,
    /// leaves the position unchanged.
    pub fn seek_to(&mut self, seconds: f64) {
        let Some(applied) = self.engine.seek(seconds) else {
            debug!(seconds, duration = ?self.engine.duration(), "Ignoring seek");
            return;
        };

        self.position = applied;
        if applied < self.last_checkpoint {
            self.last_checkpoint = applied;
        }
        self.pending_events
            .push(ControllerEvent::Seeked { position: applied });

        if self.state != ControllerState::Playing {
            self.persist_position();
        }
    }

    /// Seek relative to the current position
    pub fn seek_by(&mut self, delta: f64) {
        if delta.is_finite() {
            let target = self.live_position() + delta;
            self.seek_to(target);
        }
    }

    /// Seek by fraction of the duration (0.0 - 1.0)
    pub fn seek_to_percent(&mut self, percent: f64) {
        if !percent.is_finite() {
            return;
        }
        if let Some(duration) = self.engine.duration() {
            self.seek_to(duration * percent.clamp(0.0, 1.0));
        }
    }

    /// Step back by the configured seek step
    pub fn seek_backward(&mut self) {
        self.seek_by(-self.config.seek_step_secs);
    }

    /// Step forward by the configured seek step
    pub fn seek_forward(&mut self) {
        self.seek_by(self.config.seek_step_secs);
    }

    // ===== Verses =====

    /// Verse playing at the current position, if timings are known
    pub fn current_verse(&self) -> Option<u32> {
        self.current_entry()?.verse_at(self.position)
    }

    /// Seek to the start of a verse; unknown verses are ignored
    pub fn go_to_verse(&mut self, verse: u32) {
        match self.current_entry().and_then(|entry| entry.verse_start(verse)) {
            Some(start) => self.seek_to(start),
            None => debug!(verse, "No timing for verse"),
        }
    }

    // ===== Preferences =====

    /// Set volume (0-100), applied immediately and persisted
    pub fn set_volume(&mut self, level: i32) {
        let level = self.engine.set_volume(level);
        self.persist(|s| s.volume = level);
        self.pending_events.push(ControllerEvent::VolumeChanged {
            level,
            is_muted: self.engine.is_muted(),
        });
    }

    pub fn set_muted(&mut self, muted: bool) {
        if self.engine.is_muted() == muted {
            return;
        }
        self.engine.set_muted(muted);
        self.pending_events.push(ControllerEvent::VolumeChanged {
            level: self.engine.volume(),
            is_muted: muted,
        });
    }

    pub fn toggle_mute(&mut self) {
        self.set_muted(!self.engine.is_muted());
    }

    /// Set playback rate (0.25-2.0); non-finite input is ignored
    pub fn set_rate(&mut self, rate: f64) {
        if !rate.is_finite() {
            debug!(rate, "Ignoring playback rate");
            return;
        }
        let rate = self.engine.set_rate(rate);
        self.persist(|s| s.playback_rate = rate);
        self.pending_events.push(ControllerEvent::RateChanged { rate });
    }

    /// Select the track-boundary policy; replaces the previous mode
    pub fn set_mode(&mut self, mode: PlayerMode) {
        if self.store.session().mode == mode {
            return;
        }
        debug!(mode = mode.as_str(), "Player mode changed");
        self.persist(|s| s.mode = mode);
        self.pending_events.push(ControllerEvent::ModeChanged { mode });
    }

    pub fn set_show_translation(&mut self, show: bool) {
        if self.store.session().show_translation == show {
            return;
        }
        self.persist(|s| s.show_translation = show);
        self.pending_events
            .push(ControllerEvent::TranslationToggled { show });
    }

    // ===== Navigation =====

    /// Go to the next track according to the current mode
    pub fn next_track(&mut self) {
        self.advance(AdvanceTrigger::NextRequested);
    }

    /// Go to the previous track, or restart the current one past the threshold
    pub fn previous_track(&mut self) {
        self.advance(AdvanceTrigger::PreviousRequested);
    }

    /// Shared entry point for natural end-of-track and OS next/previous
    fn advance(&mut self, trigger: AdvanceTrigger) {
        if self.advance_in_flight {
            debug!(?trigger, "Advance already in flight, ignoring");
            return;
        }
        let Some(track) = self.current else {
            return;
        };

        let mode = self.store.session().mode;
        let position = self.live_position();
        let plan = plan_advance(
            trigger,
            mode,
            track.surah,
            position,
            self.config.restart_threshold_secs,
            &mut *self.rng,
        );
        debug!(?trigger, mode = mode.as_str(), ?plan, "Advancing");

        match plan {
            AdvancePlan::Stop => {
                self.rewind();
                self.persist_position();
                self.set_state(ControllerState::Ready);
            }
            AdvancePlan::Replay => {
                self.advance_in_flight = true;
                self.rewind();
                self.engine.play();
            }
            AdvancePlan::Restart => {
                self.rewind();
                if self.state != ControllerState::Playing {
                    self.persist_position();
                }
            }
            AdvancePlan::Load(surah) => self.advance_to(track, surah),
        }
    }

    fn advance_to(&mut self, track: TrackRef, surah: SurahId) {
        self.advance_in_flight = true;
        self.play_when_ready = true;
        self.cancel_retry();
        self.clear_error();
        self.begin_load(track.with_surah(surah), Some(TrackChangeCause::Advance));
    }

    fn rewind(&mut self) {
        self.engine.seek(0.0);
        self.position = 0.0;
        self.last_checkpoint = 0.0;
        self.pending_events
            .push(ControllerEvent::Seeked { position: 0.0 });
    }

    // ===== Errors =====

    /// Explicit retry after a terminal error
    ///
    /// Clears the retry budget and the error, then reloads the last track.
    pub fn retry(&mut self) {
        let Some(track) = self.current else {
            return;
        };
        info!(surah = %track.surah, reciter = %track.reciter, "Manual retry");

        self.cancel_retry();
        self.budget.reset();
        self.advance_in_flight = false;
        self.clear_error();
        self.play_when_ready = true;
        self.begin_load(track, None);
    }

    /// Acknowledge an error without retrying
    ///
    /// Returns to `Idle` keeping the track selection; `play()` reloads it.
    pub fn dismiss_error(&mut self) {
        if self.state != ControllerState::Error && self.error.is_none() {
            return;
        }

        self.cancel_retry();
        self.budget.reset();
        self.advance_in_flight = false;
        self.play_when_ready = false;
        self.clear_error();
        self.engine.dispose();
        self.set_state(ControllerState::Idle);
    }

    fn clear_error(&mut self) {
        if self.error.take().is_some() {
            self.pending_events.push(ControllerEvent::ErrorCleared);
        }
    }

    fn cancel_retry(&mut self) {
        if let Some(retry) = self.retry.cancel() {
            debug!(op = ?retry.op, generation = retry.generation.0, "Cancelled pending retry");
        }
    }

    /// Schedule a retry or surface a terminal error
    fn on_failure(&mut self, op: RetryOp, err: &PlaybackError) {
        // One retry in flight at a time
        if self.retry.is_retrying() {
            debug!(error = %err, "Retry already pending, ignoring failure");
            return;
        }

        match self.budget.record_failure() {
            Some(delay) => {
                let attempt = self.budget.attempts();
                let due = self.clock.now() + delay;
                warn!(
                    error = %err,
                    attempt,
                    max = self.budget.max(),
                    delay_ms = delay.as_millis() as u64,
                    "Playback failure, retrying"
                );
                self.retry.schedule(PendingRetry {
                    due,
                    op,
                    generation: self.generation,
                });
                self.pending_events.push(ControllerEvent::RetryScheduled {
                    attempt,
                    delay_ms: delay.as_millis() as u64,
                });
                self.set_state(ControllerState::Error);
            }
            None => {
                let attempts = self.budget.attempts();
                let user_error = if self.advance_in_flight {
                    UserFacingError::advance_failed(attempts)
                } else {
                    match op {
                        RetryOp::Load(_) => UserFacingError::load_exhausted(attempts),
                        RetryOp::Play => UserFacingError::play_exhausted(attempts),
                    }
                };
                error!(error = %err, attempts, "Playback failed, giving up");
                self.fail(user_error);
            }
        }
    }

    fn fail(&mut self, user_error: UserFacingError) {
        self.advance_in_flight = false;
        self.play_when_ready = false;
        self.error = Some(user_error.clone());
        self.pending_events
            .push(ControllerEvent::Error { error: user_error });
        self.set_state(ControllerState::Error);
    }

    fn fire_retry(&mut self, retry: PendingRetry) {
        if retry.generation != self.generation {
            debug!(generation = retry.generation.0, "Dropping retry for superseded load");
            return;
        }

        debug!(op = ?retry.op, attempt = self.budget.attempts(), "Firing retry");
        match retry.op {
            RetryOp::Load(track) => self.begin_load(track, None),
            RetryOp::Play => self.play_now(),
        }
    }

    // ===== Event loop =====

    /// Drain engine events and fire a due retry
    pub fn poll(&mut self) {
        let now = self.clock.now();

        for event in self.engine.poll_events(now) {
            self.handle_engine_event(event);
        }

        if let Some(retry) = self.retry.take_due(now) {
            self.fire_retry(retry);
        }
    }

    /// Apply one engine event
    ///
    /// Events tagged with a superseded load generation are discarded.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if event.generation != self.generation {
            debug!(
                event_generation = event.generation.0,
                current_generation = self.generation.0,
                kind = ?event.kind,
                "Discarding stale engine event"
            );
            return;
        }

        match event.kind {
            EngineEventKind::Ready { duration } => self.on_ready(duration),
            EngineEventKind::Started => {
                self.budget.reset();
                self.advance_in_flight = false;
                self.set_state(ControllerState::Playing);
            }
            EngineEventKind::Paused => {
                // Paused from outside (OS, headset)
                if self.state == ControllerState::Playing {
                    self.position = self.live_position();
                    self.set_state(ControllerState::Paused);
                    self.persist_position();
                }
            }
            EngineEventKind::Ended => self.on_ended(),
            EngineEventKind::LoadError { cause } => {
                if let Some(track) = self.current {
                    self.on_failure(RetryOp::Load(track), &PlaybackError::Load(cause));
                }
            }
            EngineEventKind::PlayError { kind, cause } => {
                if kind == PlayErrorKind::AutoplayBlocked {
                    // Retrying without a gesture would be refused again
                    warn!(cause = %cause, "Autoplay blocked, waiting for user gesture");
                    self.cancel_retry();
                    self.fail(UserFacingError::autoplay_blocked());
                } else {
                    self.on_failure(RetryOp::Play, &PlaybackError::Play { kind, cause });
                }
            }
            EngineEventKind::PositionTick { seconds } => self.on_position(seconds),
        }
    }

    fn on_ready(&mut self, duration: f64) {
        let Some(track) = self.current else {
            return;
        };

        self.budget.reset();
        self.duration = Some(duration);

        let start_offset = self
            .store
            .session()
            .restorable_offset(track, duration)
            .unwrap_or(0.0);
        if start_offset > 0.0 {
            self.engine.seek(start_offset);
        }
        self.position = start_offset;
        self.last_checkpoint = start_offset;

        info!(surah = %track.surah, reciter = %track.reciter, duration, start_offset, "Track ready");
        self.pending_events.push(ControllerEvent::Ready {
            track,
            duration,
            start_offset,
        });
        self.set_state(ControllerState::Ready);

        if std::mem::take(&mut self.play_when_ready) {
            self.engine.play();
        }
    }

    fn on_ended(&mut self) {
        if let Some(duration) = self.duration {
            self.position = duration;
        }
        self.set_state(ControllerState::Ending);
        self.advance(AdvanceTrigger::TrackEnded);
    }

    fn on_position(&mut self, seconds: f64) {
        if self.state != ControllerState::Playing || !seconds.is_finite() {
            return;
        }

        self.position = seconds;
        self.pending_events.push(ControllerEvent::PositionUpdate {
            position: seconds,
            duration: self.duration,
        });

        // Checkpoint on media time so rate changes don't skew the cadence
        if seconds < self.last_checkpoint {
            self.last_checkpoint = seconds;
        } else if seconds - self.last_checkpoint >= self.config.checkpoint_interval_secs {
            self.last_checkpoint = seconds;
            self.persist_position();
        }
    }

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    /// Persist the position and release the engine resource
    pub fn shutdown(&mut self) {
        if matches!(
            self.state,
            ControllerState::Playing | ControllerState::Paused | ControllerState::Ready
        ) {
            self.position = self.live_position();
            self.persist_position();
        }

        self.cancel_retry();
        self.engine.dispose();
        self.play_when_ready = false;
        self.advance_in_flight = false;
        self.set_state(ControllerState::Idle);
        self.pending_events.push(ControllerEvent::Shutdown);
        info!("Playback controller shut down");
    }

    // ===== Persistence =====

    fn persist(&mut self, mutate: impl FnOnce(&mut PersistedSession)) {
        if let Err(e) = self.store.update(mutate) {
            warn!(error = %e, "Failed to persist session, continuing in memory");
        }
    }

    fn persist_position(&mut self) {
        let Some(track) = self.current else {
            return;
        };
        let offset = self.position;
        self.persist(|s| {
            s.surah = Some(track.surah);
            s.reciter = track.reciter;
            s.offset_secs = offset;
        });
    }

    fn set_state(&mut self, state: ControllerState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "State changed");
            self.state = state;
            self.pending_events
                .push(ControllerEvent::StateChanged { state });
        }
    }

    fn live_position(&self) -> f64 {
        match self.engine.state() {
            EngineState::Playing | EngineState::Paused => {
                self.engine.position().unwrap_or(self.position)
            }
            _ => self.position,
        }
    }

    // ===== Queries =====

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn current_track(&self) -> Option<TrackRef> {
        self.current
    }

    /// Last known position within the current track
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn playback_position(&self) -> Option<PlaybackPosition> {
        self.current.map(|track| PlaybackPosition {
            track,
            offset_secs: self.position,
        })
    }

    /// Stream duration once ready, the catalog's figure while loading
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn mode(&self) -> PlayerMode {
        self.store.session().mode
    }

    pub fn volume(&self) -> u8 {
        self.engine.volume()
    }

    pub fn is_muted(&self) -> bool {
        self.engine.is_muted()
    }

    pub fn playback_rate(&self) -> f64 {
        self.engine.rate()
    }

    pub fn show_translation(&self) -> bool {
        self.store.session().show_translation
    }

    pub fn is_playing(&self) -> bool {
        self.state == ControllerState::Playing
    }

    /// Error awaiting acknowledgement
    pub fn error(&self) -> Option<&UserFacingError> {
        self.error.as_ref()
    }

    /// A retry is scheduled and not yet fired
    pub fn is_retrying(&self) -> bool {
        self.retry.is_retrying()
    }

    pub fn retry_attempts(&self) -> u32 {
        self.budget.attempts()
    }

    pub fn generation(&self) -> LoadGeneration {
        self.generation
    }

    pub fn session(&self) -> &PersistedSession {
        self.store.session()
    }

    pub fn catalog(&self) -> Option<&ReciterCatalog> {
        self.catalog.as_ref()
    }

    /// Catalog entry of the current track
    pub fn current_entry(&self) -> Option<&CatalogEntry> {
        catalog_entry(self.catalog.as_ref(), self.current?)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

fn catalog_entry(catalog: Option<&ReciterCatalog>, track: TrackRef) -> Option<&CatalogEntry> {
    catalog
        .filter(|c| c.reciter() == track.reciter)
        .and_then(|c| c.get(track.surah))
}
