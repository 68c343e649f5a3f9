//! Player facade
//!
//! Wires the controller to its observers: every controller event is mirrored
//! to the OS media surface and the wake lock before being handed to the UI.

use crate::bridge::{Capabilities, ExternalControlBridge, MediaAction, MediaSurface};
use crate::catalog::ReciterCatalog;
use crate::clock::Clock;
use crate::config::PlayerConfig;
use crate::controller::PlaybackController;
use crate::engine::{MediaBackend, StreamingEngine};
use crate::error::Result;
use crate::events::ControllerEvent;
use crate::resolver::TrackResolver;
use crate::session::SessionStore;
use crate::storage::KeyValueStorage;
use crate::types::NetworkProbe;
use crate::wake_lock::{WakeLock, WakeLockManager};
use rand::RngCore;

/// Platform pieces a player is assembled from
pub struct PlayerParts {
    pub backend: Box<dyn MediaBackend>,
    pub storage: Box<dyn KeyValueStorage>,
    pub surface: Box<dyn MediaSurface>,
    pub wake_lock: Box<dyn WakeLock>,
    pub clock: Box<dyn Clock>,
    pub network: Box<dyn NetworkProbe>,
    pub rng: Box<dyn RngCore>,
    pub capabilities: Capabilities,
}

/// Controller plus its outward-facing collaborators
pub struct QuranPlayer {
    controller: PlaybackController,
    bridge: ExternalControlBridge,
    wake_lock: WakeLockManager,
}

impl QuranPlayer {
    pub fn new(
        controller: PlaybackController,
        bridge: ExternalControlBridge,
        wake_lock: WakeLockManager,
    ) -> Self {
        Self {
            controller,
            bridge,
            wake_lock,
        }
    }

    /// Assemble a player from configuration and platform parts
    pub fn from_parts(config: &PlayerConfig, parts: PlayerParts) -> Result<Self> {
        let PlayerParts {
            backend,
            storage,
            surface,
            wake_lock,
            clock,
            network,
            mut rng,
            capabilities,
        } = parts;

        let resolver = TrackResolver::from_config(&config.source)?;
        let store = SessionStore::open(storage, &mut *rng);
        let controller = PlaybackController::new(
            StreamingEngine::new(backend),
            resolver,
            store,
            clock,
            config.controller.clone(),
        )
        .with_network(network)
        .with_rng(rng);

        let bridge = ExternalControlBridge::new(surface, capabilities, config.bridge.clone());
        Ok(Self::new(controller, bridge, WakeLockManager::new(wake_lock)))
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    /// Mutable access; call [`QuranPlayer::dispatch`] afterwards
    pub fn controller_mut(&mut self) -> &mut PlaybackController {
        &mut self.controller
    }

    pub fn set_catalog(&mut self, catalog: ReciterCatalog) {
        self.controller.set_catalog(catalog);
    }

    /// Run one event-loop step and return the events for the UI
    pub fn pump(&mut self) -> Vec<ControllerEvent> {
        self.controller.poll();
        self.dispatch()
    }

    /// Forward pending controller events to the bridge and the wake lock
    pub fn dispatch(&mut self) -> Vec<ControllerEvent> {
        let events = self.controller.drain_events();
        for event in &events {
            self.bridge.observe(event, &self.controller);
            self.wake_lock.observe(event);
        }
        events
    }

    /// Inbound OS media action
    pub fn handle_media_action(&mut self, action: MediaAction) -> Vec<ControllerEvent> {
        self.bridge.handle_action(action, &mut self.controller);
        self.dispatch()
    }

    pub fn on_visibility_change(&mut self, visible: bool) {
        self.wake_lock.on_visibility_change(visible);
    }

    pub fn on_wake_lock_revoked(&mut self) {
        self.wake_lock.on_revoked();
    }

    pub fn bridge(&self) -> &ExternalControlBridge {
        &self.bridge
    }

    pub fn wake_lock(&self) -> &WakeLockManager {
        &self.wake_lock
    }

    /// Page teardown: persist, dispose, release
    pub fn teardown(&mut self) -> Vec<ControllerEvent> {
        self.controller.shutdown();
        self.dispatch()
    }
}
