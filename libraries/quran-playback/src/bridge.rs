//! OS media controls
//!
//! [`ExternalControlBridge`] mirrors controller state onto the platform media
//! surface (lock screen, headset keys, notification shade) and turns inbound
//! media actions back into controller calls.
//!
//! Some platforms drop seek handlers when track-navigation handlers are also
//! registered, and ignore handlers registered before playback began. Which
//! handlers get registered, and when, is decided once by a
//! [`ControlStrategy`] chosen from a [`Capabilities`] probe.

use crate::catalog::reciter;
use crate::config::{Artwork, BridgeConfig};
use crate::controller::PlaybackController;
use crate::events::ControllerEvent;
use crate::types::{ControllerState, TrackRef};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Inbound command from the OS media surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum MediaAction {
    Play,
    Pause,
    SeekBackward { offset: Option<f64> },
    SeekForward { offset: Option<f64> },
    SeekTo { time: f64 },
    NextTrack,
    PreviousTrack,
}

impl MediaAction {
    pub fn kind(&self) -> MediaActionKind {
        match self {
            MediaAction::Play => MediaActionKind::Play,
            MediaAction::Pause => MediaActionKind::Pause,
            MediaAction::SeekBackward { .. } => MediaActionKind::SeekBackward,
            MediaAction::SeekForward { .. } => MediaActionKind::SeekForward,
            MediaAction::SeekTo { .. } => MediaActionKind::SeekTo,
            MediaAction::NextTrack => MediaActionKind::NextTrack,
            MediaAction::PreviousTrack => MediaActionKind::PreviousTrack,
        }
    }
}

/// Handler slot on the media surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaActionKind {
    Play,
    Pause,
    SeekBackward,
    SeekForward,
    SeekTo,
    NextTrack,
    PreviousTrack,
}

impl MediaActionKind {
    /// Media Session action name
    pub fn as_str(self) -> &'static str {
        match self {
            MediaActionKind::Play => "play",
            MediaActionKind::Pause => "pause",
            MediaActionKind::SeekBackward => "seekbackward",
            MediaActionKind::SeekForward => "seekforward",
            MediaActionKind::SeekTo => "seekto",
            MediaActionKind::NextTrack => "nexttrack",
            MediaActionKind::PreviousTrack => "previoustrack",
        }
    }
}

/// Now-playing metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork: Vec<Artwork>,
}

/// Playback state as the OS understands it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfacePlaybackState {
    None,
    Paused,
    Playing,
}

impl SurfacePlaybackState {
    pub fn as_str(self) -> &'static str {
        match self {
            SurfacePlaybackState::None => "none",
            SurfacePlaybackState::Paused => "paused",
            SurfacePlaybackState::Playing => "playing",
        }
    }
}

/// Position published to the OS scrubber
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionState {
    pub duration: f64,
    pub position: f64,
    pub playback_rate: f64,
}

/// Platform media-control surface
pub trait MediaSurface {
    /// Register handlers for exactly these actions
    fn set_action_handlers(&mut self, actions: &[MediaActionKind]);

    fn clear_action_handlers(&mut self);

    fn set_metadata(&mut self, metadata: &MediaMetadata);

    fn set_playback_state(&mut self, state: SurfacePlaybackState);

    fn set_position_state(&mut self, state: &PositionState);
}

/// What the platform's media surface allows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Seek and track-navigation handlers can coexist
    pub seek_with_track_nav: bool,

    /// Handlers registered before playback starts are kept
    pub early_registration: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::FULL
    }
}

impl Capabilities {
    pub const FULL: Capabilities = Capabilities {
        seek_with_track_nav: true,
        early_registration: true,
    };

    pub const RESTRICTED: Capabilities = Capabilities {
        seek_with_track_nav: false,
        early_registration: false,
    };

    /// Probe from the user agent string
    ///
    /// iPadOS reports a desktop Safari UA, so a Mac with touch points counts
    /// as iOS as well.
    pub fn from_user_agent(user_agent: &str, max_touch_points: u32) -> Self {
        let ios = ["iPhone", "iPad", "iPod"]
            .iter()
            .any(|device| user_agent.contains(device))
            || (user_agent.contains("Macintosh") && max_touch_points > 1);

        if ios {
            Self::RESTRICTED
        } else {
            Self::FULL
        }
    }
}

/// Which handlers to register and when
pub trait ControlStrategy {
    fn name(&self) -> &'static str;

    fn actions(&self) -> &'static [MediaActionKind];

    /// Wait for the first successful `started` before registering
    fn defers_registration(&self) -> bool;

    fn supports(&self, kind: MediaActionKind) -> bool {
        self.actions().contains(&kind)
    }
}

/// Every handler, registered up front
#[derive(Debug, Clone, Copy, Default)]
pub struct FullControl;

impl ControlStrategy for FullControl {
    fn name(&self) -> &'static str {
        "full"
    }

    fn actions(&self) -> &'static [MediaActionKind] {
        &[
            MediaActionKind::Play,
            MediaActionKind::Pause,
            MediaActionKind::SeekBackward,
            MediaActionKind::SeekForward,
            MediaActionKind::SeekTo,
            MediaActionKind::NextTrack,
            MediaActionKind::PreviousTrack,
        ]
    }

    fn defers_registration(&self) -> bool {
        false
    }
}

/// Play/pause and track navigation only, registered after playback starts
#[derive(Debug, Clone, Copy, Default)]
pub struct RestrictedControl;

impl ControlStrategy for RestrictedControl {
    fn name(&self) -> &'static str {
        "restricted"
    }

    fn actions(&self) -> &'static [MediaActionKind] {
        &[
            MediaActionKind::Play,
            MediaActionKind::Pause,
            MediaActionKind::NextTrack,
            MediaActionKind::PreviousTrack,
        ]
    }

    fn defers_registration(&self) -> bool {
        true
    }
}

/// Pick the strategy for a capability set
pub fn select_strategy(capabilities: Capabilities) -> Box<dyn ControlStrategy> {
    if capabilities.seek_with_track_nav && capabilities.early_registration {
        Box::new(FullControl)
    } else {
        Box::new(RestrictedControl)
    }
}

/// Two-way link between the controller and the OS media surface
pub struct ExternalControlBridge {
    surface: Box<dyn MediaSurface>,
    strategy: Box<dyn ControlStrategy>,
    config: BridgeConfig,
    registered: bool,
    last_published: Option<f64>,
}

impl ExternalControlBridge {
    pub fn new(
        surface: Box<dyn MediaSurface>,
        capabilities: Capabilities,
        config: BridgeConfig,
    ) -> Self {
        let strategy = select_strategy(capabilities);
        info!(strategy = strategy.name(), "Media controls initialized");

        let mut bridge = Self {
            surface,
            strategy,
            config,
            registered: false,
            last_published: None,
        };
        if !bridge.strategy.defers_registration() {
            bridge.register();
        }
        bridge
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    fn register(&mut self) {
        self.surface.set_action_handlers(self.strategy.actions());
        self.registered = true;
        debug!(strategy = self.strategy.name(), "Media action handlers registered");
    }

    // ===== Outbound =====

    /// Mirror one controller event onto the surface
    pub fn observe(&mut self, event: &ControllerEvent, controller: &PlaybackController) {
        match event {
            ControllerEvent::TrackChanged { track, .. } => {
                let metadata = self.metadata_for(*track, controller);
                self.surface.set_metadata(&metadata);
                self.last_published = None;
            }
            ControllerEvent::StateChanged { state } => {
                if *state == ControllerState::Playing && !self.registered {
                    self.register();
                }
                if let Some(surface_state) = surface_state(*state) {
                    self.surface.set_playback_state(surface_state);
                }
                self.publish_position(controller);
            }
            ControllerEvent::Ready { .. }
            | ControllerEvent::Seeked { .. }
            | ControllerEvent::RateChanged { .. } => self.publish_position(controller),
            ControllerEvent::PositionUpdate { position, .. } => {
                let due = match self.last_published {
                    Some(last) => {
                        (position - last).abs() >= self.config.position_sync_interval_secs
                    }
                    None => true,
                };
                if due {
                    self.publish_position(controller);
                }
            }
            ControllerEvent::Shutdown => self.teardown(),
            _ => {}
        }
    }

    fn metadata_for(&self, track: TrackRef, controller: &PlaybackController) -> MediaMetadata {
        let title = controller
            .catalog()
            .filter(|catalog| catalog.reciter() == track.reciter)
            .and_then(|catalog| catalog.get(track.surah))
            .map_or_else(
                || format!("Surah {}", track.surah),
                |entry| entry.display_name.clone(),
            );
        let artist = reciter(track.reciter).map_or_else(
            || format!("Reciter {}", track.reciter),
            |r| r.name.to_string(),
        );

        MediaMetadata {
            title,
            artist,
            album: self.config.album.clone(),
            artwork: self.config.artwork.clone(),
        }
    }

    fn publish_position(&mut self, controller: &PlaybackController) {
        let Some(duration) = controller
            .duration()
            .filter(|d| d.is_finite() && *d > 0.0)
        else {
            return;
        };

        let position = controller.position().clamp(0.0, duration);
        self.surface.set_position_state(&PositionState {
            duration,
            position,
            playback_rate: controller.playback_rate(),
        });
        self.last_published = Some(position);
    }

    /// Drop handlers and clear the surface
    pub fn teardown(&mut self) {
        if self.registered {
            self.surface.clear_action_handlers();
            self.registered = false;
        }
        self.surface
            .set_playback_state(SurfacePlaybackState::None);
    }

    // ===== Inbound =====

    /// Route an OS media action into the controller
    ///
    /// Next/previous go through the controller's mode-aware advance, the same
    /// path as a natural end of track.
    pub fn handle_action(&mut self, action: MediaAction, controller: &mut PlaybackController) {
        if !self.strategy.supports(action.kind()) {
            debug!(?action, strategy = self.strategy.name(), "Ignoring unsupported media action");
            return;
        }
        debug!(?action, "Media action");

        let default_offset = self.config.default_seek_offset_secs;
        match action {
            MediaAction::Play => controller.play(),
            MediaAction::Pause => controller.pause(),
            MediaAction::SeekBackward { offset } => {
                controller.seek_by(-offset.unwrap_or(default_offset));
            }
            MediaAction::SeekForward { offset } => {
                controller.seek_by(offset.unwrap_or(default_offset));
            }
            MediaAction::SeekTo { time } => controller.seek_to(time),
            MediaAction::NextTrack => controller.next_track(),
            MediaAction::PreviousTrack => controller.previous_track(),
        }
    }
}

fn surface_state(state: ControllerState) -> Option<SurfacePlaybackState> {
    match state {
        ControllerState::Playing => Some(SurfacePlaybackState::Playing),
        ControllerState::Paused | ControllerState::Ready => Some(SurfacePlaybackState::Paused),
        ControllerState::Idle | ControllerState::Error => Some(SurfacePlaybackState::None),
        ControllerState::Loading | ControllerState::Ending => None,
    }
}
