//! Integration tests for the player facade
//!
//! Covers the OS media surface and the wake lock as they follow the
//! controller through `QuranPlayer`.

mod common;

use common::{saved_session, track, Op, PlayerFixture};
use quran_playback::{
    BackendEvent, Capabilities, CatalogEntry, ControllerState, MediaAction, MediaActionKind,
    PlayerMode, ReciterCatalog, ReciterId, SurahId, SurfacePlaybackState,
};

// ===== Test Helpers =====

fn ya_sin_catalog() -> ReciterCatalog {
    ReciterCatalog::new(
        ReciterId(2),
        [CatalogEntry {
            id: SurahId::new(36).unwrap(),
            display_name: "Ya-Sin".to_string(),
            duration: 1260.0,
            file_size: 0,
            format: None,
            verse_timings: Vec::new(),
        }],
    )
}

// ===== Registration =====

#[test]
fn test_full_strategy_registers_every_action_up_front() {
    let f = PlayerFixture::new(Capabilities::FULL);

    assert_eq!(f.player.bridge().strategy_name(), "full");
    assert!(f.player.bridge().is_registered());

    let log = f.surface.log.borrow();
    assert_eq!(log.actions.len(), 1);
    assert_eq!(log.actions[0].len(), 7);
    assert!(log.actions[0].contains(&MediaActionKind::SeekTo));
}

#[test]
fn test_restricted_strategy_defers_until_playing() {
    let mut f = PlayerFixture::new(Capabilities::RESTRICTED);
    assert_eq!(f.player.bridge().strategy_name(), "restricted");
    assert!(!f.player.bridge().is_registered());

    f.player.controller_mut().play_track(track(2));
    f.player.dispatch();
    f.emit(BackendEvent::Ready { duration: 300.0 });
    assert!(f.surface.log.borrow().actions.is_empty());

    f.emit(BackendEvent::Started);
    assert!(f.player.bridge().is_registered());
    assert_eq!(
        f.surface.log.borrow().actions,
        vec![vec![
            MediaActionKind::Play,
            MediaActionKind::Pause,
            MediaActionKind::NextTrack,
            MediaActionKind::PreviousTrack,
        ]]
    );
}

#[test]
fn test_restricted_strategy_ignores_seek_actions() {
    let mut f = PlayerFixture::new(Capabilities::RESTRICTED);
    f.playing(2, 300.0);

    f.player
        .handle_media_action(MediaAction::SeekTo { time: 30.0 });
    assert_eq!(f.player.controller().position(), 0.0);
    assert_eq!(f.backend.count(&Op::Seek(30.0)), 0);
}

#[test]
fn test_ios_user_agents_are_restricted() {
    let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
    let ipad_desktop_ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15";
    let android = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/120.0";

    assert_eq!(Capabilities::from_user_agent(iphone, 5), Capabilities::RESTRICTED);
    assert_eq!(
        Capabilities::from_user_agent(ipad_desktop_ua, 5),
        Capabilities::RESTRICTED
    );
    assert_eq!(Capabilities::from_user_agent(ipad_desktop_ua, 0), Capabilities::FULL);
    assert_eq!(Capabilities::from_user_agent(android, 5), Capabilities::FULL);
}

// ===== Outbound =====

#[test]
fn test_metadata_follows_track_changes() {
    let mut f = PlayerFixture::new(Capabilities::FULL);
    f.player.set_catalog(ya_sin_catalog());
    f.playing(36, 1260.0);

    {
        let log = f.surface.log.borrow();
        let metadata = log.metadata.last().expect("metadata published");
        assert_eq!(metadata.title, "Ya-Sin");
        assert_eq!(metadata.artist, "อุมัร สุจิตวรรณศรี");
        assert_eq!(metadata.album, "อัลกุรอาน - Al-Quran");
        assert_eq!(metadata.artwork.len(), 1);
    }

    // Natural end moves on to 37, which the catalog does not list
    f.emit(BackendEvent::Ended);
    let log = f.surface.log.borrow();
    assert_eq!(log.metadata.len(), 2);
    assert_eq!(log.metadata[1].title, "Surah 37");
}

#[test]
fn test_playback_state_mirrors_controller() {
    let mut f = PlayerFixture::new(Capabilities::FULL);
    f.playing(2, 300.0);
    assert_eq!(
        f.surface.log.borrow().states.last(),
        Some(&SurfacePlaybackState::Playing)
    );

    f.player.handle_media_action(MediaAction::Pause);
    assert_eq!(f.player.controller().state(), ControllerState::Paused);
    assert_eq!(
        f.surface.log.borrow().states.last(),
        Some(&SurfacePlaybackState::Paused)
    );
}

#[test]
fn test_position_state_is_throttled_while_playing() {
    let mut f = PlayerFixture::new(Capabilities::FULL);
    f.playing(2, 300.0);
    let before = f.surface.log.borrow().positions.len();

    for i in 1..20 {
        f.tick(f64::from(i) * 0.25);
    }
    assert_eq!(f.surface.log.borrow().positions.len(), before);

    f.tick(5.0);
    let log = f.surface.log.borrow();
    assert_eq!(log.positions.len(), before + 1);

    let last = log.positions.last().unwrap();
    assert_eq!(last.position, 5.0);
    assert_eq!(last.duration, 300.0);
    assert_eq!(last.playback_rate, 1.0);
}

#[test]
fn test_seek_action_publishes_position() {
    let mut f = PlayerFixture::new(Capabilities::FULL);
    f.playing(2, 300.0);

    f.player
        .handle_media_action(MediaAction::SeekTo { time: 100.0 });
    assert_eq!(f.player.controller().position(), 100.0);
    assert_eq!(
        f.surface.log.borrow().positions.last().map(|p| p.position),
        Some(100.0)
    );

    f.player
        .handle_media_action(MediaAction::SeekBackward { offset: None });
    assert_eq!(f.player.controller().position(), 90.0);
}

// ===== Inbound =====

#[test]
fn test_next_action_goes_through_mode_policy() {
    let mut f = PlayerFixture::new(Capabilities::FULL);
    f.player.controller_mut().set_mode(PlayerMode::Shuffle);
    f.playing(40, 300.0);

    f.player.handle_media_action(MediaAction::NextTrack);
    let current = f.player.controller().current_track().unwrap();
    assert_ne!(current.surah, SurahId::new(40).unwrap());
    assert_eq!(f.player.controller().mode(), PlayerMode::Shuffle);
}

#[test]
fn test_next_action_racing_natural_end_advances_once() {
    let mut f = PlayerFixture::new(Capabilities::FULL);
    f.playing(10, 300.0);

    f.backend.emit(BackendEvent::Ended);
    f.player.handle_media_action(MediaAction::NextTrack);
    f.player.pump();

    assert_eq!(f.player.controller().current_track(), Some(track(11)));
    assert_eq!(f.backend.opened().len(), 2);
}

#[test]
fn test_pause_then_play_keys_resume_playback() {
    let mut f = PlayerFixture::new(Capabilities::FULL);
    f.playing(2, 300.0);

    // Both keys land before the element reports anything
    f.player.handle_media_action(MediaAction::Pause);
    f.player.handle_media_action(MediaAction::Play);
    assert_eq!(f.backend.count(&Op::Play), 2);

    f.emit(BackendEvent::Paused);
    f.emit(BackendEvent::Started);
    assert_eq!(f.player.controller().state(), ControllerState::Playing);
    assert_eq!(
        f.surface.log.borrow().states.last(),
        Some(&SurfacePlaybackState::Playing)
    );
    assert!(f.player.wake_lock().is_held());
}

// ===== Wake lock =====

#[test]
fn test_wake_lock_held_only_while_playing() {
    let mut f = PlayerFixture::new(Capabilities::FULL);
    f.playing(2, 300.0);
    assert!(f.player.wake_lock().is_held());
    assert_eq!(f.wake_lock.log.borrow().requests, 1);

    f.player.handle_media_action(MediaAction::Pause);
    assert!(!f.player.wake_lock().is_held());
    assert_eq!(f.wake_lock.log.borrow().releases, 1);

    // Becoming visible while paused does not acquire
    f.player.on_visibility_change(false);
    f.player.on_visibility_change(true);
    assert_eq!(f.wake_lock.log.borrow().requests, 1);
}

#[test]
fn test_wake_lock_reacquired_when_visible_again() {
    let mut f = PlayerFixture::new(Capabilities::FULL);
    f.playing(2, 300.0);

    f.player.on_visibility_change(false);
    assert!(!f.player.wake_lock().is_held());

    f.player.on_visibility_change(true);
    assert!(f.player.wake_lock().is_held());
    assert_eq!(f.wake_lock.log.borrow().requests, 2);

    f.player.on_wake_lock_revoked();
    assert!(!f.player.wake_lock().is_held());
}

// ===== Teardown =====

#[test]
fn test_teardown_persists_and_clears_surface() {
    let mut f = PlayerFixture::new(Capabilities::FULL);
    f.playing(2, 300.0);
    f.backend.set_time(40.0);

    f.player.teardown();

    assert_eq!(saved_session(&f.storage).offset_secs, 40.0);
    assert!(!f.backend.is_open());
    assert!(!f.player.wake_lock().is_held());
    assert_eq!(f.wake_lock.log.borrow().releases, 1);

    let log = f.surface.log.borrow();
    assert_eq!(log.actions.last(), Some(&Vec::new()));
    assert_eq!(log.states.last(), Some(&SurfacePlaybackState::None));
    assert!(!f.player.bridge().is_registered());
}
