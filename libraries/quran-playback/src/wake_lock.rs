//! Display wake lock bound to the playing state

use crate::error::WakeLockError;
use crate::events::ControllerEvent;
use crate::types::ControllerState;
use tracing::{debug, warn};

/// Platform wake lock
pub trait WakeLock {
    fn is_supported(&self) -> bool;

    fn request(&mut self) -> Result<(), WakeLockError>;

    fn release(&mut self) -> Result<(), WakeLockError>;
}

/// Holds the lock exactly while the controller is `Playing`
///
/// The platform may revoke the lock on its own (typically when the page is
/// hidden). It is re-acquired when the page becomes visible again and
/// playback is still running.
pub struct WakeLockManager {
    lock: Box<dyn WakeLock>,
    held: bool,
    playing: bool,
    visible: bool,
}

impl WakeLockManager {
    pub fn new(lock: Box<dyn WakeLock>) -> Self {
        Self {
            lock,
            held: false,
            playing: false,
            visible: true,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Follow controller state changes
    pub fn observe(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::StateChanged { state } => {
                self.playing = *state == ControllerState::Playing;
                if self.playing {
                    self.acquire();
                } else {
                    self.release();
                }
            }
            ControllerEvent::Shutdown => self.teardown(),
            _ => {}
        }
    }

    pub fn on_visibility_change(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            // Hidden pages lose the lock
            self.held = false;
        } else if self.playing && !self.held {
            debug!("Page visible again, re-acquiring wake lock");
            self.acquire();
        }
    }

    /// The platform released the lock on its own
    pub fn on_revoked(&mut self) {
        if self.held {
            debug!("Wake lock revoked");
            self.held = false;
        }
    }

    /// Release on page teardown
    pub fn teardown(&mut self) {
        self.playing = false;
        self.release();
    }

    fn acquire(&mut self) {
        if self.held || !self.visible || !self.lock.is_supported() {
            return;
        }
        match self.lock.request() {
            Ok(()) => {
                self.held = true;
                debug!("Wake lock acquired");
            }
            Err(e) => warn!(error = %e, "Failed to acquire wake lock"),
        }
    }

    fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        match self.lock.release() {
            Ok(()) => debug!("Wake lock released"),
            Err(e) => warn!(error = %e, "Failed to release wake lock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Calls {
        requests: u32,
        releases: u32,
        fail_requests: bool,
    }

    struct FakeLock(Rc<RefCell<Calls>>);

    impl WakeLock for FakeLock {
        fn is_supported(&self) -> bool {
            true
        }

        fn request(&mut self) -> Result<(), WakeLockError> {
            let mut calls = self.0.borrow_mut();
            calls.requests += 1;
            if calls.fail_requests {
                Err(WakeLockError::Rejected("NotAllowedError".into()))
            } else {
                Ok(())
            }
        }

        fn release(&mut self) -> Result<(), WakeLockError> {
            self.0.borrow_mut().releases += 1;
            Ok(())
        }
    }

    fn state(state: ControllerState) -> ControllerEvent {
        ControllerEvent::StateChanged { state }
    }

    #[test]
    fn held_exactly_while_playing() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut manager = WakeLockManager::new(Box::new(FakeLock(calls.clone())));

        manager.observe(&state(ControllerState::Loading));
        assert!(!manager.is_held());

        manager.observe(&state(ControllerState::Playing));
        assert!(manager.is_held());

        manager.observe(&state(ControllerState::Paused));
        assert!(!manager.is_held());
        assert_eq!(calls.borrow().requests, 1);
        assert_eq!(calls.borrow().releases, 1);
    }

    #[test]
    fn reacquired_when_visible_again() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut manager = WakeLockManager::new(Box::new(FakeLock(calls.clone())));

        manager.observe(&state(ControllerState::Playing));
        manager.on_visibility_change(false);
        assert!(!manager.is_held());

        manager.on_visibility_change(true);
        assert!(manager.is_held());
        assert_eq!(calls.borrow().requests, 2);

        manager.on_revoked();
        manager.observe(&state(ControllerState::Error));
        assert_eq!(calls.borrow().releases, 0);
    }

    #[test]
    fn failures_are_not_fatal() {
        let calls = Rc::new(RefCell::new(Calls {
            fail_requests: true,
            ..Default::default()
        }));
        let mut manager = WakeLockManager::new(Box::new(FakeLock(calls.clone())));

        manager.observe(&state(ControllerState::Playing));
        assert!(!manager.is_held());

        manager.teardown();
        assert_eq!(calls.borrow().releases, 0);
    }
}
