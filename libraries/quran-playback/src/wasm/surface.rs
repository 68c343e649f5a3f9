//! JS-provided platform integrations
//!
//! The Media Session and Screen Wake Lock APIs are still unstable in web-sys,
//! so the page wires them up in JS and hands us callbacks, the same way the
//! player reports its own events.

use super::storage::describe;
use crate::bridge::{
    Capabilities, MediaActionKind, MediaMetadata, MediaSurface, PositionState,
    SurfacePlaybackState,
};
use crate::error::WakeLockError;
use crate::types::{NetworkClass, NetworkProbe};
use js_sys::{Array, Function, Reflect};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::JsValue;

/// Callbacks registered from JS
#[derive(Default)]
pub struct SurfaceCallbacks {
    pub on_action_handlers: Option<Function>,
    pub on_metadata: Option<Function>,
    pub on_playback_state: Option<Function>,
    pub on_position_state: Option<Function>,

    // Replayed when the handler callback is registered late
    last_actions: Vec<MediaActionKind>,
}

impl SurfaceCallbacks {
    pub fn set_on_action_handlers(&mut self, callback: Function) {
        call(&callback, &action_array(&self.last_actions));
        self.on_action_handlers = Some(callback);
    }
}

/// [`MediaSurface`] forwarding to JS callbacks
pub struct JsMediaSurface {
    callbacks: Rc<RefCell<SurfaceCallbacks>>,
}

impl JsMediaSurface {
    pub fn new(callbacks: Rc<RefCell<SurfaceCallbacks>>) -> Self {
        Self { callbacks }
    }
}

impl MediaSurface for JsMediaSurface {
    fn set_action_handlers(&mut self, actions: &[MediaActionKind]) {
        let mut callbacks = self.callbacks.borrow_mut();
        callbacks.last_actions = actions.to_vec();
        if let Some(cb) = &callbacks.on_action_handlers {
            call(cb, &action_array(actions));
        }
    }

    fn clear_action_handlers(&mut self) {
        self.set_action_handlers(&[]);
    }

    fn set_metadata(&mut self, metadata: &MediaMetadata) {
        if let Some(cb) = &self.callbacks.borrow().on_metadata {
            if let Ok(value) = serde_wasm_bindgen::to_value(metadata) {
                call(cb, &value);
            }
        }
    }

    fn set_playback_state(&mut self, state: SurfacePlaybackState) {
        if let Some(cb) = &self.callbacks.borrow().on_playback_state {
            call(cb, &JsValue::from_str(state.as_str()));
        }
    }

    fn set_position_state(&mut self, state: &PositionState) {
        if let Some(cb) = &self.callbacks.borrow().on_position_state {
            if let Ok(value) = serde_wasm_bindgen::to_value(state) {
                call(cb, &value);
            }
        }
    }
}

fn action_array(actions: &[MediaActionKind]) -> JsValue {
    actions
        .iter()
        .map(|a| JsValue::from_str(a.as_str()))
        .collect::<Array>()
        .into()
}

fn call(cb: &Function, arg: &JsValue) {
    if let Err(e) = cb.call1(&JsValue::NULL, arg) {
        debug!(error = %describe(&e), "Media session callback threw");
    }
}

/// `navigator.wakeLock` request/release supplied by JS
#[derive(Default)]
pub struct WakeLockCallbacks {
    pub request: Option<Function>,
    pub release: Option<Function>,
}

/// [`crate::WakeLock`] forwarding to JS callbacks
pub struct JsWakeLock {
    callbacks: Rc<RefCell<WakeLockCallbacks>>,
}

impl JsWakeLock {
    pub fn new(callbacks: Rc<RefCell<WakeLockCallbacks>>) -> Self {
        Self { callbacks }
    }
}

impl crate::wake_lock::WakeLock for JsWakeLock {
    fn is_supported(&self) -> bool {
        self.callbacks.borrow().request.is_some()
    }

    fn request(&mut self) -> Result<(), WakeLockError> {
        let callbacks = self.callbacks.borrow();
        let cb = callbacks.request.as_ref().ok_or(WakeLockError::Unsupported)?;
        cb.call0(&JsValue::NULL)
            .map(|_| ())
            .map_err(|e| WakeLockError::Rejected(describe(&e)))
    }

    fn release(&mut self) -> Result<(), WakeLockError> {
        let callbacks = self.callbacks.borrow();
        let Some(cb) = callbacks.release.as_ref() else {
            return Ok(());
        };
        cb.call0(&JsValue::NULL)
            .map(|_| ())
            .map_err(|e| WakeLockError::Rejected(describe(&e)))
    }
}

/// Network class from `navigator.connection`, where the browser exposes it
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNetwork;

impl NetworkProbe for BrowserNetwork {
    fn network_class(&self) -> NetworkClass {
        let Some(window) = web_sys::window() else {
            return NetworkClass::Unknown;
        };
        let Some(connection) = Reflect::get(&window.navigator(), &JsValue::from_str("connection"))
            .ok()
            .filter(|c| c.is_object())
        else {
            return NetworkClass::Unknown;
        };

        let read = |field: &str| {
            Reflect::get(&connection, &JsValue::from_str(field))
                .ok()
                .and_then(|v| v.as_string())
        };

        match read("type").as_deref() {
            Some("cellular") => return NetworkClass::Cellular,
            Some("wifi" | "ethernet") => return NetworkClass::Wifi,
            _ => {}
        }
        match read("effectiveType").as_deref() {
            Some("slow-2g" | "2g" | "3g") => NetworkClass::Cellular,
            _ => NetworkClass::Unknown,
        }
    }
}

/// Probe media-control capabilities from the navigator
pub fn detect_capabilities() -> Capabilities {
    let Some(window) = web_sys::window() else {
        return Capabilities::default();
    };
    let navigator = window.navigator();
    let user_agent = navigator.user_agent().unwrap_or_default();
    let touch_points = u32::try_from(navigator.max_touch_points()).unwrap_or(0);
    Capabilities::from_user_agent(&user_agent, touch_points)
}
