//! HTML audio element backend
//!
//! One `<audio>` element per resource. The element streams through HTTP range
//! requests on its own; `preload` decides how much is fetched up front.
//! Native events are queued by listeners and drained by `poll()`.

use super::storage::describe;
use crate::engine::{BackendEvent, MediaBackend};
use crate::error::PlayErrorKind;
use crate::types::PreloadStrategy;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlAudioElement, MediaError};

type Queue = Rc<RefCell<Vec<BackendEvent>>>;
type Listener = Closure<dyn FnMut(Event)>;

/// A live `<audio>` element and the listeners feeding its queue
struct AudioResource {
    element: HtmlAudioElement,
    queue: Queue,
    listeners: Vec<(&'static str, Listener)>,
    on_play_rejected: Closure<dyn FnMut(JsValue)>,
}

impl AudioResource {
    fn open(url: &str, preload: PreloadStrategy) -> Result<Self, JsValue> {
        let element = HtmlAudioElement::new()?;
        element.set_preload(preload.as_str());

        let queue: Queue = Rc::new(RefCell::new(Vec::new()));
        let listeners = vec![
            ("loadedmetadata", {
                let (queue, element) = (queue.clone(), element.clone());
                listener(move || {
                    queue.borrow_mut().push(BackendEvent::Ready {
                        duration: element.duration(),
                    });
                })
            }),
            ("playing", push_on(&queue, BackendEvent::Started)),
            ("pause", push_on(&queue, BackendEvent::Paused)),
            ("ended", push_on(&queue, BackendEvent::Ended)),
            ("error", {
                let (queue, element) = (queue.clone(), element.clone());
                listener(move || {
                    let cause = element
                        .error()
                        .map_or_else(|| "unknown media error".to_string(), media_error_cause);
                    queue.borrow_mut().push(BackendEvent::LoadFailed(cause));
                })
            }),
        ];

        for (name, callback) in &listeners {
            element.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())?;
        }

        let on_play_rejected = {
            let queue = queue.clone();
            Closure::wrap(Box::new(move |err: JsValue| {
                let name = js_sys::Reflect::get(&err, &JsValue::from_str("name"))
                    .ok()
                    .and_then(|n| n.as_string())
                    .unwrap_or_default();
                let kind = match name.as_str() {
                    "NotAllowedError" => PlayErrorKind::AutoplayBlocked,
                    "NotSupportedError" => PlayErrorKind::Decode,
                    // Interrupted by pause() or a new load
                    "AbortError" => return,
                    _ => PlayErrorKind::Other,
                };
                queue.borrow_mut().push(BackendEvent::PlayFailed {
                    kind,
                    cause: describe(&err),
                });
            }) as Box<dyn FnMut(JsValue)>)
        };

        element.set_src(url);

        Ok(Self {
            element,
            queue,
            listeners,
            on_play_rejected,
        })
    }

    fn close(&self) {
        if let Err(e) = self.element.pause() {
            debug!(error = %describe(&e), "Pause on close failed");
        }
        for (name, callback) in &self.listeners {
            if let Err(e) = self
                .element
                .remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref())
            {
                debug!(event = name, error = %describe(&e), "Failed to remove listener");
            }
        }

        // Abort the network fetch
        if let Err(e) = self.element.remove_attribute("src") {
            debug!(error = %describe(&e), "Failed to clear src");
        }
        self.element.load();
        self.queue.borrow_mut().clear();
    }
}

fn listener(mut f: impl FnMut() + 'static) -> Listener {
    Closure::wrap(Box::new(move |_event: Event| f()) as Box<dyn FnMut(Event)>)
}

fn push_on(queue: &Queue, event: BackendEvent) -> Listener {
    let queue = queue.clone();
    listener(move || queue.borrow_mut().push(event.clone()))
}

fn media_error_cause(error: MediaError) -> String {
    let reason = match error.code() {
        MediaError::MEDIA_ERR_ABORTED => "aborted",
        MediaError::MEDIA_ERR_NETWORK => "network error",
        MediaError::MEDIA_ERR_DECODE => "decode error",
        MediaError::MEDIA_ERR_SRC_NOT_SUPPORTED => "source not supported",
        _ => "unknown",
    };
    format!("media error {} ({})", error.code(), reason)
}

/// [`MediaBackend`] on top of `HTMLAudioElement`
#[derive(Default)]
pub struct HtmlAudioBackend {
    current: Option<AudioResource>,

    // Kept one load longer so a late play() rejection still has a live callback
    retired: Option<AudioResource>,

    failures: Vec<BackendEvent>,
}

impl HtmlAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaBackend for HtmlAudioBackend {
    fn open(&mut self, url: &str, preload: PreloadStrategy) {
        match AudioResource::open(url, preload) {
            Ok(resource) => self.current = Some(resource),
            Err(e) => {
                warn!(url = %url, error = %describe(&e), "Failed to create audio element");
                self.failures.push(BackendEvent::LoadFailed(describe(&e)));
            }
        }
    }

    fn close(&mut self) {
        if let Some(resource) = self.current.take() {
            resource.close();
            self.retired = Some(resource);
        }
        self.failures.clear();
    }

    fn play(&mut self) {
        let Some(resource) = &self.current else {
            return;
        };
        match resource.element.play() {
            Ok(promise) => {
                let _ = promise.catch(&resource.on_play_rejected);
            }
            Err(e) => self.failures.push(BackendEvent::PlayFailed {
                kind: PlayErrorKind::Other,
                cause: describe(&e),
            }),
        }
    }

    fn pause(&mut self) {
        if let Some(resource) = &self.current {
            if let Err(e) = resource.element.pause() {
                debug!(error = %describe(&e), "Pause failed");
            }
        }
    }

    fn seek(&mut self, seconds: f64) {
        if let Some(resource) = &self.current {
            resource.element.set_current_time(seconds);
        }
    }

    fn set_volume(&mut self, gain: f64) {
        if let Some(resource) = &self.current {
            resource.element.set_volume(gain);
        }
    }

    fn set_muted(&mut self, muted: bool) {
        if let Some(resource) = &self.current {
            resource.element.set_muted(muted);
        }
    }

    fn set_rate(&mut self, rate: f64) {
        if let Some(resource) = &self.current {
            resource.element.set_playback_rate(rate);
        }
    }

    fn current_time(&self) -> Option<f64> {
        self.current.as_ref().map(|r| r.element.current_time())
    }

    fn poll(&mut self) -> Vec<BackendEvent> {
        let mut events = std::mem::take(&mut self.failures);
        if let Some(resource) = &self.current {
            events.append(&mut resource.queue.borrow_mut());
        }
        events
    }
}
