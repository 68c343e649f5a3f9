//! WASM bindings for quran-playback
//!
//! Browser implementations of the platform traits (HTML audio element,
//! `localStorage`, JS-provided media session and wake lock) and a
//! `wasm_bindgen` player the page drives from a timer.

pub mod backend;
pub mod player;
pub mod storage;
pub mod surface;

pub use backend::HtmlAudioBackend;
pub use player::WasmQuranPlayer;
pub use storage::LocalStorage;
pub use surface::{BrowserNetwork, JsMediaSurface, JsWakeLock};
