//! JavaScript bindings.
//!
//! The browser side of the bridge: the injected wallet adapter, the live
//! document, `CustomEvent` publishing and the exported `WasmWalletBridge`.

mod bridge;
mod dom;
mod events;
mod provider;

pub use bridge::{bridge_preset, WasmWalletBridge, MOUNT_GLOBAL, SIGNER_GLOBAL};
pub use dom::{DomMountHost, CONNECT_BUTTON_CLASS};
pub use events::{event_detail, DomEventSink};
pub use provider::{JsWalletAdapter, JsWalletProvider, KEY_CHANGE_EVENT};

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    crate::logging::init_console_logging();
}
