//! WebAssembly bindings for the Keccak challenge miner.
//!
//! This crate provides JavaScript-accessible APIs for:
//! - Starting and stopping a nonce search from a Web Worker
//! - Mining one cooperative batch per event loop turn
//! - Re-verifying a found nonce before it is submitted

use wasm_bindgen::prelude::*;

pub mod miner;
pub mod state;

// Re-export main types for JS access
pub use miner::Miner;

/// Initialize the WASM module with better panic messages.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Log to the browser console.
#[wasm_bindgen]
pub fn console_log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}
