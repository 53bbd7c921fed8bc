//! Archery Range core crate.
//!
//! The archer stands at the left edge, loads the bow, adjusts the aim and looses
//! arrows that fly under gravity at a red target. Each hit moves and resizes the
//! target; every fifth hit records the round time. The engine lives in
//! [`range`] and is browser-free; the `web` module wires it to a canvas page.

use wasm_bindgen::prelude::*;

pub mod range;
mod web;

pub use range::{Command, GameState, RangeConfig};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

// -----------------------------------------------------------------------------
// Entrypoints
// -----------------------------------------------------------------------------

/// Build the canvas, HUD and controls with the default layout. The range stays
/// stopped until Start is pressed (or `start_round` is called).
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    web::boot(RangeConfig::default())
}

/// Like `start_game`, with a JSON object overriding any `RangeConfig` field.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_game_with_config(json: &str) -> Result<(), JsValue> {
    let cfg = RangeConfig::from_json(json).map_err(|e| {
        log::warn!("config rejected: {e}");
        JsValue::from_str(&e.to_string())
    })?;
    web::boot(cfg)
}

#[wasm_bindgen]
pub fn start_round() -> Result<(), JsValue> {
    web::start_round()
}

#[wasm_bindgen]
pub fn reset_round() -> Result<(), JsValue> {
    web::reset_round()
}

/// Milliseconds from the page's high resolution clock; 0 off-browser.
pub(crate) fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}
