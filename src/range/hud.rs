//! Text fields and button states shown around the canvas.

use web_sys::Document;

use super::GameState;

pub const FASTEST_UNSET: &str = "--";

pub const SCORE_ID: &str = "score";
pub const TIMER_ID: &str = "timer";
pub const HIGHEST_ID: &str = "highestScore";
pub const FASTEST_ID: &str = "fastestTime";
pub const START_ID: &str = "startButton";
pub const RESET_ID: &str = "resetButton";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HudText {
    pub score: String,
    /// Seconds, two decimals.
    pub timer: String,
    pub highest: String,
    /// `S.SSs`, or [`FASTEST_UNSET`] before the first checkpoint.
    pub fastest: String,
}

impl HudText {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            score: state.score.current.to_string(),
            timer: format!("{:.2}", state.timer.elapsed),
            highest: state.score.highest.to_string(),
            fastest: state
                .timer
                .fastest()
                .map(|t| format!("{t:.2}s"))
                .unwrap_or_else(|| FASTEST_UNSET.to_string()),
        }
    }

    pub fn write(&self, doc: &Document) {
        for (id, text) in [
            (SCORE_ID, &self.score),
            (TIMER_ID, &self.timer),
            (HIGHEST_ID, &self.highest),
            (FASTEST_ID, &self.fastest),
        ] {
            if let Some(el) = doc.get_element_by_id(id) {
                el.set_text_content(Some(text.as_str()));
            }
        }
    }
}

/// Start is usable only while stopped, Reset only while running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub reset_enabled: bool,
}

impl Controls {
    pub fn for_state(state: &GameState) -> Self {
        let running = state.is_running();
        Self {
            start_enabled: !running,
            reset_enabled: running,
        }
    }

    pub fn write(&self, doc: &Document) {
        use wasm_bindgen::JsCast;
        for (id, enabled) in [(START_ID, self.start_enabled), (RESET_ID, self.reset_enabled)] {
            if let Some(btn) = doc
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<web_sys::HtmlButtonElement>().ok())
            {
                btn.set_disabled(!enabled);
            }
        }
    }
}
