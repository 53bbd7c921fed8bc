//! Browser glue: canvas and HUD lookup, keyboard/button listeners and the
//! requestAnimationFrame loop driving [`GameState::frame`].

use rand::rngs::ThreadRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, window};

use crate::range::hud::{FASTEST_ID, HIGHEST_ID, RESET_ID, SCORE_ID, START_ID, TIMER_ID};
use crate::range::{Command, Controls, GameState, HudText, RangeConfig};

const CANVAS_ID: &str = "gameCanvas";

struct Session {
    state: GameState,
    ctx: CanvasRenderingContext2d,
    doc: Document,
    rng: ThreadRng,
    frame: FrameGate,
}

/// Tracks whether a requestAnimationFrame callback is queued and has not run
/// yet, so a stop/start inside one frame never spins up a second loop.
#[derive(Debug, Default)]
struct FrameGate {
    pending: bool,
}

impl FrameGate {
    /// True when the caller must queue a frame; false when one is already queued.
    fn claim(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    /// The queued frame ran, or queuing it failed.
    fn release(&mut self) {
        self.pending = false;
    }
}

thread_local! {
    static SESSION: std::cell::RefCell<Option<Session>> = std::cell::RefCell::new(None);
    static FRAME: std::cell::RefCell<Option<Closure<dyn FnMut(f64)>>> = std::cell::RefCell::new(None);
}

fn with_session<R>(f: impl FnOnce(&mut Session) -> R) -> Option<R> {
    SESSION.with(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Wire the range into the page. Calling it again once wired is a no-op.
pub fn boot(mut cfg: RangeConfig) -> Result<(), JsValue> {
    if SESSION.with(|cell| cell.borrow().is_some()) {
        return Ok(());
    }
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;

    // An existing canvas decides the playfield size.
    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
        let c: HtmlCanvasElement = el.dyn_into()?;
        cfg.canvas_width = c.width() as f64;
        cfg.canvas_height = c.height() as f64;
        c
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id(CANVAS_ID);
        c.set_width(cfg.canvas_width as u32);
        c.set_height(cfg.canvas_height as u32);
        c.set_attribute("style", "display:block; margin:12px auto; border:2px solid #222; background:#f4f1e8;").ok();
        body.append_child(&c)?;
        c
    };
    let state = GameState::new(cfg).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    ctx.set_line_width(2.0);

    ensure_hud(&doc, &body)?;
    ensure_button(&doc, &body, START_ID, "Start")?;
    ensure_button(&doc, &body, RESET_ID, "Reset")?;

    log::info!(
        "range ready: {}x{} canvas",
        state.cfg.canvas_width,
        state.cfg.canvas_height
    );
    HudText::from_state(&state).write(&doc);
    Controls::for_state(&state).write(&doc);
    SESSION.with(|cell| {
        *cell.borrow_mut() = Some(Session {
            state,
            ctx,
            doc: doc.clone(),
            rng: rand::thread_rng(),
            frame: FrameGate::default(),
        });
    });

    install_frame_loop();

    // Keyboard: unbound keys and keys pressed while stopped go nowhere.
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            if let Some(cmd) = Command::from_key(&evt.key()) {
                with_session(|s| s.state.handle(cmd));
            }
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    listen_click(&doc, START_ID, start_round)?;
    listen_click(&doc, RESET_ID, reset_round)?;
    Ok(())
}

pub fn start_round() -> Result<(), JsValue> {
    let now = crate::performance_now();
    let started = with_session(|s| {
        let started = s.state.start(now);
        Controls::for_state(&s.state).write(&s.doc);
        started
    })
    .ok_or_else(|| JsValue::from_str("range not booted"))?;
    if started {
        schedule_frame()?;
    }
    Ok(())
}

pub fn reset_round() -> Result<(), JsValue> {
    let now = crate::performance_now();
    with_session(|s| {
        s.state.reset(now);
        HudText::from_state(&s.state).write(&s.doc);
        Controls::for_state(&s.state).write(&s.doc);
    })
    .ok_or_else(|| JsValue::from_str("range not booted"))
}

fn listen_click(doc: &Document, id: &str, action: fn() -> Result<(), JsValue>) -> Result<(), JsValue> {
    let el = doc
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str("missing control"))?;
    let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
        if let Err(e) = action() {
            log::warn!("control failed: {e:?}");
        }
    }) as Box<dyn FnMut(_)>);
    el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// --- Frame loop ---------------------------------------------------------------

fn install_frame_loop() {
    let closure = Closure::wrap(Box::new(move |_ts: f64| {
        // performance.now() rather than the rAF stamp: start() records the
        // same clock, so the first delta is never negative.
        let now = crate::performance_now();
        let keep_going = with_session(|s| {
            s.frame.release();
            let report = s.state.frame(now, &mut s.rng, &mut s.ctx);
            if report.ran {
                HudText::from_state(&s.state).write(&s.doc);
            }
            s.state.is_running()
        })
        .unwrap_or(false);
        if keep_going {
            if let Err(e) = schedule_frame() {
                log::warn!("frame not scheduled: {e:?}");
            }
        }
    }) as Box<dyn FnMut(f64)>);
    FRAME.with(|f| *f.borrow_mut() = Some(closure));
}

/// Queue the next frame unless one is already queued.
fn schedule_frame() -> Result<(), JsValue> {
    let claimed = with_session(|s| s.frame.claim()).unwrap_or(false);
    if !claimed {
        return Ok(());
    }
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let queued = FRAME.with(|f| match f.borrow().as_ref() {
        Some(cb) => win.request_animation_frame(cb.as_ref().unchecked_ref()).map(|_| ()),
        None => Err(JsValue::from_str("frame loop not installed")),
    });
    if queued.is_err() {
        with_session(|s| s.frame.release());
    }
    queued
}

// --- DOM scaffolding ------------------------------------------------------------

fn ensure_hud(doc: &Document, body: &HtmlElement) -> Result<(), JsValue> {
    let fields = [
        (SCORE_ID, "Score"),
        (TIMER_ID, "Time"),
        (HIGHEST_ID, "Highest Score"),
        (FASTEST_ID, "Fastest Time"),
    ];
    for (id, label) in fields {
        if doc.get_element_by_id(id).is_some() {
            continue;
        }
        let div = doc.create_element("div")?;
        div.set_inner_html(&format!("{label}: <span id='{id}'></span>"));
        div.set_attribute("style", "font-family:'Fira Code', monospace; font-size:15px; text-align:center; margin:2px;").ok();
        body.append_child(&div)?;
    }
    Ok(())
}

fn ensure_button(doc: &Document, body: &HtmlElement, id: &str, label: &str) -> Result<(), JsValue> {
    if doc.get_element_by_id(id).is_some() {
        return Ok(());
    }
    let btn = doc.create_element("button")?;
    btn.set_id(id);
    btn.set_text_content(Some(label));
    btn.set_attribute("style", "margin:4px; padding:4px 14px; font-size:15px;").ok();
    body.append_child(&btn)?;
    Ok(())
}
