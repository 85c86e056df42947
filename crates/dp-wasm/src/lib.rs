//! WASM bridge for Driftpad — exposes the drawing pad to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The page forwards DOM
//! pointer/mouse/touch events to [`DriftpadCanvas::pointer`] and calls
//! [`DriftpadCanvas::poll`] from a `setInterval`; everything else is toolbar
//! plumbing.

mod context2d;
mod web;

use context2d::WebContext;
use dp_core::clock::Clock;
use dp_core::config::DriftpadConfig;
use dp_core::model::{SizePreset, ToolKind};
use dp_core::storage::{KeyValueStore, MemoryStore};
use dp_core::streak::{StreakStats, StreakTracker};
use dp_editor::input::{
    ClientRect, PointerKind, PointerSource, RawPointerEvent, SurfaceGeometry,
};
use dp_editor::pad::Driftpad;
use dp_editor::telemetry::LogTelemetry;
use dp_render::fade_timer::FadeTimer;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

/// The WASM-facing drawing pad.
#[wasm_bindgen]
pub struct DriftpadCanvas {
    pad: Driftpad<WebContext>,
    streak: StreakTracker,
}

#[wasm_bindgen]
impl DriftpadCanvas {
    /// Wire a pad onto `canvas`. `config_json` may be empty or a partial
    /// override. Fails only when the canvas has no 2d context or the config
    /// is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        css_width: f32,
        css_height: f32,
        dpr: f32,
        config_json: &str,
    ) -> Result<DriftpadCanvas, JsValue> {
        web::init(log::LevelFilter::Warn);

        let config = DriftpadConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e))?;
        let ctx = WebContext::new(canvas).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let store: Rc<dyn KeyValueStore> = match web::LocalStorageStore::open() {
            Some(store) => Rc::new(store),
            None => {
                log::warn!("localStorage unavailable; fade and streak will not persist");
                Rc::new(MemoryStore::new())
            }
        };
        let clock: Rc<dyn Clock> = Rc::new(web::DateClock);

        let pad = Driftpad::new(ctx, css_width, css_height, dpr, config, clock.clone(), store.clone())
            .map_err(|e| JsValue::from_str(&e.to_string()))?
            .with_telemetry(Box::new(LogTelemetry));
        let streak = StreakTracker::load(clock, store);

        Ok(Self { pad, streak })
    }

    /// Set console verbosity (`"error"` … `"trace"`).
    pub fn set_log_level(&self, level: &str) {
        web::init(web::parse_level(level));
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Forward a DOM event. `kind` is the event-name suffix (`down`, `move`,
    /// `up`, `cancel`, `leave`, `start`, `end`), `source` is `pointer`,
    /// `mouse` or `touch`. Returns `true` if the event affected the stroke,
    /// so the page knows to `preventDefault()`.
    pub fn pointer(
        &mut self,
        kind: &str,
        source: &str,
        client_x: f32,
        client_y: f32,
        pressure: Option<f32>,
        time_stamp: f64,
    ) -> bool {
        let Some(event) = raw_event(kind, source, client_x, client_y, pressure, time_stamp) else {
            log::debug!("unknown pointer event {source}/{kind}");
            return false;
        };
        self.pad.handle_event(&event).is_some()
    }

    /// Window-level pointer-up or blur: end any active stroke.
    pub fn cancel_stroke(&mut self) {
        self.pad.cancel_stroke();
    }

    /// Bounding client rects of the container and the canvas.
    #[allow(clippy::too_many_arguments)]
    pub fn set_geometry(
        &mut self,
        container_left: f32,
        container_top: f32,
        container_width: f32,
        container_height: f32,
        canvas_left: f32,
        canvas_top: f32,
        canvas_width: f32,
        canvas_height: f32,
    ) {
        self.pad.set_geometry(SurfaceGeometry {
            container: ClientRect {
                left: container_left,
                top: container_top,
                width: container_width,
                height: container_height,
            },
            canvas: ClientRect {
                left: canvas_left,
                top: canvas_top,
                width: canvas_width,
                height: canvas_height,
            },
        });
    }

    // ─── Scheduling ──────────────────────────────────────────────────────

    /// Run due work (debounced resize, fade tick). Returns `true` if the
    /// raster changed.
    pub fn poll(&mut self) -> bool {
        let outcome = self.pad.poll();
        outcome.resized
            || matches!(outcome.fade, Some(dp_render::fade_timer::TickOutcome::Faded { .. }))
    }

    /// `Date.now()` value at which `poll` next has work, for hosts that
    /// prefer a one-shot `setTimeout` over a fixed interval.
    pub fn next_due_ms(&self) -> Option<f64> {
        self.pad.next_due_ms()
    }

    pub fn resize(&mut self, css_width: f32, css_height: f32, dpr: f32) {
        self.pad.request_resize(css_width, css_height, dpr);
    }

    // ─── Commands ────────────────────────────────────────────────────────

    pub fn clear(&mut self) {
        self.pad.clear();
    }

    pub fn begin_prompt(&mut self) {
        self.pad.begin_prompt();
    }

    pub fn has_user_strokes(&self) -> bool {
        self.pad.brush().has_user_strokes()
    }

    /// Select an ink tone by palette index.
    pub fn set_color(&mut self, index: usize) -> bool {
        self.pad.set_color(index)
    }

    /// Palette as a JSON array of `#RRGGBB` strings.
    pub fn palette(&self) -> String {
        let hex: Vec<String> = dp_core::model::INK_PALETTE.iter().map(|c| c.to_hex()).collect();
        serde_json::to_string(&hex).unwrap_or_else(|_| "[]".to_string())
    }

    /// `S`, `M`, `L` or `XL`.
    pub fn set_size(&mut self, label: &str) -> bool {
        match SizePreset::from_label(label) {
            Some(preset) => {
                self.pad.set_size_preset(preset);
                true
            }
            None => false,
        }
    }

    /// Switch brush ↔ eraser, returning the new tool name.
    pub fn toggle_tool(&mut self) -> String {
        self.pad.toggle_tool().name().to_string()
    }

    pub fn set_tool(&mut self, name: &str) -> bool {
        match ToolKind::from_name(name) {
            Some(tool) => {
                self.pad.set_tool(tool);
                true
            }
            None => false,
        }
    }

    pub fn tool(&self) -> String {
        self.pad.tools().tool().name().to_string()
    }

    pub fn cursor_size(&self) -> f32 {
        self.pad.tools().cursor_diameter()
    }

    // ─── Status ──────────────────────────────────────────────────────────

    /// Fade status for the countdown badge.
    pub fn fade_status(&self) -> String {
        fade_status_json(self.pad.fade())
    }

    /// Count today's visit; returns the milestone reached, if any.
    pub fn record_visit(&mut self) -> Option<u32> {
        self.streak.record_visit()
    }

    /// Zero the current streak (the user's "start over").
    pub fn reset_streak(&mut self) {
        self.streak.reset();
    }

    pub fn streak_json(&self) -> String {
        streak_json(self.streak.stats(), &self.streak.history(), &self.streak.milestones())
    }

    /// PNG data URL of the current drawing.
    pub fn to_data_url(&self) -> Result<String, JsValue> {
        self.pad.surface().context().canvas().to_data_url()
    }
}

// ─── Helpers (no browser needed) ─────────────────────────────────────────

fn raw_event(
    kind: &str,
    source: &str,
    client_x: f32,
    client_y: f32,
    pressure: Option<f32>,
    time_stamp: f64,
) -> Option<RawPointerEvent> {
    Some(RawPointerEvent {
        source: PointerSource::from_name(source)?,
        kind: PointerKind::from_name(kind)?,
        client_x,
        client_y,
        pressure,
        time_stamp,
    })
}

fn fade_status_json(fade: &FadeTimer) -> String {
    serde_json::json!({
        "active": fade.is_active(),
        "opacity": fade.published_opacity(),
        "progress": fade.progress(),
        "stage": fade.stage().name,
        "remainingMs": fade.remaining_ms(),
        "remaining": fade.remaining_formatted(),
    })
    .to_string()
}

fn streak_json(stats: &StreakStats, history: &[String], milestones: &[u32]) -> String {
    serde_json::json!({
        "stats": stats,
        "history": history,
        "milestones": milestones,
    })
    .to_string()
}
