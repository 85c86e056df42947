//! The drawing pad controller.
//!
//! `Driftpad` wires the pieces together:
//!
//! ```text
//! RawPointerEvent → InputSampler → WidthEstimator → brush | eraser → CanvasSurface
//!                                                    FadeTimer ──────┘
//! ```
//!
//! It owns every component outright; nothing else holds the raster. Hosts
//! feed it events, call [`Driftpad::poll`] periodically, and read pixels
//! back with [`Driftpad::snapshot`].

use crate::input::{InputSampler, RawPointerEvent, StrokeEvent, SurfaceGeometry};
use crate::scheduler::Debouncer;
use crate::telemetry::{NoopTelemetry, TelemetrySink};
use crate::tools::ToolBelt;
use dp_core::clock::Clock;
use dp_core::config::DriftpadConfig;
use dp_core::model::{Sample, SizePreset, ToolKind};
use dp_core::storage::KeyValueStore;
use dp_core::width::WidthEstimator;
use dp_render::canvas::CanvasSurface;
use dp_render::eraser::Eraser;
use dp_render::fade_timer::{FadeTimer, TickOutcome};
use dp_render::surface::{PixelBuffer, RasterContext, SurfaceError};
use dp_render::brush::WatercolorBrush;
use std::rc::Rc;

/// Sub-pixel nudge that turns a tap into a visible dot.
const TAP_EPSILON: f32 = 0.01;

/// What a call to [`Driftpad::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PollOutcome {
    pub resized: bool,
    pub fade: Option<TickOutcome>,
}

pub struct Driftpad<C: RasterContext> {
    surface: CanvasSurface<C>,
    sampler: InputSampler,
    estimator: WidthEstimator,
    brush: WatercolorBrush,
    eraser: Eraser,
    fade: FadeTimer,
    tools: ToolBelt,
    resize: Debouncer<(f32, f32, f32)>,
    clock: Rc<dyn Clock>,
    telemetry: Box<dyn TelemetrySink>,
    stroke_started_ms: f64,
    stroke_count: u32,
    last_point: Option<(f32, f32)>,
}

impl<C: RasterContext> Driftpad<C> {
    /// Build a pad on `ctx`. A context that cannot be sized, or a config that
    /// fails validation, is fatal and nothing is wired up.
    pub fn new(
        ctx: C,
        css_width: f32,
        css_height: f32,
        dpr: f32,
        config: DriftpadConfig,
        clock: Rc<dyn Clock>,
        store: Rc<dyn KeyValueStore>,
    ) -> Result<Self, SurfaceError> {
        config.validate().map_err(SurfaceError::InvalidConfig)?;
        let surface = CanvasSurface::new(ctx, css_width, css_height, dpr)?;
        let tools = ToolBelt::default();
        let fade = FadeTimer::new(config.fade.clone(), clock.clone(), store);
        let mut brush = WatercolorBrush::new(config.brush.clone(), clock.clone());
        brush.set_fade_source(fade.opacity_handle());

        log::info!(
            "driftpad ready: {css_width}x{css_height} @{dpr}, fade {}",
            if fade.is_active() { fade.stage().name } else { "idle" }
        );

        Ok(Self {
            surface,
            sampler: InputSampler::new(SurfaceGeometry::at(0.0, 0.0, css_width, css_height)),
            estimator: WidthEstimator::new(tools.width()),
            brush,
            eraser: Eraser::new(),
            fade,
            tools,
            resize: Debouncer::new(config.surface.resize_debounce_ms),
            clock,
            telemetry: Box::new(NoopTelemetry),
            stroke_started_ms: 0.0,
            stroke_count: 0,
            last_point: None,
        })
    }

    pub fn with_telemetry(mut self, telemetry: Box<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Make brush jitter reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.brush.reseed(seed);
        self
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn surface(&self) -> &CanvasSurface<C> {
        &self.surface
    }

    pub fn brush(&self) -> &WatercolorBrush {
        &self.brush
    }

    pub fn fade(&self) -> &FadeTimer {
        &self.fade
    }

    pub fn sampler(&self) -> &InputSampler {
        &self.sampler
    }

    pub fn tools(&self) -> ToolBelt {
        self.tools
    }

    pub fn current_width(&self) -> f32 {
        self.estimator.current_width()
    }

    pub fn stroke_count(&self) -> u32 {
        self.stroke_count
    }

    pub fn set_geometry(&mut self, geometry: SurfaceGeometry) {
        self.sampler.set_geometry(geometry);
    }

    /// Raw pixels for export.
    pub fn snapshot(&self) -> PixelBuffer {
        self.surface.snapshot()
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one raw event through the sampler and draw its effect.
    pub fn handle_event(&mut self, event: &RawPointerEvent) -> Option<StrokeEvent> {
        let stroke = self.sampler.handle(event)?;
        self.apply(stroke);
        Some(stroke)
    }

    /// End any active stroke (window-level pointer-up, blur).
    pub fn cancel_stroke(&mut self) {
        if let Some(stroke) = self.sampler.end() {
            self.apply(stroke);
        }
    }

    fn apply(&mut self, stroke: StrokeEvent) {
        match stroke {
            StrokeEvent::Start(sample) => {
                self.begin_stroke(&sample);
                self.continue_stroke(&sample.offset(TAP_EPSILON, TAP_EPSILON));
            }
            StrokeEvent::Continue(sample) => self.continue_stroke(&sample),
            StrokeEvent::End => self.end_stroke(),
        }
    }

    fn begin_stroke(&mut self, sample: &Sample) {
        let width = self.estimator.begin(sample);
        self.stroke_started_ms = self.clock.now_ms();
        let ctx = self.surface.context_mut();
        match self.tools.tool() {
            ToolKind::Brush => self.brush.start_stroke(ctx, sample.x, sample.y, sample.pressure),
            ToolKind::Eraser => self.eraser.start(ctx, sample.x, sample.y, width),
        }
        self.last_point = Some((sample.x, sample.y));
    }

    fn continue_stroke(&mut self, sample: &Sample) {
        let Some(last) = self.last_point else {
            return;
        };
        let width = self.estimator.advance(sample);
        let ctx = self.surface.context_mut();
        match self.tools.tool() {
            ToolKind::Brush => {
                self.brush.continue_stroke(ctx, sample.x, sample.y, sample.pressure)
            }
            ToolKind::Eraser => self.eraser.erase_segment(ctx, last, (sample.x, sample.y), width),
        }
        self.last_point = Some((sample.x, sample.y));
    }

    fn end_stroke(&mut self) {
        if self.last_point.take().is_none() {
            return;
        }
        self.brush.end_stroke();
        self.estimator.end();
        self.stroke_count += 1;
        let duration = self.clock.now_ms() - self.stroke_started_ms;
        self.telemetry.stroke_completed(duration, self.stroke_count);

        if !self.fade.is_active() {
            self.fade.start();
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Wipe the drawing: wet buffer, fade timer and raster. A pending resize
    /// is applied at once, as there is no content left to preserve.
    pub fn clear(&mut self) {
        self.brush.clear();
        self.fade.stop();
        self.surface.clear();
        if let Some((w, h, dpr)) = self.resize.flush() {
            self.apply_resize(w, h, dpr);
        }
        self.stroke_count = 0;
        self.telemetry.cleared();
    }

    /// A new prompt or mode begins; the previous drawing goes away.
    pub fn begin_prompt(&mut self) {
        log::debug!("new prompt, clearing pad");
        self.clear();
    }

    /// Queue a resize; it is applied by [`Driftpad::poll`] once resize
    /// requests have been quiet for the debounce period.
    pub fn request_resize(&mut self, css_width: f32, css_height: f32, dpr: f32) {
        self.resize.push(self.clock.now_ms(), (css_width, css_height, dpr));
    }

    /// Apply a due resize, then a due fade tick.
    pub fn poll(&mut self) -> PollOutcome {
        let now = self.clock.now_ms();
        let mut outcome = PollOutcome::default();

        if let Some((w, h, dpr)) = self.resize.poll(now) {
            outcome.resized = self.apply_resize(w, h, dpr);
        }
        outcome.fade = self.fade.poll(self.surface.context_mut());
        outcome
    }

    /// Earliest time at which [`Driftpad::poll`] has work to do, for hosts
    /// that schedule a one-shot timer instead of polling on an interval.
    pub fn next_due_ms(&self) -> Option<f64> {
        match (self.resize.due_at(), self.fade.next_tick_ms()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn apply_resize(&mut self, w: f32, h: f32, dpr: f32) -> bool {
        match self.surface.resize(w, h, dpr) {
            Ok(resized) => resized,
            Err(e) => {
                log::warn!("resize to {w}x{h} @{dpr} failed: {e}");
                false
            }
        }
    }

    pub fn set_color(&mut self, index: usize) -> bool {
        self.brush.set_color(index)
    }

    pub fn set_size_preset(&mut self, preset: SizePreset) {
        self.tools.set_preset(preset);
        self.sync_widths();
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.tools.set_tool(tool) {
            self.sync_widths();
            self.telemetry.tool_changed(tool);
        }
    }

    pub fn toggle_tool(&mut self) -> ToolKind {
        let tool = self.tools.toggle();
        self.sync_widths();
        self.telemetry.tool_changed(tool);
        tool
    }

    fn sync_widths(&mut self) {
        self.estimator.set_max_width(self.tools.width());
        self.brush.set_size(self.tools.brush_width());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{PointerKind, PointerSource};
    use dp_core::clock::ManualClock;
    use dp_core::storage::MemoryStore;
    use dp_render::surface::PixmapContext;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recording(RefCell<Vec<String>>);

    impl TelemetrySink for Rc<Recording> {
        fn stroke_completed(&self, duration_ms: f64, stroke_count: u32) {
            self.0.borrow_mut().push(format!("stroke {stroke_count} {duration_ms}"));
        }
        fn tool_changed(&self, tool: ToolKind) {
            self.0.borrow_mut().push(format!("tool {}", tool.name()));
        }
        fn cleared(&self) {
            self.0.borrow_mut().push("cleared".to_string());
        }
    }

    fn pad() -> (Driftpad<PixmapContext>, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new(1_000.0));
        let store = Rc::new(MemoryStore::new());
        let pad = Driftpad::new(
            PixmapContext::new(1, 1).unwrap(),
            100.0,
            60.0,
            1.0,
            DriftpadConfig::default(),
            clock.clone(),
            store,
        )
        .unwrap()
        .with_seed(1);
        (pad, clock)
    }

    fn ev(kind: PointerKind, x: f32, y: f32) -> RawPointerEvent {
        RawPointerEvent {
            source: PointerSource::Pointer,
            kind,
            client_x: x,
            client_y: y,
            pressure: Some(0.8),
            time_stamp: 0.0,
        }
    }

    #[test]
    fn tap_leaves_a_dot_and_starts_fade() {
        let (mut pad, _) = pad();
        pad.handle_event(&ev(PointerKind::Down, 50.0, 30.0));
        pad.handle_event(&ev(PointerKind::Up, 50.0, 30.0));
        assert!(pad.snapshot().get(50, 30).unwrap()[3] > 0);
        assert!(pad.fade().is_active());
        assert_eq!(pad.stroke_count(), 1);
    }

    #[test]
    fn fade_is_not_restarted_by_later_strokes() {
        let (mut pad, clock) = pad();
        pad.handle_event(&ev(PointerKind::Down, 10.0, 10.0));
        pad.handle_event(&ev(PointerKind::Up, 10.0, 10.0));
        let start = pad.fade().state().start_time_ms;
        clock.advance(5_000.0);
        pad.handle_event(&ev(PointerKind::Down, 20.0, 10.0));
        pad.handle_event(&ev(PointerKind::Up, 20.0, 10.0));
        assert_eq!(pad.fade().state().start_time_ms, start);
    }

    #[test]
    fn clear_wipes_everything() {
        let (mut pad, _) = pad();
        let log = Rc::new(Recording::default());
        let mut pad = pad.with_telemetry(Box::new(log.clone()));
        pad.handle_event(&ev(PointerKind::Down, 10.0, 10.0));
        pad.handle_event(&ev(PointerKind::Move, 40.0, 10.0));
        pad.handle_event(&ev(PointerKind::Up, 40.0, 10.0));
        pad.clear();
        assert!(pad.snapshot().is_blank());
        assert!(!pad.fade().is_active());
        assert!(!pad.brush().has_user_strokes());
        assert_eq!(
            *log.0.borrow(),
            vec!["stroke 1 0".to_string(), "cleared".to_string()]
        );
    }

    #[test]
    fn eraser_removes_ink() {
        let (mut pad, _) = pad();
        pad.handle_event(&ev(PointerKind::Down, 10.0, 30.0));
        pad.handle_event(&ev(PointerKind::Move, 90.0, 30.0));
        pad.handle_event(&ev(PointerKind::Up, 90.0, 30.0));
        assert!(pad.snapshot().get(50, 30).unwrap()[3] > 0);

        assert_eq!(pad.toggle_tool(), ToolKind::Eraser);
        pad.set_size_preset(SizePreset::XL);
        pad.handle_event(&ev(PointerKind::Down, 5.0, 30.0));
        pad.handle_event(&ev(PointerKind::Move, 95.0, 30.0));
        pad.handle_event(&ev(PointerKind::Up, 95.0, 30.0));
        assert_eq!(pad.snapshot().get(50, 30).unwrap()[3], 0);
    }

    #[test]
    fn resize_is_debounced() {
        let (mut pad, clock) = pad();
        pad.request_resize(120.0, 60.0, 1.0);
        clock.advance(100.0);
        pad.request_resize(200.0, 80.0, 1.0);
        clock.advance(100.0);
        assert!(!pad.poll().resized);
        assert_eq!(pad.surface().pixel_size(), (100, 60));
        clock.advance(50.0);
        assert!(pad.poll().resized);
        assert_eq!(pad.surface().pixel_size(), (200, 80));
    }

    #[test]
    fn clear_applies_a_pending_resize() {
        let (mut pad, _) = pad();
        pad.request_resize(150.0, 90.0, 1.0);
        assert_eq!(pad.next_due_ms(), Some(1_150.0));
        pad.clear();
        assert_eq!(pad.surface().pixel_size(), (150, 90));
        assert_eq!(pad.next_due_ms(), None);
    }

    #[test]
    fn next_due_tracks_resize_and_fade() {
        let (mut pad, clock) = pad();
        assert_eq!(pad.next_due_ms(), None);
        pad.handle_event(&ev(PointerKind::Down, 10.0, 10.0));
        pad.handle_event(&ev(PointerKind::Up, 10.0, 10.0));
        assert_eq!(pad.next_due_ms(), Some(1_500.0));
        clock.advance(400.0);
        pad.request_resize(120.0, 60.0, 1.0);
        assert_eq!(pad.next_due_ms(), Some(1_500.0));
        pad.request_resize(130.0, 60.0, 2.0);
        clock.advance(100.0);
        pad.poll();
        assert_eq!(pad.next_due_ms(), Some(1_550.0));
    }

    #[test]
    fn invalid_config_is_rejected_before_wiring() {
        let mut config = DriftpadConfig::default();
        config.brush.min_size = 50.0;
        let result = Driftpad::new(
            PixmapContext::new(1, 1).unwrap(),
            10.0,
            10.0,
            1.0,
            config,
            Rc::new(ManualClock::new(0.0)),
            Rc::new(MemoryStore::new()),
        );
        assert!(matches!(result, Err(SurfaceError::InvalidConfig(_))));
    }

    #[test]
    fn size_presets_drive_brush_and_estimator() {
        let (mut pad, _) = pad();
        assert_eq!(pad.brush().size(), 10.0);
        pad.set_size_preset(SizePreset::L);
        assert_eq!(pad.brush().size(), 12.0);
        pad.set_tool(ToolKind::Eraser);
        assert_eq!(pad.tools().width(), 24.0);
        assert_eq!(pad.brush().size(), 12.0);
    }
}
