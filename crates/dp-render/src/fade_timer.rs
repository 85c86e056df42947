//! Persistent fade timer.
//!
//! Two states: idle, and fading from a recorded wall-clock start. While
//! fading, every tick maps elapsed time through the staged curve in
//! [`dp_core::fade`] and re-composites the whole raster so the drawing ages
//! uniformly. The start time is persisted, so a reload resumes at the same
//! stage instead of flashing back to full opacity.

use crate::surface::{PixelBuffer, RasterContext};
use dp_core::clock::Clock;
use dp_core::config::FadeConfig;
use dp_core::fade::{self, FadeStage};
use dp_core::model::FadeTimerState;
use dp_core::storage::{FADE_TIMER_KEY, KeyValueStore, load_json, remove_key, save_json};
use std::cell::Cell;
use std::rc::Rc;

/// Un-faded alpha of every raster pixel, held in floating point so that
/// successive recomposites never compound 8-bit rounding.
struct BaseAlpha {
    width: u32,
    height: u32,
    /// Alpha written to the raster by the last recomposite. A pixel whose
    /// alpha differs at the next tick was painted or erased since.
    written: Vec<u8>,
    /// Alpha at full opacity, `0.0..=255.0`.
    alpha: Vec<f32>,
}

impl BaseAlpha {
    fn blank(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            written: vec![0; len],
            alpha: vec![0.0; len],
        }
    }

    fn fits(&self, pixels: &PixelBuffer) -> bool {
        self.width == pixels.width && self.height == pixels.height
    }

    /// Pick up changes made since the last recomposite, then rewrite every
    /// alpha in `pixels` as `base × opacity`.
    fn recomposite(&mut self, pixels: &mut PixelBuffer, applied: f32, opacity: f32) {
        for (i, px) in pixels.data.chunks_exact_mut(4).enumerate() {
            if px[3] != self.written[i] {
                self.alpha[i] = (px[3] as f32 / applied).min(255.0);
            }
            px[3] = (self.alpha[i] * opacity).round().clamp(0.0, 255.0) as u8;
            self.written[i] = px[3];
        }
    }
}

/// Read side of the timer's current opacity, shared with the brush so new
/// ink is drawn at the same age as the rest of the drawing.
#[derive(Debug, Clone)]
pub struct OpacityHandle(Rc<Cell<f32>>);

impl OpacityHandle {
    fn new(value: f32) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    pub fn get(&self) -> f32 {
        self.0.get()
    }

    fn set(&self, value: f32) {
        self.0.set(value);
    }
}

/// What a tick did to the raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Timer idle; nothing happened.
    Idle,
    /// Opacity computed but the raster already carries it.
    Unchanged { opacity: f32 },
    /// Raster re-composited at the new opacity.
    Faded { opacity: f32 },
}

pub struct FadeTimer {
    config: FadeConfig,
    clock: Rc<dyn Clock>,
    store: Rc<dyn KeyValueStore>,
    state: FadeTimerState,
    opacity: OpacityHandle,
    /// Opacity already baked into the raster's pixels.
    applied_opacity: f32,
    base: Option<BaseAlpha>,
    next_tick_ms: Option<f64>,
}

impl FadeTimer {
    /// Construct and restore any persisted fade.
    pub fn new(config: FadeConfig, clock: Rc<dyn Clock>, store: Rc<dyn KeyValueStore>) -> Self {
        let mut timer = Self {
            config,
            clock,
            store,
            state: FadeTimerState::idle(),
            opacity: OpacityHandle::new(1.0),
            applied_opacity: 1.0,
            base: None,
            next_tick_ms: None,
        };
        timer.restore();
        timer
    }

    fn restore(&mut self) {
        let Some(stored) = load_json::<FadeTimerState>(self.store.as_ref(), FADE_TIMER_KEY) else {
            return;
        };
        let Some(start) = stored.active_start() else {
            if stored.is_active {
                log::warn!("ignoring fade record without a start time");
                remove_key(self.store.as_ref(), FADE_TIMER_KEY);
            }
            return;
        };

        let now = self.clock.now_ms();
        self.state = FadeTimerState::fading(start);
        let opacity = self.current_opacity();
        // The raster starts empty after a reload, so there is nothing to
        // re-composite; new ink is drawn at `opacity` directly.
        self.opacity.set(opacity);
        self.applied_opacity = opacity;
        self.next_tick_ms = Some(self.next_tick_after(now));

        if now - start >= self.config.duration_ms {
            log::info!("restored fade already complete; holding at {}", self.stage().name);
        } else {
            log::debug!(
                "resumed fade at progress {:.3} ({})",
                self.progress(),
                self.stage().name
            );
        }
    }

    pub fn config(&self) -> &FadeConfig {
        &self.config
    }

    pub fn state(&self) -> FadeTimerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    /// Shared handle to the published opacity.
    pub fn opacity_handle(&self) -> OpacityHandle {
        self.opacity.clone()
    }

    /// Opacity last published by a tick, restore or start.
    pub fn published_opacity(&self) -> f32 {
        self.opacity.get()
    }

    /// Idle → Fading. Restarting an active timer resets its start.
    pub fn start(&mut self) {
        let now = self.clock.now_ms();
        self.state = FadeTimerState::fading(now);
        save_json(self.store.as_ref(), FADE_TIMER_KEY, &self.state);
        self.opacity.set(1.0);
        self.applied_opacity = 1.0;
        self.base = None;
        self.next_tick_ms = Some(now + self.config.tick_interval_ms);
        log::debug!("fade started at {now}");
    }

    /// Fading → Idle. Erases the persisted record.
    pub fn stop(&mut self) {
        if self.state.is_active {
            log::debug!("fade stopped at {}", self.stage().name);
        }
        self.state = FadeTimerState::idle();
        self.next_tick_ms = None;
        self.opacity.set(1.0);
        self.applied_opacity = 1.0;
        self.base = None;
        remove_key(self.store.as_ref(), FADE_TIMER_KEY);
    }

    /// Fraction of the fade elapsed; 0 while idle.
    pub fn progress(&self) -> f32 {
        match self.state.active_start() {
            Some(start) => fade::progress(self.clock.now_ms() - start, self.config.duration_ms),
            None => 0.0,
        }
    }

    pub fn current_opacity(&self) -> f32 {
        fade::opacity_at(self.progress())
    }

    pub fn stage(&self) -> &'static FadeStage {
        fade::stage_at(self.progress())
    }

    pub fn remaining_ms(&self) -> f64 {
        match self.state.active_start() {
            Some(start) => (self.config.duration_ms - (self.clock.now_ms() - start)).max(0.0),
            None => 0.0,
        }
    }

    pub fn remaining_formatted(&self) -> String {
        fade::format_remaining(self.remaining_ms())
    }

    fn next_tick_after(&self, now: f64) -> f64 {
        let interval = self.config.tick_interval_ms;
        match self.state.start_time_ms {
            Some(start) if now >= start => start + ((now - start) / interval).floor() * interval + interval,
            _ => now + interval,
        }
    }

    /// Wall-clock time of the next scheduled tick; `None` while idle.
    pub fn next_tick_ms(&self) -> Option<f64> {
        self.next_tick_ms
    }

    /// Whether a tick is due at the current wall-clock time.
    pub fn is_due(&self) -> bool {
        self.next_tick_ms.is_some_and(|t| self.clock.now_ms() >= t)
    }

    /// Run the tick if one is due. Ticks sit on a fixed `start + k·interval`
    /// grid; ticks missed while the host was suspended are skipped.
    pub fn poll(&mut self, ctx: &mut dyn RasterContext) -> Option<TickOutcome> {
        if !self.is_due() {
            return None;
        }
        let now = self.clock.now_ms();
        self.next_tick_ms = Some(self.next_tick_after(now));
        Some(self.tick(ctx))
    }

    /// Recompute the opacity and re-composite the raster at it.
    ///
    /// Each pixel's full-opacity alpha is tracked in floating point and the
    /// raster is rewritten as `base × opacity`, so faint ink ages at the same
    /// rate as dense ink and the floor tick is idempotent. Pixels painted or
    /// erased between ticks are re-read from the raster, divided by the
    /// opacity they were drawn at.
    pub fn tick(&mut self, ctx: &mut dyn RasterContext) -> TickOutcome {
        if !self.state.is_active {
            return TickOutcome::Idle;
        }
        let opacity = self.current_opacity();
        self.opacity.set(opacity);
        if opacity >= self.applied_opacity {
            return TickOutcome::Unchanged { opacity };
        }

        let mut pixels = ctx.get_pixels();
        let mut base = match self.base.take() {
            Some(base) if base.fits(&pixels) => base,
            _ => BaseAlpha::blank(pixels.width, pixels.height),
        };
        base.recomposite(&mut pixels, self.applied_opacity, opacity);
        ctx.clear();
        ctx.put_pixels(&pixels);
        self.base = Some(base);

        self.applied_opacity = opacity;
        log::trace!("fade tick: opacity {opacity:.3} ({})", self.stage().name);
        TickOutcome::Faded { opacity }
    }
}
