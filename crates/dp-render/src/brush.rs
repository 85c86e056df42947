//! Watercolor / sumi-ink brush.
//!
//! Every sample becomes a [`PaintDrop`]; the straight segment between two
//! samples is filled with roughly one drop per pixel, each nudged by a
//! little pressure and positional noise so the line never looks ruled.
//! A drop renders as a soft radial-gradient ellipse whose roundness follows
//! pressure (thin under a light touch, round under a heavy one).
//!
//! Wet-on-wet blending: the last few drops stay "wet" in a small buffer.
//! A new drop landing close to a wet one deposits an extra soft ellipse of
//! the mixed colour between them, imitating pigment bleeding into damp ink.
//! The buffer is only an index for that lookup; the raster is the record.

use crate::fade_timer::OpacityHandle;
use crate::surface::{EllipseShape, Fill, GradientStop, RadialGradient, RasterContext, Rgba};
use dp_core::clock::Clock;
use dp_core::config::BrushConfig;
use dp_core::model::{INK_PALETTE, PaintDrop, Rgb};
use kurbo::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::smallvec;
use std::collections::VecDeque;
use std::rc::Rc;

/// Upper bound on interpolated drops for one segment.
const MAX_SEGMENT_STEPS: usize = 4096;
/// Textured stipples per large drop.
const MAX_TEXTURE_SPOTS: usize = 1;

pub struct WatercolorBrush {
    config: BrushConfig,
    clock: Rc<dyn Clock>,
    rng: StdRng,
    color: Rgb,
    color_index: usize,
    size: f32,
    wet: VecDeque<PaintDrop>,
    fade: Option<OpacityHandle>,
    cursor: Option<Point>,
}

impl WatercolorBrush {
    pub fn new(config: BrushConfig, clock: Rc<dyn Clock>) -> Self {
        let seed = clock.now_ms().to_bits();
        let size = clamp_size(config.size, &config).unwrap_or(config.size);
        let capacity = config.max_wet_drops;
        Self {
            config,
            clock,
            rng: StdRng::seed_from_u64(seed),
            color: INK_PALETTE[0],
            color_index: 0,
            size,
            wet: VecDeque::with_capacity(capacity + 1),
            fade: None,
            cursor: None,
        }
    }

    /// Reseed the jitter source, for reproducible output.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Multiply every new drop by the fade timer's published opacity.
    pub fn set_fade_source(&mut self, handle: OpacityHandle) {
        self.fade = Some(handle);
    }

    fn fade_opacity(&self) -> f32 {
        match &self.fade {
            Some(h) => {
                let o = h.get();
                if o.is_finite() && o > 0.0 { o.min(1.0) } else { 1.0 }
            }
            None => 1.0,
        }
    }

    // ─── Settings ────────────────────────────────────────────────────────

    /// Select a palette tone. Out-of-range indices are ignored.
    pub fn set_color(&mut self, index: usize) -> bool {
        match INK_PALETTE.get(index) {
            Some(color) => {
                self.color_index = index;
                self.color = *color;
                true
            }
            None => false,
        }
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn color_index(&self) -> usize {
        self.color_index
    }

    pub fn set_size(&mut self, size: f32) {
        if let Some(size) = clamp_size(size, &self.config) {
            self.size = size;
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    // ─── Stroke lifecycle ────────────────────────────────────────────────

    pub fn is_drawing(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn start_stroke(&mut self, ctx: &mut dyn RasterContext, x: f32, y: f32, pressure: f32) {
        self.cursor = Some(Point::new(x as f64, y as f64));
        self.add_drop(ctx, x, y, pressure);
    }

    pub fn continue_stroke(&mut self, ctx: &mut dyn RasterContext, x: f32, y: f32, pressure: f32) {
        let Some(last) = self.cursor else {
            return;
        };
        self.add_drop(ctx, x, y, pressure);
        let next = Point::new(x as f64, y as f64);
        self.fill_segment(ctx, last, next, pressure);
        self.cursor = Some(next);
    }

    pub fn end_stroke(&mut self) {
        self.cursor = None;
    }

    /// Forget the wet buffer. The raster is cleared by its owner.
    pub fn clear(&mut self) {
        self.wet.clear();
    }

    pub fn has_user_strokes(&self) -> bool {
        !self.wet.is_empty()
    }

    /// Wet drops, oldest first.
    pub fn recent_drops(&self) -> impl Iterator<Item = &PaintDrop> {
        self.wet.iter()
    }

    // ─── Drops ───────────────────────────────────────────────────────────

    /// Create, render and blend one drop. Returns `None` when the input is
    /// invisible or malformed; nothing is drawn in that case.
    pub fn add_drop(
        &mut self,
        ctx: &mut dyn RasterContext,
        x: f32,
        y: f32,
        pressure: f32,
    ) -> Option<PaintDrop> {
        if !(x.is_finite() && y.is_finite() && pressure.is_finite()) {
            log::trace!("rejected drop at ({x}, {y}) p={pressure}");
            return None;
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return None;
        }
        if pressure < self.config.min_visible_pressure {
            return None;
        }

        let pressure_multiplier = pressure.min(1.0).powf(0.8);
        let size = self.size * (0.3 + pressure_multiplier * 1.4);
        let opacity = 0.4 + pressure_multiplier * 0.6;

        let drop = PaintDrop {
            x,
            y,
            color: self.color,
            size,
            opacity,
            wetness: self.config.wetness,
            flow: self.config.flow,
            pressure,
            pressure_multiplier,
            created_at_ms: self.clock.now_ms(),
        };
        if !drop.is_renderable() || !pressure_multiplier.is_finite() {
            return None;
        }

        self.render_drop(ctx, &drop);
        self.blend_with_wet(ctx, &drop);

        self.wet.push_back(drop);
        while self.wet.len() > self.config.max_wet_drops {
            self.wet.pop_front();
        }
        Some(drop)
    }

    /// Fill the segment `from → to` with jittered drops.
    fn fill_segment(&mut self, ctx: &mut dyn RasterContext, from: Point, to: Point, pressure: f32) {
        let distance = from.distance(to);
        if !distance.is_finite() || distance <= 0.0 {
            return;
        }
        let steps = (distance.floor() as usize).clamp(2, MAX_SEGMENT_STEPS);
        // Unit normal to the segment.
        let nx = ((to.y - from.y) / distance) as f32;
        let ny = ((from.x - to.x) / distance) as f32;

        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let p = from.lerp(to, t);

            let envelope = (t as f32 * std::f32::consts::PI).sin() * 0.05;
            let jitter = self.rng.gen_range(-0.05..=0.05);
            let varied = (pressure + envelope + jitter).clamp(0.2, 1.0);

            let width = self.size * (0.3 + varied * 1.4);
            let offset = (self.rng.r#gen::<f32>() - 0.5) * width * 0.15;

            self.add_drop(ctx, p.x as f32 + nx * offset, p.y as f32 + ny * offset, varied);
        }
    }

    fn render_drop(&mut self, ctx: &mut dyn RasterContext, drop: &PaintDrop) {
        let aspect = 0.2 + drop.pressure_multiplier * 0.8;
        let shape = EllipseShape {
            cx: drop.x,
            cy: drop.y,
            rx: drop.size * aspect,
            ry: drop.size,
        };
        if !shape.is_drawable() {
            return;
        }

        ctx.save();
        ctx.set_global_alpha(self.fade_opacity());

        let o = drop.opacity;
        let stops = [(0.0, 1.0), (0.3, 0.9), (0.6, 0.7), (0.8, 0.4), (1.0, 0.1)];
        let gradient = RadialGradient {
            cx: drop.x,
            cy: drop.y,
            radius: drop.size,
            stops: stops
                .iter()
                .map(|&(offset, k)| GradientStop {
                    offset,
                    color: Rgba::new(drop.color, o * k),
                })
                .collect(),
        };
        ctx.fill_ellipse(&shape, &Fill::Radial(gradient));

        if drop.size > 6.0 && drop.pressure > 0.3 {
            self.stipple(ctx, &shape, drop.color, o * 0.2);
        }
        if drop.pressure < 0.4 && drop.size > 8.0 {
            direction_hint(ctx, &shape, drop.color, o * 0.15);
        }

        ctx.restore();
    }

    /// A few small solid ellipses inside the footprint for paper texture.
    fn stipple(&mut self, ctx: &mut dyn RasterContext, shape: &EllipseShape, color: Rgb, opacity: f32) {
        let count = ((shape.rx / 4.0).floor() as usize).min(MAX_TEXTURE_SPOTS);
        for i in 0..count {
            let angle = std::f32::consts::PI * i as f32 / count as f32;
            let spot = EllipseShape {
                cx: shape.cx + angle.cos() * self.rng.r#gen::<f32>() * shape.rx * 0.4,
                cy: shape.cy + angle.sin() * self.rng.r#gen::<f32>() * shape.ry * 0.4,
                rx: self.rng.r#gen::<f32>() * shape.rx * 0.2,
                ry: self.rng.r#gen::<f32>() * shape.ry * 0.2,
            };
            if spot.is_drawable() {
                ctx.fill_ellipse(&spot, &Fill::Solid(Rgba::new(color, opacity)));
            }
        }
    }

    // ─── Wet-on-wet ──────────────────────────────────────────────────────

    fn blend_with_wet(&mut self, ctx: &mut dyn RasterContext, drop: &PaintDrop) {
        let now = drop.created_at_ms;
        let radius = self.config.blend_radius;
        let dry_time = self.config.dry_time_ms;
        let threshold = self.config.blend_threshold;

        let partners: Vec<(PaintDrop, f32)> = self
            .wet
            .iter()
            .rev()
            .take(self.config.max_blends)
            .filter(|wet| now - wet.created_at_ms <= dry_time)
            .filter_map(|wet| {
                let distance = drop.distance_to(wet);
                if !(distance < radius) {
                    return None;
                }
                let strength = (1.0 - distance / radius) * drop.wetness.min(wet.wetness) * 0.3;
                (strength > threshold).then_some((*wet, strength))
            })
            .collect();

        if partners.is_empty() {
            return;
        }
        let fade = self.fade_opacity();
        for (wet, strength) in partners {
            blend_spot(ctx, drop, &wet, strength, fade);
        }
    }
}

/// Clamp to the configured size range without trusting the range itself:
/// `f32::clamp` panics on an inverted or NaN range. `None` for a NaN size.
fn clamp_size(size: f32, config: &BrushConfig) -> Option<f32> {
    if size.is_nan() {
        return None;
    }
    Some(size.max(config.min_size).min(config.max_size))
}

/// Narrow vertical wash marking the brush direction under light pressure.
fn direction_hint(ctx: &mut dyn RasterContext, shape: &EllipseShape, color: Rgb, opacity: f32) {
    let radius = shape.ry * 0.4;
    let hint = EllipseShape {
        cx: shape.cx,
        cy: shape.cy,
        rx: shape.rx * 0.15,
        ry: shape.ry * 0.6,
    };
    if !(radius.is_finite() && radius > 0.0) || !hint.is_drawable() {
        return;
    }
    let gradient = RadialGradient {
        cx: shape.cx,
        cy: shape.cy,
        radius,
        stops: smallvec![
            GradientStop { offset: 0.0, color: Rgba::new(color, opacity) },
            GradientStop { offset: 0.5, color: Rgba::new(color, opacity * 0.6) },
            GradientStop { offset: 1.0, color: Rgba::new(color, 0.0) },
        ],
    };
    ctx.fill_ellipse(&hint, &Fill::Radial(gradient));
}

/// Soft mixed-colour spot halfway between two wet drops.
fn blend_spot(ctx: &mut dyn RasterContext, a: &PaintDrop, b: &PaintDrop, strength: f32, fade: f32) {
    let mid_x = (a.x + b.x) / 2.0;
    let mid_y = (a.y + b.y) / 2.0;
    let size = (a.size + b.size) / 2.0 * strength;
    let color = a.color.mix(b.color, 0.5);
    let opacity = (a.opacity + b.opacity) / 2.0 * strength;

    let shape = EllipseShape::circle(mid_x, mid_y, size);
    if !shape.is_drawable() || !(opacity.is_finite() && opacity > 0.0) {
        return;
    }
    let gradient = RadialGradient {
        cx: mid_x,
        cy: mid_y,
        radius: size,
        stops: smallvec![
            GradientStop { offset: 0.0, color: Rgba::new(color, opacity) },
            GradientStop { offset: 0.5, color: Rgba::new(color, opacity * 0.5) },
            GradientStop { offset: 1.0, color: Rgba::new(color, 0.0) },
        ],
    };
    ctx.save();
    ctx.set_global_alpha(fade);
    ctx.fill_ellipse(&shape, &Fill::Radial(gradient));
    ctx.restore();
}
