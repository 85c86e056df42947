//! The 2D raster boundary.
//!
//! [`RasterContext`] is the small slice of a Canvas2D-style context the
//! engines need: radial-gradient ellipses, round-capped lines, global
//! alpha, `source-over` / `destination-out` compositing and whole-buffer
//! pixel access. Shapes are given in CSS pixels and scaled by the device
//! pixel ratio; pixel buffers are always addressed in device pixels.
//!
//! [`PixmapContext`] implements it on a `tiny_skia::Pixmap` for native
//! rendering and tests. The browser implementation lives in `dp-wasm`.

use smallvec::SmallVec;
use thiserror::Error;
use tiny_skia::{
    BlendMode, Color, ColorU8, FillRule, GradientStop as SkiaStop, LineCap, LineJoin, Paint,
    PathBuilder, Pixmap, Point, RadialGradient as SkiaRadial, Rect, Shader, SpreadMode, Stroke,
    Transform,
};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("2D rendering context is unavailable")]
    ContextUnavailable,
    #[error("invalid surface dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("failed to encode surface: {0}")]
    Encode(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

// ─── Paint description ───────────────────────────────────────────────────

/// Straight-alpha colour as Canvas2D accepts it: `rgba(r, g, b, a)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub fn new(rgb: dp_core::Rgb, alpha: f32) -> Self {
        Self {
            r: rgb.r,
            g: rgb.g,
            b: rgb.b,
            a: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }

    fn alpha_u8(&self, global_alpha: f32) -> u8 {
        (self.a * global_alpha * 255.0).round().clamp(0.0, 255.0) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

/// Concentric radial gradient centred at `(cx, cy)`, from radius 0 to `radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub stops: SmallVec<[GradientStop; 5]>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Solid(Rgba),
    Radial(RadialGradient),
}

/// Axis-aligned ellipse in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseShape {
    pub cx: f32,
    pub cy: f32,
    pub rx: f32,
    pub ry: f32,
}

impl EllipseShape {
    pub fn circle(cx: f32, cy: f32, r: f32) -> Self {
        Self { cx, cy, rx: r, ry: r }
    }

    /// Finite centre, finite and strictly positive radii.
    pub fn is_drawable(&self) -> bool {
        self.cx.is_finite()
            && self.cy.is_finite()
            && self.rx.is_finite()
            && self.ry.is_finite()
            && self.rx > 0.0
            && self.ry > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeOp {
    #[default]
    SourceOver,
    DestinationOut,
}

impl CompositeOp {
    pub fn css_name(self) -> &'static str {
        match self {
            CompositeOp::SourceOver => "source-over",
            CompositeOp::DestinationOut => "destination-out",
        }
    }
}

// ─── Pixel buffer ────────────────────────────────────────────────────────

/// Straight-alpha RGBA8 pixels, row-major, like `ImageData`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y as usize * self.width as usize + x as usize) * 4)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    pub fn set(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 4].copy_from_slice(&rgba);
        }
    }

    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    pub fn painted_pixels(&self) -> usize {
        self.data.chunks_exact(4).filter(|px| px[3] > 0).count()
    }

    /// Highest alpha value in the buffer.
    pub fn max_alpha(&self) -> u8 {
        self.data.chunks_exact(4).map(|px| px[3]).max().unwrap_or(0)
    }
}

// ─── Context trait ───────────────────────────────────────────────────────

/// A Canvas2D-like drawing target.
pub trait RasterContext {
    /// Backing buffer size in device pixels.
    fn pixel_size(&self) -> (u32, u32);

    /// Reallocate the backing buffer. Contents are discarded and the state
    /// (scale, alpha, composite, save stack) resets, as assigning
    /// `canvas.width` does in a browser.
    fn set_pixel_size(&mut self, width: u32, height: u32) -> Result<(), SurfaceError>;

    /// Uniform CSS → device scale for shape drawing.
    fn set_scale(&mut self, scale: f32);

    fn save(&mut self);
    fn restore(&mut self);
    fn set_global_alpha(&mut self, alpha: f32);
    fn set_composite(&mut self, op: CompositeOp);

    fn fill_ellipse(&mut self, shape: &EllipseShape, fill: &Fill);

    /// Round-capped straight line.
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba);

    /// Wipe every pixel to transparent.
    fn clear(&mut self);

    /// Copy of the whole buffer.
    fn get_pixels(&self) -> PixelBuffer;

    /// Replace pixels at device origin, 1:1, ignoring alpha/composite state.
    /// Parts of `pixels` outside the buffer are dropped.
    fn put_pixels(&mut self, pixels: &PixelBuffer);
}

// ─── tiny-skia backend ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct DrawState {
    scale: f32,
    alpha: f32,
    composite: CompositeOp,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            alpha: 1.0,
            composite: CompositeOp::SourceOver,
        }
    }
}

/// Software raster backed by `tiny_skia::Pixmap`.
pub struct PixmapContext {
    pixmap: Pixmap,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl PixmapContext {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let pixmap =
            Pixmap::new(width, height).ok_or(SurfaceError::InvalidDimensions { width, height })?;
        Ok(Self {
            pixmap,
            state: DrawState::default(),
            stack: Vec::new(),
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha pixel at device coordinates.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, SurfaceError> {
        self.pixmap
            .encode_png()
            .map_err(|e| SurfaceError::Encode(e.to_string()))
    }

    fn transform(&self) -> Transform {
        Transform::from_scale(self.state.scale, self.state.scale)
    }

    fn paint(&self, shader: Shader<'static>) -> Paint<'static> {
        Paint {
            shader,
            blend_mode: match self.state.composite {
                CompositeOp::SourceOver => BlendMode::SourceOver,
                CompositeOp::DestinationOut => BlendMode::DestinationOut,
            },
            anti_alias: true,
            ..Paint::default()
        }
    }

    fn shader_for(&self, fill: &Fill) -> Option<Shader<'static>> {
        let alpha = self.state.alpha;
        match fill {
            Fill::Solid(c) => Some(Shader::SolidColor(Color::from_rgba8(
                c.r,
                c.g,
                c.b,
                c.alpha_u8(alpha),
            ))),
            Fill::Radial(g) => {
                if !(g.radius.is_finite() && g.radius > 0.0) || g.stops.is_empty() {
                    return None;
                }
                let stops = g
                    .stops
                    .iter()
                    .map(|s| {
                        let c = s.color;
                        SkiaStop::new(
                            s.offset.clamp(0.0, 1.0),
                            Color::from_rgba8(c.r, c.g, c.b, c.alpha_u8(alpha)),
                        )
                    })
                    .collect();
                let center = Point::from_xy(g.cx, g.cy);
                SkiaRadial::new(
                    center,
                    center,
                    g.radius,
                    stops,
                    SpreadMode::Pad,
                    Transform::identity(),
                )
            }
        }
    }
}

impl RasterContext for PixmapContext {
    fn pixel_size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn set_pixel_size(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        self.pixmap =
            Pixmap::new(width, height).ok_or(SurfaceError::InvalidDimensions { width, height })?;
        self.state = DrawState::default();
        self.stack.clear();
        Ok(())
    }

    fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.state.scale = scale;
        }
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        // Canvas2D ignores out-of-range assignments.
        if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
            self.state.alpha = alpha;
        }
    }

    fn set_composite(&mut self, op: CompositeOp) {
        self.state.composite = op;
    }

    fn fill_ellipse(&mut self, shape: &EllipseShape, fill: &Fill) {
        if !shape.is_drawable() {
            return;
        }
        let Some(rect) = Rect::from_xywh(
            shape.cx - shape.rx,
            shape.cy - shape.ry,
            shape.rx * 2.0,
            shape.ry * 2.0,
        ) else {
            return;
        };
        let Some(path) = PathBuilder::from_oval(rect) else {
            return;
        };
        let Some(shader) = self.shader_for(fill) else {
            return;
        };
        let paint = self.paint(shader);
        let transform = self.transform();
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, transform, None);
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba) {
        let finite = [from.0, from.1, to.0, to.1, width].iter().all(|v| v.is_finite());
        if !finite || width <= 0.0 {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        let Some(shader) = self.shader_for(&Fill::Solid(color)) else {
            return;
        };
        let paint = self.paint(shader);
        let transform = self.transform();
        self.pixmap
            .stroke_path(&path, &paint, &stroke, transform, None);
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    fn get_pixels(&self) -> PixelBuffer {
        let mut data = Vec::with_capacity(self.pixmap.pixels().len() * 4);
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        PixelBuffer {
            width: self.pixmap.width(),
            height: self.pixmap.height(),
            data,
        }
    }

    fn put_pixels(&mut self, pixels: &PixelBuffer) {
        let dst_w = self.pixmap.width();
        let dst_h = self.pixmap.height();
        let w = pixels.width.min(dst_w);
        let h = pixels.height.min(dst_h);
        let dst = self.pixmap.pixels_mut();
        for y in 0..h {
            for x in 0..w {
                let Some([r, g, b, a]) = pixels.get(x, y) else {
                    continue;
                };
                dst[(y * dst_w + x) as usize] = ColorU8::from_rgba(r, g, b, a).premultiply();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dp_core::Rgb;
    use pretty_assertions::assert_eq;

    fn red(a: f32) -> Rgba {
        Rgba::new(Rgb::new(255, 0, 0), a)
    }

    #[test]
    fn zero_sized_pixmap_is_rejected() {
        assert!(matches!(
            PixmapContext::new(0, 10),
            Err(SurfaceError::InvalidDimensions { width: 0, height: 10 })
        ));
    }

    #[test]
    fn solid_ellipse_paints_centre() {
        let mut ctx = PixmapContext::new(40, 40).unwrap();
        ctx.fill_ellipse(&EllipseShape::circle(20.0, 20.0, 8.0), &Fill::Solid(red(1.0)));
        assert_eq!(ctx.pixel(20, 20), Some([255, 0, 0, 255]));
        assert_eq!(ctx.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn scale_maps_css_to_device_pixels() {
        let mut ctx = PixmapContext::new(40, 40).unwrap();
        ctx.set_scale(2.0);
        ctx.fill_ellipse(&EllipseShape::circle(10.0, 10.0, 3.0), &Fill::Solid(red(1.0)));
        assert_eq!(ctx.pixel(20, 20).map(|p| p[3]), Some(255));
        assert_eq!(ctx.pixel(10, 10).map(|p| p[3]), Some(0));
    }

    #[test]
    fn global_alpha_scales_fill() {
        let mut ctx = PixmapContext::new(20, 20).unwrap();
        ctx.set_global_alpha(0.5);
        ctx.fill_ellipse(&EllipseShape::circle(10.0, 10.0, 6.0), &Fill::Solid(red(1.0)));
        let a = ctx.pixel(10, 10).unwrap()[3];
        assert!((127..=128).contains(&a), "alpha {a}");
    }

    #[test]
    fn destination_out_erases() {
        let mut ctx = PixmapContext::new(30, 30).unwrap();
        ctx.fill_ellipse(&EllipseShape::circle(15.0, 15.0, 12.0), &Fill::Solid(red(1.0)));
        ctx.set_composite(CompositeOp::DestinationOut);
        ctx.fill_ellipse(&EllipseShape::circle(15.0, 15.0, 4.0), &Fill::Solid(red(1.0)));
        assert_eq!(ctx.pixel(15, 15).map(|p| p[3]), Some(0));
        assert_eq!(ctx.pixel(15, 5).map(|p| p[3]), Some(255));
    }

    #[test]
    fn save_restore_roundtrips_state() {
        let mut ctx = PixmapContext::new(10, 10).unwrap();
        ctx.save();
        ctx.set_composite(CompositeOp::DestinationOut);
        ctx.set_global_alpha(0.2);
        ctx.restore();
        ctx.fill_ellipse(&EllipseShape::circle(5.0, 5.0, 4.0), &Fill::Solid(red(1.0)));
        assert_eq!(ctx.pixel(5, 5), Some([255, 0, 0, 255]));
    }

    #[test]
    fn invalid_geometry_is_ignored() {
        let mut ctx = PixmapContext::new(10, 10).unwrap();
        ctx.fill_ellipse(&EllipseShape::circle(f32::NAN, 5.0, 4.0), &Fill::Solid(red(1.0)));
        ctx.fill_ellipse(&EllipseShape::circle(5.0, 5.0, -1.0), &Fill::Solid(red(1.0)));
        ctx.stroke_line((0.0, 0.0), (f32::INFINITY, 3.0), 2.0, red(1.0));
        assert!(ctx.get_pixels().is_blank());
    }

    #[test]
    fn pixels_roundtrip_opaque() {
        let mut ctx = PixmapContext::new(8, 8).unwrap();
        let mut buf = PixelBuffer::new(4, 4);
        buf.set(1, 2, [10, 20, 30, 255]);
        ctx.put_pixels(&buf);
        assert_eq!(ctx.pixel(1, 2), Some([10, 20, 30, 255]));
        assert_eq!(ctx.get_pixels().get(1, 2), Some([10, 20, 30, 255]));
    }
}
