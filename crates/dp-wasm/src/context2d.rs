//! Canvas2D backend for [`RasterContext`].
//!
//! Maps the raster trait onto `CanvasRenderingContext2d`. The canvas owns
//! the real state; we only mirror the CSS → device scale so it can be
//! re-applied after the buffer is reallocated.

use dp_render::surface::{
    CompositeOp, EllipseShape, Fill, PixelBuffer, RasterContext, Rgba, SurfaceError,
};
use std::f64::consts::TAU;
use wasm_bindgen::{Clamped, JsCast};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

pub struct WebContext {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    scale: f64,
}

impl WebContext {
    /// Acquire the 2d context of `canvas`. Missing context is fatal.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, SurfaceError> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|obj| obj.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or(SurfaceError::ContextUnavailable)?;
        Ok(Self {
            canvas,
            ctx,
            scale: 1.0,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    fn apply_fill(&self, fill: &Fill) -> bool {
        match fill {
            Fill::Solid(c) => {
                self.ctx.set_fill_style_str(&c.to_css());
                true
            }
            Fill::Radial(g) => {
                let (cx, cy, r) = (g.cx as f64, g.cy as f64, g.radius as f64);
                let Ok(gradient) = self.ctx.create_radial_gradient(cx, cy, 0.0, cx, cy, r) else {
                    return false;
                };
                for stop in &g.stops {
                    let _ = gradient.add_color_stop(stop.offset.clamp(0.0, 1.0), &stop.color.to_css());
                }
                self.ctx.set_fill_style_canvas_gradient(&gradient);
                true
            }
        }
    }
}

impl RasterContext for WebContext {
    fn pixel_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_pixel_size(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::InvalidDimensions { width, height });
        }
        // Assigning the size reallocates and resets all context state.
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.scale = 1.0;
        Ok(())
    }

    fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale as f64;
            let _ = self.ctx.set_transform(self.scale, 0.0, 0.0, self.scale, 0.0, 0.0);
        }
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.ctx.set_global_alpha(alpha as f64);
    }

    fn set_composite(&mut self, op: CompositeOp) {
        let _ = self.ctx.set_global_composite_operation(op.css_name());
    }

    fn fill_ellipse(&mut self, shape: &EllipseShape, fill: &Fill) {
        if !shape.is_drawable() || !self.apply_fill(fill) {
            return;
        }
        self.ctx.begin_path();
        let _ = self.ctx.ellipse(
            shape.cx as f64,
            shape.cy as f64,
            shape.rx as f64,
            shape.ry as f64,
            0.0,
            0.0,
            TAU,
        );
        self.ctx.fill();
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba) {
        let finite = [from.0, from.1, to.0, to.1, width].iter().all(|v| v.is_finite());
        if !finite || width <= 0.0 {
            return;
        }
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width as f64);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
        self.ctx.begin_path();
        self.ctx.move_to(from.0 as f64, from.1 as f64);
        self.ctx.line_to(to.0 as f64, to.1 as f64);
        self.ctx.stroke();
    }

    fn clear(&mut self) {
        let (w, h) = self.pixel_size();
        self.ctx.save();
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        self.ctx.clear_rect(0.0, 0.0, w as f64, h as f64);
        self.ctx.restore();
    }

    fn get_pixels(&self) -> PixelBuffer {
        let (w, h) = self.pixel_size();
        match self.ctx.get_image_data(0.0, 0.0, w as f64, h as f64) {
            Ok(image) => PixelBuffer {
                width: image.width(),
                height: image.height(),
                data: image.data().0,
            },
            Err(e) => {
                log::warn!("getImageData failed: {e:?}");
                PixelBuffer::new(w, h)
            }
        }
    }

    fn put_pixels(&mut self, pixels: &PixelBuffer) {
        if pixels.width == 0 || pixels.height == 0 {
            return;
        }
        let image = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(pixels.data.as_slice()),
            pixels.width,
            pixels.height,
        );
        match image {
            Ok(image) => {
                // putImageData ignores transform, alpha and compositing.
                let _ = self.ctx.put_image_data(&image, 0.0, 0.0);
            }
            Err(e) => log::warn!("ImageData construction failed: {e:?}"),
        }
    }
}
