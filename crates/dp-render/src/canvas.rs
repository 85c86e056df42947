//! Canvas surface manager: device-pixel-ratio sizing and resize with
//! content preservation.
//!
//! The manager is the single owner of the raster. Brush, eraser and fade
//! timer draw through [`CanvasSurface::context_mut`]; nobody else holds the
//! context.

use crate::surface::{PixelBuffer, RasterContext, SurfaceError};

/// Backing-buffer length for a CSS length at `dpr`: integral and at least 1.
pub fn device_pixels(css: f32, dpr: f32) -> u32 {
    let css = if css.is_finite() { css.floor().max(0.0) } else { 0.0 };
    let dpr = normalize_dpr(dpr);
    ((css * dpr).floor() as u32).max(1)
}

/// Device pixel ratios below 1 (or garbage) are treated as 1.
pub fn normalize_dpr(dpr: f32) -> f32 {
    if dpr.is_finite() { dpr.max(1.0) } else { 1.0 }
}

pub struct CanvasSurface<C: RasterContext> {
    ctx: C,
    css_width: f32,
    css_height: f32,
    dpr: f32,
}

impl<C: RasterContext> CanvasSurface<C> {
    /// Take ownership of `ctx` and size it for the given CSS box.
    pub fn new(ctx: C, css_width: f32, css_height: f32, dpr: f32) -> Result<Self, SurfaceError> {
        let mut surface = Self {
            ctx,
            css_width: css_width.floor(),
            css_height: css_height.floor(),
            dpr: normalize_dpr(dpr),
        };
        surface.apply_size()?;
        Ok(surface)
    }

    fn apply_size(&mut self) -> Result<(), SurfaceError> {
        let w = device_pixels(self.css_width, self.dpr);
        let h = device_pixels(self.css_height, self.dpr);
        self.ctx.set_pixel_size(w, h)?;
        self.ctx.set_scale(self.dpr);
        Ok(())
    }

    pub fn css_size(&self) -> (f32, f32) {
        (self.css_width, self.css_height)
    }

    pub fn dpr(&self) -> f32 {
        self.dpr
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        self.ctx.pixel_size()
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// Resize the backing buffer, keeping existing pixels anchored top-left
    /// at 1:1 scale. Returns `Ok(false)` when nothing changed.
    ///
    /// The snapshot is restored before this returns, so no draw call can
    /// land between the reallocation and the restore.
    pub fn resize(&mut self, css_width: f32, css_height: f32, dpr: f32) -> Result<bool, SurfaceError> {
        let css_width = css_width.floor();
        let css_height = css_height.floor();
        let dpr = normalize_dpr(dpr);
        if css_width == self.css_width && css_height == self.css_height && dpr == self.dpr {
            return Ok(false);
        }

        let snapshot = self.ctx.get_pixels();
        let old = (self.css_width, self.css_height, self.dpr);
        self.css_width = css_width;
        self.css_height = css_height;
        self.dpr = dpr;

        if let Err(e) = self.apply_size() {
            (self.css_width, self.css_height, self.dpr) = old;
            return Err(e);
        }
        if !snapshot.is_blank() {
            self.ctx.put_pixels(&snapshot);
        }

        log::debug!(
            "surface resized to {}x{} css @{} ({:?} px)",
            css_width,
            css_height,
            dpr,
            self.ctx.pixel_size()
        );
        Ok(true)
    }

    /// Wipe the whole raster.
    pub fn clear(&mut self) {
        self.ctx.clear();
    }

    /// Raw pixels for export.
    pub fn snapshot(&self) -> PixelBuffer {
        self.ctx.get_pixels()
    }
}
