//! Eraser: removes ink with `destination-out` compositing.
//!
//! A segment is cleared with a round-capped line of the current width plus
//! two discs, one at the segment end (radius w/2) and one at the midpoint
//! (radius w/3), so fast strokes leave no gaps between samples.

use crate::surface::{CompositeOp, EllipseShape, Fill, RasterContext, Rgba};
use dp_core::model::Rgb;

#[derive(Debug, Default, Clone, Copy)]
pub struct Eraser;

impl Eraser {
    pub fn new() -> Self {
        Self
    }

    /// Clear a disc of diameter `width` at a stroke start.
    pub fn start(&self, ctx: &mut dyn RasterContext, x: f32, y: f32, width: f32) {
        if !valid(&[x, y, width]) {
            return;
        }
        with_erase(ctx, |ctx| {
            ctx.fill_ellipse(&EllipseShape::circle(x, y, width / 2.0), &solid());
        });
    }

    /// Clear along `from → to`.
    pub fn erase_segment(&self, ctx: &mut dyn RasterContext, from: (f32, f32), to: (f32, f32), width: f32) {
        if !valid(&[from.0, from.1, to.0, to.1, width]) {
            return;
        }
        let mid = ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
        with_erase(ctx, |ctx| {
            ctx.fill_ellipse(&EllipseShape::circle(to.0, to.1, width / 2.0), &solid());
            ctx.stroke_line(from, to, width, Rgba::new(Rgb::BLACK, 1.0));
            ctx.fill_ellipse(&EllipseShape::circle(mid.0, mid.1, width / 3.0), &solid());
        });
    }
}

fn valid(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite()) && values.last().is_some_and(|w| *w > 0.0)
}

fn solid() -> Fill {
    Fill::Solid(Rgba::new(Rgb::BLACK, 1.0))
}

fn with_erase(ctx: &mut dyn RasterContext, draw: impl FnOnce(&mut dyn RasterContext)) {
    ctx.save();
    ctx.set_composite(CompositeOp::DestinationOut);
    ctx.set_global_alpha(1.0);
    draw(ctx);
    ctx.restore();
}
