//! Integration tests: brush, eraser and surface on the tiny-skia backend.
//!
//! Strokes are rendered for real and checked pixel by pixel.

use dp_core::clock::ManualClock;
use dp_core::config::BrushConfig;
use dp_core::model::Sample;
use dp_core::width::{WidthEstimator, min_width};
use dp_render::brush::WatercolorBrush;
use dp_render::canvas::CanvasSurface;
use dp_render::eraser::Eraser;
use dp_render::surface::PixmapContext;
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn surface(w: f32, h: f32, dpr: f32) -> CanvasSurface<PixmapContext> {
    CanvasSurface::new(PixmapContext::new(1, 1).unwrap(), w, h, dpr).unwrap()
}

fn brush() -> WatercolorBrush {
    let clock = Rc::new(ManualClock::new(0.0));
    WatercolorBrush::new(BrushConfig::default(), clock).with_seed(3)
}

// ─── Straight stroke ─────────────────────────────────────────────────────

#[test]
fn horizontal_stroke_leaves_continuous_ink() {
    let mut s = surface(140.0, 60.0, 1.0);
    let mut b = brush();
    let max_width = 12.0;
    let mut estimator = WidthEstimator::new(max_width);

    let first = Sample::new(20.0, 30.0, Some(0.8), 0.0);
    let w0 = estimator.begin(&first);
    assert_eq!(w0, max_width, "1.24 × max clamps to max at rest");

    b.start_stroke(s.context_mut(), first.x, first.y, first.pressure);
    for i in 1..=10 {
        let sample = Sample::new(20.0 + i as f32 * 10.0, 30.0, Some(0.8), i as f64 * 16.0);
        let w = estimator.advance(&sample);
        assert!((min_width(max_width)..=max_width).contains(&w));
        b.continue_stroke(s.context_mut(), sample.x, sample.y, sample.pressure);
    }
    b.end_stroke();
    assert!(estimator.current_width() < max_width, "fast motion thins the stroke");

    let px = s.snapshot();
    for x in (20..=120).step_by(4) {
        assert!(px.get(x, 30).unwrap()[3] > 0, "gap at x={x}");
    }
    assert_eq!(px.get(70, 2).unwrap()[3], 0);
    assert_eq!(px.get(139, 30).unwrap()[3], 0);
}

#[test]
fn stroke_scales_with_device_pixel_ratio() {
    let mut s = surface(60.0, 40.0, 2.0);
    let mut b = brush();
    b.start_stroke(s.context_mut(), 30.0, 20.0, 0.8);
    b.end_stroke();
    assert_eq!(s.pixel_size(), (120, 80));
    assert!(s.context().pixel(60, 40).unwrap()[3] > 0);
}

// ─── Robustness ──────────────────────────────────────────────────────────

#[test]
fn invalid_geometry_never_touches_pixels() {
    let mut s = surface(40.0, 40.0, 1.0);
    let mut b = brush();
    b.start_stroke(s.context_mut(), 20.0, 20.0, -1.0);
    b.continue_stroke(s.context_mut(), f32::NAN, 20.0, 0.5);
    b.continue_stroke(s.context_mut(), 20.0, f32::INFINITY, 0.5);
    b.end_stroke();
    b.set_size(f32::NAN);
    b.add_drop(s.context_mut(), 10.0, 10.0, f32::NAN);
    assert!(s.snapshot().is_blank());
}

#[test]
fn clear_twice_leaves_no_strokes() {
    let mut s = surface(40.0, 40.0, 1.0);
    let mut b = brush();
    b.start_stroke(s.context_mut(), 20.0, 20.0, 0.5);
    b.continue_stroke(s.context_mut(), 30.0, 20.0, 0.5);
    for _ in 0..2 {
        b.clear();
        assert!(!b.has_user_strokes());
        assert_eq!(b.recent_drops().count(), 0);
    }
    // The brush buffer is not the raster.
    assert!(!s.snapshot().is_blank());
    s.clear();
    assert!(s.snapshot().is_blank());
}

// ─── Resize ──────────────────────────────────────────────────────────────

#[test]
fn brushed_content_survives_growth() {
    let mut s = surface(80.0, 50.0, 1.0);
    let mut b = brush();
    b.start_stroke(s.context_mut(), 10.0, 25.0, 0.7);
    b.continue_stroke(s.context_mut(), 70.0, 25.0, 0.7);
    b.end_stroke();
    let before = s.snapshot();

    assert!(s.resize(160.0, 100.0, 1.0).unwrap());
    let after = s.snapshot();
    for y in 0..50 {
        for x in 0..80 {
            let (a, b) = (before.get(x, y).unwrap(), after.get(x, y).unwrap());
            assert_eq!(a[3], b[3], "alpha at ({x},{y})");
        }
    }
    assert_eq!(after.painted_pixels(), before.painted_pixels());
}

// ─── Eraser ──────────────────────────────────────────────────────────────

#[test]
fn eraser_cuts_through_a_stroke() {
    let mut s = surface(80.0, 60.0, 1.0);
    let mut b = brush();
    b.start_stroke(s.context_mut(), 10.0, 30.0, 0.8);
    b.continue_stroke(s.context_mut(), 70.0, 30.0, 0.8);
    b.end_stroke();
    assert!(s.context().pixel(40, 30).unwrap()[3] > 0);

    let eraser = Eraser::new();
    eraser.start(s.context_mut(), 40.0, 5.0, 12.0);
    eraser.erase_segment(s.context_mut(), (40.0, 5.0), (40.0, 55.0), 12.0);
    assert_eq!(s.context().pixel(40, 30).unwrap()[3], 0);
    assert!(s.context().pixel(15, 30).unwrap()[3] > 0);
}
