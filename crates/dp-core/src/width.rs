//! Stroke width estimation from pressure and pointer speed.
//!
//! Faster motion thins the stroke, harder pressure thickens it. Both the
//! speed and the resulting width are low-pass filtered so a jittery
//! pointer does not produce a jittery line.

use crate::model::Sample;

/// Speed filter: `smoothed = 0.7 * previous + 0.3 * current`.
const SPEED_RETAIN: f32 = 0.7;
/// Width filter: `current = 0.6 * current + 0.4 * target`.
const WIDTH_RETAIN: f32 = 0.6;

/// Smallest width the stroke may thin down to for a given maximum.
pub fn min_width(max_width: f32) -> f32 {
    (0.18 * max_width).max(0.6)
}

/// Target width for `pressure` at `speed` (CSS px per ms).
///
/// Always inside `[min_width(max_width), max_width]` for finite inputs.
pub fn target_width(max_width: f32, pressure: f32, speed: f32) -> f32 {
    let min_w = min_width(max_width);
    let speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
    let pressure = if pressure.is_finite() { pressure } else { 0.0 };

    let speed_factor = (1.0 / (1.0 + 2.5 * speed)).clamp(0.3, 1.0);
    let pressure_factor = (0.6 + 0.8 * pressure).clamp(0.6, 1.4);
    (max_width * speed_factor * pressure_factor).clamp(min_w, max_width.max(min_w))
}

/// Stateful width filter for one stroke at a time.
#[derive(Debug, Clone)]
pub struct WidthEstimator {
    max_width: f32,
    smoothed_speed: f32,
    current_width: f32,
    last: Option<Sample>,
}

impl WidthEstimator {
    pub fn new(max_width: f32) -> Self {
        Self {
            max_width,
            smoothed_speed: 0.0,
            current_width: max_width,
            last: None,
        }
    }

    pub fn max_width(&self) -> f32 {
        self.max_width
    }

    /// Change the maximum width (tool or size switch). Takes effect on the
    /// next stroke; an in-flight stroke keeps its filter state.
    pub fn set_max_width(&mut self, max_width: f32) {
        self.max_width = max_width;
    }

    pub fn current_width(&self) -> f32 {
        self.current_width
    }

    pub fn smoothed_speed(&self) -> f32 {
        self.smoothed_speed
    }

    /// Reset the filter at stroke start. Width starts at the zero-speed target.
    pub fn begin(&mut self, sample: &Sample) -> f32 {
        self.smoothed_speed = 0.0;
        self.current_width = target_width(self.max_width, sample.pressure, 0.0);
        self.last = Some(*sample);
        self.current_width
    }

    /// Feed the next sample of the stroke and return the smoothed width.
    pub fn advance(&mut self, sample: &Sample) -> f32 {
        let Some(last) = self.last else {
            return self.begin(sample);
        };

        let dt = (sample.timestamp_ms - last.timestamp_ms).max(1.0) as f32;
        let dist = (sample.x - last.x).hypot(sample.y - last.y);
        let speed = if dist.is_finite() { dist / dt } else { 0.0 };

        self.smoothed_speed = SPEED_RETAIN * self.smoothed_speed + (1.0 - SPEED_RETAIN) * speed;
        let target = target_width(self.max_width, sample.pressure, self.smoothed_speed);
        self.current_width = WIDTH_RETAIN * self.current_width + (1.0 - WIDTH_RETAIN) * target;
        self.last = Some(*sample);
        self.current_width
    }

    pub fn end(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_width_floor() {
        assert_eq!(min_width(2.0), 0.6);
        assert!((min_width(20.0) - 3.6).abs() < 1e-6);
    }

    #[test]
    fn width_stays_in_bounds() {
        for max in [1.0_f32, 6.0, 12.0, 40.0] {
            let lo = min_width(max);
            for p in 0..=10 {
                let pressure = p as f32 / 10.0;
                for speed in [0.0_f32, 0.01, 0.1, 0.5, 1.0, 5.0, 100.0, 1e9] {
                    let w = target_width(max, pressure, speed);
                    assert!(
                        w >= lo - 1e-6 && w <= max + 1e-6,
                        "w={w} out of [{lo}, {max}] at p={pressure} s={speed}"
                    );
                }
            }
        }
    }

    #[test]
    fn zero_speed_high_pressure_clamps_to_max() {
        // 0.6 + 0.8 * 0.8 = 1.24, clamped to max.
        assert_eq!(target_width(10.0, 0.8, 0.0), 10.0);
        assert!((target_width(10.0, 0.25, 0.0) - 8.0).abs() < 1e-5);
    }

    #[test]
    fn fast_motion_thins_stroke() {
        let slow = target_width(10.0, 0.5, 0.0);
        let fast = target_width(10.0, 0.5, 2.0);
        assert!(fast < slow);
    }

    #[test]
    fn smoothing_prevents_jumps() {
        let mut est = WidthEstimator::new(10.0);
        let start = Sample::new(0.0, 0.0, Some(0.5), 0.0);
        let w0 = est.begin(&start);

        // 200 px in 1 ms: raw target would drop to the speed floor at once.
        let w1 = est.advance(&Sample::new(200.0, 0.0, Some(0.5), 1.0));
        let raw = target_width(10.0, 0.5, 200.0);
        assert!(w1 < w0);
        assert!(w1 > raw, "smoothed width {w1} should lag the raw target {raw}");
    }

    #[test]
    fn zero_dt_is_treated_as_one_ms() {
        let mut est = WidthEstimator::new(10.0);
        est.begin(&Sample::new(0.0, 0.0, None, 5.0));
        est.advance(&Sample::new(3.0, 4.0, None, 5.0));
        assert!((est.smoothed_speed() - 0.3 * 5.0).abs() < 1e-5);
    }
}
