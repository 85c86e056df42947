//! Staged fade curve: elapsed time → global ink opacity.
//!
//! Six named checkpoints step the opacity from 1.0 down to a 0.5 floor.
//! Between checkpoints the value is eased, so the drawing ages smoothly
//! rather than in visible jumps. The curve never reaches zero: a finished
//! fade leaves a permanent "memory" of the drawing.

/// One checkpoint of the fade curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeStage {
    /// Progress in `[0, 1]` at which this stage begins.
    pub at: f32,
    pub opacity: f32,
    pub name: &'static str,
}

pub const FADE_STAGES: [FadeStage; 6] = [
    FadeStage { at: 0.0, opacity: 1.0, name: "Fresh" },
    FadeStage { at: 0.2, opacity: 0.9, name: "Settling" },
    FadeStage { at: 0.4, opacity: 0.8, name: "Drying" },
    FadeStage { at: 0.6, opacity: 0.7, name: "Fading" },
    FadeStage { at: 0.8, opacity: 0.6, name: "Pale" },
    FadeStage { at: 1.0, opacity: 0.5, name: "Memory" },
];

/// Opacity held once the fade completes.
pub const FLOOR_OPACITY: f32 = 0.5;

/// Quadratic ease-in-out on `[0, 1]`.
pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// Fraction of the fade elapsed, clamped to `[0, 1]`.
pub fn progress(elapsed_ms: f64, duration_ms: f64) -> f32 {
    if !(duration_ms > 0.0) || !elapsed_ms.is_finite() {
        return if elapsed_ms > 0.0 { 1.0 } else { 0.0 };
    }
    (elapsed_ms / duration_ms).clamp(0.0, 1.0) as f32
}

/// Opacity at `progress`, eased within the surrounding segment.
pub fn opacity_at(progress: f32) -> f32 {
    let p = if progress.is_finite() { progress.clamp(0.0, 1.0) } else { 1.0 };

    for pair in FADE_STAGES.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if p >= from.at && p <= to.at {
            let local = (p - from.at) / (to.at - from.at);
            return from.opacity + (to.opacity - from.opacity) * ease_in_out(local);
        }
    }
    FLOOR_OPACITY
}

/// The last stage whose checkpoint has been reached.
pub fn stage_at(progress: f32) -> &'static FadeStage {
    FADE_STAGES
        .iter()
        .rev()
        .find(|stage| progress >= stage.at)
        .unwrap_or(&FADE_STAGES[0])
}

/// Human-readable countdown: `"1h 5m"`, `"2m 30s"` or `"45s"`.
pub fn format_remaining(remaining_ms: f64) -> String {
    let total_secs = (remaining_ms.max(0.0) / 1000.0).floor() as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
