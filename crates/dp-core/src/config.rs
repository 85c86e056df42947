//! Tunable constants for the brush, fade timer and surface.
//!
//! Every field has a default matching the shipping pad; a host may override
//! any subset from JSON (`{"fade": {"durationMs": 7200000}}`).

use serde::{Deserialize, Serialize};

// ─── Brush ────────────────────────────────────────────────────────────────

/// Watercolor brush parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrushConfig {
    /// Base brush size in CSS px. Default: **10**.
    pub size: f32,
    /// Clamp range for `set_size`.
    pub min_size: f32,
    pub max_size: f32,
    /// How readily fresh ink blends with neighbours. Default: **0.3**.
    pub wetness: f32,
    /// Ink flow recorded on each drop. Default: **0.4**.
    pub flow: f32,
    /// Capacity of the wet-drop buffer used for blending. Default: **8**.
    pub max_wet_drops: usize,
    /// Drops older than this are dry and never blend. Default: **4000 ms**.
    pub dry_time_ms: f64,
    /// Neighbour search radius for wet-on-wet blending. Default: **20 px**.
    pub blend_radius: f32,
    /// Blend comparisons per new drop. Default: **4**.
    pub max_blends: usize,
    /// Blends weaker than this are skipped. Default: **0.02**.
    pub blend_threshold: f32,
    /// Drops with less pressure than this are invisible. Default: **0.02**.
    pub min_visible_pressure: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            size: 10.0,
            min_size: 1.0,
            max_size: 40.0,
            wetness: 0.3,
            flow: 0.4,
            max_wet_drops: 8,
            dry_time_ms: 4000.0,
            blend_radius: 20.0,
            max_blends: 4,
            blend_threshold: 0.02,
            min_visible_pressure: 0.02,
        }
    }
}

// ─── Fade ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FadeConfig {
    /// Time from first stroke to the "Memory" floor. Default: **60 s**.
    pub duration_ms: f64,
    /// Re-composite cadence. Default: **500 ms**.
    pub tick_interval_ms: f64,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            duration_ms: 60_000.0,
            tick_interval_ms: 500.0,
        }
    }
}

// ─── Surface ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurfaceConfig {
    /// Resize requests closer together than this are coalesced. Default: **150 ms**.
    pub resize_debounce_ms: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 150.0,
        }
    }
}

// ─── Aggregate ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftpadConfig {
    pub brush: BrushConfig,
    pub fade: FadeConfig,
    pub surface: SurfaceConfig,
}

impl DriftpadConfig {
    /// Parse a (possibly partial) JSON override on top of the defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(json).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the engines misbehave.
    pub fn validate(&self) -> Result<(), String> {
        let b = &self.brush;
        if !(b.min_size > 0.0 && b.min_size <= b.max_size) {
            return Err(format!(
                "brush size range [{}, {}] is invalid",
                b.min_size, b.max_size
            ));
        }
        if !(b.blend_radius > 0.0) {
            return Err("brush.blendRadius must be positive".to_string());
        }
        if b.max_wet_drops == 0 {
            return Err("brush.maxWetDrops must be at least 1".to_string());
        }
        if !(self.fade.duration_ms > 0.0) {
            return Err("fade.durationMs must be positive".to_string());
        }
        if !(self.fade.tick_interval_ms > 0.0) {
            return Err("fade.tickIntervalMs must be positive".to_string());
        }
        if !(self.surface.resize_debounce_ms >= 0.0) {
            return Err("surface.resizeDebounceMs must not be negative".to_string());
        }
        Ok(())
    }
}
