//! Stroke scripts: a JSON description of a drawing session.
//!
//! ```json
//! {
//!   "width": 320, "height": 200, "dpr": 2,
//!   "config": { "fade": { "durationMs": 10000 } },
//!   "strokes": [
//!     { "tool": "brush", "color": 1, "size": "L",
//!       "points": [[20, 100, 0.6, 0], [60, 90, 0.8, 16], [100, 100, 0.7, 32]] }
//!   ],
//!   "fadeAfterMs": 5000
//! }
//! ```
//!
//! Point times are milliseconds from the start of the session.

use dp_core::clock::{Clock, ManualClock};
use dp_core::config::DriftpadConfig;
use dp_core::model::{SizePreset, ToolKind};
use dp_core::storage::MemoryStore;
use dp_editor::input::{PointerKind, PointerSource, RawPointerEvent};
use dp_editor::pad::Driftpad;
use dp_render::surface::{PixmapContext, SurfaceError};
use serde::Deserialize;
use std::rc::Rc;

/// Session epoch; any fixed value works, the fade only sees differences.
const EPOCH_MS: f64 = 1_700_000_000_000.0;

fn default_dpr() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_dpr")]
    pub dpr: f32,
    #[serde(default)]
    pub config: DriftpadConfig,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub strokes: Vec<ScriptStroke>,
    /// Let the fade run this long after the last point.
    #[serde(default)]
    pub fade_after_ms: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptStroke {
    #[serde(default)]
    pub tool: ToolKind,
    #[serde(default)]
    pub color: Option<usize>,
    #[serde(default)]
    pub size: Option<SizePreset>,
    /// `[x, y, pressure, t]`; a pressure of 0 means "not reported".
    pub points: Vec<[f64; 4]>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, String> {
        let script: Self = serde_json::from_str(json).map_err(|e| e.to_string())?;
        script.config.validate()?;
        if !(script.width >= 1.0 && script.height >= 1.0) {
            return Err(format!("canvas {}x{} is too small", script.width, script.height));
        }
        Ok(script)
    }

    /// Play the script on a software raster.
    pub fn replay(&self) -> Result<Driftpad<PixmapContext>, SurfaceError> {
        let clock = Rc::new(ManualClock::new(EPOCH_MS));
        let mut pad = Driftpad::new(
            PixmapContext::new(1, 1)?,
            self.width,
            self.height,
            self.dpr,
            self.config.clone(),
            clock.clone(),
            Rc::new(MemoryStore::new()),
        )?
        .with_seed(self.seed);

        for (i, stroke) in self.strokes.iter().enumerate() {
            pad.set_tool(stroke.tool);
            if let Some(index) = stroke.color
                && !pad.set_color(index)
            {
                log::warn!("stroke {i}: colour index {index} is out of range");
            }
            if let Some(preset) = stroke.size {
                pad.set_size_preset(preset);
            }

            let last = stroke.points.len().saturating_sub(1);
            for (j, &[x, y, pressure, t]) in stroke.points.iter().enumerate() {
                advance_to(&clock, &mut pad, EPOCH_MS + t);
                let kind = if j == 0 { PointerKind::Down } else { PointerKind::Move };
                pad.handle_event(&event(kind, x, y, pressure, t));
                if j == last {
                    pad.handle_event(&event(PointerKind::Up, x, y, pressure, t));
                }
            }
            log::debug!("stroke {i}: {} points with {}", stroke.points.len(), stroke.tool.name());
        }

        if let Some(ms) = self.fade_after_ms {
            let until = clock.now_ms() + ms.max(0.0);
            advance_to(&clock, &mut pad, until);
        }
        Ok(pad)
    }
}

fn event(kind: PointerKind, x: f64, y: f64, pressure: f64, t: f64) -> RawPointerEvent {
    RawPointerEvent {
        source: PointerSource::Pointer,
        kind,
        client_x: x as f32,
        client_y: y as f32,
        pressure: (pressure > 0.0).then_some(pressure as f32),
        time_stamp: t,
    }
}

/// Move the clock forward to `target`, stopping at every moment the pad has
/// work due so fade ticks and resizes land where a host timer would fire.
fn advance_to(clock: &ManualClock, pad: &mut Driftpad<PixmapContext>, target: f64) {
    while let Some(due) = pad.next_due_ms()
        && due <= target
    {
        clock.set(due.max(clock.now_ms()));
        pad.poll();
    }
    if target > clock.now_ms() {
        clock.set(target);
    }
    pad.poll();
}
