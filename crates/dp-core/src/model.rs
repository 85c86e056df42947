//! Core data model for Driftpad drawings.
//!
//! Everything here is plain data: pointer samples, rendered paint drops,
//! ink colours, tool selection and the persisted fade-timer record.
//! Rendering and timing live in `dp-render`; this crate only describes
//! *what* is drawn.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Colors ──────────────────────────────────────────────────────────────

/// Opaque sRGB ink colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `#RGB`. The leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::new(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = hex_val(bytes[0])? << 4 | hex_val(bytes[1])?;
                let g = hex_val(bytes[2])? << 4 | hex_val(bytes[3])?;
                let b = hex_val(bytes[4])? << 4 | hex_val(bytes[5])?;
                Some(Self::new(r, g, b))
            }
            _ => None,
        }
    }

    /// Format as lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Linear per-channel mix: `ratio = 0` is `self`, `ratio = 1` is `other`.
    pub fn mix(self, other: Rgb, ratio: f32) -> Rgb {
        let ratio = ratio.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| {
            let v = a as f32 + (b as f32 - a as f32) * ratio;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(lerp(self.r, other.r), lerp(self.g, other.g), lerp(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The five sumi-ink tones offered by the palette, darkest first.
pub const INK_PALETTE: [Rgb; 5] = [
    Rgb::new(0x00, 0x00, 0x00), // 100% black
    Rgb::new(0x33, 0x33, 0x33), // 80%
    Rgb::new(0x66, 0x66, 0x66), // 60%
    Rgb::new(0x99, 0x99, 0x99), // 40%
    Rgb::new(0xE6, 0xE6, 0xE6), // 10%
];

// ─── Samples & drops ─────────────────────────────────────────────────────

/// Pressure reported for devices that do not measure it (mouse, most touch).
pub const DEFAULT_PRESSURE: f32 = 0.5;

/// One observed pointer position in canvas-local CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    /// Normalized to `[0, 1]`.
    pub pressure: f32,
    pub timestamp_ms: f64,
}

impl Sample {
    pub fn new(x: f32, y: f32, pressure: Option<f32>, timestamp_ms: f64) -> Self {
        Self {
            x,
            y,
            pressure: normalize_pressure(pressure),
            timestamp_ms,
        }
    }

    /// Same sample nudged by `(dx, dy)`; used to force a visible tap dot.
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Missing, zero or garbage pressure becomes [`DEFAULT_PRESSURE`].
pub fn normalize_pressure(pressure: Option<f32>) -> f32 {
    match pressure {
        Some(p) if p.is_finite() && p > 0.0 => p.min(1.0),
        _ => DEFAULT_PRESSURE,
    }
}

/// The atomic unit of rendered ink.
///
/// Created for every sample and every interpolated sub-step, never mutated
/// afterwards. The raster is the permanent record; drops only linger in the
/// brush's wet buffer long enough to blend with their neighbours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintDrop {
    pub x: f32,
    pub y: f32,
    pub color: Rgb,
    pub size: f32,
    pub opacity: f32,
    pub wetness: f32,
    pub flow: f32,
    pub pressure: f32,
    pub pressure_multiplier: f32,
    pub created_at_ms: f64,
}

impl PaintDrop {
    pub fn distance_to(&self, other: &PaintDrop) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether every geometric and alpha field is drawable.
    pub fn is_renderable(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.size.is_finite()
            && self.size > 0.0
            && self.opacity.is_finite()
            && self.opacity > 0.0
    }
}

// ─── Tools ───────────────────────────────────────────────────────────────

/// The active tool decides whether samples add ink or remove it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Brush,
    Eraser,
}

impl ToolKind {
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Brush => "brush",
            ToolKind::Eraser => "eraser",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "brush" => Some(ToolKind::Brush),
            "eraser" => Some(ToolKind::Eraser),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ToolKind::Brush => ToolKind::Eraser,
            ToolKind::Eraser => ToolKind::Brush,
        }
    }
}

/// Size buttons in the toolbar. Each tool maps a preset to its own width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizePreset {
    S,
    #[default]
    M,
    L,
    XL,
}

impl SizePreset {
    /// Width in CSS pixels for the given tool.
    pub fn width_for(self, tool: ToolKind) -> f32 {
        match (tool, self) {
            (ToolKind::Brush, SizePreset::S) => 2.0,
            (ToolKind::Brush, SizePreset::M) => 6.0,
            (ToolKind::Brush, SizePreset::L) => 12.0,
            (ToolKind::Brush, SizePreset::XL) => 20.0,
            (ToolKind::Eraser, SizePreset::S) => 4.0,
            (ToolKind::Eraser, SizePreset::M) => 12.0,
            (ToolKind::Eraser, SizePreset::L) => 24.0,
            (ToolKind::Eraser, SizePreset::XL) => 40.0,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "S" | "s" => Some(SizePreset::S),
            "M" | "m" => Some(SizePreset::M),
            "L" | "l" => Some(SizePreset::L),
            "XL" | "xl" => Some(SizePreset::XL),
            _ => None,
        }
    }
}

// ─── Fade timer record ───────────────────────────────────────────────────

/// Persisted fade-timer record.
///
/// Invariant: `is_active` implies `start_time_ms.is_some()`. The constructors
/// uphold it; [`FadeTimerState::is_consistent`] checks records read back from
/// storage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FadeTimerState {
    #[serde(rename = "startTime")]
    pub start_time_ms: Option<f64>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

impl FadeTimerState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn fading(start_time_ms: f64) -> Self {
        Self {
            start_time_ms: Some(start_time_ms),
            is_active: true,
        }
    }

    pub fn is_consistent(&self) -> bool {
        !self.is_active || self.start_time_ms.is_some_and(f64::is_finite)
    }

    /// Start time of an active, well-formed record.
    pub fn active_start(&self) -> Option<f64> {
        if self.is_active && self.is_consistent() {
            self.start_time_ms
        } else {
            None
        }
    }
}
