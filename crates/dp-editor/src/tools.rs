//! Tool selection.
//!
//! The pad has two tools sharing one size picker. A preset maps to a
//! different width per tool, so switching tools with `M` selected gives a
//! 6 px brush or a 12 px eraser.

use dp_core::model::{SizePreset, ToolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToolBelt {
    tool: ToolKind,
    preset: SizePreset,
}

impl ToolBelt {
    pub fn new(tool: ToolKind, preset: SizePreset) -> Self {
        Self { tool, preset }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn preset(&self) -> SizePreset {
        self.preset
    }

    /// Returns `true` if the tool changed.
    pub fn set_tool(&mut self, tool: ToolKind) -> bool {
        let changed = self.tool != tool;
        self.tool = tool;
        changed
    }

    pub fn toggle(&mut self) -> ToolKind {
        self.tool = self.tool.toggled();
        self.tool
    }

    pub fn set_preset(&mut self, preset: SizePreset) {
        self.preset = preset;
    }

    /// Stroke width for the active tool: the width estimator's maximum.
    pub fn width(&self) -> f32 {
        self.preset.width_for(self.tool)
    }

    /// Brush size for the current preset, whichever tool is active.
    pub fn brush_width(&self) -> f32 {
        self.preset.width_for(ToolKind::Brush)
    }

    /// Diameter of the on-screen cursor ring.
    pub fn cursor_diameter(&self) -> f32 {
        self.width().max(8.0)
    }
}
