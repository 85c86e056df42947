//! Optional usage telemetry.
//!
//! The pad reports a handful of interaction events to whatever sink the
//! host supplies. Every method has an empty default, so a sink implements
//! only what it cares about and [`NoopTelemetry`] implements nothing.

use dp_core::model::ToolKind;

pub trait TelemetrySink {
    /// A stroke ended. `stroke_count` counts strokes since the last clear.
    fn stroke_completed(&self, _duration_ms: f64, _stroke_count: u32) {}

    fn tool_changed(&self, _tool: ToolKind) {}

    /// The raster was wiped by the user or a prompt change.
    fn cleared(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {}

/// Sink that writes events to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn stroke_completed(&self, duration_ms: f64, stroke_count: u32) {
        log::debug!("stroke #{stroke_count} completed in {duration_ms:.0}ms");
    }

    fn tool_changed(&self, tool: ToolKind) {
        log::debug!("tool changed to {}", tool.name());
    }

    fn cleared(&self) {
        log::debug!("canvas cleared");
    }
}
