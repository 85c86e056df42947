pub mod input;
pub mod pad;
pub mod scheduler;
pub mod telemetry;
pub mod tools;

pub use input::{
    ClientRect, InputSampler, PointerKind, PointerSource, RawPointerEvent, StrokeEvent,
    StrokeState, SurfaceGeometry,
};
pub use pad::{Driftpad, PollOutcome};
pub use telemetry::{LogTelemetry, NoopTelemetry, TelemetrySink};
pub use tools::ToolBelt;
