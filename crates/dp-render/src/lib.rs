pub mod brush;
pub mod canvas;
pub mod eraser;
pub mod fade_timer;
pub mod surface;

pub use brush::WatercolorBrush;
pub use canvas::CanvasSurface;
pub use eraser::Eraser;
pub use fade_timer::{FadeTimer, OpacityHandle, TickOutcome};
pub use surface::{
    CompositeOp, EllipseShape, Fill, PixelBuffer, PixmapContext, RasterContext, Rgba, SurfaceError,
};
