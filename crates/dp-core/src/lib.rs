pub mod clock;
pub mod config;
pub mod fade;
pub mod model;
pub mod storage;
pub mod streak;
pub mod width;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BrushConfig, DriftpadConfig, FadeConfig, SurfaceConfig};
pub use model::*;
pub use storage::{KeyValueStore, MemoryStore, StoreError};
pub use streak::{StreakStats, StreakTracker};
pub use width::WidthEstimator;
