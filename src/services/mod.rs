pub mod charts;
pub mod encoding;
pub mod file_processor;
pub mod pipeline;
pub mod profiler;
pub mod session;
pub mod stats;
pub mod utils;

pub use charts::{ChartKind, ChartManifest, ChartStore};
pub use session::{Dataset, SessionStore};
