//! Telemetry and logging infrastructure
//!
//! Structured logging with tracing, the host frame rate counter and the
//! warm-up profiler used by frame updates.

pub mod accumulator;
pub mod logging;
pub mod metrics;

pub use accumulator::{PerformanceAccumulator, PerformanceSummary, Phase, UpdateCounts};
pub use logging::{init_logging, LogConfig};
pub use metrics::{FrameProfiler, FrameStats};
