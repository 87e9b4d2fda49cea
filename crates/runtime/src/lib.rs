//! Engine runtime: subsystem assembly, background cadences and the
//! tracing event sink.

mod engine;
mod sink;
mod tasks;

pub use engine::{AdaptiveEngine, EngineStatus};
pub use sink::LogEventSink;
pub use tasks::{spawn_periodic, TaskHandle};
