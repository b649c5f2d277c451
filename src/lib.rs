pub mod context;
pub mod environment;
pub mod error;
pub mod logging;
pub mod options;
pub mod service;
pub mod stats;

pub use context::{Context, ContextBuilder};
pub use environment::{Environment, SAMPLE_INTERVAL};
pub use error::{Error, Result};
pub use logging::{BufferSink, LogLevel, LogSink, Logger, StdoutSink, Verbosity};
pub use options::Options;
pub use service::{exec, run_loop, send_signal, start, start_ctx, ControlEvent, Signal, Worker};
pub use stats::{MemoryStats, ProcStatsProvider, RuntimeStats, StatsProvider};
