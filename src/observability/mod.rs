//! Observability module
//!
//! Logging, metrics, and structured event infrastructure for monitoring
//! the analyzer while it reads a log.

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{Event, EventEmitter, SessionMode};
pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
