//! Monitoring
//!
//! Structured logging setup for the broker.

pub mod logging;

pub use logging::{init_logging, LogFormat, LogLevel, LoggerConfig};
