//! Core utilities and common types for the broker.

pub mod config;
pub mod error;
pub mod types;

pub use config::BrokerConfig;
pub use error::{Error, Result};
pub use types::*;
