//! Channels
//!
//! Named context sharing scopes:
//! - System channels, preconfigured and immutable
//! - App channels, created on first reference

pub mod registry;

pub use registry::{default_system_channels, Channel, ChannelKind, ChannelRegistry, DisplayMetadata};
