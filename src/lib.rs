//! # fdc3-broker - FDC3 desktop agent interop core
//!
//! Brokers context and intents between application instances:
//! - **Channels**: system and app channels with per-channel context history
//! - **Listeners**: channel, point-to-point and intent listeners
//! - **Intents**: candidate discovery over live listeners and the app
//!   directory, with a resolver hand-off when several handlers qualify
//!
//! Rendering, window management and the resolver picker stay with the host
//! and are reached through the collaborator traits in [`host`] and
//! [`directory`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fdc3_broker::core::Context;
//! use fdc3_broker::{Broker, BrokerConfig, BrokerService, Collaborators, Command};
//!
//! async fn run(collaborators: Collaborators) -> fdc3_broker::Result<()> {
//!     let broker = Broker::new(BrokerConfig::default(), collaborators);
//!     let handle = BrokerService::spawn(broker);
//!
//!     handle.apply(Command::join("app-1", "red")).await?;
//!     handle
//!         .apply(Command::broadcast("app-1", "red", Context::new("fdc3.instrument")))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod broker;
pub mod channel;
pub mod context;
pub mod core;
pub mod directory;
pub mod host;
pub mod intent;
pub mod listener;
pub mod monitoring;

#[cfg(test)]
mod testing;

pub use broker::{Broker, BrokerHandle, BrokerService, Collaborators, Command, Outcome};
pub use core::config::BrokerConfig;
pub use core::error::{Error, Result};
pub use directory::AppDirectory;
pub use host::{InstanceHost, ResolverUi, WorkspaceHost};
