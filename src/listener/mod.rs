//! Listeners
//!
//! Context and intent listener registrations and the matching rules used by
//! broadcast and intent routing.

pub mod registry;

pub use registry::{ContextListenerOptions, IntentListenerMatch, Listener, ListenerRegistry};
