//! Context
//!
//! Shared context state:
//! - Per-channel history, newest first
//! - Per-instance pending contexts for deliveries nobody was listening for

pub mod pending;
pub mod store;

pub use pending::{PendingContext, PendingContextQueue};
pub use store::ContextStore;
