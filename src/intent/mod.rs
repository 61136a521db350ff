//! Intents
//!
//! Intent routing and resolution:
//! - Pending intents queued for launching instances, with a time-to-live
//! - Resolution candidates and their ordering
//! - The two-phase resolver hand-off
//! - The router: candidate discovery and single/zero/multi-match policy

pub mod candidate;
pub mod pending;
pub mod resolution;
pub mod router;

pub use candidate::{IntentCandidates, ResolutionCandidate};
pub use pending::{PendingIntent, PendingIntentQueue};
pub use resolution::{IntentResolution, ResolutionHandle, ResolutionTable, ResolverSelection};
