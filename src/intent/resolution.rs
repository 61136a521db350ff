//! Intent resolution results and the outstanding resolver hand-offs.
//!
//! A multi-candidate raise is split in two phases: `ResolutionTable::begin`
//! registers the request under a fresh correlation id and hands the caller a
//! `ResolutionHandle`; the host later reports the user's pick, which the
//! router completes through `ResolutionTable::take`.

use crate::core::{Context, Error, InstanceId, Result};
use crate::directory::AppMetadata;
use crate::intent::{IntentCandidates, ResolutionCandidate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Result of a routed intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentResolution {
    /// The raising application
    pub source: AppMetadata,
    /// FDC3 version
    pub version: String,
}

/// The user's pick in the resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverSelection {
    /// Selected candidate
    pub candidate: ResolutionCandidate,
    /// Selected intent, for requests that did not name one
    #[serde(default)]
    pub intent: Option<String>,
}

impl ResolverSelection {
    /// Select a candidate.
    pub fn new(candidate: ResolutionCandidate) -> Self {
        Self {
            candidate,
            intent: None,
        }
    }

    /// Select the intent as well.
    pub fn with_intent(mut self, intent: &str) -> Self {
        self.intent = Some(intent.to_string());
        self
    }
}

/// Awaitable result of a suspended resolution.
#[derive(Debug)]
pub struct ResolutionHandle {
    correlation_id: String,
    rx: oneshot::Receiver<Result<IntentResolution>>,
    timeout: Option<Duration>,
}

impl ResolutionHandle {
    /// Correlation id the resolver was shown with.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Wait for the host to report a selection.
    ///
    /// Fails with `ResolutionCancelled` when the resolution is dropped and
    /// with `ResolutionTimedOut` when a timeout was configured and expires.
    pub async fn wait(self) -> Result<IntentResolution> {
        let received = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.rx)
                .await
                .map_err(|_| Error::ResolutionTimedOut(timeout.as_millis() as u64))?,
            None => self.rx.await,
        };
        received.unwrap_or_else(|_| Err(Error::ResolutionCancelled))
    }
}

/// A raise suspended on the resolver.
#[derive(Debug)]
pub struct OutstandingResolution {
    /// Raising instance
    pub source: InstanceId,
    /// Intent named by the request
    pub intent: Option<String>,
    /// Raised context
    pub context: Option<Context>,
    /// Candidates grouped by intent, when the request named no intent
    pub by_intent: Vec<IntentCandidates>,
    responder: oneshot::Sender<Result<IntentResolution>>,
}

impl OutstandingResolution {
    /// Whether the caller stopped waiting.
    pub fn is_abandoned(&self) -> bool {
        self.responder.is_closed()
    }

    /// Hand the outcome to the waiting caller. Returns `false` if nobody is
    /// waiting any more.
    pub fn complete(self, result: Result<IntentResolution>) -> bool {
        self.responder.send(result).is_ok()
    }
}

/// Outstanding resolutions keyed by correlation id.
#[derive(Debug, Default)]
pub struct ResolutionTable {
    outstanding: HashMap<String, OutstandingResolution>,
}

impl ResolutionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a suspended request and return the caller's handle.
    pub fn begin(
        &mut self,
        source: &str,
        intent: Option<String>,
        context: Option<Context>,
        by_intent: Vec<IntentCandidates>,
        timeout: Option<Duration>,
    ) -> ResolutionHandle {
        let correlation_id = format!("resolveIntent-{}", Uuid::new_v4());
        let (tx, rx) = oneshot::channel();
        self.outstanding.insert(
            correlation_id.clone(),
            OutstandingResolution {
                source: source.to_string(),
                intent,
                context,
                by_intent,
                responder: tx,
            },
        );
        ResolutionHandle {
            correlation_id,
            rx,
            timeout,
        }
    }

    /// Remove a resolution for completion. Each id can be taken once.
    pub fn take(&mut self, correlation_id: &str) -> Result<OutstandingResolution> {
        self.outstanding
            .remove(correlation_id)
            .ok_or_else(|| Error::ResolutionNotFound(correlation_id.to_string()))
    }

    /// Drop a resolution; its caller observes `ResolutionCancelled`.
    pub fn cancel(&mut self, correlation_id: &str) -> Result<()> {
        self.take(correlation_id).map(drop)
    }

    /// Drop every resolution raised by an instance.
    pub fn cancel_for_source(&mut self, source: &str) -> usize {
        let before = self.outstanding.len();
        self.outstanding.retain(|_, r| r.source != source);
        before - self.outstanding.len()
    }

    /// Drop resolutions whose callers stopped waiting.
    pub fn purge_abandoned(&mut self) -> usize {
        let before = self.outstanding.len();
        self.outstanding.retain(|_, r| !r.is_abandoned());
        before - self.outstanding.len()
    }

    /// Whether a correlation id is outstanding.
    pub fn contains(&self, correlation_id: &str) -> bool {
        self.outstanding.contains_key(correlation_id)
    }

    /// Number of outstanding resolutions.
    pub fn len(&self) -> usize {
        self.outstanding.len()
    }

    /// Whether nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }
}
