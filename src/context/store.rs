//! Context store.
//!
//! Per-channel history of broadcast contexts, newest first, plus the
//! per-instance pending-context queues.

use crate::context::pending::{PendingContext, PendingContextQueue};
use crate::core::{Context, DEFAULT_CHANNEL};
use std::collections::{HashMap, VecDeque};

/// Channel histories and pending contexts.
#[derive(Clone, Debug, Default)]
pub struct ContextStore {
    /// History per channel id; the front is the current context
    histories: HashMap<String, VecDeque<Context>>,
    /// Contexts waiting for listeners
    pending: PendingContextQueue,
    /// Optional history cap
    history_limit: Option<usize>,
}

impl ContextStore {
    /// Create a store with an optional history cap.
    pub fn new(history_limit: Option<usize>) -> Self {
        Self {
            histories: HashMap::new(),
            pending: PendingContextQueue::new(),
            history_limit,
        }
    }

    /// Allocate an empty history for a channel if it has none.
    pub fn ensure_channel(&mut self, channel: &str) {
        if channel != DEFAULT_CHANNEL {
            self.histories.entry(channel.to_string()).or_default();
        }
    }

    /// Whether a history exists for a channel.
    pub fn has_channel(&self, channel: &str) -> bool {
        self.histories.contains_key(channel)
    }

    /// The current context on a channel.
    ///
    /// Without a type filter this is the history head. With one, the history
    /// is scanned newest first and the first context of that type is returned.
    pub fn current_context(&self, channel: &str, context_type: Option<&str>) -> Option<&Context> {
        let history = self.histories.get(channel)?;
        match context_type {
            None => history.front(),
            Some(t) => history.iter().find(|c| c.context_type == t),
        }
    }

    /// Full history of a channel, newest first.
    pub fn history(&self, channel: &str) -> Vec<&Context> {
        self.histories
            .get(channel)
            .map(|h| h.iter().collect())
            .unwrap_or_default()
    }

    /// Prepend a context to a channel history.
    ///
    /// Returns `false` (and stores nothing) for the default channel.
    pub fn broadcast(&mut self, channel: &str, context: Context) -> bool {
        if channel == DEFAULT_CHANNEL {
            return false;
        }
        let history = self.histories.entry(channel.to_string()).or_default();
        history.push_front(context);
        if let Some(limit) = self.history_limit {
            history.truncate(limit);
        }
        true
    }

    /// Queue a context for an instance.
    pub fn push_pending(&mut self, instance_id: &str, pending: PendingContext) {
        self.pending.push(instance_id, pending);
    }

    /// Pending contexts for an instance, oldest first.
    pub fn pending_contexts_for(&self, instance_id: &str) -> &[PendingContext] {
        self.pending.for_instance(instance_id)
    }

    /// Remove a pending context by position.
    pub fn consume_pending_context(&mut self, instance_id: &str, index: usize) -> Option<PendingContext> {
        self.pending.consume(instance_id, index)
    }

    /// Remove and return every pending context on an instance matching `pred`.
    pub fn take_pending_matching(
        &mut self,
        instance_id: &str,
        pred: impl FnMut(&PendingContext) -> bool,
    ) -> Vec<PendingContext> {
        self.pending.take_matching(instance_id, pred)
    }

    /// Drop everything queued for an instance.
    pub fn clear_instance(&mut self, instance_id: &str) {
        self.pending.clear(instance_id);
    }
}
