//! Pending contexts.
//!
//! Contexts queued against an instance because nothing on it was listening
//! when they were sent. Consumed by the first matching listener added later.

use crate::core::types::drain_matching;
use crate::core::{Context, InstanceId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A context waiting for a listener.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingContext {
    /// The context
    pub context: Context,
    /// Instance that sent it (none when produced by a channel join)
    pub source: Option<InstanceId>,
    /// Channel it was broadcast on; none for direct sends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

impl PendingContext {
    /// Create a pending context.
    pub fn new(context: Context, source: Option<&str>) -> Self {
        Self {
            context,
            source: source.map(str::to_string),
            channel: None,
        }
    }

    /// Mark the context as coming from a channel.
    pub fn with_channel(mut self, channel: &str) -> Self {
        self.channel = Some(channel.to_string());
        self
    }
}

/// Per-instance queues of pending contexts, oldest first.
#[derive(Clone, Debug, Default)]
pub struct PendingContextQueue {
    queues: HashMap<InstanceId, Vec<PendingContext>>,
}

impl PendingContextQueue {
    /// Create an empty queue set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a context for an instance.
    ///
    /// A channel context replaces any older one queued from the same channel.
    pub fn push(&mut self, instance_id: &str, pending: PendingContext) {
        let queue = self.queues.entry(instance_id.to_string()).or_default();
        if let Some(channel) = pending.channel.as_deref() {
            queue.retain(|p| p.channel.as_deref() != Some(channel));
        }
        queue.push(pending);
    }

    /// Pending contexts for an instance, oldest first.
    pub fn for_instance(&self, instance_id: &str) -> &[PendingContext] {
        self.queues
            .get(instance_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Remove the entry at `index`.
    pub fn consume(&mut self, instance_id: &str, index: usize) -> Option<PendingContext> {
        let queue = self.queues.get_mut(instance_id)?;
        if index < queue.len() {
            Some(queue.remove(index))
        } else {
            None
        }
    }

    /// Remove and return every entry matching `pred`, oldest first.
    pub fn take_matching(
        &mut self,
        instance_id: &str,
        pred: impl FnMut(&PendingContext) -> bool,
    ) -> Vec<PendingContext> {
        match self.queues.get_mut(instance_id) {
            Some(queue) => drain_matching(queue, pred),
            None => Vec::new(),
        }
    }

    /// Drop everything queued for an instance.
    pub fn clear(&mut self, instance_id: &str) {
        self.queues.remove(instance_id);
    }

    /// Total queued entries across all instances.
    pub fn len(&self) -> usize {
        self.queues.values().map(Vec::len).sum()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
