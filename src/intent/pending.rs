//! Pending intent queue.
//!
//! Intents raised against instances that have not yet registered a listener
//! for them, kept for a fixed time-to-live.

use crate::core::config::DEFAULT_PENDING_INTENT_TTL_MS;
use crate::core::types::drain_matching;
use crate::core::{now, Context, InstanceId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An intent waiting for its target to register a listener.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingIntent {
    /// Intent name
    pub intent: String,
    /// Context raised with the intent
    pub context: Option<Context>,
    /// Raising instance
    pub source: InstanceId,
    /// When the intent was raised
    pub timestamp: Timestamp,
}

impl PendingIntent {
    /// Create a pending intent stamped with the current time.
    pub fn new(intent: &str, context: Option<Context>, source: &str) -> Self {
        Self {
            intent: intent.to_string(),
            context,
            source: source.to_string(),
            timestamp: now(),
        }
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether the entry is still deliverable at `now`.
    pub fn is_live(&self, now: Timestamp, ttl: chrono::Duration) -> bool {
        now - self.timestamp < ttl
    }
}

/// Per-instance pending intents.
#[derive(Clone, Debug)]
pub struct PendingIntentQueue {
    queues: HashMap<InstanceId, Vec<PendingIntent>>,
    ttl: chrono::Duration,
}

impl PendingIntentQueue {
    /// Create a queue with the given time-to-live.
    pub fn new(ttl: chrono::Duration) -> Self {
        Self {
            queues: HashMap::new(),
            ttl,
        }
    }

    /// Time-to-live of queued entries.
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Queue an intent for an instance.
    pub fn enqueue(&mut self, instance_id: &str, pending: PendingIntent) {
        self.queues
            .entry(instance_id.to_string())
            .or_default()
            .push(pending);
    }

    /// Remove and return the entries for `intent` that are still live at `now`.
    ///
    /// Expired entries for that intent are dropped without being returned.
    pub fn drain_matching(&mut self, instance_id: &str, intent: &str, now: Timestamp) -> Vec<PendingIntent> {
        let Some(queue) = self.queues.get_mut(instance_id) else {
            return Vec::new();
        };
        let ttl = self.ttl;
        let matched = drain_matching(queue, |p| p.intent == intent);
        if queue.is_empty() {
            self.queues.remove(instance_id);
        }
        matched.into_iter().filter(|p| p.is_live(now, ttl)).collect()
    }

    /// Entries queued for an instance, oldest first.
    pub fn for_instance(&self, instance_id: &str) -> &[PendingIntent] {
        self.queues
            .get(instance_id)
            .map(|q| q.as_slice())
            .unwrap_or(&[])
    }

    /// Drop expired entries everywhere. Returns how many were removed.
    pub fn purge_expired(&mut self, now: Timestamp) -> usize {
        let ttl = self.ttl;
        let mut removed = 0;
        for queue in self.queues.values_mut() {
            removed += drain_matching(queue, |p| !p.is_live(now, ttl)).len();
        }
        self.queues.retain(|_, q| !q.is_empty());
        removed
    }

    /// Drop everything queued for an instance.
    pub fn clear(&mut self, instance_id: &str) {
        self.queues.remove(instance_id);
    }

    /// Total number of queued entries.
    pub fn len(&self) -> usize {
        self.queues.values().map(Vec::len).sum()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

impl Default for PendingIntentQueue {
    fn default() -> Self {
        Self::new(chrono::Duration::milliseconds(DEFAULT_PENDING_INTENT_TTL_MS as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: i64) -> chrono::Duration {
        chrono::Duration::milliseconds(n)
    }

    #[test]
    fn test_drain_before_expiry() {
        let t0 = now();
        let mut queue = PendingIntentQueue::default();
        queue.enqueue("a", PendingIntent::new("fdc3.ViewChart", None, "b").at(t0));

        let drained = queue.drain_matching("a", "fdc3.ViewChart", t0 + ms(119_999));
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].source, "b");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_expired_at_ttl_boundary() {
        let t0 = now();
        let mut queue = PendingIntentQueue::default();
        queue.enqueue("a", PendingIntent::new("fdc3.ViewChart", None, "b").at(t0));

        assert!(queue.drain_matching("a", "fdc3.ViewChart", t0 + ms(120_000)).is_empty());
        // Dropped, not retried.
        assert!(queue.is_empty());
        assert!(queue.drain_matching("a", "fdc3.ViewChart", t0).is_empty());
    }

    #[test]
    fn test_other_intents_stay_queued() {
        let t0 = now();
        let mut queue = PendingIntentQueue::default();
        queue.enqueue("a", PendingIntent::new("fdc3.ViewChart", None, "b").at(t0));
        queue.enqueue("a", PendingIntent::new("fdc3.ViewNews", None, "b").at(t0));
        queue.enqueue("a", PendingIntent::new("fdc3.ViewChart", None, "c").at(t0));

        let drained = queue.drain_matching("a", "fdc3.ViewChart", t0);
        let sources: Vec<&str> = drained.iter().map(|p| p.source.as_str()).collect();
        assert_eq!(sources, vec!["b", "c"]);
        assert_eq!(queue.for_instance("a").len(), 1);
        assert_eq!(queue.for_instance("a")[0].intent, "fdc3.ViewNews");
    }

    #[test]
    fn test_purge_expired() {
        let t0 = now();
        let mut queue = PendingIntentQueue::new(ms(1_000));
        queue.enqueue("a", PendingIntent::new("x", None, "b").at(t0));
        queue.enqueue("b", PendingIntent::new("x", None, "a").at(t0 + ms(900)));

        assert_eq!(queue.purge_expired(t0 + ms(1_000)), 1);
        assert_eq!(queue.len(), 1);
        assert!(queue.for_instance("a").is_empty());
    }

    #[test]
    fn test_clear() {
        let mut queue = PendingIntentQueue::default();
        queue.enqueue("a", PendingIntent::new("x", None, "b"));
        queue.clear("a");
        assert!(queue.is_empty());
    }
}
