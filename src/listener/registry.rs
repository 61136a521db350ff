//! Listener registry.
//!
//! Tracks context and intent listeners in registration order. Every
//! listener sits in exactly one instance's list (its owner); point-to-point
//! listeners additionally name the instance that receives what they match.

use crate::core::{InstanceId, DEFAULT_CHANNEL};
use serde::{Deserialize, Serialize};

/// A registered listener.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    /// Listener id chosen by the registering instance
    pub listener_id: String,
    /// Instance whose list holds the listener
    pub instance_id: InstanceId,
    /// Conduit instance for point-to-point listeners
    pub recipient: Option<InstanceId>,
    /// Context type filter (none = all types)
    pub context_type: Option<String>,
    /// Channel resolved at registration (channel-scoped listeners only)
    pub channel: Option<String>,
    /// Whether the listener was registered for a non-default channel
    pub is_channel: bool,
    /// Intent name (intent listeners only)
    pub intent: Option<String>,
}

impl Listener {
    /// Whether this is an intent listener.
    pub fn is_intent(&self) -> bool {
        self.intent.is_some()
    }

    /// Whether this is a point-to-point context listener.
    pub fn is_direct(&self) -> bool {
        self.recipient.is_some()
    }

    /// Instance that receives deliveries for this listener.
    pub fn delivers_to(&self) -> &str {
        self.recipient.as_deref().unwrap_or(&self.instance_id)
    }

    /// Whether a context type passes this listener's filter.
    pub fn accepts_type(&self, context_type: &str) -> bool {
        self.context_type.as_deref().map_or(true, |t| t == context_type)
    }

    /// Channel the listener matches on, given its owner's current channel.
    ///
    /// A listener resolved to `default` follows its instance's membership.
    pub fn effective_channel<'a>(&'a self, instance_channel: &'a str) -> &'a str {
        match self.channel.as_deref() {
            Some(c) if c != DEFAULT_CHANNEL => c,
            _ => instance_channel,
        }
    }
}

/// Options for a context listener registration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextListenerOptions {
    /// Only match this context type
    pub context_type: Option<String>,
    /// Listen on this channel instead of the instance's current one
    pub channel: Option<String>,
    /// Listen to contexts sent directly to this instance
    pub target_instance: Option<InstanceId>,
}

/// A matched intent listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentListenerMatch {
    /// Owning instance
    pub instance_id: InstanceId,
    /// Listener id
    pub listener_id: String,
}

/// Registry of all listeners.
#[derive(Clone, Debug, Default)]
pub struct ListenerRegistry {
    listeners: Vec<Listener>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context listener for `instance_id`.
    ///
    /// Channel-scoped listeners resolve their channel now: the requested
    /// channel, else `current_channel`. Point-to-point listeners are stored
    /// on the target instance with the caller as recipient.
    pub fn add_context_listener(
        &mut self,
        instance_id: &str,
        listener_id: &str,
        options: &ContextListenerOptions,
        current_channel: &str,
    ) -> Listener {
        let listener = match options.target_instance.as_deref() {
            Some(target) => Listener {
                listener_id: listener_id.to_string(),
                instance_id: target.to_string(),
                recipient: Some(instance_id.to_string()),
                context_type: options.context_type.clone(),
                channel: None,
                is_channel: false,
                intent: None,
            },
            None => {
                let channel = options
                    .channel
                    .clone()
                    .unwrap_or_else(|| current_channel.to_string());
                Listener {
                    listener_id: listener_id.to_string(),
                    instance_id: instance_id.to_string(),
                    recipient: None,
                    context_type: options.context_type.clone(),
                    is_channel: channel != DEFAULT_CHANNEL,
                    channel: Some(channel),
                    intent: None,
                }
            }
        };
        self.insert(listener.clone());
        listener
    }

    /// Register an intent listener for `instance_id`.
    pub fn add_intent_listener(&mut self, instance_id: &str, listener_id: &str, intent: &str) -> Listener {
        let listener = Listener {
            listener_id: listener_id.to_string(),
            instance_id: instance_id.to_string(),
            recipient: None,
            context_type: None,
            channel: None,
            is_channel: false,
            intent: Some(intent.to_string()),
        };
        self.insert(listener.clone());
        listener
    }

    fn insert(&mut self, listener: Listener) {
        // Re-registering an id replaces the earlier registration.
        self.listeners.retain(|l| {
            !(l.listener_id == listener.listener_id
                && l.instance_id == listener.instance_id
                && l.recipient == listener.recipient)
        });
        self.listeners.push(listener);
    }

    /// Remove a listener registered by `instance_id`. Idempotent.
    ///
    /// Covers the instance's own listeners and point-to-point listeners it
    /// registered on other instances.
    pub fn drop_listener(&mut self, instance_id: &str, listener_id: &str) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| {
            !(l.listener_id == listener_id
                && (l.recipient.as_deref() == Some(instance_id)
                    || (l.recipient.is_none() && l.instance_id == instance_id)))
        });
        self.listeners.len() != before
    }

    /// Remove every listener owned by or delivering to an instance.
    pub fn remove_instance(&mut self, instance_id: &str) -> usize {
        let before = self.listeners.len();
        self.listeners
            .retain(|l| l.instance_id != instance_id && l.recipient.as_deref() != Some(instance_id));
        before - self.listeners.len()
    }

    /// Listeners held in an instance's list, in registration order.
    pub fn listeners_of<'a>(&'a self, instance_id: &'a str) -> impl Iterator<Item = &'a Listener> + 'a {
        self.listeners.iter().filter(move |l| l.instance_id == instance_id)
    }

    /// Ids of the channel-scoped context listeners on an instance matching a
    /// broadcast on `channel` of `context_type`.
    pub fn match_context_listeners(
        &self,
        instance_id: &str,
        instance_channel: &str,
        channel: &str,
        context_type: &str,
    ) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for l in self.listeners_of(instance_id) {
            if l.is_intent() || l.is_direct() {
                continue;
            }
            if l.effective_channel(instance_channel) == channel
                && l.accepts_type(context_type)
                && !ids.contains(&l.listener_id)
            {
                ids.push(l.listener_id.clone());
            }
        }
        ids
    }

    /// Context listeners on `target` matching a direct delivery of
    /// `context_type`, regardless of channel.
    pub fn match_direct_listeners<'a>(&'a self, target: &'a str, context_type: &str) -> Vec<&'a Listener> {
        self.listeners_of(target)
            .filter(|l| !l.is_intent() && l.accepts_type(context_type))
            .collect()
    }

    /// Intent listeners for `intent`.
    ///
    /// Restricted to `target_instance` when given; otherwise listeners of the
    /// raising instance are excluded.
    pub fn match_intent_listeners(
        &self,
        intent: &str,
        target_instance: Option<&str>,
        raising_instance: &str,
    ) -> Vec<IntentListenerMatch> {
        self.listeners
            .iter()
            .filter(|l| l.intent.as_deref() == Some(intent))
            .filter(|l| match target_instance {
                Some(target) => l.instance_id == target,
                None => l.instance_id != raising_instance,
            })
            .map(|l| IntentListenerMatch {
                instance_id: l.instance_id.clone(),
                listener_id: l.listener_id.clone(),
            })
            .collect()
    }

    /// Every intent listener, in registration order.
    pub fn intent_listeners(&self) -> impl Iterator<Item = &Listener> {
        self.listeners.iter().filter(|l| l.is_intent())
    }

    /// Whether an instance has an intent listener for `intent`.
    pub fn has_intent_listener(&self, instance_id: &str, intent: &str) -> bool {
        self.listeners_of(instance_id)
            .any(|l| l.intent.as_deref() == Some(intent))
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
