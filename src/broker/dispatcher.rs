//! Broadcast dispatcher.
//!
//! Listener registration (with pending drains), channel and point-to-point
//! broadcast, and channel membership.

use crate::broker::{Broker, Outcome};
use crate::context::PendingContext;
use crate::core::{now, Context, Error, InstanceId, Result, DEFAULT_CHANNEL};
use crate::host::Delivery;
use crate::listener::ContextListenerOptions;
use tracing::{debug, info, warn};

impl Broker {
    /// Deliver to an instance; failures are logged and skipped.
    pub(crate) async fn deliver_or_warn(&self, instance_id: &str, delivery: Delivery) {
        if let Err(err) = self.host.deliver(instance_id, delivery).await {
            warn!(instance = instance_id, error = %err, "delivery failed");
        }
    }

    /// `InstanceNotFound` unless the table or the host knows the instance.
    pub(crate) fn ensure_known(&self, instance_id: &str) -> Result<()> {
        if !self.instances.contains(instance_id) && self.host.get_instance(instance_id).is_none() {
            return Err(Error::InstanceNotFound(instance_id.to_string()));
        }
        Ok(())
    }

    /// Register a context listener, then hand it any pending contexts it matches.
    pub(crate) async fn add_context_listener(
        &mut self,
        source: &str,
        listener_id: &str,
        options: ContextListenerOptions,
    ) -> Result<Outcome> {
        if let Some(target) = options.target_instance.as_deref() {
            self.ensure_known(target)?;
        }
        let current = self.instances.channel_of(source).to_string();
        let listener = self
            .listeners
            .add_context_listener(source, listener_id, &options, &current);
        debug!(
            instance = source,
            listener = listener_id,
            owner = %listener.instance_id,
            channel = ?listener.channel,
            context_type = ?listener.context_type,
            "context listener added"
        );

        let drained = match options.target_instance.as_deref() {
            // A conduit only picks up what its registrant sent to the target.
            Some(target) => self.store.take_pending_matching(target, |p| {
                p.source.as_deref() == Some(source) && listener.accepts_type(&p.context.context_type)
            }),
            None => self
                .store
                .take_pending_matching(source, |p| listener.accepts_type(&p.context.context_type)),
        };

        for pending in drained {
            debug!(instance = source, listener = listener_id, "delivering pending context");
            let delivery = Delivery::context(
                vec![listener_id.to_string()],
                pending.context,
                pending.source.as_deref(),
            );
            self.deliver_or_warn(source, delivery).await;
        }
        Ok(Outcome::Ack)
    }

    /// Register an intent listener, then deliver live pending intents for it.
    pub(crate) async fn add_intent_listener(
        &mut self,
        source: &str,
        listener_id: &str,
        intent: &str,
    ) -> Result<Outcome> {
        if intent.is_empty() {
            return Err(Error::MissingRequiredField("intent"));
        }
        self.listeners.add_intent_listener(source, listener_id, intent);
        debug!(instance = source, listener = listener_id, intent, "intent listener added");

        let drained = self.pending_intents.drain_matching(source, intent, now());
        for pending in drained {
            debug!(instance = source, intent, from = %pending.source, "delivering pending intent");
            let delivery = Delivery::intent(&pending.intent, pending.context, &pending.source);
            self.deliver_or_warn(source, delivery).await;
        }
        Ok(Outcome::Ack)
    }

    /// Route a broadcast request.
    pub(crate) async fn broadcast(
        &mut self,
        source: &str,
        context: Option<Context>,
        channel: Option<String>,
        target: Option<InstanceId>,
    ) -> Result<Outcome> {
        let context = context.ok_or(Error::MissingRequiredField("context"))?;
        if let Some(target) = target {
            return self.broadcast_to_instance(&target, context, Some(source)).await;
        }
        let channel = channel.unwrap_or_else(|| self.instances.channel_of(source).to_string());
        self.broadcast_on_channel(&channel, context, Some(source)).await
    }

    /// Broadcast on a channel.
    ///
    /// Each instance with matching listeners gets one batched delivery.
    /// Members of the channel with no match get the context queued instead.
    pub(crate) async fn broadcast_on_channel(
        &mut self,
        channel: &str,
        context: Context,
        source: Option<&str>,
    ) -> Result<Outcome> {
        if channel == DEFAULT_CHANNEL {
            debug!(source = ?source, "broadcast on default channel ignored");
            return Ok(Outcome::Ack);
        }
        if self.channels.resolve(channel).is_none() {
            return Err(Error::ChannelNotFound(channel.to_string()));
        }
        self.store.broadcast(channel, context.clone());

        let mut deliveries: Vec<(InstanceId, Vec<String>)> = Vec::new();
        let mut unmatched: Vec<InstanceId> = Vec::new();
        for record in self.instances.iter() {
            let ids = self.listeners.match_context_listeners(
                &record.id,
                &record.channel,
                channel,
                &context.context_type,
            );
            if !ids.is_empty() {
                deliveries.push((record.id.clone(), ids));
            } else if record.channel == channel && Some(record.id.as_str()) != source {
                unmatched.push(record.id.clone());
            }
        }

        debug!(
            channel,
            context_type = %context.context_type,
            delivered = deliveries.len(),
            queued = unmatched.len(),
            "channel broadcast"
        );

        for instance_id in unmatched {
            self.store.push_pending(
                &instance_id,
                PendingContext::new(context.clone(), source).with_channel(channel),
            );
        }
        for (instance_id, listener_ids) in deliveries {
            let delivery = Delivery::context(listener_ids, context.clone(), source);
            self.deliver_or_warn(&instance_id, delivery).await;
        }
        Ok(Outcome::Ack)
    }

    /// Send a context straight to one instance, bypassing channels.
    ///
    /// Matches every context listener held by the target, grouped by the
    /// instance that receives it. With no match the context is queued on
    /// the target.
    pub(crate) async fn broadcast_to_instance(
        &mut self,
        target: &str,
        context: Context,
        source: Option<&str>,
    ) -> Result<Outcome> {
        self.ensure_known(target)?;

        let mut groups: Vec<(InstanceId, Vec<String>)> = Vec::new();
        for listener in self.listeners.match_direct_listeners(target, &context.context_type) {
            let recipient = listener.delivers_to();
            match groups.iter_mut().find(|(id, _)| id == recipient) {
                Some((_, ids)) => {
                    if !ids.contains(&listener.listener_id) {
                        ids.push(listener.listener_id.clone());
                    }
                }
                None => groups.push((recipient.to_string(), vec![listener.listener_id.clone()])),
            }
        }

        if groups.is_empty() {
            debug!(target, context_type = %context.context_type, "no listener, queueing pending context");
            self.store.push_pending(target, PendingContext::new(context, source));
            return Ok(Outcome::Ack);
        }
        for (recipient, listener_ids) in groups {
            let delivery = Delivery::context(listener_ids, context.clone(), source);
            self.deliver_or_warn(&recipient, delivery).await;
        }
        Ok(Outcome::Ack)
    }

    /// Move an instance to a channel.
    ///
    /// Unless `restore_only` is set, the channel's current context goes to
    /// the instance's matching listeners once, or is queued when none match.
    pub(crate) async fn join_channel(
        &mut self,
        source: &str,
        channel: Option<String>,
        restore_only: bool,
    ) -> Result<Outcome> {
        let channel = channel
            .filter(|c| !c.is_empty())
            .ok_or(Error::MissingRequiredField("channel"))?;
        if channel != DEFAULT_CHANNEL && self.channels.resolve(&channel).is_none() {
            return Err(Error::ChannelNotFound(channel));
        }
        let record = self
            .instances
            .get_mut(source)
            .ok_or_else(|| Error::InstanceNotFound(source.to_string()))?;
        if record.channel == channel {
            return Ok(Outcome::Ack);
        }
        record.channel = channel.clone();
        info!(instance = source, channel = %channel, "joined channel");

        if restore_only || channel == DEFAULT_CHANNEL {
            return Ok(Outcome::Ack);
        }
        self.store.ensure_channel(&channel);
        let Some(current) = self.store.current_context(&channel, None).cloned() else {
            return Ok(Outcome::Ack);
        };

        let ids = self
            .listeners
            .match_context_listeners(source, &channel, &channel, &current.context_type);
        if ids.is_empty() {
            debug!(instance = source, channel = %channel, "no listener, queueing channel context");
            self.store
                .push_pending(source, PendingContext::new(current, None).with_channel(&channel));
        } else {
            self.deliver_or_warn(source, Delivery::context(ids, current, None)).await;
        }
        Ok(Outcome::Ack)
    }

    /// Return an instance to the default channel.
    pub(crate) async fn leave_current_channel(&mut self, source: &str) -> Result<Outcome> {
        self.join_channel(source, Some(DEFAULT_CHANNEL.to_string()), false)
            .await
    }

    /// Join every instance in the source's workspace to a channel.
    pub(crate) async fn join_workspace_to_channel(&mut self, source: &str, channel: &str) -> Result<Outcome> {
        if channel != DEFAULT_CHANNEL && self.channels.resolve(channel).is_none() {
            return Err(Error::ChannelNotFound(channel.to_string()));
        }
        let Some(workspace) = self.workspaces.workspace_for(source) else {
            debug!(instance = source, "no workspace to join");
            return Ok(Outcome::Bool(false));
        };
        self.workspaces.set_channel(&workspace, channel).await?;

        for member in self.workspaces.members(&workspace) {
            match self.join_channel(&member, Some(channel.to_string()), false).await {
                Ok(_) => {}
                Err(Error::InstanceNotFound(id)) => {
                    warn!(workspace = %workspace, instance = %id, "workspace member not registered");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(Outcome::Bool(true))
    }

    /// Return a channel, creating an app channel on first reference.
    pub(crate) fn get_or_create_channel(&mut self, channel_id: Option<String>) -> Result<Outcome> {
        let id = channel_id.unwrap_or_else(|| DEFAULT_CHANNEL.to_string());
        if id.is_empty() {
            return Err(Error::MissingRequiredField("channel"));
        }
        let (channel, created) = self.channels.create_or_get_app_channel(&id)?;
        if created {
            self.store.ensure_channel(&id);
            info!(channel = %id, "app channel created");
        }
        Ok(Outcome::Channel(Some(channel)))
    }

    /// Channel an instance is on; none for the default channel.
    pub(crate) fn current_channel(&self, source: &str) -> Result<Outcome> {
        let record = self
            .instances
            .get(source)
            .ok_or_else(|| Error::InstanceNotFound(source.to_string()))?;
        if record.channel == DEFAULT_CHANNEL {
            return Ok(Outcome::Channel(None));
        }
        Ok(Outcome::Channel(self.channels.resolve(&record.channel).cloned()))
    }
}
