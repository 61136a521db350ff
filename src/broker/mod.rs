//! Broker
//!
//! The aggregate owning all interop state:
//! - Channel registry, context store and listener registry
//! - Pending intents and outstanding resolver hand-offs
//! - The instance table (membership and directory metadata)
//!
//! Every mutation goes through `Broker::apply`, one command at a time.
//! `BrokerService` runs a broker on its own task for shared use.

pub mod command;
pub mod dispatcher;
pub mod instance;
pub mod service;

pub use command::{Command, Outcome};
pub use instance::{InstanceRecord, InstanceTable};
pub use service::{BrokerHandle, BrokerService};

use crate::channel::ChannelRegistry;
use crate::context::ContextStore;
use crate::core::{BrokerConfig, Result};
use crate::directory::{AppDirectory, DirectoryApp};
use crate::host::{InstanceHost, ResolverUi, WorkspaceHost};
use crate::intent::{PendingIntentQueue, ResolutionTable};
use crate::listener::ListenerRegistry;
use std::sync::Arc;
use tracing::{debug, info};

/// External collaborators the broker talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Instance host
    pub host: Arc<dyn InstanceHost>,
    /// Workspace grouping
    pub workspaces: Arc<dyn WorkspaceHost>,
    /// App directory
    pub directory: Arc<dyn AppDirectory>,
    /// Resolver UI
    pub resolver: Arc<dyn ResolverUi>,
}

/// The interop broker.
pub struct Broker {
    pub(crate) config: BrokerConfig,
    pub(crate) channels: ChannelRegistry,
    pub(crate) store: ContextStore,
    pub(crate) listeners: ListenerRegistry,
    pub(crate) pending_intents: PendingIntentQueue,
    pub(crate) instances: InstanceTable,
    pub(crate) resolutions: ResolutionTable,
    pub(crate) host: Arc<dyn InstanceHost>,
    pub(crate) workspaces: Arc<dyn WorkspaceHost>,
    pub(crate) directory: Arc<dyn AppDirectory>,
    pub(crate) resolver: Arc<dyn ResolverUi>,
}

impl Broker {
    /// Create a broker.
    pub fn new(config: BrokerConfig, collaborators: Collaborators) -> Self {
        let channels = ChannelRegistry::new(config.system_channels.clone());
        let mut store = ContextStore::new(config.history_limit);
        for channel in channels.list_system_channels() {
            store.ensure_channel(&channel.id);
        }
        let pending_intents = PendingIntentQueue::new(config.pending_intent_ttl());

        info!(
            system_channels = channels.list_system_channels().len(),
            ttl_ms = config.pending_intent_ttl_ms,
            "broker created"
        );

        Self {
            config,
            channels,
            store,
            listeners: ListenerRegistry::new(),
            pending_intents,
            instances: InstanceTable::new(),
            resolutions: ResolutionTable::new(),
            host: collaborators.host,
            workspaces: collaborators.workspaces,
            directory: collaborators.directory,
            resolver: collaborators.resolver,
        }
    }

    /// Apply one command.
    pub async fn apply(&mut self, command: Command) -> Result<Outcome> {
        debug!(command = command.name(), "applying command");
        match command {
            Command::RegisterInstance {
                instance_id,
                directory_data,
            } => Ok(self.register_instance(&instance_id, directory_data)),
            Command::DestroyInstance { instance_id } => Ok(self.destroy_instance(&instance_id)),
            Command::AddContextListener {
                source,
                listener_id,
                options,
            } => self.add_context_listener(&source, &listener_id, options).await,
            Command::AddIntentListener {
                source,
                listener_id,
                intent,
            } => self.add_intent_listener(&source, &listener_id, &intent).await,
            Command::DropListener { source, listener_id } => {
                Ok(Outcome::Bool(self.listeners.drop_listener(&source, &listener_id)))
            }
            Command::Broadcast {
                source,
                context,
                channel,
                instance_id,
            } => self.broadcast(&source, context, channel, instance_id).await,
            Command::GetCurrentContext {
                channel,
                context_type,
            } => Ok(Outcome::Context(channel.and_then(|c| {
                self.store
                    .current_context(&c, context_type.as_deref())
                    .cloned()
            }))),
            Command::GetSystemChannels => Ok(Outcome::Channels(
                self.channels.list_system_channels().to_vec(),
            )),
            Command::GetOrCreateChannel { channel_id } => self.get_or_create_channel(channel_id),
            Command::GetCurrentChannel { source } => self.current_channel(&source),
            Command::JoinChannel {
                source,
                channel,
                restore_only,
            } => self.join_channel(&source, channel, restore_only).await,
            Command::LeaveCurrentChannel { source } => self.leave_current_channel(&source).await,
            Command::JoinWorkspaceToChannel { source, channel } => {
                self.join_workspace_to_channel(&source, &channel).await
            }
            Command::Open {
                source,
                target,
                context,
            } => self.open(&source, &target, context).await,
            Command::FindIntent { intent, context } => self.find_intent(intent, context).await,
            Command::FindIntentsByContext { context } => self.find_intents_by_context(context).await,
            Command::RaiseIntent {
                source,
                intent,
                context,
                target,
            } => self.raise_intent(&source, intent, context, target).await,
            Command::RaiseIntentForContext {
                source,
                context,
                target,
            } => self.raise_intent_for_context(&source, context, target).await,
            Command::ResolveSelection {
                correlation_id,
                selection,
            } => self.resolve_selection(&correlation_id, selection).await,
            Command::CancelResolution { correlation_id } => self.cancel_resolution(&correlation_id),
        }
    }

    fn register_instance(&mut self, instance_id: &str, directory_data: Option<DirectoryApp>) -> Outcome {
        if self.instances.register(instance_id, directory_data) {
            info!(instance = instance_id, "instance registered");
        }
        Outcome::Ack
    }

    fn destroy_instance(&mut self, instance_id: &str) -> Outcome {
        let existed = self.instances.remove(instance_id).is_some();
        let listeners = self.listeners.remove_instance(instance_id);
        self.store.clear_instance(instance_id);
        self.pending_intents.clear(instance_id);
        let cancelled = self.resolutions.cancel_for_source(instance_id);
        info!(
            instance = instance_id,
            existed, listeners, cancelled, "instance destroyed"
        );
        Outcome::Ack
    }

    /// Configuration the broker was built with.
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Channel registry.
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Context store.
    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    /// Listener registry.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Pending intents.
    pub fn pending_intents(&self) -> &PendingIntentQueue {
        &self.pending_intents
    }

    /// Known instances.
    pub fn instances(&self) -> &InstanceTable {
        &self.instances
    }

    /// Outstanding resolver hand-offs.
    pub fn resolutions(&self) -> &ResolutionTable {
        &self.resolutions
    }
}
