//! Inbound commands and their outcomes.

use crate::channel::Channel;
use crate::core::{Context, InstanceId};
use crate::directory::{AppIntent, DirectoryApp, TargetApp};
use crate::intent::{IntentResolution, ResolutionHandle, ResolverSelection};
use crate::listener::ContextListenerOptions;

/// An event applied to the broker.
///
/// `source` is always the instance the request came from.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// The host reports a new instance
    RegisterInstance {
        instance_id: InstanceId,
        directory_data: Option<DirectoryApp>,
    },
    /// The host reports an instance is gone
    DestroyInstance { instance_id: InstanceId },
    AddContextListener {
        source: InstanceId,
        listener_id: String,
        options: ContextListenerOptions,
    },
    AddIntentListener {
        source: InstanceId,
        listener_id: String,
        intent: String,
    },
    DropListener {
        source: InstanceId,
        listener_id: String,
    },
    /// Broadcast a context. A target instance takes precedence over a channel;
    /// with neither, the source's current channel is used.
    Broadcast {
        source: InstanceId,
        context: Option<Context>,
        channel: Option<String>,
        instance_id: Option<InstanceId>,
    },
    GetCurrentContext {
        channel: Option<String>,
        context_type: Option<String>,
    },
    GetSystemChannels,
    GetOrCreateChannel { channel_id: Option<String> },
    GetCurrentChannel { source: InstanceId },
    JoinChannel {
        source: InstanceId,
        channel: Option<String>,
        restore_only: bool,
    },
    LeaveCurrentChannel { source: InstanceId },
    JoinWorkspaceToChannel { source: InstanceId, channel: String },
    Open {
        source: InstanceId,
        target: TargetApp,
        context: Option<Context>,
    },
    FindIntent {
        intent: Option<String>,
        context: Option<Context>,
    },
    FindIntentsByContext { context: Option<Context> },
    RaiseIntent {
        source: InstanceId,
        intent: Option<String>,
        context: Option<Context>,
        target: Option<TargetApp>,
    },
    RaiseIntentForContext {
        source: InstanceId,
        context: Option<Context>,
        target: Option<TargetApp>,
    },
    /// The host reports the resolver selection
    ResolveSelection {
        correlation_id: String,
        selection: ResolverSelection,
    },
    CancelResolution { correlation_id: String },
}

impl Command {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::RegisterInstance { .. } => "registerInstance",
            Command::DestroyInstance { .. } => "destroyInstance",
            Command::AddContextListener { .. } => "addContextListener",
            Command::AddIntentListener { .. } => "addIntentListener",
            Command::DropListener { .. } => "dropListener",
            Command::Broadcast { .. } => "broadcast",
            Command::GetCurrentContext { .. } => "getCurrentContext",
            Command::GetSystemChannels => "getSystemChannels",
            Command::GetOrCreateChannel { .. } => "getOrCreateChannel",
            Command::GetCurrentChannel { .. } => "getCurrentChannel",
            Command::JoinChannel { .. } => "joinChannel",
            Command::LeaveCurrentChannel { .. } => "leaveCurrentChannel",
            Command::JoinWorkspaceToChannel { .. } => "joinWorkspaceToChannel",
            Command::Open { .. } => "open",
            Command::FindIntent { .. } => "findIntent",
            Command::FindIntentsByContext { .. } => "findIntentsByContext",
            Command::RaiseIntent { .. } => "raiseIntent",
            Command::RaiseIntentForContext { .. } => "raiseIntentForContext",
            Command::ResolveSelection { .. } => "resolveSelection",
            Command::CancelResolution { .. } => "cancelResolution",
        }
    }

    /// Broadcast on a channel.
    pub fn broadcast(source: &str, channel: &str, context: Context) -> Self {
        Command::Broadcast {
            source: source.to_string(),
            context: Some(context),
            channel: Some(channel.to_string()),
            instance_id: None,
        }
    }

    /// Send a context straight to one instance.
    pub fn broadcast_to(source: &str, target: &str, context: Context) -> Self {
        Command::Broadcast {
            source: source.to_string(),
            context: Some(context),
            channel: None,
            instance_id: Some(target.to_string()),
        }
    }

    /// Join a channel, pushing its current context.
    pub fn join(source: &str, channel: &str) -> Self {
        Command::JoinChannel {
            source: source.to_string(),
            channel: Some(channel.to_string()),
            restore_only: false,
        }
    }

    /// Raise a named intent.
    pub fn raise(source: &str, intent: &str, context: Option<Context>) -> Self {
        Command::RaiseIntent {
            source: source.to_string(),
            intent: Some(intent.to_string()),
            context,
            target: None,
        }
    }
}

/// Result of applying a command.
#[derive(Debug)]
pub enum Outcome {
    /// Applied, nothing to return
    Ack,
    Bool(bool),
    Context(Option<Context>),
    Channels(Vec<Channel>),
    Channel(Option<Channel>),
    AppIntent(AppIntent),
    AppIntents(Vec<AppIntent>),
    /// Intent routed
    Resolution(IntentResolution),
    /// Intent handed to the resolver; the handle completes on selection
    Resolving(ResolutionHandle),
    /// Application launched
    Opened(InstanceId),
}

impl Outcome {
    /// The context, for `Context` outcomes.
    pub fn into_context(self) -> Option<Context> {
        match self {
            Outcome::Context(context) => context,
            _ => None,
        }
    }

    /// The resolution, for `Resolution` outcomes.
    pub fn into_resolution(self) -> Option<IntentResolution> {
        match self {
            Outcome::Resolution(resolution) => Some(resolution),
            _ => None,
        }
    }

    /// The handle, for `Resolving` outcomes.
    pub fn into_handle(self) -> Option<ResolutionHandle> {
        match self {
            Outcome::Resolving(handle) => Some(handle),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let cmd = Command::broadcast_to("b", "a", Context::new("fdc3.instrument"));
        assert_eq!(cmd.name(), "broadcast");
        match cmd {
            Command::Broadcast { channel, instance_id, .. } => {
                assert!(channel.is_none());
                assert_eq!(instance_id.as_deref(), Some("a"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(Command::join("a", "red").name(), "joinChannel");
    }

    #[test]
    fn test_outcome_accessors() {
        assert!(Outcome::Ack.into_context().is_none());
        let ctx = Context::new("fdc3.contact");
        assert_eq!(Outcome::Context(Some(ctx.clone())).into_context(), Some(ctx));
        assert!(Outcome::Opened("x".to_string()).into_handle().is_none());
    }
}
