//! Host collaborators
//!
//! The broker never owns application instances. It reaches them through:
//! - `InstanceHost`: instance lookup, launch, message delivery, focus
//! - `WorkspaceHost`: grouping of instances into workspaces
//! - `ResolverUi`: the picker shown when several handlers qualify

use crate::core::{Context, InstanceId, Result};
use crate::directory::{DirectoryApp, IntentMetadata};
use crate::intent::{IntentCandidates, ResolutionCandidate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What the host knows about a running instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    /// Instance id
    pub id: InstanceId,
    /// Current title, if any
    pub title: Option<String>,
    /// Workspace holding the instance
    pub workspace_id: Option<String>,
}

impl InstanceInfo {
    /// Create an info record with just an id.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: None,
            workspace_id: None,
        }
    }
}

/// A message delivered to an application instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", rename_all = "lowercase")]
pub enum Delivery {
    /// A context for one or more of the instance's listeners
    #[serde(rename_all = "camelCase")]
    Context {
        /// Matched listener ids
        listener_ids: Vec<String>,
        /// The context
        context: Context,
        /// Sending instance
        source: Option<InstanceId>,
    },
    /// A raised intent
    #[serde(rename_all = "camelCase")]
    Intent {
        /// Intent name
        intent: String,
        /// Context raised with it
        context: Option<Context>,
        /// Raising instance
        source: InstanceId,
    },
}

impl Delivery {
    /// A context delivery.
    pub fn context(listener_ids: Vec<String>, context: Context, source: Option<&str>) -> Self {
        Delivery::Context {
            listener_ids,
            context,
            source: source.map(str::to_string),
        }
    }

    /// An intent delivery.
    pub fn intent(intent: &str, context: Option<Context>, source: &str) -> Self {
        Delivery::Intent {
            intent: intent.to_string(),
            context,
            source: source.to_string(),
        }
    }
}

/// Request handed to the resolver UI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverRequest {
    /// Single-use id the selection must be reported against
    pub correlation_id: String,
    /// Raised intent, if one was named
    pub intent: Option<IntentMetadata>,
    /// Raised context
    pub context: Option<Context>,
    /// Raising instance
    pub source: InstanceId,
    /// Candidates sorted by title
    pub candidates: Vec<ResolutionCandidate>,
    /// Candidates grouped by intent (raise-intent-for-context only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub by_intent: Vec<IntentCandidates>,
}

/// Owner of application instances.
#[async_trait]
pub trait InstanceHost: Send + Sync {
    /// Look up a running instance.
    fn get_instance(&self, instance_id: &str) -> Option<InstanceInfo>;

    /// Launch a new instance, in `workspace_id` or a new workspace.
    async fn create_instance(
        &self,
        workspace_id: Option<&str>,
        launch_url: &str,
        directory_data: &DirectoryApp,
    ) -> Result<InstanceInfo>;

    /// Deliver a message to an instance.
    async fn deliver(&self, instance_id: &str, delivery: Delivery) -> Result<()>;

    /// Current title of an instance.
    fn title(&self, instance_id: &str) -> Option<String>;

    /// Bring the container holding an instance to the front.
    async fn bring_to_front(&self, instance_id: &str) -> Result<()>;
}

/// Workspace grouping of instances.
#[async_trait]
pub trait WorkspaceHost: Send + Sync {
    /// Workspace holding an instance.
    fn workspace_for(&self, instance_id: &str) -> Option<String>;

    /// Instances in a workspace.
    fn members(&self, workspace_id: &str) -> Vec<InstanceId>;

    /// Mark the channel a workspace is linked to.
    async fn set_channel(&self, workspace_id: &str, channel: &str) -> Result<()>;
}

/// Presents the intent resolver.
#[async_trait]
pub trait ResolverUi: Send + Sync {
    /// Show the picker. The selection comes back later as a
    /// `ResolveSelection` command carrying the same correlation id.
    async fn present(&self, request: ResolverRequest) -> Result<()>;
}
