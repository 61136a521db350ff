//! Recording doubles for the broker's collaborators.

use crate::broker::{Broker, Collaborators, Command};
use crate::core::{BrokerConfig, Error, InstanceId, Result};
use crate::directory::{AppDirectory, DirectoryApp, DirectoryQuery, InMemoryDirectory};
use crate::host::{Delivery, InstanceHost, InstanceInfo, ResolverRequest, ResolverUi, WorkspaceHost};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Instance host that records everything asked of it.
#[derive(Default)]
pub(crate) struct RecordingHost {
    deliveries: Mutex<Vec<(InstanceId, Delivery)>>,
    focused: Mutex<Vec<InstanceId>>,
    launched: Mutex<Vec<(Option<String>, String)>>,
    titles: Mutex<HashMap<InstanceId, String>>,
    known: Mutex<HashSet<InstanceId>>,
    failing: Mutex<HashSet<InstanceId>>,
    next_id: AtomicUsize,
}

impl RecordingHost {
    pub(crate) fn deliveries(&self) -> Vec<(InstanceId, Delivery)> {
        self.deliveries.lock().unwrap().clone()
    }

    pub(crate) fn deliveries_to(&self, instance_id: &str) -> Vec<Delivery> {
        self.deliveries()
            .into_iter()
            .filter(|(id, _)| id == instance_id)
            .map(|(_, d)| d)
            .collect()
    }

    pub(crate) fn focused(&self) -> Vec<InstanceId> {
        self.focused.lock().unwrap().clone()
    }

    /// `(workspace, launch url)` per launch.
    pub(crate) fn launched(&self) -> Vec<(Option<String>, String)> {
        self.launched.lock().unwrap().clone()
    }

    pub(crate) fn set_title(&self, instance_id: &str, title: &str) {
        self.known.lock().unwrap().insert(instance_id.to_string());
        self.titles
            .lock()
            .unwrap()
            .insert(instance_id.to_string(), title.to_string());
    }

    pub(crate) fn fail_deliveries_to(&self, instance_id: &str) {
        self.failing.lock().unwrap().insert(instance_id.to_string());
    }

    pub(crate) fn clear(&self) {
        self.deliveries.lock().unwrap().clear();
        self.focused.lock().unwrap().clear();
    }
}

#[async_trait]
impl InstanceHost for RecordingHost {
    fn get_instance(&self, instance_id: &str) -> Option<InstanceInfo> {
        if !self.known.lock().unwrap().contains(instance_id) {
            return None;
        }
        let mut info = InstanceInfo::new(instance_id);
        info.title = self.title(instance_id);
        Some(info)
    }

    async fn create_instance(
        &self,
        workspace_id: Option<&str>,
        launch_url: &str,
        directory_data: &DirectoryApp,
    ) -> Result<InstanceInfo> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("launched-{}", n);
        self.launched
            .lock()
            .unwrap()
            .push((workspace_id.map(str::to_string), launch_url.to_string()));
        self.set_title(&id, &directory_data.title);
        Ok(InstanceInfo {
            id,
            title: Some(directory_data.title.clone()),
            workspace_id: workspace_id.map(str::to_string),
        })
    }

    async fn deliver(&self, instance_id: &str, delivery: Delivery) -> Result<()> {
        if self.failing.lock().unwrap().contains(instance_id) {
            return Err(Error::Host(format!("{} unreachable", instance_id)));
        }
        self.deliveries
            .lock()
            .unwrap()
            .push((instance_id.to_string(), delivery));
        Ok(())
    }

    fn title(&self, instance_id: &str) -> Option<String> {
        self.titles.lock().unwrap().get(instance_id).cloned()
    }

    async fn bring_to_front(&self, instance_id: &str) -> Result<()> {
        self.focused.lock().unwrap().push(instance_id.to_string());
        Ok(())
    }
}

/// Workspace host with fixed membership.
#[derive(Default)]
pub(crate) struct RecordingWorkspaces {
    workspaces: Mutex<Vec<(String, Vec<InstanceId>)>>,
    channel_calls: Mutex<Vec<(String, String)>>,
}

impl RecordingWorkspaces {
    pub(crate) fn add(&self, workspace_id: &str, members: &[&str]) {
        self.workspaces.lock().unwrap().push((
            workspace_id.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        ));
    }

    pub(crate) fn channel_calls(&self) -> Vec<(String, String)> {
        self.channel_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkspaceHost for RecordingWorkspaces {
    fn workspace_for(&self, instance_id: &str) -> Option<String> {
        self.workspaces
            .lock()
            .unwrap()
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == instance_id))
            .map(|(id, _)| id.clone())
    }

    fn members(&self, workspace_id: &str) -> Vec<InstanceId> {
        self.workspaces
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == workspace_id)
            .map(|(_, members)| members.clone())
            .unwrap_or_default()
    }

    async fn set_channel(&self, workspace_id: &str, channel: &str) -> Result<()> {
        self.channel_calls
            .lock()
            .unwrap()
            .push((workspace_id.to_string(), channel.to_string()));
        Ok(())
    }
}

/// Resolver UI that records what it was shown.
#[derive(Default)]
pub(crate) struct RecordingResolver {
    requests: Mutex<Vec<ResolverRequest>>,
    fail: AtomicBool,
}

impl RecordingResolver {
    pub(crate) fn requests(&self) -> Vec<ResolverRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last(&self) -> ResolverRequest {
        self.requests().pop().expect("resolver was not presented")
    }

    pub(crate) fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResolverUi for RecordingResolver {
    async fn present(&self, request: ResolverRequest) -> Result<()> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(Error::Host("resolver window failed to open".to_string()));
        }
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

/// Directory whose service is unreachable.
pub(crate) struct FailingDirectory;

#[async_trait]
impl AppDirectory for FailingDirectory {
    async fn search(&self, _query: &DirectoryQuery) -> Result<Vec<DirectoryApp>> {
        Err(Error::DirectorySearchFailed("connection refused".to_string()))
    }

    async fn lookup_by_name(&self, _name: &str) -> Result<Option<DirectoryApp>> {
        Err(Error::DirectorySearchFailed("connection refused".to_string()))
    }
}

/// Sample directory records.
pub(crate) fn sample_apps() -> Vec<DirectoryApp> {
    vec![
        DirectoryApp::new("TradingViewChart", "https://example.com/chart/")
            .with_title("TradingView Chart")
            .with_intent("fdc3.ViewChart", "View Chart", &["fdc3.instrument"]),
        DirectoryApp::new("News-Demo", "https://example.com/news/")
            .with_title("News Demo")
            .with_intent("fdc3.ViewNews", "View News", &["fdc3.instrument"]),
        DirectoryApp::new("Contacts", "https://example.com/contacts/")
            .with_title("Contacts")
            .with_intent("fdc3.ViewContact", "View Contact", &["fdc3.contact"]),
    ]
}

/// Doubles wired into a broker.
pub(crate) struct Fixture {
    pub(crate) host: Arc<RecordingHost>,
    pub(crate) workspaces: Arc<RecordingWorkspaces>,
    pub(crate) resolver: Arc<RecordingResolver>,
    pub(crate) directory: Arc<dyn AppDirectory>,
}

impl Fixture {
    /// Fixture with an empty directory.
    pub(crate) fn new() -> Self {
        Self::with_directory(Arc::new(InMemoryDirectory::default()))
    }

    /// Fixture serving the given records.
    pub(crate) fn with_apps(apps: Vec<DirectoryApp>) -> Self {
        Self::with_directory(Arc::new(InMemoryDirectory::new(apps)))
    }

    pub(crate) fn with_directory(directory: Arc<dyn AppDirectory>) -> Self {
        Self {
            host: Arc::new(RecordingHost::default()),
            workspaces: Arc::new(RecordingWorkspaces::default()),
            resolver: Arc::new(RecordingResolver::default()),
            directory,
        }
    }

    pub(crate) fn collaborators(&self) -> Collaborators {
        Collaborators {
            host: self.host.clone(),
            workspaces: self.workspaces.clone(),
            directory: self.directory.clone(),
            resolver: self.resolver.clone(),
        }
    }

    pub(crate) fn broker(&self) -> Broker {
        self.broker_with(BrokerConfig::default())
    }

    pub(crate) fn broker_with(&self, config: BrokerConfig) -> Broker {
        Broker::new(config, self.collaborators())
    }

    /// Register instances with no directory metadata.
    pub(crate) async fn register(&self, broker: &mut Broker, ids: &[&str]) {
        for id in ids {
            broker
                .apply(Command::RegisterInstance {
                    instance_id: id.to_string(),
                    directory_data: None,
                })
                .await
                .unwrap();
        }
    }

    /// Register an instance launched from a directory record.
    pub(crate) async fn register_app(&self, broker: &mut Broker, id: &str, app: DirectoryApp) {
        broker
            .apply(Command::RegisterInstance {
                instance_id: id.to_string(),
                directory_data: Some(app),
            })
            .await
            .unwrap();
    }
}
