//! Intent router.
//!
//! Collects candidates for a raised intent from live intent listeners and
//! the app directory, then applies the match policy:
//! - zero candidates: `NoHandlerFound`
//! - one candidate: deliver to the live instance, or launch the app with a
//!   pending intent
//! - several: sort by title and hand off to the resolver UI

use crate::broker::{Broker, Outcome};
use crate::context::PendingContext;
use crate::core::{now, Context, Error, InstanceId, Result};
use crate::directory::{AppIntent, AppMetadata, DirectoryApp, DirectoryQuery, IntentMetadata, TargetApp};
use crate::host::{Delivery, ResolverRequest};
use crate::intent::candidate::{add_to_tree, dedupe, intent_for_instance, push_unique, sort_by_title};
use crate::intent::{IntentCandidates, IntentResolution, PendingIntent, ResolutionCandidate, ResolverSelection};
use tracing::{debug, info, warn};

impl Broker {
    /// Resolution reported back to the raising instance.
    pub(crate) fn resolution_for(&self, source: &str) -> IntentResolution {
        IntentResolution {
            source: AppMetadata {
                name: self.instances.directory_name(source).to_string(),
                app_id: Some(source.to_string()),
                ..Default::default()
            },
            version: self.config.fdc3_version.clone(),
        }
    }

    fn window_candidate(&self, instance_id: &str) -> ResolutionCandidate {
        let directory_data = self
            .instances
            .get(instance_id)
            .and_then(|r| r.directory_data.clone());
        ResolutionCandidate::window(instance_id, directory_data, self.host.title(instance_id))
    }

    /// Directory search for routing; failures count as no results.
    async fn search_directory(&self, query: DirectoryQuery) -> Vec<DirectoryApp> {
        match self.directory.search(&query).await {
            Ok(apps) => apps,
            Err(err) => {
                warn!(error = %err, query = ?query, "directory search failed, continuing without directory results");
                Vec::new()
            }
        }
    }

    /// Launch a directory app, optionally in an existing workspace.
    pub(crate) async fn launch(&mut self, workspace_id: Option<&str>, app: &DirectoryApp) -> Result<InstanceId> {
        if app.start_url.is_empty() {
            return Err(Error::MissingRequiredField("start_url"));
        }
        let info = self
            .host
            .create_instance(workspace_id, &app.start_url, app)
            .await?;
        self.instances.register(&info.id, Some(app.clone()));
        info!(instance = %info.id, app = %app.name, "application launched");
        Ok(info.id)
    }

    /// Open an application by name, queueing `context` for it.
    pub(crate) async fn open(&mut self, source: &str, target: &TargetApp, context: Option<Context>) -> Result<Outcome> {
        let name = target
            .name()
            .ok_or(Error::MissingRequiredField("name"))?
            .to_string();
        let app = self
            .directory
            .lookup_by_name(&name)
            .await?
            .ok_or(Error::AppNotFound(name))?;
        let workspace = self.workspaces.workspace_for(source);
        let instance_id = self.launch(workspace.as_deref(), &app).await?;
        if let Some(context) = context {
            self.store
                .push_pending(&instance_id, PendingContext::new(context, Some(source)));
        }
        Ok(Outcome::Opened(instance_id))
    }

    /// Directory apps handling an intent.
    pub(crate) async fn find_intent(&self, intent: Option<String>, context: Option<Context>) -> Result<Outcome> {
        let intent = intent
            .filter(|i| !i.is_empty())
            .ok_or(Error::MissingRequiredField("intent"))?;
        let mut query = DirectoryQuery::by_intent(&intent);
        if let Some(context) = &context {
            query = query.with_context(&context.context_type);
        }
        let apps = self.search_directory(query).await;
        let metadata = apps
            .iter()
            .find_map(|a| a.intent(&intent))
            .map(|i| i.metadata())
            .unwrap_or_else(|| IntentMetadata {
                name: intent.clone(),
                display_name: intent.clone(),
            });
        Ok(Outcome::AppIntent(AppIntent {
            intent: metadata,
            apps: apps.iter().map(DirectoryApp::to_app_metadata).collect(),
        }))
    }

    /// Directory apps accepting a context, one entry per intent.
    pub(crate) async fn find_intents_by_context(&self, context: Option<Context>) -> Result<Outcome> {
        let context = context.ok_or(Error::MissingRequiredField("context"))?;
        let apps = self
            .search_directory(DirectoryQuery::by_context(&context.context_type))
            .await;

        let mut found: Vec<AppIntent> = Vec::new();
        for app in &apps {
            for declared in app.intents_for_context(&context.context_type) {
                let metadata = app.to_app_metadata();
                match found.iter_mut().find(|g| g.intent.name == declared.name) {
                    Some(group) => {
                        if !group.apps.iter().any(|a| a.name == metadata.name) {
                            group.apps.push(metadata);
                        }
                    }
                    None => found.push(AppIntent {
                        intent: declared.metadata(),
                        apps: vec![metadata],
                    }),
                }
            }
        }
        Ok(Outcome::AppIntents(found))
    }

    /// Raise a named intent.
    pub(crate) async fn raise_intent(
        &mut self,
        source: &str,
        intent: Option<String>,
        context: Option<Context>,
        target: Option<TargetApp>,
    ) -> Result<Outcome> {
        let intent = intent
            .filter(|i| !i.is_empty())
            .ok_or(Error::MissingRequiredField("intent"))?;
        let target_instance = target.as_ref().and_then(|t| t.instance_id());
        let target_name = target.as_ref().and_then(|t| t.name());

        let mut candidates = Vec::new();
        for matched in self.listeners.match_intent_listeners(&intent, target_instance, source) {
            if target_name.map_or(false, |name| self.instances.directory_name(&matched.instance_id) != name) {
                continue;
            }
            push_unique(&mut candidates, self.window_candidate(&matched.instance_id));
        }

        if target_instance.is_none() {
            let mut query = DirectoryQuery::by_intent(&intent);
            if let Some(context) = &context {
                query = query.with_context(&context.context_type);
            }
            if let Some(target) = &target {
                query = target.narrow(query);
            }
            for app in self.search_directory(query).await {
                candidates.push(ResolutionCandidate::directory(app));
            }
        }

        let mut candidates = dedupe(candidates);
        debug!(intent = %intent, source, candidates = candidates.len(), "intent candidates collected");

        match candidates.len() {
            0 => Err(Error::NoHandlerFound(intent)),
            1 => {
                let candidate = candidates.remove(0);
                let resolution = self.route(source, candidate, Some(intent), context).await?;
                Ok(Outcome::Resolution(resolution))
            }
            _ => {
                sort_by_title(&mut candidates);
                self.begin_resolution(source, Some(intent), context, candidates, Vec::new())
                    .await
            }
        }
    }

    /// Raise an intent implied by a context's type.
    pub(crate) async fn raise_intent_for_context(
        &mut self,
        source: &str,
        context: Option<Context>,
        target: Option<TargetApp>,
    ) -> Result<Outcome> {
        let context = context.ok_or(Error::MissingRequiredField("context"))?;
        let context_type = context.context_type.clone();
        let target_instance = target.as_ref().and_then(|t| t.instance_id());
        let target_name = target.as_ref().and_then(|t| t.name());

        let mut tree: Vec<IntentCandidates> = Vec::new();
        let mut candidates = Vec::new();

        // Live listeners whose instance declares the intent for this context type.
        for listener in self.listeners.intent_listeners() {
            let owner = listener.instance_id.as_str();
            if owner == source || target_instance.map_or(false, |t| t != owner) {
                continue;
            }
            let Some(app) = self.instances.get(owner).and_then(|r| r.directory_data.as_ref()) else {
                continue;
            };
            if target_name.map_or(false, |name| app.name != name) {
                continue;
            }
            let Some(declared) = listener
                .intent
                .as_deref()
                .and_then(|name| app.intent(name))
                .filter(|i| i.contexts.iter().any(|c| *c == context_type))
            else {
                continue;
            };
            let candidate = self.window_candidate(owner);
            add_to_tree(&mut tree, declared.metadata(), candidate.clone());
            push_unique(&mut candidates, candidate);
        }

        if target_instance.is_none() {
            let mut query = DirectoryQuery::by_context(&context_type);
            if let Some(target) = &target {
                query = target.narrow(query);
            }
            for app in self.search_directory(query).await {
                let candidate = ResolutionCandidate::directory(app);
                if let Some(data) = candidate.directory_data() {
                    for declared in data.intents_for_context(&context_type) {
                        add_to_tree(&mut tree, declared.metadata(), candidate.clone());
                    }
                }
                candidates.push(candidate);
            }
        }

        let mut candidates = dedupe(candidates);
        debug!(context_type = %context_type, source, candidates = candidates.len(), "context candidates collected");

        match candidates.len() {
            0 => Err(Error::NoHandlerFound(context_type)),
            1 => {
                let candidate = candidates.remove(0);
                let intent = pick_intent(&candidate, &tree, &context_type);
                let resolution = self.route(source, candidate, intent, Some(context)).await?;
                Ok(Outcome::Resolution(resolution))
            }
            _ => {
                sort_by_title(&mut candidates);
                self.begin_resolution(source, None, Some(context), candidates, tree)
                    .await
            }
        }
    }

    /// Route to exactly one candidate.
    async fn route(
        &mut self,
        source: &str,
        candidate: ResolutionCandidate,
        intent: Option<String>,
        context: Option<Context>,
    ) -> Result<IntentResolution> {
        match candidate {
            ResolutionCandidate::Window { instance_id, .. } => {
                let intent = intent.ok_or(Error::MissingRequiredField("intent"))?;
                self.ensure_known(&instance_id)?;
                self.host
                    .deliver(&instance_id, Delivery::intent(&intent, context, source))
                    .await?;
                if let Err(err) = self.host.bring_to_front(&instance_id).await {
                    warn!(instance = %instance_id, error = %err, "could not bring instance to front");
                }
                info!(intent = %intent, source, target = %instance_id, "intent delivered");
            }
            ResolutionCandidate::Directory { directory_data } => {
                let instance_id = self.launch(None, &directory_data).await?;
                let expired = self.pending_intents.purge_expired(now());
                if expired > 0 {
                    debug!(expired, "dropped expired pending intents");
                }
                match intent {
                    Some(intent) => {
                        info!(intent = %intent, source, target = %instance_id, "intent pending on launched instance");
                        self.pending_intents
                            .enqueue(&instance_id, PendingIntent::new(&intent, context, source));
                    }
                    None => debug!(target = %instance_id, "launched without an intent to deliver"),
                }
            }
        }
        Ok(self.resolution_for(source))
    }

    /// Suspend on the resolver UI.
    async fn begin_resolution(
        &mut self,
        source: &str,
        intent: Option<String>,
        context: Option<Context>,
        candidates: Vec<ResolutionCandidate>,
        by_intent: Vec<IntentCandidates>,
    ) -> Result<Outcome> {
        let abandoned = self.resolutions.purge_abandoned();
        if abandoned > 0 {
            debug!(abandoned, "dropped abandoned resolutions");
        }

        let intent_metadata = intent.as_deref().map(|name| {
            candidates
                .iter()
                .filter_map(|c| c.directory_data())
                .find_map(|d| d.intent(name))
                .map(|i| i.metadata())
                .unwrap_or_else(|| IntentMetadata {
                    name: name.to_string(),
                    display_name: name.to_string(),
                })
        });
        let handle = self.resolutions.begin(
            source,
            intent,
            context.clone(),
            by_intent.clone(),
            self.config.resolver_timeout(),
        );
        let correlation_id = handle.correlation_id().to_string();
        info!(correlation_id = %correlation_id, source, candidates = candidates.len(), "handing off to resolver");

        let request = ResolverRequest {
            correlation_id: correlation_id.clone(),
            intent: intent_metadata,
            context,
            source: source.to_string(),
            candidates,
            by_intent,
        };
        if let Err(err) = self.resolver.present(request).await {
            self.resolutions.cancel(&correlation_id).ok();
            return Err(err);
        }
        Ok(Outcome::Resolving(handle))
    }

    /// Complete a suspended resolution with the user's selection.
    pub(crate) async fn resolve_selection(
        &mut self,
        correlation_id: &str,
        selection: ResolverSelection,
    ) -> Result<Outcome> {
        let outstanding = self.resolutions.take(correlation_id)?;
        if outstanding.is_abandoned() {
            debug!(correlation_id, "caller stopped waiting, selection dropped");
            return Ok(Outcome::Ack);
        }

        let ResolverSelection { candidate, intent } = selection;
        let intent = outstanding.intent.clone().or(intent).or_else(|| {
            let context_type = outstanding.context.as_ref().map(|c| c.context_type.as_str())?;
            pick_intent(&candidate, &outstanding.by_intent, context_type)
        });
        let source = outstanding.source.clone();
        let context = outstanding.context.clone();

        match self.route(&source, candidate, intent, context).await {
            Ok(resolution) => {
                outstanding.complete(Ok(resolution.clone()));
                Ok(Outcome::Resolution(resolution))
            }
            Err(err) => {
                warn!(correlation_id, error = %err, "selected candidate could not be routed");
                outstanding.complete(Err(err));
                Ok(Outcome::Ack)
            }
        }
    }

    /// Drop a suspended resolution.
    pub(crate) fn cancel_resolution(&mut self, correlation_id: &str) -> Result<Outcome> {
        self.resolutions.cancel(correlation_id)?;
        info!(correlation_id, "resolution cancelled");
        Ok(Outcome::Ack)
    }
}

/// Intent to use for a candidate picked without one: the intent it was
/// grouped under, else the first of its directory intents accepting the
/// context type.
fn pick_intent(candidate: &ResolutionCandidate, tree: &[IntentCandidates], context_type: &str) -> Option<String> {
    if let Some(intent) = candidate
        .instance_id()
        .and_then(|id| intent_for_instance(tree, id))
    {
        return Some(intent.to_string());
    }
    candidate
        .directory_data()
        .and_then(|app| app.intents_for_context(context_type).next())
        .map(|i| i.name.clone())
}
