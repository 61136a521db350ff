//! In-memory app directory.
//!
//! Serves a fixed list of records, e.g. loaded from a JSON file.

use crate::core::Result;
use crate::directory::{AppDirectory, DirectoryApp, DirectoryQuery};
use async_trait::async_trait;
use std::path::Path;

/// Directory backed by a list of records.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDirectory {
    apps: Vec<DirectoryApp>,
}

impl InMemoryDirectory {
    /// Create a directory from records.
    pub fn new(apps: Vec<DirectoryApp>) -> Self {
        Self { apps }
    }

    /// Parse a JSON array of records.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Load a JSON array of records from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Add a record.
    pub fn insert(&mut self, app: DirectoryApp) {
        self.apps.retain(|a| a.name != app.name);
        self.apps.push(app);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    fn matches(app: &DirectoryApp, query: &DirectoryQuery) -> bool {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());

        if let Some(name) = non_empty(&query.name) {
            if app.name != name {
                return false;
            }
        }

        match (non_empty(&query.intent), non_empty(&query.context)) {
            (Some(intent), Some(context)) => {
                if !app.handles(&intent, &context) {
                    return false;
                }
            }
            (Some(intent), None) => {
                if app.intent(&intent).is_none() {
                    return false;
                }
            }
            (None, Some(context)) => {
                if app.intents_for_context(&context).next().is_none() {
                    return false;
                }
            }
            (None, None) => {}
        }

        if let Some(text) = non_empty(&query.text) {
            let needle = text.to_lowercase();
            let hit = [&app.app_id, &app.name, &app.title, &app.description]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        true
    }
}

#[async_trait]
impl AppDirectory for InMemoryDirectory {
    async fn search(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryApp>> {
        Ok(self
            .apps
            .iter()
            .filter(|app| Self::matches(app, query))
            .cloned()
            .collect())
    }

    async fn lookup_by_name(&self, name: &str) -> Result<Option<DirectoryApp>> {
        Ok(self.apps.iter().find(|a| a.name == name).cloned())
    }
}
