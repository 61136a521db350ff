//! App directory
//!
//! The external catalog of launchable applications:
//! - Directory records and the FDC3 metadata derived from them
//! - The `AppDirectory` collaborator trait
//! - In-memory and HTTP implementations

pub mod http;
pub mod memory;

pub use http::HttpDirectory;
pub use memory::InMemoryDirectory;

use crate::core::{InstanceId, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An icon reference in a directory record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryIcon {
    /// Icon URL
    pub icon: String,
}

/// An intent declared by a directory record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryIntent {
    /// Intent name, e.g. `fdc3.ViewChart`
    pub name: String,
    /// Human readable name
    #[serde(default)]
    pub display_name: String,
    /// Context types the intent accepts
    #[serde(default)]
    pub contexts: Vec<String>,
}

impl DirectoryIntent {
    /// FDC3 intent metadata; the display name falls back to the intent name.
    pub fn metadata(&self) -> IntentMetadata {
        let display_name = if self.display_name.is_empty() {
            self.name.clone()
        } else {
            self.display_name.clone()
        };
        IntentMetadata {
            name: self.name.clone(),
            display_name,
        }
    }
}

/// A directory record, as served by the directory service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryApp {
    /// Application id
    #[serde(rename = "appId", default)]
    pub app_id: String,
    /// Unique name
    pub name: String,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Icons
    #[serde(default)]
    pub icons: Vec<DirectoryIcon>,
    /// Declared intents
    #[serde(default)]
    pub intents: Vec<DirectoryIntent>,
    /// Launch URL
    #[serde(default)]
    pub start_url: String,
}

impl DirectoryApp {
    /// Create a record with just a name and launch URL.
    pub fn new(name: &str, start_url: &str) -> Self {
        Self {
            app_id: name.to_string(),
            name: name.to_string(),
            title: name.to_string(),
            description: String::new(),
            icons: Vec::new(),
            intents: Vec::new(),
            start_url: start_url.to_string(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Declare an intent.
    pub fn with_intent(mut self, name: &str, display_name: &str, contexts: &[&str]) -> Self {
        self.intents.push(DirectoryIntent {
            name: name.to_string(),
            display_name: display_name.to_string(),
            contexts: contexts.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// The declared intent named `name`.
    pub fn intent(&self, name: &str) -> Option<&DirectoryIntent> {
        self.intents.iter().find(|i| i.name == name)
    }

    /// Intents accepting `context_type`, in declaration order.
    pub fn intents_for_context<'a>(&'a self, context_type: &'a str) -> impl Iterator<Item = &'a DirectoryIntent> + 'a {
        self.intents
            .iter()
            .filter(move |i| i.contexts.iter().any(|c| c == context_type))
    }

    /// Whether the intent `name` is declared and accepts `context_type`.
    pub fn handles(&self, name: &str, context_type: &str) -> bool {
        self.intent(name)
            .map_or(false, |i| i.contexts.iter().any(|c| c == context_type))
    }

    /// FDC3 app metadata for this record.
    pub fn to_app_metadata(&self) -> AppMetadata {
        AppMetadata {
            name: self.name.clone(),
            app_id: Some(self.app_id.clone()).filter(|s| !s.is_empty()),
            title: Some(self.title.clone()).filter(|s| !s.is_empty()),
            description: Some(self.description.clone()).filter(|s| !s.is_empty()),
            icons: self.icons.iter().map(|i| i.icon.clone()).collect(),
        }
    }
}

/// FDC3 application metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppMetadata {
    /// Application name
    #[serde(default)]
    pub name: String,
    /// Application id (or instance id for resolution sources)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Icon URLs
    #[serde(default)]
    pub icons: Vec<String>,
}

/// FDC3 intent metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMetadata {
    /// Intent name
    pub name: String,
    /// Human readable name
    pub display_name: String,
}

/// An intent and the apps able to handle it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIntent {
    /// The intent
    pub intent: IntentMetadata,
    /// Apps handling it
    pub apps: Vec<AppMetadata>,
}

/// Target of `open` or `raiseIntent`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetApp {
    /// An application name
    Name(String),
    /// A specific live instance
    Instance {
        /// Instance id
        #[serde(rename = "instanceId")]
        instance_id: InstanceId,
    },
    /// Application metadata
    App(AppMetadata),
}

impl TargetApp {
    /// The application name, if the target carries one.
    pub fn name(&self) -> Option<&str> {
        match self {
            TargetApp::Name(name) => Some(name.as_str()),
            TargetApp::App(app) if !app.name.is_empty() => Some(app.name.as_str()),
            _ => None,
        }
        .filter(|n| !n.is_empty())
    }

    /// The live instance, if the target names one.
    pub fn instance_id(&self) -> Option<&str> {
        match self {
            TargetApp::Instance { instance_id } => Some(instance_id.as_str()),
            _ => None,
        }
    }

    /// Narrow a directory query to this target.
    ///
    /// An explicit name wins; otherwise a text search on the app id, then
    /// title, then description.
    pub fn narrow(&self, query: DirectoryQuery) -> DirectoryQuery {
        if let Some(name) = self.name() {
            return query.with_name(name);
        }
        match self {
            TargetApp::App(app) => {
                let text = [&app.app_id, &app.title, &app.description]
                    .into_iter()
                    .flatten()
                    .find(|s| !s.is_empty());
                match text {
                    Some(text) => query.with_text(text),
                    None => query,
                }
            }
            _ => query,
        }
    }
}

/// Directory search parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryQuery {
    /// Declared intent
    pub intent: Option<String>,
    /// Accepted context type
    pub context: Option<String>,
    /// Exact app name
    pub name: Option<String>,
    /// Free text
    pub text: Option<String>,
}

impl DirectoryQuery {
    /// Query by intent.
    pub fn by_intent(intent: &str) -> Self {
        Self {
            intent: Some(intent.to_string()),
            ..Default::default()
        }
    }

    /// Query by context type.
    pub fn by_context(context_type: &str) -> Self {
        Self {
            context: Some(context_type.to_string()),
            ..Default::default()
        }
    }

    /// Add a context type filter.
    pub fn with_context(mut self, context_type: &str) -> Self {
        self.context = Some(context_type.to_string());
        self
    }

    /// Add a name filter.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Add a text filter.
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    /// Non-empty parameters as URL query pairs.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("intent", &self.intent),
            ("context", &self.context),
            ("name", &self.name),
            ("text", &self.text),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_ref().filter(|v| !v.is_empty()).map(|v| (k, v.clone())))
        .collect()
    }
}

/// The external application directory.
#[async_trait]
pub trait AppDirectory: Send + Sync {
    /// Search for applications.
    async fn search(&self, query: &DirectoryQuery) -> Result<Vec<DirectoryApp>>;

    /// Look up one application by its name.
    async fn lookup_by_name(&self, name: &str) -> Result<Option<DirectoryApp>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_directory_app_wire_shape() {
        let app: DirectoryApp = serde_json::from_value(json!({
            "appId": "TradingViewChart",
            "name": "TradingViewChart",
            "title": "TradingView Chart",
            "description": "Demo fdc3 chart",
            "icons": [{"icon": "https://example.com/icon.png"}],
            "intents": [{
                "name": "fdc3.ViewChart",
                "display_name": "View Chart",
                "contexts": ["fdc3.instrument"]
            }],
            "start_url": "https://example.com/chart/",
            "manifest_type": "web"
        }))
        .unwrap();

        assert_eq!(app.app_id, "TradingViewChart");
        assert!(app.handles("fdc3.ViewChart", "fdc3.instrument"));
        assert!(!app.handles("fdc3.ViewChart", "fdc3.contact"));
        assert_eq!(app.intent("fdc3.ViewChart").unwrap().metadata().display_name, "View Chart");

        let bare = DirectoryIntent {
            name: "fdc3.StartChat".to_string(),
            display_name: String::new(),
            contexts: Vec::new(),
        };
        assert_eq!(bare.metadata().display_name, "fdc3.StartChat");

        let meta = app.to_app_metadata();
        assert_eq!(meta.title.as_deref(), Some("TradingView Chart"));
        assert_eq!(meta.icons, vec!["https://example.com/icon.png".to_string()]);
    }

    #[test]
    fn test_target_app_forms() {
        let target: TargetApp = serde_json::from_value(json!("News-Demo")).unwrap();
        assert_eq!(target.name(), Some("News-Demo"));

        let target: TargetApp = serde_json::from_value(json!({"instanceId": "view-3"})).unwrap();
        assert_eq!(target.instance_id(), Some("view-3"));
        assert!(target.name().is_none());

        let target: TargetApp = serde_json::from_value(json!({"name": "", "title": "Ticker Info"})).unwrap();
        assert!(target.name().is_none());
    }

    #[test]
    fn test_target_narrowing_preference() {
        let base = DirectoryQuery::by_intent("fdc3.ViewChart");

        let q = TargetApp::Name("Chart".to_string()).narrow(base.clone());
        assert_eq!(q.name.as_deref(), Some("Chart"));
        assert!(q.text.is_none());

        let app = AppMetadata {
            app_id: Some("chart-app".to_string()),
            title: Some("Chart".to_string()),
            ..Default::default()
        };
        let q = TargetApp::App(app).narrow(base.clone());
        assert_eq!(q.text.as_deref(), Some("chart-app"));

        let app = AppMetadata {
            description: Some("charts things".to_string()),
            ..Default::default()
        };
        let q = TargetApp::App(app).narrow(base.clone());
        assert_eq!(q.text.as_deref(), Some("charts things"));

        let q = TargetApp::Instance { instance_id: "v1".to_string() }.narrow(base.clone());
        assert_eq!(q, base);
    }

    #[test]
    fn test_query_pairs_skip_empty() {
        let query = DirectoryQuery::by_intent("fdc3.ViewNews").with_context("");
        assert_eq!(query.query_pairs(), vec![("intent", "fdc3.ViewNews".to_string())]);
    }
}
