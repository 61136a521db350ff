//! Channel registry.
//!
//! System channels are fixed at startup. App channels are created on first
//! reference and live for the lifetime of the broker.

use crate::core::{Error, Result, DEFAULT_CHANNEL};
use serde::{Deserialize, Serialize};

/// Channel kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Preconfigured user channel
    System,
    /// Channel created on demand by an application
    App,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::System => write!(f, "system"),
            ChannelKind::App => write!(f, "app"),
        }
    }
}

/// Display hints for a channel picker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMetadata {
    /// Human readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// CSS color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Glyph or icon URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glyph: Option<String>,
}

/// A context sharing scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Channel id
    pub id: String,
    /// System or app channel
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    /// Optional display metadata (system channels only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_metadata: Option<DisplayMetadata>,
}

impl Channel {
    /// Create a system channel with display metadata.
    pub fn system(id: &str, name: &str, color: &str, glyph: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: ChannelKind::System,
            display_metadata: Some(DisplayMetadata {
                name: Some(name.to_string()),
                color: Some(color.to_string()),
                glyph: Some(glyph.to_string()),
            }),
        }
    }

    /// Create an app channel.
    pub fn app(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: ChannelKind::App,
            display_metadata: None,
        }
    }
}

/// The default set of FDC3 user channels.
pub fn default_system_channels() -> Vec<Channel> {
    [
        ("red", "Red", "#da2d2d"),
        ("orange", "Orange", "#eb8c00"),
        ("yellow", "Yellow", "#f0d500"),
        ("green", "Green", "#00a03a"),
        ("blue", "Blue", "#0067c4"),
        ("purple", "Purple", "#9b0095"),
    ]
    .iter()
    .map(|(id, name, color)| Channel::system(id, name, color, "●"))
    .collect()
}

/// Registry of system and app channels.
#[derive(Clone, Debug)]
pub struct ChannelRegistry {
    system: Vec<Channel>,
    app: Vec<Channel>,
}

impl ChannelRegistry {
    /// Create a registry with the given system channels.
    ///
    /// A system channel claiming the reserved `default` id is ignored.
    pub fn new(system: Vec<Channel>) -> Self {
        let system = system
            .into_iter()
            .filter(|c| c.id != DEFAULT_CHANNEL)
            .map(|mut c| {
                c.kind = ChannelKind::System;
                c
            })
            .collect();
        Self {
            system,
            app: Vec::new(),
        }
    }

    /// The fixed list of system channels.
    pub fn list_system_channels(&self) -> &[Channel] {
        &self.system
    }

    /// Resolve an id, checking system channels first, then app channels.
    pub fn resolve(&self, id: &str) -> Option<&Channel> {
        self.system
            .iter()
            .find(|c| c.id == id)
            .or_else(|| self.app.iter().find(|c| c.id == id))
    }

    /// Return the existing channel for `id` or create an app channel.
    ///
    /// The boolean is `true` when a new app channel was created.
    pub fn create_or_get_app_channel(&mut self, id: &str) -> Result<(Channel, bool)> {
        if id == DEFAULT_CHANNEL {
            return Err(Error::ReservedChannelId(id.to_string()));
        }
        if let Some(existing) = self.resolve(id) {
            return Ok((existing.clone(), false));
        }
        let channel = Channel::app(id);
        self.app.push(channel.clone());
        Ok((channel, true))
    }

    /// All app channels created so far.
    pub fn app_channels(&self) -> &[Channel] {
        &self.app
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(default_system_channels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_channels() {
        let registry = ChannelRegistry::default();
        let ids: Vec<&str> = registry
            .list_system_channels()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["red", "orange", "yellow", "green", "blue", "purple"]);
        assert!(registry
            .list_system_channels()
            .iter()
            .all(|c| c.kind == ChannelKind::System));
    }

    #[test]
    fn test_resolve_system_before_app() {
        let mut registry = ChannelRegistry::default();
        let (channel, created) = registry.create_or_get_app_channel("red").unwrap();
        assert!(!created);
        assert_eq!(channel.kind, ChannelKind::System);
        assert!(registry.app_channels().is_empty());
    }

    #[test]
    fn test_create_app_channel_once() {
        let mut registry = ChannelRegistry::default();
        let (first, created) = registry.create_or_get_app_channel("trades").unwrap();
        assert!(created);
        assert_eq!(first.kind, ChannelKind::App);

        let (second, created) = registry.create_or_get_app_channel("trades").unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(registry.app_channels().len(), 1);
    }

    #[test]
    fn test_default_is_reserved() {
        let mut registry = ChannelRegistry::default();
        let result = registry.create_or_get_app_channel(DEFAULT_CHANNEL);
        assert!(matches!(result, Err(Error::ReservedChannelId(_))));
        assert!(registry.resolve(DEFAULT_CHANNEL).is_none());
        assert!(registry.app_channels().is_empty());
    }

    #[test]
    fn test_system_default_ignored() {
        let registry = ChannelRegistry::new(vec![
            Channel::app("default"),
            Channel::system("red", "Red", "red", "●"),
        ]);
        assert_eq!(registry.list_system_channels().len(), 1);
        assert!(registry.resolve("default").is_none());
    }

    #[test]
    fn test_channel_serialization() {
        let value = serde_json::to_value(Channel::app("trades")).unwrap();
        assert_eq!(value, serde_json::json!({"id": "trades", "type": "app"}));

        let value = serde_json::to_value(Channel::system("red", "Red", "#f00", "●")).unwrap();
        assert_eq!(value["type"], "system");
        assert_eq!(value["displayMetadata"]["color"], "#f00");
    }
}
