//! Instance table.
//!
//! Channel membership and directory metadata of the instances the host has
//! reported.

use crate::core::{InstanceId, DEFAULT_CHANNEL};
use crate::directory::DirectoryApp;
use std::collections::BTreeMap;

/// Name reported for instances not launched from the directory.
pub const UNKNOWN_APP: &str = "unknown";

/// Broker-side state of one application instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceRecord {
    /// Instance id
    pub id: InstanceId,
    /// Current channel membership
    pub channel: String,
    /// Directory record the instance was launched from
    pub directory_data: Option<DirectoryApp>,
}

impl InstanceRecord {
    /// Create a record on the default channel.
    pub fn new(id: &str, directory_data: Option<DirectoryApp>) -> Self {
        Self {
            id: id.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            directory_data,
        }
    }
}

/// Known instances, ordered by id.
#[derive(Clone, Debug, Default)]
pub struct InstanceTable {
    instances: BTreeMap<InstanceId, InstanceRecord>,
}

impl InstanceTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance. Re-registering keeps membership and only
    /// replaces directory metadata when new metadata is given.
    ///
    /// Returns `true` for a new instance.
    pub fn register(&mut self, id: &str, directory_data: Option<DirectoryApp>) -> bool {
        match self.instances.get_mut(id) {
            Some(record) => {
                if directory_data.is_some() {
                    record.directory_data = directory_data;
                }
                false
            }
            None => {
                self.instances
                    .insert(id.to_string(), InstanceRecord::new(id, directory_data));
                true
            }
        }
    }

    /// Remove an instance.
    pub fn remove(&mut self, id: &str) -> Option<InstanceRecord> {
        self.instances.remove(id)
    }

    /// Look up an instance.
    pub fn get(&self, id: &str) -> Option<&InstanceRecord> {
        self.instances.get(id)
    }

    /// Look up an instance for update.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut InstanceRecord> {
        self.instances.get_mut(id)
    }

    /// Whether an instance is known.
    pub fn contains(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    /// Current channel of an instance; `default` when unknown.
    pub fn channel_of(&self, id: &str) -> &str {
        self.instances
            .get(id)
            .map(|r| r.channel.as_str())
            .unwrap_or(DEFAULT_CHANNEL)
    }

    /// Directory name of an instance, or `unknown`.
    pub fn directory_name(&self, id: &str) -> &str {
        self.instances
            .get(id)
            .and_then(|r| r.directory_data.as_ref())
            .map(|d| d.name.as_str())
            .unwrap_or(UNKNOWN_APP)
    }

    /// Every instance, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &InstanceRecord> {
        self.instances.values()
    }

    /// Instances currently on a channel.
    pub fn members_of<'a>(&'a self, channel: &'a str) -> impl Iterator<Item = &'a InstanceRecord> + 'a {
        self.instances.values().filter(move |r| r.channel == channel)
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_defaults() {
        let mut table = InstanceTable::new();
        assert!(table.register("a", None));
        assert_eq!(table.channel_of("a"), DEFAULT_CHANNEL);
        assert_eq!(table.directory_name("a"), UNKNOWN_APP);
        assert_eq!(table.channel_of("missing"), DEFAULT_CHANNEL);
    }

    #[test]
    fn test_reregister_keeps_membership() {
        let mut table = InstanceTable::new();
        table.register("a", None);
        table.get_mut("a").unwrap().channel = "red".to_string();

        let app = DirectoryApp::new("News", "https://news/");
        assert!(!table.register("a", Some(app)));
        assert_eq!(table.channel_of("a"), "red");
        assert_eq!(table.directory_name("a"), "News");

        assert!(!table.register("a", None));
        assert_eq!(table.directory_name("a"), "News");
    }

    #[test]
    fn test_members_of() {
        let mut table = InstanceTable::new();
        for id in ["c", "a", "b"] {
            table.register(id, None);
        }
        table.get_mut("c").unwrap().channel = "red".to_string();
        table.get_mut("a").unwrap().channel = "red".to_string();

        let ids: Vec<&str> = table.members_of("red").map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(table.remove("a").map(|r| r.id), Some("a".to_string()));
        assert_eq!(table.len(), 2);
    }
}
