//! Common types used across broker modules.

use serde::{Deserialize, Serialize};

/// Identifier of a running application instance, as assigned by the host.
pub type InstanceId = String;

/// Channel id meaning "no channel". Never materialised as a shared history.
pub const DEFAULT_CHANNEL: &str = "default";

/// Timestamp wrapper for consistent serialization.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Get current UTC timestamp.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}

/// A context object: `{ "type": ..., ...payload }`.
///
/// Opaque beyond its type. Never mutated once broadcast.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Context type, e.g. `fdc3.instrument`
    #[serde(rename = "type")]
    pub context_type: String,
    /// Remaining fields
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl Context {
    /// Create an empty context of the given type.
    pub fn new(context_type: &str) -> Self {
        Self {
            context_type: context_type.to_string(),
            payload: serde_json::Map::new(),
        }
    }

    /// Add a payload field.
    pub fn with_field(mut self, key: &str, value: serde_json::Value) -> Self {
        self.payload.insert(key.to_string(), value);
        self
    }

    /// Whether this context satisfies an optional type filter.
    pub fn matches_type(&self, filter: Option<&str>) -> bool {
        filter.map_or(true, |t| t == self.context_type)
    }

    /// Parse from a JSON value.
    pub fn from_value(value: serde_json::Value) -> crate::core::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Remove and return every entry matching `pred`, preserving the order of
/// both the drained and the remaining entries.
///
/// Rebuilds the queue in one pass instead of removing by index while scanning.
pub(crate) fn drain_matching<T>(queue: &mut Vec<T>, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
    let (taken, kept): (Vec<T>, Vec<T>) = std::mem::take(queue).into_iter().partition(|t| pred(t));
    *queue = kept;
    taken
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drain_matching_keeps_order() {
        let mut queue = vec![1, 2, 3, 4, 5, 6];
        let taken = drain_matching(&mut queue, |n| n % 2 == 0);
        assert_eq!(taken, vec![2, 4, 6]);
        assert_eq!(queue, vec![1, 3, 5]);
    }

    #[test]
    fn test_drain_adjacent_matches() {
        // Adjacent matches are the case index-based removal skips.
        let mut queue = vec!["a", "a", "b", "a"];
        let taken = drain_matching(&mut queue, |s| *s == "a");
        assert_eq!(taken.len(), 3);
        assert_eq!(queue, vec!["b"]);
    }

    #[test]
    fn test_context_serialization_shape() {
        let ctx = Context::new("fdc3.instrument").with_field("id", json!({"ticker": "AAPL"}));
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value, json!({"type": "fdc3.instrument", "id": {"ticker": "AAPL"}}));
    }

    #[test]
    fn test_context_from_value() {
        let ctx = Context::from_value(json!({"type": "fdc3.contact", "name": "Jane"})).unwrap();
        assert_eq!(ctx.context_type, "fdc3.contact");
        assert_eq!(ctx.payload.get("name"), Some(&json!("Jane")));

        assert!(Context::from_value(json!({"name": "no type"})).is_err());
    }

    #[test]
    fn test_type_filter() {
        let ctx = Context::new("fdc3.instrument");
        assert!(ctx.matches_type(None));
        assert!(ctx.matches_type(Some("fdc3.instrument")));
        assert!(!ctx.matches_type(Some("fdc3.contact")));
    }
}
