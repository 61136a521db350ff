//! Resolution candidates.

use crate::core::InstanceId;
use crate::directory::{DirectoryApp, IntentMetadata};
use serde::{Deserialize, Serialize};

/// Title used when neither the directory nor the host provides one.
pub const UNTITLED: &str = "Untitled";

/// A possible handler for a raised intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResolutionCandidate {
    /// A running instance with a matching intent listener
    #[serde(rename_all = "camelCase")]
    Window {
        /// Instance id
        instance_id: InstanceId,
        /// Display title
        title: String,
        /// Directory record the instance was launched from
        #[serde(default, skip_serializing_if = "Option::is_none")]
        directory_data: Option<DirectoryApp>,
    },
    /// An application from the directory, not yet running
    #[serde(rename_all = "camelCase")]
    Directory {
        /// Directory record
        directory_data: DirectoryApp,
    },
}

impl ResolutionCandidate {
    /// Candidate for a running instance.
    ///
    /// The title is the directory title if known, else the host's title.
    pub fn window(instance_id: &str, directory_data: Option<DirectoryApp>, host_title: Option<String>) -> Self {
        let title = directory_data
            .as_ref()
            .map(|d| d.title.clone())
            .filter(|t| !t.is_empty())
            .or(host_title.filter(|t| !t.is_empty()))
            .unwrap_or_else(|| UNTITLED.to_string());
        ResolutionCandidate::Window {
            instance_id: instance_id.to_string(),
            title,
            directory_data,
        }
    }

    /// Candidate for a directory record.
    pub fn directory(directory_data: DirectoryApp) -> Self {
        ResolutionCandidate::Directory { directory_data }
    }

    /// Title the candidate is sorted and displayed by.
    pub fn title(&self) -> &str {
        match self {
            ResolutionCandidate::Window { title, .. } => title.as_str(),
            ResolutionCandidate::Directory { directory_data } if !directory_data.title.is_empty() => {
                directory_data.title.as_str()
            }
            ResolutionCandidate::Directory { directory_data } => directory_data.name.as_str(),
        }
    }

    /// The live instance, for window candidates.
    pub fn instance_id(&self) -> Option<&str> {
        match self {
            ResolutionCandidate::Window { instance_id, .. } => Some(instance_id.as_str()),
            ResolutionCandidate::Directory { .. } => None,
        }
    }

    /// The directory record, if any.
    pub fn directory_data(&self) -> Option<&DirectoryApp> {
        match self {
            ResolutionCandidate::Window { directory_data, .. } => directory_data.as_ref(),
            ResolutionCandidate::Directory { directory_data } => Some(directory_data),
        }
    }
}

/// Candidates grouped under one intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentCandidates {
    /// The intent
    pub intent: IntentMetadata,
    /// Candidates able to handle it
    pub candidates: Vec<ResolutionCandidate>,
}

/// Append a candidate unless it refers to a live instance already present.
pub fn push_unique(candidates: &mut Vec<ResolutionCandidate>, candidate: ResolutionCandidate) -> bool {
    if let Some(id) = candidate.instance_id() {
        if candidates.iter().any(|c| c.instance_id() == Some(id)) {
            return false;
        }
    }
    candidates.push(candidate);
    true
}

/// Collapse duplicate live instances, keeping the first occurrence.
pub fn dedupe(candidates: Vec<ResolutionCandidate>) -> Vec<ResolutionCandidate> {
    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        push_unique(&mut out, candidate);
    }
    out
}

/// Sort by title, ordinal and case-sensitive; ties keep input order.
pub fn sort_by_title(candidates: &mut [ResolutionCandidate]) {
    candidates.sort_by(|a, b| a.title().cmp(b.title()));
}

/// Add a candidate under an intent in a grouped tree, creating the group in
/// first-seen order.
pub fn add_to_tree(tree: &mut Vec<IntentCandidates>, intent: IntentMetadata, candidate: ResolutionCandidate) {
    match tree.iter_mut().find(|g| g.intent.name == intent.name) {
        Some(group) => {
            push_unique(&mut group.candidates, candidate);
        }
        None => tree.push(IntentCandidates {
            intent,
            candidates: vec![candidate],
        }),
    }
}

/// The first intent in the tree that lists a candidate for `instance_id`.
pub fn intent_for_instance<'a>(tree: &'a [IntentCandidates], instance_id: &str) -> Option<&'a str> {
    tree.iter()
        .find(|g| g.candidates.iter().any(|c| c.instance_id() == Some(instance_id)))
        .map(|g| g.intent.name.as_str())
}
