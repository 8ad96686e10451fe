//! Documents context.

use serde::{Deserialize, Serialize};

use ripple_events::EventKind;

/// Event: DocumentCreated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCreated {
    pub title: String,
    pub folder_id: Option<String>,
}

impl EventKind for DocumentCreated {
    const CONTEXT: &'static str = "documents";
    const EVENT_NAME: &'static str = "document_created";
    const AGGREGATE_TYPE: &'static str = "document";
    const REQUIRED_FIELDS: &'static [&'static str] = &["title"];
}

/// Event: DocumentUpdated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpdated {
    pub title: String,
    /// Monotonically increasing per document.
    pub revision: u64,
}

impl EventKind for DocumentUpdated {
    const CONTEXT: &'static str = "documents";
    const EVENT_NAME: &'static str = "document_updated";
    const AGGREGATE_TYPE: &'static str = "document";
    const REQUIRED_FIELDS: &'static [&'static str] = &["revision"];
}

/// Event: DocumentDeleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDeleted {}

impl EventKind for DocumentDeleted {
    const CONTEXT: &'static str = "documents";
    const EVENT_NAME: &'static str = "document_deleted";
    const AGGREGATE_TYPE: &'static str = "document";
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_events::{ConstructionError, Event};
    use serde_json::json;

    #[test]
    fn update_requires_a_revision() {
        let err = Event::<DocumentUpdated>::new(json!({
            "aggregate_id": "doc-1",
            "actor_id": "user-1",
            "title": "Roadmap",
        }))
        .unwrap_err();
        assert_eq!(err, ConstructionError::missing(["revision"]));
    }

    #[test]
    fn revision_must_be_a_number() {
        let err = Event::<DocumentUpdated>::new(json!({
            "aggregate_id": "doc-1",
            "actor_id": "user-1",
            "revision": "seven",
        }))
        .unwrap_err();
        assert!(matches!(err, ConstructionError::InvalidField { .. }));
    }
}
