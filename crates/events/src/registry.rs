//! Static verification of declared event kinds.
//!
//! Event types are the routing key of the whole system, so they must be
//! unique and well formed across every kind an application declares. That
//! is checked here, over a registry the application assembles, rather than
//! at construction time.

use std::collections::HashMap;

use thiserror::Error;

use crate::event::{
    COMMON_FIELDS, EventKind, EventType, RESERVED_FIELDS, TARGET_USER_FIELD, declared_fields,
};

/// What the registry needs to know about a kind, obtained without an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindDescriptor {
    pub event_type: EventType,
    pub aggregate_type: &'static str,
    pub user_scoped: bool,
    pub type_name: &'static str,
    pub required_fields: &'static [&'static str],
    /// Keys of the kind's serialized default.
    pub declared_fields: Vec<String>,
}

impl KindDescriptor {
    pub fn of<K: EventKind>() -> Self {
        Self {
            event_type: K::event_type(),
            aggregate_type: K::aggregate_type(),
            user_scoped: K::USER_SCOPED,
            type_name: std::any::type_name::<K>(),
            required_fields: K::REQUIRED_FIELDS,
            declared_fields: declared_fields::<K>(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("event type `{event_type}` is declared by both {first} and {second}")]
    Duplicate {
        event_type: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("event type `{event_type}` declared by {kind} is malformed: {reason}")]
    Malformed {
        event_type: String,
        kind: &'static str,
        reason: &'static str,
    },

    #[error("{kind} requires `{field}` but does not declare it")]
    UndeclaredRequiredField { kind: &'static str, field: String },

    #[error("{kind} declares `{field}`, which is a common or system field")]
    FieldClash { kind: &'static str, field: String },
}

/// Check that every event type is `<context>.<event_name>` in lower snake
/// case, every aggregate type is non-empty, no two kinds share an event
/// type, and every kind's fields are constructible: required fields are
/// declared, and no declared field shadows a common or system field.
pub fn verify_registry(kinds: &[KindDescriptor]) -> Result<(), RegistryError> {
    let mut seen: HashMap<String, &'static str> = HashMap::with_capacity(kinds.len());

    for kind in kinds {
        let event_type = kind.event_type.to_string();

        if let Some(reason) = malformed(&event_type, kind.aggregate_type) {
            return Err(RegistryError::Malformed {
                event_type,
                kind: kind.type_name,
                reason,
            });
        }

        verify_fields(kind)?;

        if let Some(first) = seen.insert(event_type.clone(), kind.type_name) {
            return Err(RegistryError::Duplicate {
                event_type,
                first,
                second: kind.type_name,
            });
        }
    }

    Ok(())
}

fn verify_fields(kind: &KindDescriptor) -> Result<(), RegistryError> {
    if let Some(field) = kind
        .required_fields
        .iter()
        .find(|f| !kind.declared_fields.iter().any(|d| d.as_str() == **f))
    {
        return Err(RegistryError::UndeclaredRequiredField {
            kind: kind.type_name,
            field: (*field).to_string(),
        });
    }

    if let Some(field) = kind.declared_fields.iter().find(|f| {
        let f = f.as_str();
        COMMON_FIELDS.contains(&f) || RESERVED_FIELDS.contains(&f) || f == TARGET_USER_FIELD
    }) {
        return Err(RegistryError::FieldClash {
            kind: kind.type_name,
            field: field.clone(),
        });
    }

    Ok(())
}

fn malformed(event_type: &str, aggregate_type: &str) -> Option<&'static str> {
    let segments: Vec<&str> = event_type.split('.').collect();
    if segments.len() != 2 {
        return Some("expected exactly one `.` separator");
    }
    if segments.iter().any(|s| s.is_empty()) {
        return Some("empty segment");
    }
    if !segments.iter().all(|s| is_lower_snake_case(s)) {
        return Some("segments must be lower snake case");
    }
    if aggregate_type.is_empty() {
        return Some("empty aggregate type");
    }
    None
}

fn is_lower_snake_case(segment: &str) -> bool {
    segment.starts_with(|c: char| c.is_ascii_lowercase())
        && segment
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    fn descriptor(context: &'static str, name: &'static str, type_name: &'static str) -> KindDescriptor {
        KindDescriptor {
            event_type: EventType::new(context, name),
            aggregate_type: "thing",
            user_scoped: false,
            type_name,
            required_fields: &[],
            declared_fields: vec!["title".into()],
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct TaskCreated {
        name: String,
    }

    impl EventKind for TaskCreated {
        const CONTEXT: &'static str = "projects";
        const EVENT_NAME: &'static str = "task_created";
        const AGGREGATE_TYPE: &'static str = "task";
        const REQUIRED_FIELDS: &'static [&'static str] = &["nmae"];
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct TaskMoved {
        workspace_id: String,
    }

    impl EventKind for TaskMoved {
        const CONTEXT: &'static str = "projects";
        const EVENT_NAME: &'static str = "task_moved";
        const AGGREGATE_TYPE: &'static str = "task";
    }

    #[test]
    fn descriptor_records_required_and_declared_fields() {
        let kind = KindDescriptor::of::<TaskCreated>();
        assert_eq!(kind.required_fields.to_vec(), vec!["nmae"]);
        assert_eq!(kind.declared_fields, vec!["name".to_string()]);
    }

    #[test]
    fn required_field_that_is_not_declared_is_rejected() {
        let kind = KindDescriptor::of::<TaskCreated>();
        assert_eq!(
            verify_registry(&[kind.clone()]),
            Err(RegistryError::UndeclaredRequiredField {
                kind: kind.type_name,
                field: "nmae".into(),
            })
        );
    }

    #[test]
    fn kind_field_shadowing_a_common_field_is_rejected() {
        let kind = KindDescriptor::of::<TaskMoved>();
        assert!(matches!(
            verify_registry(&[kind]),
            Err(RegistryError::FieldClash { ref field, .. }) if field == "workspace_id"
        ));
    }

    #[test]
    fn reserved_and_target_user_names_clash_too() {
        for field in ["event_id", "occurred_at", "target_user_id", "metadata"] {
            let mut kind = descriptor("chat", "message_posted", "MessagePosted");
            kind.declared_fields = vec![field.to_string()];
            assert!(
                matches!(verify_registry(&[kind]), Err(RegistryError::FieldClash { .. })),
                "{field} should clash"
            );
        }
    }

    #[test]
    fn distinct_well_formed_kinds_verify() {
        let kinds = [
            descriptor("documents", "document_created", "DocumentCreated"),
            descriptor("documents", "document_updated", "DocumentUpdated"),
            descriptor("chat", "message_posted", "MessagePosted"),
        ];
        assert_eq!(verify_registry(&kinds), Ok(()));
    }

    #[test]
    fn duplicate_event_types_are_reported_with_both_kinds() {
        let kinds = [
            descriptor("chat", "message_posted", "chat::MessagePosted"),
            descriptor("chat", "message_posted", "legacy::MessagePosted"),
        ];
        assert_eq!(
            verify_registry(&kinds),
            Err(RegistryError::Duplicate {
                event_type: "chat.message_posted".into(),
                first: "chat::MessagePosted",
                second: "legacy::MessagePosted",
            })
        );
    }

    #[test]
    fn malformed_event_types_are_rejected() {
        for (context, name) in [
            ("chat.v2", "posted"),
            ("", "posted"),
            ("chat", ""),
            ("Chat", "MessagePosted"),
            ("chat", "message-posted"),
        ] {
            let result = verify_registry(&[descriptor(context, name, "Bad")]);
            assert!(
                matches!(result, Err(RegistryError::Malformed { .. })),
                "{context}.{name} should be malformed"
            );
        }
    }

    #[test]
    fn empty_aggregate_type_is_rejected() {
        let mut kind = descriptor("chat", "message_posted", "MessagePosted");
        kind.aggregate_type = "";
        assert!(verify_registry(&[kind]).is_err());
    }
}
