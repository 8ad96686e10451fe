//! Registry of every declared event kind.

use ripple_events::KindDescriptor;

use crate::{accounts, agents, chat, documents, notifications, projects, workspaces};

/// Every event kind the application declares.
pub fn all() -> Vec<KindDescriptor> {
    vec![
        KindDescriptor::of::<accounts::UserRegistered>(),
        KindDescriptor::of::<accounts::UserDeactivated>(),
        KindDescriptor::of::<workspaces::WorkspaceCreated>(),
        KindDescriptor::of::<workspaces::MemberInvited>(),
        KindDescriptor::of::<workspaces::MemberRemoved>(),
        KindDescriptor::of::<documents::DocumentCreated>(),
        KindDescriptor::of::<documents::DocumentUpdated>(),
        KindDescriptor::of::<documents::DocumentDeleted>(),
        KindDescriptor::of::<chat::MessagePosted>(),
        KindDescriptor::of::<agents::AgentCreated>(),
        KindDescriptor::of::<agents::AgentRunCompleted>(),
        KindDescriptor::of::<notifications::NotificationRequested>(),
        KindDescriptor::of::<projects::ProjectCreated>(),
        KindDescriptor::of::<projects::ProjectArchived>(),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use ripple_events::verify_registry;

    #[test]
    fn declared_event_types_are_unique_and_well_formed() {
        assert_eq!(verify_registry(&all()), Ok(()));
    }

    #[test]
    fn every_event_type_has_exactly_one_separator() {
        for kind in all() {
            let rendered = kind.event_type.to_string();
            let (context, name) = rendered.split_once('.').unwrap();
            assert!(!context.is_empty() && !name.is_empty(), "{rendered}");
            assert!(!name.contains('.'), "{rendered}");
        }
    }

    #[test]
    fn registry_covers_every_context() {
        let contexts: BTreeSet<&str> = all().iter().map(|k| k.event_type.context()).collect();
        assert_eq!(
            contexts.into_iter().collect::<Vec<_>>(),
            vec![
                "accounts",
                "agents",
                "chat",
                "documents",
                "notifications",
                "projects",
                "workspaces"
            ]
        );
    }

    #[test]
    fn only_membership_and_notifications_are_user_scoped() {
        let scoped: Vec<String> = all()
            .iter()
            .filter(|k| k.user_scoped)
            .map(|k| k.event_type.to_string())
            .collect();
        assert_eq!(
            scoped,
            vec![
                "workspaces.member_invited",
                "workspaces.member_removed",
                "notifications.notification_requested"
            ]
        );
    }
}
